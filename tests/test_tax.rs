//! Tests for the tax-code heuristic.
//!
//! Tests cover:
//! - Month/year extraction from noisy plate text
//! - Status and validity label for active, expired and malformed codes
//! - Month boundaries, including the December rollover

use platecheck::tax::{
    LABEL_ERROR, LABEL_INCOMPLETE, LABEL_INVALID_MONTH, TaxCode, TaxStatus, extract_tax_info,
    tax_end_date, validate_tax,
};
use time::macros::date;

fn code(month: &str, year: &str) -> Option<TaxCode> {
    Some(TaxCode {
        month: month.to_string(),
        year: year.to_string(),
    })
}

#[test]
fn test_extract_from_separate_runs() {
    assert_eq!(extract_tax_info("B 1234 XY 07 23"), code("07", "23"));
    assert_eq!(extract_tax_info("B 1234 XY 07.23"), code("07", "23"));
}

#[test]
fn test_extract_from_four_digit_run() {
    // MMYY in the last run wins over everything before it
    assert_eq!(extract_tax_info("AB 12 0725"), code("07", "25"));
}

#[test]
fn test_extract_uses_tail_of_previous_run() {
    assert_eq!(extract_tax_info("0723 X 12"), code("23", "12"));
}

#[test]
fn test_extract_needs_two_runs() {
    assert_eq!(extract_tax_info(""), None);
    assert_eq!(extract_tax_info("B XY"), None);
    assert_eq!(extract_tax_info("B 1234 XY"), None);
    // single digits are not runs
    assert_eq!(extract_tax_info("B 1 2 3"), None);
}

#[test]
fn test_extract_splits_long_digit_strings() {
    // "123456" is read as "1234" then "56"
    assert_eq!(extract_tax_info("123456"), code("34", "56"));
}

#[test]
fn test_active_when_before_end_date() {
    let v = validate_tax(Some("07"), Some("24"), date!(2024 - 06 - 15));
    assert_eq!(v.status, TaxStatus::Active);
    assert_eq!(v.validity, "Juli 2024");
}

#[test]
fn test_active_through_first_of_next_month() {
    let v = validate_tax(Some("05"), Some("24"), date!(2024 - 06 - 01));
    assert_eq!(v.status, TaxStatus::Active);

    let v = validate_tax(Some("05"), Some("24"), date!(2024 - 06 - 02));
    assert_eq!(v.status, TaxStatus::Expired);
    assert_eq!(v.validity, "Mei 2024");
}

#[test]
fn test_expired_in_the_past() {
    let v = validate_tax(Some("07"), Some("23"), date!(2024 - 06 - 15));
    assert_eq!(v.status, TaxStatus::Expired);
    assert_eq!(v.validity, "Juli 2023");
}

#[test]
fn test_december_rolls_into_next_year() {
    assert_eq!(tax_end_date(&TaxCode { month: "12".into(), year: "23".into() }), Some(date!(2024 - 01 - 01)));

    let v = validate_tax(Some("12"), Some("23"), date!(2024 - 01 - 01));
    assert_eq!(v.status, TaxStatus::Active);
    assert_eq!(v.validity, "Desember 2023");

    let v = validate_tax(Some("12"), Some("23"), date!(2024 - 01 - 02));
    assert_eq!(v.status, TaxStatus::Expired);
}

#[test]
fn test_missing_parts_are_unknown() {
    let today = date!(2024 - 06 - 15);
    for (month, year) in [(None, Some("23")), (Some("07"), None), (Some(""), Some("23")), (None, None)] {
        let v = validate_tax(month, year, today);
        assert_eq!(v.status, TaxStatus::Unknown);
        assert_eq!(v.validity, LABEL_INCOMPLETE);
    }
}

#[test]
fn test_month_out_of_range_is_invalid() {
    let today = date!(2024 - 06 - 15);
    for month in ["00", "13", "99"] {
        let v = validate_tax(Some(month), Some("23"), today);
        assert_eq!(v.status, TaxStatus::Invalid, "month {}", month);
        assert_eq!(v.validity, LABEL_INVALID_MONTH);
    }
}

#[test]
fn test_non_numeric_is_error() {
    let today = date!(2024 - 06 - 15);
    let v = validate_tax(Some("O7"), Some("23"), today);
    assert_eq!(v.status, TaxStatus::Error);
    assert_eq!(v.validity, LABEL_ERROR);

    let v = validate_tax(Some("07"), Some("2x"), today);
    assert_eq!(v.status, TaxStatus::Error);
}

#[test]
fn test_status_strings() {
    assert_eq!(TaxStatus::Active.to_string(), "AKTIF");
    assert_eq!(TaxStatus::Expired.to_string(), "KADALUARSA");
    assert_eq!(TaxStatus::Unknown.to_string(), "Tidak Diketahui");
    assert_eq!(serde_json::to_string(&TaxStatus::Active).unwrap(), "\"AKTIF\"");
}
