//! Tax-validity heuristic over plate text.
//!
//! Indonesian plates print the tax expiry as `MM.YY` below the registration
//! number. OCR output is noisy, so the month and year are guessed from the
//! last digit runs in the text and then compared against the calendar.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::{Date, Month, OffsetDateTime};

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{2,4}").unwrap_or_else(|e| panic!("Failed to compile regex pattern: {e}"))
});

pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

pub const LABEL_INCOMPLETE: &str = "Informasi tidak lengkap";
pub const LABEL_INVALID_MONTH: &str = "Bulan tidak valid";
pub const LABEL_ERROR: &str = "Terjadi kesalahan";

/// Month and two-digit year read off a plate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxCode {
    pub month: String,
    pub year: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaxStatus {
    #[serde(rename = "AKTIF")]
    Active,
    #[serde(rename = "KADALUARSA")]
    Expired,
    #[serde(rename = "Invalid")]
    Invalid,
    #[serde(rename = "Tidak Diketahui")]
    Unknown,
    #[serde(rename = "Error")]
    Error,
}

impl TaxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxStatus::Active => "AKTIF",
            TaxStatus::Expired => "KADALUARSA",
            TaxStatus::Invalid => "Invalid",
            TaxStatus::Unknown => "Tidak Diketahui",
            TaxStatus::Error => "Error",
        }
    }
}

impl std::fmt::Display for TaxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`validate_tax`]: a status plus the validity period label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxValidation {
    pub status: TaxStatus,
    pub validity: String,
}

impl TaxValidation {
    fn new(status: TaxStatus, validity: impl Into<String>) -> Self {
        Self {
            status,
            validity: validity.into(),
        }
    }
}

/// Guess the tax month and year from plate text.
///
/// Looks at the runs of 2-4 digits. The year is the tail of the last run; the
/// month is the head of the last run when it holds four digits (`MMYY`),
/// otherwise the tail of the run before it.
pub fn extract_tax_info(text: &str) -> Option<TaxCode> {
    let runs: Vec<&str> = DIGIT_RUNS.find_iter(text).map(|m| m.as_str()).collect();
    if runs.len() < 2 {
        return None;
    }

    let last = runs[runs.len() - 1];
    let year = &last[last.len() - 2..];
    let month = if last.len() >= 4 {
        &last[..2]
    } else {
        let previous = runs[runs.len() - 2];
        &previous[previous.len() - 2..]
    };

    Some(TaxCode {
        month: month.to_string(),
        year: year.to_string(),
    })
}

/// Validate a tax code against `today`.
///
/// The tax stays active up to and including the first day of the month that
/// follows the printed month.
pub fn validate_tax(month: Option<&str>, year: Option<&str>, today: Date) -> TaxValidation {
    let (month, year) = match (month, year) {
        (Some(m), Some(y)) if !m.is_empty() && !y.is_empty() => (m, y),
        _ => return TaxValidation::new(TaxStatus::Unknown, LABEL_INCOMPLETE),
    };

    match compute_validation(month, year, today) {
        Some(validation) => validation,
        None => TaxValidation::new(TaxStatus::Error, LABEL_ERROR),
    }
}

/// Current local calendar date, UTC when the local offset is unavailable.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

// None means the inputs could not be turned into a date at all.
fn compute_validation(month: &str, year: &str, today: Date) -> Option<TaxValidation> {
    let month: i32 = month.trim().parse().ok()?;
    let year = year.trim().parse::<i32>().ok()?.checked_add(2000)?;

    if !(1..=12).contains(&month) {
        return Some(TaxValidation::new(TaxStatus::Invalid, LABEL_INVALID_MONTH));
    }

    let end_date = end_date_for(month, year)?;
    let status = if today <= end_date {
        TaxStatus::Active
    } else {
        TaxStatus::Expired
    };

    let name = MONTH_NAMES[(month - 1) as usize];
    Some(TaxValidation::new(status, format!("{} {}", name, year)))
}

/// Last day on which a tax code still counts as active, if the code is a
/// well-formed month/year pair.
pub fn tax_end_date(code: &TaxCode) -> Option<Date> {
    let month: i32 = code.month.trim().parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let year = code.year.trim().parse::<i32>().ok()?.checked_add(2000)?;
    end_date_for(month, year)
}

// First day of the month after `month`/`year`; December rolls into January.
fn end_date_for(month: i32, year: i32) -> Option<Date> {
    let (next_month, next_year) = if month == 12 {
        (1, year.checked_add(1)?)
    } else {
        (month + 1, year)
    };
    let next_month = Month::try_from(u8::try_from(next_month).ok()?).ok()?;
    Date::from_calendar_date(next_year, next_month, 1).ok()
}
