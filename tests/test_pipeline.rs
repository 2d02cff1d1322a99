//! Integration tests for the full scan pipeline.
//!
//! Tests cover:
//! - Detection, OCR and tax check composed into a ScanReport
//! - Display notices per plate and for an empty scan
//! - Debug image dumps per step

mod common;

use common::*;
use platecheck::report::{MSG_NO_PLATES, MSG_NO_TAX_INFO};
use platecheck::{NoticeLevel, TaxStatus, build_standard_pipeline};
use std::sync::Arc;

#[test]
fn test_scan_reports_every_kept_plate() -> anyhow::Result<()> {
    let detector = FakeDetector::new(vec![
        det(10, 10, 60, 30, 0.9),
        det(70, 10, 90, 30, 0.1),
        det(100, 50, 180, 90, 0.7),
    ]);
    let reader = ScriptedReader::reading(&["B 1234 XY 07 24", "D 5678 AB 01.24"]);
    let scanner = make_scanner(detector, reader);

    let report = scanner.scan(&test_image(200, 100), "car.jpg")?;

    assert_eq!(report.source, "car.jpg");
    assert_eq!((report.width, report.height), (200, 100));
    assert_eq!(report.plates.len(), 2);
    assert!(report.notice().is_none());

    let first = &report.plates[0];
    assert_eq!(first.index, 1);
    assert_eq!(first.detection, det(10, 10, 60, 30, 0.9));
    assert_eq!(first.text, "B 1234 XY 07 24");
    assert_eq!((first.crop.width(), first.crop.height()), (50, 20));
    let code = first.tax_code.as_ref().expect("tax code");
    assert_eq!((code.month.as_str(), code.year.as_str()), ("07", "24"));
    let validation = first.validation.as_ref().expect("validation");
    assert_eq!(validation.status, TaxStatus::Active);
    assert_eq!(validation.validity, "Juli 2024");
    assert_eq!(first.notice.level, NoticeLevel::Success);
    assert_eq!(first.notice.message, "Status Pajak: AKTIF");

    let second = &report.plates[1];
    assert_eq!(second.index, 2);
    assert_eq!(second.validation.as_ref().map(|v| v.status), Some(TaxStatus::Expired));
    assert_eq!(second.notice.level, NoticeLevel::Error);
    assert_eq!(second.notice.message, "Status Pajak: KADALUARSA");
    Ok(())
}

#[test]
fn test_plate_without_tax_code_warns() -> anyhow::Result<()> {
    let scanner = make_scanner(
        FakeDetector::new(vec![det(0, 0, 40, 20, 0.9), det(50, 0, 90, 20, 0.9)]),
        ScriptedReader::reading(&["B XY", "B 1234 13 24"]),
    );

    let report = scanner.scan(&test_image(100, 50), "car.png")?;

    let no_code = &report.plates[0];
    assert!(no_code.tax_code.is_none());
    assert!(no_code.validation.is_none());
    assert_eq!(no_code.notice.level, NoticeLevel::Warning);
    assert_eq!(no_code.notice.message, MSG_NO_TAX_INFO);

    let bad_month = &report.plates[1];
    assert_eq!(bad_month.validation.as_ref().map(|v| v.status), Some(TaxStatus::Invalid));
    assert_eq!(bad_month.notice.level, NoticeLevel::Warning);
    assert_eq!(bad_month.notice.message, "Invalid");
    Ok(())
}

#[test]
fn test_empty_scan_has_warning_notice() -> anyhow::Result<()> {
    let scanner = make_scanner(FakeDetector::empty(), ScriptedReader::reading(&[]));

    let report = scanner.scan(&test_image(64, 64), "empty.png")?;

    assert!(report.is_empty());
    let notice = report.notice().expect("notice");
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, MSG_NO_PLATES);
    Ok(())
}

#[test]
fn test_low_threshold_keeps_more_plates() -> anyhow::Result<()> {
    let detections = vec![det(0, 0, 10, 10, 0.3), det(20, 0, 30, 10, 0.5)];

    let strict = make_scanner(FakeDetector::new(detections.clone()), ScriptedReader::reading(&[]));
    assert_eq!(strict.scan(&test_image(40, 20), "a")?.plates.len(), 1);

    let loose = make_scanner(FakeDetector::new(detections), ScriptedReader::reading(&[]))
        .with_confidence_threshold(0.2);
    assert_eq!(loose.scan(&test_image(40, 20), "a")?.plates.len(), 2);
    Ok(())
}

#[test]
fn test_detector_failure_fails_the_scan() {
    let scanner = platecheck::DetectionPipeline::new(
        Arc::new(BrokenDetector),
        Arc::new(ScriptedReader::reading(&[])),
    );
    assert!(scanner.scan(&test_image(10, 10), "x").is_err());
}

#[test]
fn test_standard_pipeline_steps() {
    let pipeline = build_standard_pipeline(
        Arc::new(FakeDetector::empty()),
        Arc::new(ScriptedReader::reading(&[])),
        0.4,
        Some(TODAY),
    );
    assert_eq!(
        pipeline.step_names(),
        vec!["Plate Detection", "OCR Recognition", "Tax Check"]
    );
}

#[test]
fn test_debug_output_per_step() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let scanner = make_scanner(
        FakeDetector::new(vec![det(10, 10, 50, 30, 0.9), det(60, 10, 90, 30, 0.8)]),
        ScriptedReader::reading(&["B 1234 XY 07 24", ""]),
    )
    .with_debug(Some(debug_dir.clone()));

    scanner.scan(&test_image(100, 50), "car.png")?;

    assert!(debug_dir.join("00_input").join("01.png").is_file());
    let detection_dir = std::fs::read_dir(&debug_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .find(|name| name.starts_with("01_"))
        .expect("step directory");
    let crops = std::fs::read_dir(debug_dir.join(detection_dir))?.count();
    assert_eq!(crops, 2);
    Ok(())
}

#[test]
fn test_debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;
    let scanner = make_scanner(FakeDetector::empty(), ScriptedReader::reading(&[]))
        .with_debug(Some(dir.path().to_path_buf()));

    let err = scanner.scan(&test_image(10, 10), "x").unwrap_err();
    assert!(err.to_string().contains("not empty"));
    Ok(())
}

#[test]
fn test_report_json_shape() -> anyhow::Result<()> {
    let scanner = make_scanner(
        FakeDetector::new(vec![det(1, 2, 30, 40, 0.5)]),
        ScriptedReader::reading(&["AB 12 0725"]),
    );
    let report = scanner.scan(&test_image(50, 50), "car.png")?;

    let json = serde_json::to_value(&report)?;
    let plate = &json["plates"][0];
    assert_eq!(plate["index"], 1);
    assert_eq!(plate["text"], "AB 12 0725");
    assert_eq!(plate["detection"]["bbox"]["x_max"], 30);
    assert_eq!(plate["tax_code"]["month"], "07");
    assert_eq!(plate["validation"]["status"], "AKTIF");
    assert_eq!(plate["notice"]["level"], "success");
    assert!(plate.get("crop").is_none());
    assert!(json["scanned_at"].is_string());
    Ok(())
}
