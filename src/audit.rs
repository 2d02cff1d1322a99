use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::models::RecognizedPlate;
use crate::report::ScanReport;

pub const HEADER: [&str; 3] = ["image_path", "box", "text"];

/// How an existing table file is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// Write one `image_path,box,text` row per plate, optionally preceded by the header.
pub fn write_plate_table<W: Write>(
    writer: W,
    source: &str,
    plates: &[RecognizedPlate],
    with_header: bool,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if with_header {
        wtr.write_record(HEADER)?;
    }
    for plate in plates {
        let bbox = plate.bbox.to_string();
        wtr.write_record([source, bbox.as_str(), plate.text.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the table to `path`. In append mode the header is only written to a new or empty file.
pub fn write_plate_table_file(
    path: &Path,
    source: &str,
    plates: &[RecognizedPlate],
    mode: WriteMode,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let (file, with_header) = match mode {
        WriteMode::Truncate => (fs::File::create(path), true),
        WriteMode::Append => {
            let is_empty = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
            (
                OpenOptions::new().create(true).append(true).open(path),
                is_empty,
            )
        }
    };
    let file = file.with_context(|| format!("Failed to open table file {}", path.display()))?;

    write_plate_table(file, source, plates, with_header)
        .with_context(|| format!("Failed to write table file {}", path.display()))
}

/// Write the plates of `report`, if it has any. Returns whether the file was touched.
pub fn write_report_table(path: &Path, report: &ScanReport, mode: WriteMode) -> anyhow::Result<bool> {
    if report.is_empty() {
        return Ok(false);
    }
    write_plate_table_file(path, &report.source, &report.recognized_plates(), mode)?;
    Ok(true)
}
