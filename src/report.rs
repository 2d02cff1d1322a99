//! What a scan shows the user: one entry per plate plus a display notice.

use image::DynamicImage;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Detection, RecognizedPlate};
use crate::pipeline::PipelineData;
use crate::tax::{TaxCode, TaxStatus, TaxValidation};

pub const MSG_NO_PLATES: &str = "Tidak terdapat plat nomor terdeteksi pada gambar.";
pub const MSG_NO_TAX_INFO: &str = "Informasi pajak tidak terdeteksi pada plat nomor";

/// Display variant of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// Notice for a plate whose tax code was (or was not) found.
    pub fn for_validation(validation: Option<&TaxValidation>) -> Self {
        match validation {
            None => Notice::new(NoticeLevel::Warning, MSG_NO_TAX_INFO),
            Some(v) => match v.status {
                TaxStatus::Active => {
                    Notice::new(NoticeLevel::Success, format!("Status Pajak: {}", v.status))
                }
                TaxStatus::Expired => {
                    Notice::new(NoticeLevel::Error, format!("Status Pajak: {}", v.status))
                }
                _ => Notice::new(NoticeLevel::Warning, v.status.as_str()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlateReport {
    /// 1-based position in detector order
    pub index: usize,
    pub detection: Detection,
    pub text: String,
    pub tax_code: Option<TaxCode>,
    pub validation: Option<TaxValidation>,
    pub notice: Notice,
    #[serde(skip)]
    pub crop: DynamicImage,
}

impl PlateReport {
    pub fn new(
        index: usize,
        detection: Detection,
        text: String,
        tax_code: Option<TaxCode>,
        validation: Option<TaxValidation>,
        crop: DynamicImage,
    ) -> Self {
        let notice = Notice::for_validation(validation.as_ref());
        Self {
            index,
            detection,
            text,
            tax_code,
            validation,
            notice,
            crop,
        }
    }

    /// Build from a finished pipeline item; `None` for items that never went through detection.
    pub fn from_pipeline(index: usize, data: PipelineData) -> Option<Self> {
        let detection = data.detection?;
        Some(Self::new(
            index,
            detection,
            data.text.unwrap_or_default(),
            data.tax_code,
            data.validation,
            data.image,
        ))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: Uuid,
    /// File name or stored upload path the image came from
    pub source: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scanned_at: OffsetDateTime,
    pub width: u32,
    pub height: u32,
    pub plates: Vec<PlateReport>,
}

impl ScanReport {
    pub fn new(source: impl Into<String>, width: u32, height: u32, plates: Vec<PlateReport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            scanned_at: OffsetDateTime::now_utc(),
            width,
            height,
            plates,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    /// Page-level notice: a warning when nothing was detected.
    pub fn notice(&self) -> Option<Notice> {
        self.is_empty()
            .then(|| Notice::new(NoticeLevel::Warning, MSG_NO_PLATES))
    }

    pub fn detections(&self) -> Vec<Detection> {
        self.plates.iter().map(|p| p.detection).collect()
    }

    pub fn recognized_plates(&self) -> Vec<RecognizedPlate> {
        self.plates
            .iter()
            .map(|p| RecognizedPlate::new(p.detection.bbox, p.text.clone()))
            .collect()
    }
}
