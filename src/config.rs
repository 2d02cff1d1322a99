use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::detection::{CONFIDENCE_THRESHOLD, DetectionPipeline, ocr::OcrsTextReader, yolo::YoloPlateDetector};

pub const DEFAULT_DETECTOR_MODEL: &str = "models/best.onnx";
pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Where the models live and how picky the detector is
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// ONNX export of the plate detector
    #[arg(long, value_name = "FILE", default_value = DEFAULT_DETECTOR_MODEL)]
    pub detector_model: PathBuf,

    /// Directory holding text-detection.rten and text-recognition.rten [default: ~/.cache/ocrs]
    #[arg(long, value_name = "DIR")]
    pub ocr_model_dir: Option<PathBuf>,

    /// Minimum detector confidence for a plate to be kept
    #[arg(long, default_value_t = CONFIDENCE_THRESHOLD)]
    pub confidence_threshold: f32,
}

impl Default for ModelArgs {
    fn default() -> Self {
        Self {
            detector_model: PathBuf::from(DEFAULT_DETECTOR_MODEL),
            ocr_model_dir: None,
            confidence_threshold: CONFIDENCE_THRESHOLD,
        }
    }
}

impl ModelArgs {
    /// Reject bad settings before any model is loaded.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "Confidence threshold must be between 0 and 1, got {}",
                self.confidence_threshold
            );
        }
        if !self.detector_model.is_file() {
            anyhow::bail!(
                "Detector model not found: {}",
                self.detector_model.display()
            );
        }
        if let Some(dir) = &self.ocr_model_dir {
            if !dir.is_dir() {
                anyhow::bail!("OCR model directory not found: {}", dir.display());
            }
        }
        Ok(())
    }

    /// Load both models and wrap them in a scan pipeline.
    pub fn load_pipeline(&self) -> anyhow::Result<DetectionPipeline> {
        self.validate()?;

        info!("Loading detector model from {}", self.detector_model.display());
        let detector = YoloPlateDetector::load(&self.detector_model)?;
        let reader = OcrsTextReader::load(self.ocr_model_dir.as_deref())?;

        Ok(DetectionPipeline::new(Arc::new(detector), Arc::new(reader))
            .with_confidence_threshold(self.confidence_threshold))
    }
}

/// Web server settings
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Append every scan's plates to this CSV file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Keep uploaded images in this directory
    #[arg(long, value_name = "DIR")]
    pub upload_dir: Option<PathBuf>,
}
