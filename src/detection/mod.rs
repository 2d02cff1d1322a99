pub mod annotate;
pub mod ocr;
pub mod preprocessing;
pub mod steps;
pub mod yolo;

use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use time::Date;
use tracing::info;

use crate::models::Detection;
use crate::pipeline::Pipeline;
use crate::report::{PlateReport, ScanReport};
use ocr::TextReader;

/// Confidence a detection needs to be kept
pub const CONFIDENCE_THRESHOLD: f32 = 0.4;

/// Anything that can locate plates in an image.
pub trait PlateDetector: Send + Sync {
    /// Raw detector output in original image pixels
    fn detect(&self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>>;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Keep detections scoring at least `threshold`, in detector order
pub fn filter_by_confidence(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= threshold)
        .collect()
}

/// Run the detector and apply the confidence threshold
pub fn detect_number_plates(
    detector: &dyn PlateDetector,
    image: &DynamicImage,
    threshold: f32,
) -> anyhow::Result<Vec<Detection>> {
    let start = Instant::now();

    let detections = filter_by_confidence(detector.detect(image)?, threshold);

    info!("{} Number plate(s) have been detected.", detections.len());
    info!(
        "Time to detect the number plates: {} milliseconds",
        start.elapsed().as_millis()
    );
    Ok(detections)
}

/// Main detection pipeline orchestrator
pub struct DetectionPipeline {
    detector: Arc<dyn PlateDetector>,
    reader: Arc<dyn TextReader>,
    pub confidence_threshold: f32,
    pub debug_out: Option<PathBuf>,
    /// Pinned reference date for tax validation
    pub today: Option<Date>,
}

impl DetectionPipeline {
    pub fn new(detector: Arc<dyn PlateDetector>, reader: Arc<dyn TextReader>) -> Self {
        Self {
            detector,
            reader,
            confidence_threshold: CONFIDENCE_THRESHOLD,
            debug_out: None,
            today: None,
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_debug(mut self, debug_out: Option<PathBuf>) -> Self {
        self.debug_out = debug_out;
        self
    }

    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    /// Build the step sequence for one scan
    pub fn build(&self) -> anyhow::Result<Pipeline> {
        let pipeline = build_standard_pipeline(
            self.detector.clone(),
            self.reader.clone(),
            self.confidence_threshold,
            self.today,
        );
        match &self.debug_out {
            Some(dir) => pipeline.with_debug(dir),
            None => Ok(pipeline),
        }
    }

    /// Detect, read and validate every plate in `img`
    pub fn scan(&self, img: &DynamicImage, source: &str) -> anyhow::Result<ScanReport> {
        info!("Scanning {} ({}x{})", source, img.width(), img.height());

        let results = self.build()?.run(img.clone())?;
        let plates: Vec<PlateReport> = results
            .into_iter()
            .filter(|data| data.detection.is_some())
            .enumerate()
            .filter_map(|(i, data)| PlateReport::from_pipeline(i + 1, data))
            .collect();

        Ok(ScanReport::new(source, img.width(), img.height(), plates))
    }
}

/// Build a standard detection pipeline using the composable pipeline system
pub fn build_standard_pipeline(
    detector: Arc<dyn PlateDetector>,
    reader: Arc<dyn TextReader>,
    confidence_threshold: f32,
    today: Option<Date>,
) -> Pipeline {
    use steps::*;

    Pipeline::new()
        .add_step(Arc::new(PlateDetectionStep {
            detector,
            confidence_threshold,
        }))
        .add_step(Arc::new(PlateOcrStep { reader }))
        .add_step(Arc::new(TaxCheckStep { today }))
}
