use crate::pipeline::{PipelineData, PipelineStep, PipelineContext};
use crate::detection::{PlateDetector, detect_number_plates, ocr};
use crate::tax;
use anyhow::Result;
use std::sync::Arc;
use time::Date;

/// Find plates and split the full image into one region per kept detection
pub struct PlateDetectionStep {
    pub detector: Arc<dyn PlateDetector>,
    pub confidence_threshold: f32,
}

impl PipelineStep for PlateDetectionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let detections = detect_number_plates(
                self.detector.as_ref(),
                &item.original,
                self.confidence_threshold,
            )?;

            for detection in detections {
                let cropped = ocr::crop_plate(&item.original, &detection.bbox);
                result.push(PipelineData::from_region(
                    cropped,
                    item.original.clone(),
                    detection,
                ));
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Plate Detection"
    }
}

/// Read the text of each plate region
pub struct PlateOcrStep {
    pub reader: Arc<dyn ocr::TextReader>,
}

impl PipelineStep for PlateOcrStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let texts = ocr::read_plate_texts(self.reader.as_ref(), data.iter().map(|item| &item.image));

        Ok(data
            .into_iter()
            .zip(texts)
            .map(|(mut item, text)| {
                tracing::debug!("OCR text: '{}'", text);
                item.text = Some(text);
                item
            })
            .collect())
    }

    fn name(&self) -> &str {
        "OCR Recognition"
    }
}

/// Guess the tax code from the plate text and validate it
pub struct TaxCheckStep {
    /// Reference date; the current local date when `None`
    pub today: Option<Date>,
}

impl PipelineStep for TaxCheckStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let today = self.today.unwrap_or_else(tax::today);

        Ok(data
            .into_iter()
            .map(|mut item| {
                let code = item.text.as_deref().and_then(tax::extract_tax_info);
                item.validation = code.as_ref().map(|c| {
                    tax::validate_tax(Some(&c.month), Some(&c.year), today)
                });
                item.tax_code = code;
                item
            })
            .collect())
    }

    fn name(&self) -> &str {
        "Tax Check"
    }
}
