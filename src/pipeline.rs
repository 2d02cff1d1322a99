use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use tracing::debug;

use crate::models::Detection;
use crate::tax::{TaxCode, TaxValidation};

/// Data that flows through the pipeline
/// Each PipelineData represents the full image or a single plate region
#[derive(Clone)]
pub struct PipelineData {
    /// The image data (full frame before detection, plate crop after)
    pub image: DynamicImage,

    /// Reference to the original image (shared efficiently via Arc)
    pub original: Arc<DynamicImage>,

    /// Detector output this region was cut from (None means full image)
    pub detection: Option<Detection>,

    /// Text read from the region, empty when OCR found nothing
    pub text: Option<String>,

    /// Month/year guessed from the text
    pub tax_code: Option<TaxCode>,

    /// Tax status for `tax_code`
    pub validation: Option<TaxValidation>,
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: DynamicImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            detection: None,
            text: None,
            tax_code: None,
            validation: None,
        }
    }

    /// Create PipelineData for a plate region of an image
    pub fn from_region(
        image: DynamicImage,
        original: Arc<DynamicImage>,
        detection: Detection,
    ) -> Self {
        Self {
            image,
            original,
            detection: Some(detection),
            text: None,
            tax_code: None,
            validation: None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    fn save(&self, dir_name: &str, file_name: &str, image: &DynamicImage) -> Result<()> {
        let dir = self.output_dir.join(dir_name);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        // Zero-area crops cannot be encoded
        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        image
            .save(&path)
            .with_context(|| format!("Failed to save debug image {}", path.display()))?;
        debug!("Debug: saved {}/{}", dir_name, file_name);
        Ok(())
    }
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in logs and debug directory names)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                anyhow::bail!("Debug directory is not empty: {}", output_dir.display());
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline sequentially on an input image
    pub fn run(&self, input: DynamicImage) -> Result<Vec<PipelineData>> {
        if let Some(debug_config) = &self.context.debug {
            debug_config.save("00_input", "01.png", &input)?;
        }

        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!("Running step: {} (processing {} items)", step.name(), data.len());

            data = step.process(data, &self.context)?;

            if let Some(debug_config) = &self.context.debug {
                let step_dir_name = format!(
                    "{:02}_{}",
                    step_idx + 1,
                    step.name().to_lowercase().replace(' ', "_")
                );
                for (idx, item) in data.iter().enumerate() {
                    debug_config.save(&step_dir_name, &format!("{:02}.png", idx + 1), &item.image)?;
                }
            }

            debug!("  → {} items", data.len());
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
