use image::DynamicImage;
pub use ocrs::{OcrEngine, ImageSource};  // Re-export for use in other modules
use ocrs::OcrEngineParams;
use rten::Model;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::models::{PlateBox, RecognizedPlate};

/// Anything that can turn a plate crop into text.
pub trait TextReader: Send + Sync {
    /// Read all text in `image`. Lines are returned separated by `\n`.
    fn read_text(&self, image: &DynamicImage) -> anyhow::Result<String>;
}

/// Default location of the ocrs models (`ocrs-cli` downloads them here)
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with models from `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> anyhow::Result<OcrEngine> {
    let detection_model_path = model_dir.join("text-detection.rten");
    let recognition_model_path = model_dir.join("text-recognition.rten");

    // Check if models exist
    if !detection_model_path.exists() || !recognition_model_path.exists() {
        anyhow::bail!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)?;
    let recognition_model = Model::load_file(&recognition_model_path)?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// [`TextReader`] backed by the ocrs engine.
pub struct OcrsTextReader {
    engine: OcrEngine,
}

impl OcrsTextReader {
    pub fn new(engine: OcrEngine) -> Self {
        Self { engine }
    }

    /// Load models from `model_dir`, or from the ocrs cache when `None`.
    pub fn load(model_dir: Option<&Path>) -> anyhow::Result<Self> {
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_model_dir()?,
        };
        info!("Loading OCR models from {}", model_dir.display());
        Ok(Self::new(init_ocr_engine(&model_dir)?))
    }
}

impl TextReader for OcrsTextReader {
    fn read_text(&self, image: &DynamicImage) -> anyhow::Result<String> {
        let img = image.to_rgb8();
        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())?;
        let ocr_input = self.engine.prepare_input(img_source)?;
        Ok(self.engine.get_text(&ocr_input)?)
    }
}

/// Cut the plate region out of the image; zero-sized when the box misses the image.
pub fn crop_plate(image: &DynamicImage, bbox: &PlateBox) -> DynamicImage {
    match bbox.crop_region(image.width(), image.height()) {
        Some((x, y, width, height)) => image.crop_imm(x, y, width, height),
        None => image.crop_imm(0, 0, 0, 0),
    }
}

/// Collapse multi-line OCR output into one line.
pub fn join_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read a single plate crop. Empty crops and engine failures give an empty string.
pub fn read_plate_text(reader: &dyn TextReader, crop: &DynamicImage) -> String {
    if crop.width() == 0 || crop.height() == 0 {
        return String::new();
    }
    match reader.read_text(crop) {
        Ok(text) => join_lines(&text),
        Err(e) => {
            warn!("Text recognition failed on {}x{} crop: {}", crop.width(), crop.height(), e);
            String::new()
        }
    }
}

/// Read each crop in order and log the total recognition time.
pub fn read_plate_texts<'a>(
    reader: &dyn TextReader,
    crops: impl IntoIterator<Item = &'a DynamicImage>,
) -> Vec<String> {
    let start = Instant::now();

    let texts: Vec<String> = crops
        .into_iter()
        .map(|crop| read_plate_text(reader, crop))
        .collect();

    info!(
        "Time to recognize the number plates: {} milliseconds",
        start.elapsed().as_millis()
    );
    texts
}

/// Crop every box out of `image` and read its text, keeping box order.
pub fn recognize_number_plates(
    reader: &dyn TextReader,
    image: &DynamicImage,
    boxes: &[PlateBox],
) -> Vec<RecognizedPlate> {
    let crops: Vec<DynamicImage> = boxes.iter().map(|bbox| crop_plate(image, bbox)).collect();

    boxes
        .iter()
        .zip(read_plate_texts(reader, &crops))
        .map(|(bbox, text)| {
            debug!("Plate {} read as '{}'", bbox, text);
            RecognizedPlate::new(*bbox, text)
        })
        .collect()
}
