use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use platecheck::{Detection, PlateBox, PlateDetector, TextReader};
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{Date, macros::date};

/// Reference date used wherever tax validation must be deterministic.
pub const TODAY: Date = date!(2024 - 06 - 15);

/// Detector that always reports the same boxes.
pub struct FakeDetector {
    pub detections: Vec<Detection>,
    pub calls: AtomicUsize,
}

impl FakeDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl PlateDetector for FakeDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Detector whose model always fails.
pub struct BrokenDetector;

impl PlateDetector for BrokenDetector {
    fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("model exploded")
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Reader returning scripted texts in call order; `None` entries fail.
pub struct ScriptedReader {
    texts: Mutex<Vec<Option<String>>>,
    pub seen_sizes: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedReader {
    pub fn new(texts: &[Option<&str>]) -> Self {
        let mut texts: Vec<Option<String>> = texts.iter().map(|t| t.map(str::to_string)).collect();
        texts.reverse();
        Self {
            texts: Mutex::new(texts),
            seen_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn reading(texts: &[&str]) -> Self {
        let texts: Vec<Option<&str>> = texts.iter().map(|t| Some(*t)).collect();
        Self::new(&texts)
    }

    pub fn call_count(&self) -> usize {
        self.seen_sizes.lock().unwrap().len()
    }
}

impl TextReader for ScriptedReader {
    fn read_text(&self, image: &DynamicImage) -> anyhow::Result<String> {
        self.seen_sizes
            .lock()
            .unwrap()
            .push((image.width(), image.height()));
        match self.texts.lock().unwrap().pop() {
            Some(Some(text)) => Ok(text),
            Some(None) => anyhow::bail!("recognition failed"),
            None => Ok(String::new()),
        }
    }
}

pub fn det(x_min: i32, y_min: i32, x_max: i32, y_max: i32, confidence: f32) -> Detection {
    Detection::new(PlateBox::new(x_min, y_min, x_max, y_max), confidence)
}

/// Creates a gray test image of the given size.
pub fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |_, _| Rgb([128u8, 128u8, 128u8])))
}

/// PNG-encoded test image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    test_image(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

pub const BOUNDARY: &str = "platecheck-test-boundary";

/// Single-field multipart/form-data body. Returns the content type and the body.
pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
