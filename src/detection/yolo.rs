//! YOLO plate detector running an ONNX export through ONNX Runtime.
//!
//! Mirrors what `model.predict()` does for an ultralytics checkpoint:
//! letterbox, forward pass, confidence floor, NMS, and mapping back to the
//! original image. The application-level threshold is applied later by
//! [`super::filter_by_confidence`].

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, Ix3};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use super::PlateDetector;
use super::preprocessing::{Letterbox, YOLO_INPUT_SIZE, preprocess_for_detection};
use crate::models::{Detection, PlateBox};

/// Detector-side parameters, matching ultralytics `predict` defaults.
#[derive(Debug, Clone, Copy)]
pub struct YoloParams {
    pub input_size: u32,
    /// Candidates below this never leave the detector
    pub min_confidence: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: YOLO_INPUT_SIZE,
            min_confidence: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

/// Box in model input space, centre format converted to corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl Candidate {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32, confidence: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            confidence,
        }
    }

    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &Candidate) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Convert to a detection in original image pixels, clamped to the image.
    pub fn to_detection(&self, letterbox: &Letterbox, img_width: u32, img_height: u32) -> Detection {
        let (x1, y1) = letterbox.to_original(self.x1, self.y1);
        let (x2, y2) = letterbox.to_original(self.x2, self.y2);
        let clamp_x = |v: f32| v.clamp(0.0, img_width as f32) as i32;
        let clamp_y = |v: f32| v.clamp(0.0, img_height as f32) as i32;
        Detection::new(
            PlateBox::new(clamp_x(x1), clamp_y(y1), clamp_x(x2), clamp_y(y2)),
            self.confidence,
        )
    }
}

/// Decode a raw `[1, C, N]` (YOLOv8) or `[1, N, C]` (YOLOv5) output tensor.
pub fn decode_output(output: ArrayViewD<f32>, min_confidence: f32) -> Result<Vec<Candidate>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .context("Expected a 3-dimensional detector output")?;
    let (_, rows, cols) = output.dim();

    let mut candidates = Vec::new();
    if rows < cols {
        // v8: channels first, 4 box values followed by class scores
        if rows < 5 {
            anyhow::bail!("Detector output has too few channels: {}", rows);
        }
        for i in 0..cols {
            let confidence = (4..rows)
                .map(|c| output[[0, c, i]])
                .fold(f32::MIN, f32::max);
            if confidence >= min_confidence {
                candidates.push(Candidate::from_center(
                    output[[0, 0, i]],
                    output[[0, 1, i]],
                    output[[0, 2, i]],
                    output[[0, 3, i]],
                    confidence,
                ));
            }
        }
    } else {
        // v5: one row per anchor, objectness then class scores
        if cols < 6 {
            anyhow::bail!("Detector output has too few columns: {}", cols);
        }
        for j in 0..rows {
            let objectness = output[[0, j, 4]];
            let class_score = (5..cols)
                .map(|c| output[[0, j, c]])
                .fold(f32::MIN, f32::max);
            let confidence = objectness * class_score;
            if confidence >= min_confidence {
                candidates.push(Candidate::from_center(
                    output[[0, j, 0]],
                    output[[0, j, 1]],
                    output[[0, j, 2]],
                    output[[0, j, 3]],
                    confidence,
                ));
            }
        }
    }

    Ok(candidates)
}

/// Greedy non-maximum suppression. Output is sorted by descending confidence.
pub fn non_max_suppression(
    mut candidates: Vec<Candidate>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Plate detector backed by a YOLO model exported to ONNX.
pub struct YoloPlateDetector {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    params: YoloParams,
}

impl std::fmt::Debug for YoloPlateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloPlateDetector")
            .field("input_name", &self.input_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl YoloPlateDetector {
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_params(model_path, YoloParams::default())
    }

    pub fn with_params(model_path: impl AsRef<Path>, params: YoloParams) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            anyhow::bail!("Plate detection model not found: {}", model_path.display());
        }

        info!("Loading plate detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("Failed to load plate detection model from {}", model_path.display())
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!("Plate detection model input: {}", input_name);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            params,
        })
    }
}

impl PlateDetector for YoloPlateDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (tensor, letterbox) = preprocess_for_detection(image, self.params.input_size)?;
        let input_value = Value::from_array(tensor).context("Failed to create input tensor")?;

        let candidates = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("Plate detector session lock poisoned"))?;
            let outputs = session
                .run(ort::inputs![&self.input_name => input_value])
                .context("Plate detection inference failed")?;
            let output = outputs[0]
                .try_extract_array::<f32>()
                .context("Failed to extract detector output")?;
            decode_output(output.view(), self.params.min_confidence)?
        };

        debug!("{} raw candidates above detector floor", candidates.len());

        let kept = non_max_suppression(
            candidates,
            self.params.iou_threshold,
            self.params.max_detections,
        );

        Ok(kept
            .iter()
            .map(|c| c.to_detection(&letterbox, image.width(), image.height()))
            .collect())
    }

    fn name(&self) -> &str {
        "yolo-onnx"
    }
}
