use serde::{Deserialize, Serialize};

/// Axis-aligned plate rectangle in original image pixels.
///
/// Corners are stored the way the detector reports them: `(x_min, y_min)`
/// top-left and `(x_max, y_max)` bottom-right, exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl PlateBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> u32 {
        (self.x_max - self.x_min).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y_max - self.y_min).max(0) as u32
    }

    /// Clamp the box to an image of the given size and return `(x, y, width, height)`
    /// suitable for cropping. `None` when nothing of the box lies inside the image.
    pub fn crop_region(&self, img_width: u32, img_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x_min.clamp(0, img_width as i32) as u32;
        let y0 = self.y_min.clamp(0, img_height as i32) as u32;
        let x1 = self.x_max.clamp(0, img_width as i32) as u32;
        let y1 = self.y_max.clamp(0, img_height as i32) as u32;

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

impl std::fmt::Display for PlateBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// A plate candidate reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: PlateBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: PlateBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// A plate box paired with the text read from it (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedPlate {
    pub bbox: PlateBox,
    pub text: String,
}

impl RecognizedPlate {
    pub fn new(bbox: PlateBox, text: String) -> Self {
        Self { bbox, text }
    }
}
