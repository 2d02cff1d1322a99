use image::{DynamicImage, Rgb, RgbImage};
use image::imageops::FilterType;
use ndarray::Array4;

/// Square input side of the plate model.
pub const YOLO_INPUT_SIZE: u32 = 640;

/// Gray used by ultralytics for letterbox padding.
const PAD_VALUE: u8 = 114;

/// How an image was fitted into the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub resized_width: u32,
    pub resized_height: u32,
}

impl Letterbox {
    pub fn for_size(width: u32, height: u32, target: u32) -> Self {
        let scale = (target as f32 / width as f32).min(target as f32 / height as f32);
        let resized_width = ((width as f32 * scale).round() as u32).clamp(1, target);
        let resized_height = ((height as f32 * scale).round() as u32).clamp(1, target);
        Self {
            scale,
            pad_x: (target - resized_width) as f32 / 2.0,
            pad_y: (target - resized_height) as f32 / 2.0,
            resized_width,
            resized_height,
        }
    }

    /// Map a point in model input space back to original image pixels.
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }

    /// Map a point in original image pixels into model input space.
    pub fn to_input(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
    }
}

/// Resize keeping aspect ratio and pad to a `target` x `target` square.
pub fn letterbox_image(image: &DynamicImage, target: u32) -> (RgbImage, Letterbox) {
    let letterbox = Letterbox::for_size(image.width(), image.height(), target);
    let resized = image
        .resize_exact(
            letterbox.resized_width,
            letterbox.resized_height,
            FilterType::Triangle,
        )
        .to_rgb8();

    let mut canvas = RgbImage::from_pixel(target, target, Rgb([PAD_VALUE; 3]));
    image::imageops::overlay(
        &mut canvas,
        &resized,
        letterbox.pad_x.floor() as i64,
        letterbox.pad_y.floor() as i64,
    );
    (canvas, letterbox)
}

/// Preprocess an image for the plate detector
///
/// Steps:
/// 1. Letterbox into a `target` square
/// 2. Scale pixels to [0, 1]
/// 3. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_detection(
    image: &DynamicImage,
    target: u32,
) -> anyhow::Result<(Array4<f32>, Letterbox)> {
    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("Cannot run detection on an empty image");
    }

    let (canvas, letterbox) = letterbox_image(image, target);
    let size = target as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    Ok((tensor, letterbox))
}
