//! Upload validation and image encoding for the page

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use thiserror::Error;

/// Maximum upload size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format (only PNG and JPEG are accepted)")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// Decode raw upload bytes
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(DynamicImage, ImageFormat), ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    Ok((img, format))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

pub fn format_to_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        _ => "bin",
    }
}

/// Encode as JPEG and wrap in a `data:` URL for an `<img>` tag
pub fn to_data_url(image: &DynamicImage) -> Result<String, ImageError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::EmptyData);
    }
    let mut buf = Cursor::new(Vec::new());
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(buf.into_inner())))
}
