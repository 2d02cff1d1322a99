use ab_glyph::FontVec;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::models::Detection;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 16.0;
const LABEL_GAP: i32 = 5;

const FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First system font that parses; labels are skipped without one.
static LABEL_FONT: Lazy<Option<FontVec>> = Lazy::new(|| {
    for path in FONT_PATHS {
        if let Ok(data) = std::fs::read(path)
            && let Ok(font) = FontVec::try_from_vec(data)
        {
            info!("Loaded label font: {}", path);
            return Some(font);
        }
    }
    debug!("No system font found, box labels will be skipped");
    None
});

/// Text drawn above each box
pub fn confidence_label(confidence: f32) -> String {
    format!("Number Plate: {:.2}%", confidence * 100.0)
}

/// Copy of `image` with every detection outlined and labelled with its confidence
pub fn draw_detections(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    draw_detections_with_font(image, detections, LABEL_FONT.as_ref())
}

/// Same as [`draw_detections`] with an explicit font. `None` draws the boxes only.
pub fn draw_detections_with_font(
    image: &DynamicImage,
    detections: &[Detection],
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for detection in detections {
        let bbox = detection.bbox;
        for inset in 0..BOX_THICKNESS {
            let width = bbox.width() as i32 - 2 * inset;
            let height = bbox.height() as i32 - 2 * inset;
            if width <= 0 || height <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x_min + inset, bbox.y_min + inset)
                .of_size(width as u32, height as u32);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }

        if let Some(font) = font {
            if bbox.width() == 0 || bbox.height() == 0 {
                continue;
            }
            // Above the box, or inside it when there is no room
            let y = (bbox.y_min - LABEL_GAP - LABEL_SCALE as i32).max(0);
            draw_text_mut(
                &mut canvas,
                BOX_COLOR,
                bbox.x_min.max(0),
                y,
                LABEL_SCALE,
                font,
                &confidence_label(detection.confidence),
            );
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlateBox;

    #[test]
    fn draws_box_outline_only() {
        let img = DynamicImage::new_rgb8(50, 50);
        let det = Detection::new(PlateBox::new(10, 10, 40, 30), 0.9);
        let out = draw_detections_with_font(&img, &[det], None);

        assert_eq!(*out.get_pixel(10, 10), BOX_COLOR);
        assert_eq!(*out.get_pixel(11, 20), BOX_COLOR);
        assert_eq!(*out.get_pixel(25, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_boxes_are_skipped() {
        let img = DynamicImage::new_rgb8(20, 20);
        let det = Detection::new(PlateBox::new(5, 5, 5, 15), 0.9);
        let out = draw_detections(&img, &[det]);
        assert!(out.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn label_shows_percentage() {
        assert_eq!(confidence_label(0.8765), "Number Plate: 87.65%");
        assert_eq!(confidence_label(1.0), "Number Plate: 100.00%");
    }

    #[test]
    fn label_is_drawn_above_the_box_when_a_font_is_available() {
        let Some(font) = LABEL_FONT.as_ref() else {
            return;
        };
        let img = DynamicImage::new_rgb8(300, 120);
        let det = Detection::new(PlateBox::new(20, 60, 200, 110), 0.9);

        let plain = draw_detections_with_font(&img, &[det], None);
        let labelled = draw_detections_with_font(&img, &[det], Some(font));

        let above = |canvas: &RgbImage| {
            (0..60u32)
                .flat_map(|y| (0..300u32).map(move |x| (x, y)))
                .filter(|&(x, y)| *canvas.get_pixel(x, y) != Rgb([0, 0, 0]))
                .count()
        };
        assert_eq!(above(&plain), 0);
        assert!(above(&labelled) > 0);
    }
}
