//! Server-rendered single page

use ammonia::clean_text;
use image::DynamicImage;
use std::fmt::Write;
use tracing::warn;

use super::image_utils::to_data_url;
use crate::report::{Notice, NoticeLevel, PlateReport, ScanReport};

pub const TITLE: &str = "Deteksi Plat Nomor & Validasi Pajak";
pub const PAGE_TITLE: &str = "Deteksi dan Validasi Status Pajak Kendaraan";
pub const MSG_START: &str = "Silakan unggah gambar plat nomor kendaraan untuk memulai";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0 auto; max-width: 1200px; padding: 1rem 2rem; color: #262730; }
hr { border: none; border-top: 1px solid #ddd; margin: 1.5rem 0; }
.columns { display: flex; gap: 2rem; align-items: flex-start; }
.col-left { flex: 2; }
.col-right { flex: 3; }
.fixed-image { max-height: 400px; width: auto; object-fit: contain; margin: 0 auto; display: block; }
.result-container { padding: 20px; background-color: #f8f9fa; border-radius: 10px; }
.notice { padding: 0.75rem 1rem; border-radius: 0.5rem; margin: 0.75rem 0; }
.notice.success { background: #dff5e3; color: #1b6b2f; }
.notice.error { background: #fde2e2; color: #8a1c1c; }
.notice.warning { background: #fff6d6; color: #7a5b00; }
.notice.info { background: #e1effe; color: #1c4d8a; }
.metrics { display: flex; gap: 2rem; }
.metric .label { font-size: 0.85rem; color: #666; }
.metric .value { font-size: 1.6rem; }
pre { background: #f0f2f6; padding: 0.75rem; border-radius: 0.5rem; }
"#;

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"id\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n<h1>{}</h1>\n<hr>\n\
         <form action=\"/scan\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label for=\"image\">Unggah Gambar Plat Nomor</label><br>\n\
         <input type=\"file\" id=\"image\" name=\"image\" accept=\".jpg,.jpeg,.png,image/jpeg,image/png\" required>\n\
         <button type=\"submit\">Proses</button>\n</form>\n{}\n</body>\n</html>\n",
        clean_text(PAGE_TITLE), STYLE, clean_text(TITLE), body
    )
}

fn notice_html(class: &str, message: &str) -> String {
    format!("<div class=\"notice {}\">{}</div>", class, clean_text(message))
}

fn render_notice(notice: &Notice) -> String {
    let (class, icon) = match notice.level {
        NoticeLevel::Success => ("success", "\u{2705} "),
        NoticeLevel::Error => ("error", "\u{274C} "),
        NoticeLevel::Warning => ("warning", "\u{26A0}\u{FE0F} "),
    };
    notice_html(class, &format!("{}{}", icon, notice.message))
}

fn metric(label: &str, value: &str) -> String {
    format!(
        "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
        clean_text(label),
        clean_text(value)
    )
}

fn img_tag(image: &DynamicImage, attrs: &str, alt: &str) -> String {
    match to_data_url(image) {
        Ok(url) => format!("<img src=\"{}\" {} alt=\"{}\">", url, attrs, clean_text(alt)),
        Err(e) => {
            warn!("Could not embed image: {}", e);
            String::new()
        }
    }
}

fn render_plate(plate: &PlateReport) -> String {
    let mut html = String::new();
    let _ = write!(html, "<hr>\n<h3>Deteksi #{}</h3>\n", plate.index);
    let _ = write!(
        html,
        "<figure>{}<figcaption>Area Plat Terdeteksi</figcaption></figure>\n",
        img_tag(&plate.crop, "class=\"plate-crop\" width=\"300\"", "Area Plat Terdeteksi")
    );
    let _ = write!(html, "<pre>Hasil Scan OCR : {}</pre>\n", clean_text(&plate.text));

    if let (Some(code), Some(validation)) = (&plate.tax_code, &plate.validation) {
        let _ = write!(
            html,
            "<div class=\"metrics\">{}{}</div>\n{}\n",
            metric("Bulan Pajak", &code.month),
            metric("Tahun Pajak", &code.year),
            metric("Masa Berlaku", &validation.validity)
        );
    }
    html.push_str(&render_notice(&plate.notice));
    html
}

/// Landing page before anything is uploaded.
pub fn render_index() -> String {
    layout(&notice_html("info", MSG_START))
}

/// Page for a request that could not be scanned.
pub fn render_error(message: &str) -> String {
    layout(&notice_html("error", message))
}

/// Upload on the left, one block per plate on the right.
pub fn render_results(report: &ScanReport, shown: &DynamicImage) -> String {
    let mut right = String::from("<h2>Hasil Deteksi</h2>\n");
    match report.notice() {
        Some(notice) => right.push_str(&render_notice(&notice)),
        None => {
            right.push_str("<div class=\"result-container\">\n");
            for plate in &report.plates {
                right.push_str(&render_plate(plate));
            }
            right.push_str("</div>\n");
        }
    }

    let body = format!(
        "<div class=\"columns\">\n<div class=\"col-left\">\n<h2>Gambar yang Diunggah</h2>\n{}\n</div>\n\
         <div class=\"col-right\">\n{}</div>\n</div>",
        img_tag(shown, "class=\"fixed-image\"", &report.source),
        right
    );
    layout(&body)
}
