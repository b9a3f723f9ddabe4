//! Shared fixtures for storage tests.
#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use vitrine_core::StoreConfig;
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};
use vitrine_storage::PageRenderer;

pub const WIDTH: u32 = 64;
pub const HEIGHT: u32 = 36;

/// Small target resolution so tests stay fast.
pub fn test_config(root: &Path) -> StoreConfig {
    StoreConfig::default()
        .with_storage_root(root)
        .with_target_width(WIDTH)
        .with_target_height(HEIGHT)
        .with_jpeg_quality(90)
}

fn color(seed: u8) -> Rgb<u8> {
    let v = seed.wrapping_mul(20);
    Rgb([v, 255 - v, v / 2])
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Solid PNG at the given size.
pub fn png_sized(seed: u8, width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, color(seed));
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Png)
}

/// Solid PNG at the test resolution; distinct seeds give distinct content.
pub fn png_payload(seed: u8) -> Vec<u8> {
    png_sized(seed, WIDTH, HEIGHT)
}

/// Solid JPEG at the test resolution.
pub fn jpeg_payload(seed: u8) -> Vec<u8> {
    let image = RgbImage::from_pixel(WIDTH, HEIGHT, color(seed));
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}

/// Fully transparent PNG at the test resolution.
pub fn transparent_png() -> Vec<u8> {
    let image = RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([0, 0, 0, 0]));
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

/// Smallest byte string that passes the PDF structure check.
pub fn minimal_pdf(tag: &str) -> Vec<u8> {
    format!("%PDF-1.4\n% {}\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n", tag)
        .into_bytes()
}

/// A real one-page PDF: a 400x300 white page with a black box over its middle.
pub fn one_page_pdf() -> Vec<u8> {
    let content = "0 0 0 rg 100 100 200 100 re f";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 400 300] /Resources << >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, body));
    }
    let xref = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    out.into_bytes()
}

/// Renders every document as a solid page whose colour depends on its length.
pub struct StubRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for StubRenderer {
    fn default() -> Self {
        Self {
            width: 100,
            height: 50,
        }
    }
}

impl PageRenderer for StubRenderer {
    fn render_first_page(
        &self,
        document: &[u8],
        _width: u32,
        _height: u32,
    ) -> VitrineResult<DynamicImage> {
        let page = RgbImage::from_pixel(self.width, self.height, color(document.len() as u8));
        Ok(DynamicImage::ImageRgb8(page))
    }
}

/// Always fails, like a renderer given an encrypted document.
pub struct FailingRenderer;

impl PageRenderer for FailingRenderer {
    fn render_first_page(
        &self,
        _document: &[u8],
        _width: u32,
        _height: u32,
    ) -> VitrineResult<DynamicImage> {
        Err(StoreError::new(StoreErrorKind::ConversionFailed("page unreadable".to_string())).into())
    }
}

/// Regular files under `root`, sorted.
pub fn files_in(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
