//! Pure-Rust PDF rasterizing through `hayro`.

use super::PageRenderer;
use hayro::{InterpreterSettings, Pdf, RenderSettings};
use image::{DynamicImage, ImageFormat};
use std::sync::Arc;
use tracing::debug;
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};

/// Renders page one with `hayro`, scaled to fit the target canvas.
///
/// Encrypted or structurally broken documents fail with `ConversionFailed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HayroRenderer;

fn failed(reason: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::ConversionFailed(reason.into()))
}

impl PageRenderer for HayroRenderer {
    fn render_first_page(
        &self,
        document: &[u8],
        width: u32,
        height: u32,
    ) -> VitrineResult<DynamicImage> {
        let pdf = Pdf::new(Arc::new(document.to_vec()))
            .map_err(|e| failed(format!("unreadable PDF: {:?}", e)))?;
        let pages = pdf.pages();
        let page = pages.first().ok_or_else(|| failed("document has no pages"))?;

        let (page_width, page_height) = page.render_dimensions();
        if !(page_width > 0.0 && page_height > 0.0) {
            return Err(failed("first page has no area").into());
        }
        let scale = f32::min(width as f32 / page_width, height as f32 / page_height);
        debug!(page_width, page_height, scale, "Rendering first PDF page");

        let settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            ..Default::default()
        };
        let pixmap = hayro::render(page, &InterpreterSettings::default(), &settings);

        image::load_from_memory_with_format(&pixmap.take_png(), ImageFormat::Png)
            .map_err(|e| failed(format!("rendered page unreadable: {}", e)).into())
    }
}
