//! Pluggable PDF page rendering.

use image::DynamicImage;
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};

#[cfg(feature = "pdf")]
mod hayro_backend;
#[cfg(feature = "pdf")]
pub use hayro_backend::HayroRenderer;

/// Renders the first page of a PDF document to pixels.
///
/// `width` and `height` are the target canvas; implementations should render at
/// roughly that size; the converter fits whatever comes back onto the exact canvas.
/// Failures should be reported as `ConversionFailed`.
pub trait PageRenderer: Send + Sync {
    /// Render page one of `document`.
    fn render_first_page(
        &self,
        document: &[u8],
        width: u32,
        height: u32,
    ) -> VitrineResult<DynamicImage>;
}

/// Renderer used when no PDF backend is installed; refuses every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRenderer;

impl PageRenderer for UnavailableRenderer {
    fn render_first_page(
        &self,
        _document: &[u8],
        _width: u32,
        _height: u32,
    ) -> VitrineResult<DynamicImage> {
        Err(StoreError::new(StoreErrorKind::ConversionFailed(
            "no PDF renderer configured".to_string(),
        ))
        .into())
    }
}
