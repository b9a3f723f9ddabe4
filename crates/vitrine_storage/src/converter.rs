//! Normalization of accepted uploads into canonical JPEG bytes.
//!
//! Every stored file comes out of [`Converter::convert`]: PNG and JPEG inputs
//! are decoded, flattened onto white and re-encoded; PDFs have their first
//! page rendered and fitted onto the target canvas. Encoding uses a fixed
//! quality and embeds no timestamps, so identical input yields identical bytes.

use crate::PageRenderer;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba};
use std::sync::Arc;
use tracing::{debug, instrument};
use vitrine_core::{StoreConfig, UploadFormat};
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const PDF_TRAILER_WINDOW: usize = 1024;

/// Produces canonical bytes at a fixed resolution and quality.
#[derive(Clone)]
pub struct Converter {
    target_width: u32,
    target_height: u32,
    quality: u8,
    renderer: Arc<dyn PageRenderer>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("target_width", &self.target_width)
            .field("target_height", &self.target_height)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

fn conversion_failed(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::ConversionFailed(message.into()))
}

impl Converter {
    /// Create a converter from store configuration and a PDF renderer.
    pub fn new(config: &StoreConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            target_width: *config.target_width(),
            target_height: *config.target_height(),
            quality: *config.jpeg_quality(),
            renderer,
        }
    }

    /// Convert a validated payload to canonical JPEG bytes.
    ///
    /// CPU-bound; callers on an async runtime should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns `ConversionFailed` for undecodable images, corrupt or empty PDFs,
    /// and renders that cannot be placed on the target canvas.
    #[instrument(skip(self, payload), fields(size = payload.len(), %format))]
    pub fn convert(&self, payload: &[u8], format: UploadFormat) -> VitrineResult<Vec<u8>> {
        let pixels = match format {
            UploadFormat::Jpeg | UploadFormat::Png => self.decode_image(payload, format)?,
            UploadFormat::Pdf => self.render_pdf(payload)?,
        };
        let encoded = self.encode(&pixels)?;
        debug!(bytes = encoded.len(), "Encoded canonical image");
        Ok(encoded)
    }

    fn decode_image(&self, payload: &[u8], format: UploadFormat) -> VitrineResult<RgbImage> {
        let image_format = match format {
            UploadFormat::Png => image::ImageFormat::Png,
            _ => image::ImageFormat::Jpeg,
        };
        let decoded = image::load_from_memory_with_format(payload, image_format)
            .map_err(|e| conversion_failed(format!("failed to decode {}: {}", format, e)))?;

        let pixels = flatten_onto_white(&decoded);
        if pixels.dimensions() != (self.target_width, self.target_height) {
            return Err(conversion_failed(format!(
                "decoded image is {}x{}, expected {}x{}",
                pixels.width(),
                pixels.height(),
                self.target_width,
                self.target_height
            ))
            .into());
        }
        Ok(pixels)
    }

    fn render_pdf(&self, payload: &[u8]) -> VitrineResult<RgbImage> {
        if !looks_like_pdf(payload) {
            return Err(conversion_failed("payload is not a complete PDF document").into());
        }

        let page = self
            .renderer
            .render_first_page(payload, self.target_width, self.target_height)?;
        if page.width() == 0 || page.height() == 0 {
            return Err(conversion_failed("renderer produced an empty page").into());
        }

        debug!(
            page_width = page.width(),
            page_height = page.height(),
            "Rendered first PDF page"
        );
        Ok(fit_to_canvas(
            &flatten_onto_white(&page),
            self.target_width,
            self.target_height,
        ))
    }

    fn encode(&self, pixels: &RgbImage) -> VitrineResult<Vec<u8>> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(pixels)
            .map_err(|e| conversion_failed(format!("JPEG encoding failed: {}", e)))?;
        Ok(out)
    }
}

/// Header magic plus an end-of-file marker near the end.
fn looks_like_pdf(payload: &[u8]) -> bool {
    if !payload.starts_with(b"%PDF-") {
        return false;
    }
    let tail = &payload[payload.len().saturating_sub(PDF_TRAILER_WINDOW)..];
    tail.windows(5).any(|w| w == b"%%EOF")
}

/// Drop the alpha channel by compositing onto white.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Scale preserving aspect ratio and centre on a white canvas of exactly `width`x`height`.
pub fn fit_to_canvas(page: &RgbImage, width: u32, height: u32) -> RgbImage {
    if page.dimensions() == (width, height) {
        return page.clone();
    }

    let scale = f64::min(
        width as f64 / page.width() as f64,
        height as f64 / page.height() as f64,
    );
    let scaled_width = ((page.width() as f64 * scale).round() as u32).clamp(1, width);
    let scaled_height = ((page.height() as f64 * scale).round() as u32).clamp(1, height);
    let resized = imageops::resize(page, scaled_width, scaled_height, FilterType::Lanczos3);

    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    imageops::overlay(
        &mut canvas,
        &resized,
        ((width - scaled_width) / 2) as i64,
        ((height - scaled_height) / 2) as i64,
    );
    canvas
}
