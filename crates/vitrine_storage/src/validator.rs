//! Cheap admission checks run before any conversion work.

use image::ImageReader;
use std::io::Cursor;
use tracing::{debug, instrument};
use vitrine_core::{SourceKind, StoreConfig, UploadFormat};
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};

const OCTET_STREAM: &str = "application/octet-stream";

/// Outcome of a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_getters::Getters)]
pub struct ValidationResult {
    /// Resolved content type
    format: UploadFormat,
    /// Header dimensions, for raster images only
    dimensions: Option<(u32, u32)>,
}

impl ValidationResult {
    /// How the accepted payload will be recorded.
    pub fn source_kind(&self) -> SourceKind {
        match self.format {
            UploadFormat::Pdf => SourceKind::PdfDerived,
            UploadFormat::Jpeg | UploadFormat::Png => SourceKind::DirectImage,
        }
    }
}

/// Checks size, content type and image dimensions.
///
/// Pure: no filesystem access, and image payloads are only read up to their header.
#[derive(Debug, Clone)]
pub struct Validator {
    target_width: u32,
    target_height: u32,
    max_payload_bytes: u64,
}

impl Validator {
    /// Create a validator for an explicit target resolution and byte ceiling.
    pub fn new(target_width: u32, target_height: u32, max_payload_bytes: u64) -> Self {
        Self {
            target_width,
            target_height,
            max_payload_bytes,
        }
    }

    /// Create a validator from store configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            *config.target_width(),
            *config.target_height(),
            *config.max_payload_bytes(),
        )
    }

    /// Validate a payload against its declared mime type.
    ///
    /// A missing or `application/octet-stream` declaration is resolved by sniffing.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` above the byte ceiling (checked first)
    /// - `UnsupportedFormat` for other mime types, or content contradicting the declaration
    /// - `InvalidDimensions` when an image is not exactly the target resolution
    #[instrument(skip(self, payload), fields(size = payload.len(), declared = ?declared_mime))]
    pub fn validate(
        &self,
        payload: &[u8],
        declared_mime: Option<&str>,
    ) -> VitrineResult<ValidationResult> {
        let size = payload.len() as u64;
        if size > self.max_payload_bytes {
            return Err(StoreError::new(StoreErrorKind::PayloadTooLarge {
                size,
                limit: self.max_payload_bytes,
            })
            .into());
        }

        let format = Self::resolve_format(payload, declared_mime)?;
        if !format.is_image() {
            debug!("PDF accepted; resolution is enforced after rendering");
            return Ok(ValidationResult {
                format,
                dimensions: None,
            });
        }

        let (width, height) = Self::read_dimensions(payload, format)?;
        if (width, height) != (self.target_width, self.target_height) {
            return Err(StoreError::new(StoreErrorKind::InvalidDimensions {
                expected_width: self.target_width,
                expected_height: self.target_height,
                width,
                height,
            })
            .into());
        }

        debug!(%format, width, height, "Payload validated");
        Ok(ValidationResult {
            format,
            dimensions: Some((width, height)),
        })
    }

    fn resolve_format(payload: &[u8], declared_mime: Option<&str>) -> VitrineResult<UploadFormat> {
        let sniffed = UploadFormat::sniff(payload);
        let declared = declared_mime
            .map(str::trim)
            .filter(|mime| !mime.is_empty() && !mime.eq_ignore_ascii_case(OCTET_STREAM));

        let Some(mime) = declared else {
            return sniffed.ok_or_else(|| {
                StoreError::new(StoreErrorKind::UnsupportedFormat(
                    "unrecognized content".to_string(),
                ))
                .into()
            });
        };

        let format = UploadFormat::from_mime(mime).ok_or_else(|| {
            StoreError::new(StoreErrorKind::UnsupportedFormat(mime.to_string()))
        })?;

        match sniffed {
            Some(actual) if actual != format => Err(StoreError::new(
                StoreErrorKind::UnsupportedFormat(format!(
                    "declared {} but content is {}",
                    format, actual
                )),
            )
            .into()),
            _ => Ok(format),
        }
    }

    fn read_dimensions(payload: &[u8], format: UploadFormat) -> VitrineResult<(u32, u32)> {
        let image_format = match format {
            UploadFormat::Png => image::ImageFormat::Png,
            _ => image::ImageFormat::Jpeg,
        };

        ImageReader::with_format(Cursor::new(payload), image_format)
            .into_dimensions()
            .map_err(|e| {
                StoreError::new(StoreErrorKind::UnsupportedFormat(format!(
                    "unreadable {} header: {}",
                    format, e
                )))
                .into()
            })
    }
}
