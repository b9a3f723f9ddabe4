//! Upload content types.

use serde::{Deserialize, Serialize};

/// Content types the store admits.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    /// JPEG image
    #[display("image/jpeg")]
    Jpeg,
    /// PNG image
    #[display("image/png")]
    Png,
    /// PDF document, rendered to an image on admission
    #[display("application/pdf")]
    Pdf,
}

impl UploadFormat {
    /// Canonical mime type.
    pub fn mime(&self) -> &'static str {
        match self {
            UploadFormat::Jpeg => "image/jpeg",
            UploadFormat::Png => "image/png",
            UploadFormat::Pdf => "application/pdf",
        }
    }

    /// Resolve a declared mime type. Parameters such as `; charset=` are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use vitrine_core::UploadFormat;
    ///
    /// assert_eq!(UploadFormat::from_mime("image/jpg"), Some(UploadFormat::Jpeg));
    /// assert_eq!(UploadFormat::from_mime("image/gif"), None);
    /// ```
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(UploadFormat::Jpeg),
            "image/png" => Some(UploadFormat::Png),
            "application/pdf" => Some(UploadFormat::Pdf),
            _ => None,
        }
    }

    /// Detect the format from leading magic bytes.
    pub fn sniff(payload: &[u8]) -> Option<Self> {
        if payload.starts_with(b"%PDF") {
            Some(UploadFormat::Pdf)
        } else if payload.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(UploadFormat::Png)
        } else if payload.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(UploadFormat::Jpeg)
        } else {
            None
        }
    }

    /// Whether the payload is a raster image (subject to the dimension check).
    pub fn is_image(&self) -> bool {
        !matches!(self, UploadFormat::Pdf)
    }
}
