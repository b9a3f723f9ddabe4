//! Committed image records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vitrine_error::{BuilderError, BuilderErrorKind};

/// How a stored image entered the store.
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
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Uploaded as a JPEG or PNG image
    #[display("direct_image")]
    DirectImage,
    /// Rendered from the first page of a PDF
    #[display("pdf_derived")]
    PdfDerived,
}

/// Metadata for one stored image. Never mutated once committed.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use vitrine_core::{ImageRecord, SourceKind};
///
/// let record = ImageRecord::builder()
///     .sequence(1u64)
///     .filename("front_door.png")
///     .content_hash("ab".repeat(32))
///     .width(3840u32)
///     .height(2160u32)
///     .source_kind(SourceKind::DirectImage)
///     .file_path("img_000001_abababababababab.jpg")
///     .created_at(Utc::now())
///     .byte_size(1024u64)
///     .build()
///     .unwrap();
/// assert_eq!(*record.sequence(), 1);
/// assert!(record.source_path().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct ImageRecord {
    /// Unique, never reused identifier
    sequence: u64,
    /// Sanitized display name
    filename: String,
    /// Hex SHA-256 of the canonical bytes
    content_hash: String,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Origin of the image
    source_kind: SourceKind,
    /// Canonical image file, relative to the storage root
    file_path: String,
    /// Retained source document, relative to the storage root
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_path: Option<String>,
    /// Admission time
    created_at: DateTime<Utc>,
    /// Size of the canonical file in bytes
    byte_size: u64,
}

impl ImageRecord {
    /// Creates a new record builder.
    pub fn builder() -> ImageRecordBuilder {
        ImageRecordBuilder::default()
    }

    /// Every file under the storage root this record owns.
    pub fn owned_files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.file_path.as_str()).chain(self.source_path.as_deref())
    }

    /// The same record with its source document detached.
    pub fn without_source_path(mut self) -> Self {
        self.source_path = None;
        self
    }
}

impl From<ImageRecordBuilderError> for BuilderError {
    #[track_caller]
    fn from(err: ImageRecordBuilderError) -> Self {
        match err {
            ImageRecordBuilderError::UninitializedField(field) => {
                BuilderError::new(BuilderErrorKind::MissingField(field.to_string()))
            }
            ImageRecordBuilderError::ValidationError(msg) => {
                BuilderError::new(BuilderErrorKind::ValidationFailed(msg))
            }
        }
    }
}

const MAX_FILENAME_CHARS: usize = 100;
const HASH_PREFIX_LEN: usize = 16;

/// Reduce a user-supplied name to a safe display name.
///
/// Only the final path component survives; characters outside
/// `[A-Za-z0-9._-]` become `_`; leading dots are dropped. Falls back to
/// `image_<sequence>` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use vitrine_core::sanitize_filename;
///
/// assert_eq!(sanitize_filename(Some("../../etc/pass wd"), 3), "pass_wd");
/// assert_eq!(sanitize_filename(None, 3), "image_3");
/// ```
pub fn sanitize_filename(suggested: Option<&str>, sequence: u64) -> String {
    let base = suggested
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        format!("image_{}", sequence)
    } else {
        cleaned
    }
}

fn stem(sequence: u64, content_hash: &str) -> String {
    let prefix: String = content_hash.chars().take(HASH_PREFIX_LEN).collect();
    format!("img_{:06}_{}", sequence, prefix)
}

/// Deterministic canonical file name for `(sequence, content_hash)`.
pub fn record_file_name(sequence: u64, content_hash: &str) -> String {
    format!("{}.jpg", stem(sequence, content_hash))
}

/// Deterministic file name for a retained source PDF.
pub fn source_file_name(sequence: u64, content_hash: &str) -> String {
    format!("{}.pdf", stem(sequence, content_hash))
}
