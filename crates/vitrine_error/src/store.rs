//! Image store error types.

/// Kinds of image store errors.
///
/// Validation and conversion kinds are terminal for a single operation and
/// leave the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoreErrorKind {
    /// Declared or sniffed content type is not accepted
    #[display("Unsupported format: {}", _0)]
    UnsupportedFormat(String),
    /// Image dimensions differ from the configured target resolution
    #[display(
        "Invalid dimensions: expected {}x{}, got {}x{}",
        expected_width,
        expected_height,
        width,
        height
    )]
    InvalidDimensions {
        /// Required width in pixels
        expected_width: u32,
        /// Required height in pixels
        expected_height: u32,
        /// Width found in the payload
        width: u32,
        /// Height found in the payload
        height: u32,
    },
    /// Payload exceeds the configured byte ceiling
    #[display("Payload too large: {} bytes (max: {})", size, limit)]
    PayloadTooLarge {
        /// Payload size in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },
    /// Input could not be turned into canonical bytes
    #[display("Conversion failed: {}", _0)]
    ConversionFailed(String),
    /// Identical canonical content is already stored
    #[display("Duplicate content {} (already stored as sequence {})", content_hash, existing_sequence)]
    DuplicateContent {
        /// Digest of the rejected content
        content_hash: String,
        /// Sequence of the record holding the same content
        existing_sequence: u64,
    },
    /// Store holds `max_images` records
    #[display("Storage full: {} images stored", max_images)]
    StorageFull {
        /// Configured capacity ceiling
        max_images: u32,
    },
    /// Record or file is absent
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Persisted metadata document cannot be trusted
    #[display("Metadata corrupt: {}", _0)]
    MetadataCorrupt(String),
    /// Underlying filesystem failure
    #[display("I/O failure: {}", _0)]
    Io(String),
}

/// Image store error with location tracking.
///
/// # Examples
///
/// ```
/// use vitrine_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::StorageFull { max_images: 2 });
/// assert!(format!("{}", err).contains("Storage full"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The kind of error that occurred
    pub kind: StoreErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Wrap an I/O error, naming the operation and path involved.
    #[track_caller]
    pub fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::new(StoreErrorKind::Io(format!("{}: {}", context, err)))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoreErrorKind {
        &self.kind
    }
}
