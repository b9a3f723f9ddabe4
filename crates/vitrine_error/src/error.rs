//! Top-level error wrapper types.

use crate::{BuilderError, ConfigError, StoreError, StoreErrorKind};

/// Every error the Vitrine crates can surface.
///
/// # Examples
///
/// ```
/// use vitrine_error::{ConfigError, VitrineError};
///
/// let err: VitrineError = ConfigError::new("bad quality").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VitrineErrorKind {
    /// Image store error
    #[from(StoreError)]
    Store(StoreError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
}

/// Vitrine error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vitrine Error: {}", _0)]
pub struct VitrineError(Box<VitrineErrorKind>);

impl VitrineError {
    /// Create a new error from a kind.
    pub fn new(kind: VitrineErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VitrineErrorKind {
        &self.0
    }

    /// The store error kind, if this is a store error.
    pub fn store_kind(&self) -> Option<&StoreErrorKind> {
        match self.kind() {
            VitrineErrorKind::Store(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// The configuration error, if this is one.
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self.kind() {
            VitrineErrorKind::Config(e) => Some(e),
            _ => None,
        }
    }

    /// True when the requested record or file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.store_kind(), Some(StoreErrorKind::NotFound(_)))
    }
}

// Generic From implementation for any type that converts to VitrineErrorKind
impl<T> From<T> for VitrineError
where
    T: Into<VitrineErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vitrine operations.
pub type VitrineResult<T> = std::result::Result<T, VitrineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_exposes_inner_kind() {
        let err: VitrineError = StoreError::new(StoreErrorKind::StorageFull { max_images: 3 }).into();
        assert_eq!(
            err.store_kind(),
            Some(&StoreErrorKind::StorageFull { max_images: 3 })
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn config_error_has_no_store_kind() {
        let err: VitrineError = ConfigError::new("nope").into();
        assert!(err.store_kind().is_none());
        assert!(err.config_error().is_some_and(|e| e.field.is_none()));
    }

    #[test]
    fn invalid_setting_names_field() {
        let err: VitrineError = ConfigError::invalid("jpeg_quality", "got 0").into();
        let config = err.config_error().unwrap();
        assert_eq!(config.field, Some("jpeg_quality"));
        assert_eq!(config.message, "jpeg_quality: got 0");
        assert!(config.file.ends_with("error.rs"));
    }

    #[test]
    fn store_error_records_location() {
        let err = StoreError::new(StoreErrorKind::NotFound("sequence 9".into()));
        assert!(err.file.ends_with("error.rs"));
        assert!(err.line > 0);
    }
}
