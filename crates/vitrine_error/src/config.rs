//! Configuration error types.

/// A setting that cannot be used to open a store.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Setting at fault, if a single one is
    pub field: Option<&'static str>,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a ConfigError not tied to one setting, such as an unreadable file.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::at(None, message.into())
    }

    /// Reject the value of one setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use vitrine_error::ConfigError;
    ///
    /// let err = ConfigError::invalid("max_images", "must be between 1 and 100, got 0");
    /// assert_eq!(err.field, Some("max_images"));
    /// assert!(err.message.starts_with("max_images: must be"));
    /// ```
    #[track_caller]
    pub fn invalid(field: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::at(Some(field), format!("{}: {}", field, reason))
    }

    #[track_caller]
    fn at(field: Option<&'static str>, message: String) -> Self {
        let location = std::panic::Location::caller();
        Self {
            field,
            message,
            line: location.line(),
            file: location.file(),
        }
    }
}
