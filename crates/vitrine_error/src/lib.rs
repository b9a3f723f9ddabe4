//! Error types for the Vitrine image store.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};
//!
//! fn lookup(sequence: u64) -> VitrineResult<()> {
//!     Err(StoreError::new(StoreErrorKind::NotFound(format!("sequence {}", sequence))))?
//! }
//!
//! let err = lookup(7).unwrap_err();
//! assert!(err.is_not_found());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod store;

pub use builder::{BuilderError, BuilderErrorKind};
pub use config::ConfigError;
pub use error::{VitrineError, VitrineErrorKind, VitrineResult};
pub use store::{StoreError, StoreErrorKind};
