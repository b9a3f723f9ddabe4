//! Vitrine - a bounded on-disk image store.
//!
//! Vitrine keeps a fixed-capacity collection of images at one target
//! resolution in a plain directory. Every upload is validated, normalized to
//! a canonical JPEG, digested, and admitted under the capacity ceiling with a
//! stable, never reused sequence number. A single JSON document tracks the
//! records and is replaced atomically on every change, and any leftovers of
//! an interrupted write are removed the next time the store is opened.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vitrine::{ImageStore, StoreConfig, VitrineResult};
//!
//! #[tokio::main]
//! async fn main() -> VitrineResult<()> {
//!     let store = ImageStore::open(StoreConfig::load()?).await?;
//!
//!     let payload = std::fs::read("poster.png").expect("read poster");
//!     let record = store.upload(payload, Some("image/png"), Some("poster.png")).await?;
//!     println!("stored as #{}", record.sequence());
//!
//!     for record in store.list() {
//!         println!("{} {}", record.sequence(), record.filename());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `vitrine_error` - Error types
//! - `vitrine_core` - Records, formats, status and configuration
//! - `vitrine_storage` - Validation, conversion, files, metadata and the store itself
//!
//! This crate re-exports everything for convenience and ships the `vitrine` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod observability;

pub use observability::{LoggingConfig, init_logging};

pub use vitrine_error::{
    BuilderError, BuilderErrorKind, ConfigError, StoreError, StoreErrorKind, VitrineError,
    VitrineErrorKind, VitrineResult,
};

pub use vitrine_core::{
    DuplicatePolicy, ImageRecord, ImageRecordBuilder, SourceKind, StatusSnapshot, StoreConfig,
    UploadFormat, record_file_name, sanitize_filename, source_file_name,
};

pub use vitrine_storage::{
    ContentHash, ContentHasher, Converter, FileStore, ImageStore, METADATA_FILE, MetadataStore,
    PageRenderer, ReconcileReport, StorageState, UnavailableRenderer, ValidationResult, Validator,
};

#[cfg(feature = "pdf")]
pub use vitrine_storage::HayroRenderer;
