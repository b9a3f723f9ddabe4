//! Core data types for the Vitrine image store.
//!
//! This crate holds the vocabulary shared by the storage engine and its
//! collaborators: the committed [`ImageRecord`], the accepted [`UploadFormat`]s,
//! the read-only [`StatusSnapshot`] and the [`StoreConfig`] a store is opened with.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod format;
mod record;
mod status;

pub use config::{DuplicatePolicy, StoreConfig};
pub use format::UploadFormat;
pub use record::{
    ImageRecord, ImageRecordBuilder, SourceKind, record_file_name, sanitize_filename,
    source_file_name,
};
pub use status::StatusSnapshot;
