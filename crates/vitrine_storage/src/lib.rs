//! Storage engine for the Vitrine image store.
//!
//! [`ImageStore`] is the entry point. It validates uploads with a
//! [`Validator`], normalizes them with a [`Converter`], digests the result
//! with [`ContentHasher`] and admits it under the capacity ceiling. Files are
//! written through a [`FileStore`] before the [`MetadataStore`] commits the
//! new state, and [`reconcile`] repairs the root on every open.
//!
//! # Example
//!
//! ```no_run
//! use vitrine_core::StoreConfig;
//! use vitrine_storage::ImageStore;
//!
//! # async fn example() -> vitrine_error::VitrineResult<()> {
//! let store = ImageStore::open(StoreConfig::default().with_storage_root("/var/lib/vitrine")).await?;
//! let payload = std::fs::read("poster.png").expect("read poster");
//! let record = store.upload(payload, Some("image/png"), Some("poster.png")).await?;
//! let (bytes, _) = store.get(*record.sequence()).await?;
//! assert_eq!(*record.byte_size(), bytes.len() as u64);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod converter;
mod file_store;
mod hasher;
mod metadata;
mod reconcile;
mod render;
mod store;
mod validator;

pub use converter::{Converter, fit_to_canvas, flatten_onto_white};
pub use file_store::{FileStore, TEMP_SUFFIX};
pub use hasher::{ContentHash, ContentHasher};
pub use metadata::{METADATA_FILE, MetadataStore, StorageState};
pub use reconcile::{ReconcileReport, reconcile};
pub use render::{PageRenderer, UnavailableRenderer};
#[cfg(feature = "pdf")]
pub use render::HayroRenderer;
pub use store::ImageStore;
pub use validator::{ValidationResult, Validator};
