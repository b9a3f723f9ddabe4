//! The image store: sole writer of the storage root.

use crate::{
    ContentHasher, Converter, FileStore, MetadataStore, PageRenderer, ReconcileReport,
    StorageState, UnavailableRenderer, Validator, reconcile,
};
use chrono::Utc;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};
use vitrine_core::{
    DuplicatePolicy, ImageRecord, SourceKind, StatusSnapshot, StoreConfig, UploadFormat,
    record_file_name, sanitize_filename, source_file_name,
};
use vitrine_error::{BuilderError, StoreError, StoreErrorKind, VitrineResult};

/// Bounded, crash-safe collection of canonical images.
///
/// Mutations (`upload`, `delete`, `clear_all`) run one at a time behind a
/// store-wide lock held for the whole operation. Reads use the last committed
/// snapshot and never wait for a mutation.
///
/// Once an upload or delete has started touching the disk it runs on its own
/// task, so dropping the caller's future cannot leave it half done.
///
/// Cloning is cheap and every clone shares one store. At most one store may
/// be open on a given root.
#[derive(Debug, Clone)]
pub struct ImageStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    config: StoreConfig,
    validator: Validator,
    converter: Converter,
    files: FileStore,
    metadata: MetadataStore,
    mutations: Arc<Mutex<()>>,
    snapshot: RwLock<Arc<StorageState>>,
    report: ReconcileReport,
}

/// Canonical bytes that passed every admission check.
struct Admission {
    filename: Option<String>,
    source_kind: SourceKind,
    canonical: Vec<u8>,
    content_hash: String,
    source: Option<Vec<u8>>,
    dimensions: (u32, u32),
}

fn join_failed(err: tokio::task::JoinError) -> StoreError {
    StoreError::new(StoreErrorKind::Io(format!("store task failed: {}", err)))
}

impl ImageStore {
    /// Open the store without PDF support.
    ///
    /// PDF uploads fail with `ConversionFailed` until a renderer is supplied
    /// through [`ImageStore::with_renderer`].
    pub async fn open(config: StoreConfig) -> VitrineResult<Self> {
        Self::with_renderer(config, Arc::new(UnavailableRenderer)).await
    }

    /// Open the store, loading metadata and reconciling the storage root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for out-of-range settings or for a duplicate
    /// policy other than the one a non-empty store was created with.
    /// `MetadataCorrupt` if the persisted document cannot be trusted, and `Io`
    /// if the root is unusable.
    #[instrument(skip(config, renderer), fields(root = %config.storage_root().display()))]
    pub async fn with_renderer(
        config: StoreConfig,
        renderer: Arc<dyn PageRenderer>,
    ) -> VitrineResult<Self> {
        config.validate()?;

        let files = FileStore::new(config.storage_root()).await?;
        let metadata = MetadataStore::new(files.clone());
        let mut state = metadata
            .load(*config.max_images(), *config.duplicate_policy())
            .await?;
        let report = reconcile(&files, &metadata, &mut state, &config).await?;

        info!(
            records = state.len(),
            next_sequence = state.next_sequence(),
            max_images = config.max_images(),
            "Opened image store"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                validator: Validator::from_config(&config),
                converter: Converter::new(&config, renderer),
                files,
                metadata,
                mutations: Arc::new(Mutex::new(())),
                snapshot: RwLock::new(Arc::new(state)),
                report,
                config,
            }),
        })
    }

    /// Validate, convert and admit one upload.
    ///
    /// # Errors
    ///
    /// Validation and conversion failures, `DuplicateContent` under the reject
    /// policy, `StorageFull` at capacity, or `Io` if the write or commit fails.
    /// On every error the committed state is unchanged.
    #[instrument(skip(self, payload), fields(size = payload.len()))]
    pub async fn upload(
        &self,
        payload: Vec<u8>,
        declared_mime: Option<&str>,
        suggested_filename: Option<&str>,
    ) -> VitrineResult<ImageRecord> {
        let guard = self.inner.mutations.clone().lock_owned().await;

        let validation = self.inner.validator.validate(&payload, declared_mime)?;
        let format = *validation.format();

        let converter = self.inner.converter.clone();
        let (payload, canonical) = tokio::task::spawn_blocking(move || {
            converter
                .convert(&payload, format)
                .map(|canonical| (payload, canonical))
        })
        .await
        .map_err(join_failed)??;

        let content_hash = String::from(ContentHasher::hash(&canonical));
        let current = self.inner.current();

        if current.duplicate_policy() == DuplicatePolicy::Reject {
            if let Some(existing) = current.find_by_hash(&content_hash) {
                return Err(StoreError::new(StoreErrorKind::DuplicateContent {
                    content_hash,
                    existing_sequence: *existing.sequence(),
                })
                .into());
            }
        }

        if current.is_full() {
            return Err(StoreError::new(StoreErrorKind::StorageFull {
                max_images: current.max_images(),
            })
            .into());
        }

        let keep_source = format == UploadFormat::Pdf && *self.inner.config.keep_source_pdf();
        let admission = Admission {
            filename: suggested_filename.map(str::to_string),
            source_kind: validation.source_kind(),
            dimensions: (
                *self.inner.config.target_width(),
                *self.inner.config.target_height(),
            ),
            content_hash,
            source: keep_source.then_some(payload),
            canonical,
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.admit(guard, admission).await })
            .await
            .map_err(join_failed)?
    }

    /// Remove one record and its files.
    ///
    /// The record is gone once this returns `Ok`; file removal afterwards is
    /// best effort and leftovers are cleaned up on the next open.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown sequence, `Io` if the commit fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, sequence: u64) -> VitrineResult<()> {
        let guard = self.inner.mutations.clone().lock_owned().await;

        if self.inner.current().get(sequence).is_none() {
            return Err(StoreError::new(StoreErrorKind::NotFound(format!(
                "sequence {}",
                sequence
            )))
            .into());
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.remove(guard, sequence).await })
            .await
            .map_err(join_failed)?
    }

    /// Remove every record in one commit. Returns the number of records removed.
    ///
    /// `next_sequence` is kept, so sequences are never reused.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> VitrineResult<usize> {
        let guard = self.inner.mutations.clone().lock_owned().await;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.clear(guard).await })
            .await
            .map_err(join_failed)?
    }

    /// Canonical bytes and record for one sequence.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such record is committed.
    pub async fn get(&self, sequence: u64) -> VitrineResult<(Vec<u8>, ImageRecord)> {
        let record = self.record(sequence)?;
        let bytes = self.inner.files.read(record.file_path()).await?;
        Ok((bytes, record))
    }

    /// The retained source PDF of a pdf-derived record.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record is absent or kept no source document.
    pub async fn get_source(&self, sequence: u64) -> VitrineResult<(Vec<u8>, ImageRecord)> {
        let record = self.record(sequence)?;
        let Some(source) = record.source_path() else {
            return Err(StoreError::new(StoreErrorKind::NotFound(format!(
                "source document for sequence {}",
                sequence
            )))
            .into());
        };
        let bytes = self.inner.files.read(source).await?;
        Ok((bytes, record))
    }

    /// Committed record for one sequence.
    pub fn record(&self, sequence: u64) -> VitrineResult<ImageRecord> {
        self.inner.current().get(sequence).cloned().ok_or_else(|| {
            StoreError::new(StoreErrorKind::NotFound(format!("sequence {}", sequence))).into()
        })
    }

    /// All committed records in ascending sequence order.
    pub fn list(&self) -> Vec<ImageRecord> {
        self.inner.current().records().cloned().collect()
    }

    /// Current occupancy.
    pub fn status(&self) -> StatusSnapshot {
        self.inner.current().status()
    }

    /// Configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// What reconciliation repaired when the store was opened.
    pub fn recovery_report(&self) -> &ReconcileReport {
        &self.inner.report
    }

    /// Wait for any in-flight mutation to finish, then release this handle.
    pub async fn shutdown(self) {
        let _guard = self.inner.mutations.lock().await;
        debug!("Image store shut down");
    }
}

impl StoreInner {
    fn current(&self) -> Arc<StorageState> {
        let snapshot = self
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&snapshot)
    }

    fn publish(&self, state: StorageState) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *snapshot = Arc::new(state);
    }

    /// Allocate a sequence, write files, commit. Runs to completion on its own task.
    async fn admit(
        &self,
        _guard: OwnedMutexGuard<()>,
        admission: Admission,
    ) -> VitrineResult<ImageRecord> {
        let mut next = (*self.current()).clone();
        let sequence = next.next_sequence();
        let file_path = record_file_name(sequence, &admission.content_hash);
        let source_path = admission
            .source
            .as_ref()
            .map(|_| source_file_name(sequence, &admission.content_hash));

        let record = ImageRecord::builder()
            .sequence(sequence)
            .filename(sanitize_filename(admission.filename.as_deref(), sequence))
            .content_hash(admission.content_hash.clone())
            .width(admission.dimensions.0)
            .height(admission.dimensions.1)
            .source_kind(admission.source_kind)
            .file_path(file_path.clone())
            .source_path(source_path.clone())
            .created_at(Utc::now())
            .byte_size(admission.canonical.len() as u64)
            .build()
            .map_err(BuilderError::from)?;

        self.files.write(&file_path, &admission.canonical).await?;

        if let (Some(name), Some(bytes)) = (&source_path, &admission.source) {
            if let Err(e) = self.files.write(name, bytes).await {
                self.discard_files(&record).await;
                return Err(e);
            }
        }

        next.insert(record.clone());
        if let Err(e) = self.metadata.commit(&next).await {
            warn!(sequence, error = %e, "Metadata commit failed; rolling back files");
            self.discard_files(&record).await;
            return Err(e);
        }
        self.publish(next);

        info!(
            sequence,
            file = %file_path,
            kind = %record.source_kind(),
            bytes = record.byte_size(),
            "Stored image"
        );
        Ok(record)
    }

    /// Commit the removal first; the files go afterwards.
    async fn remove(&self, _guard: OwnedMutexGuard<()>, sequence: u64) -> VitrineResult<()> {
        let mut next = (*self.current()).clone();
        let removed = next.remove(sequence);
        self.metadata.commit(&next).await?;
        self.publish(next);

        if let Some(record) = removed {
            self.discard_files(&record).await;
        }
        info!(sequence, "Deleted image");
        Ok(())
    }

    async fn clear(&self, _guard: OwnedMutexGuard<()>) -> VitrineResult<usize> {
        let mut next = (*self.current()).clone();
        let removed = next.clear();
        self.metadata.commit(&next).await?;
        self.publish(next);

        for record in &removed {
            self.discard_files(record).await;
        }
        info!(count = removed.len(), "Cleared image store");
        Ok(removed.len())
    }

    /// Best-effort removal of a record's files.
    async fn discard_files(&self, record: &ImageRecord) {
        for name in record.owned_files() {
            if let Err(e) = self.files.delete(name).await {
                warn!(file = %name, error = %e, "Failed to remove file");
            }
        }
    }
}
