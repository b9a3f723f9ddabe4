//! Durable store state, persisted as one atomically replaced JSON document.
//!
//! Every mutation serializes the full state and swaps the document in with
//! [`FileStore::write`], so the file on disk is always one of the states the
//! store has actually been in.

use crate::FileStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument};
use vitrine_core::{DuplicatePolicy, ImageRecord, StatusSnapshot};
use vitrine_error::{StoreError, StoreErrorKind, VitrineResult};

/// Name of the metadata document under the storage root.
pub const METADATA_FILE: &str = "metadata.json";

const DOCUMENT_VERSION: u32 = 1;

/// In-memory state of one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageState {
    records: BTreeMap<u64, ImageRecord>,
    next_sequence: u64,
    max_images: u32,
    duplicate_policy: DuplicatePolicy,
}

impl StorageState {
    /// A fresh store: no records, sequences start at 1.
    pub fn empty(max_images: u32, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            records: BTreeMap::new(),
            next_sequence: 1,
            max_images,
            duplicate_policy,
        }
    }

    /// Records in ascending sequence order.
    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.values()
    }

    /// Look up a record.
    pub fn get(&self, sequence: u64) -> Option<&ImageRecord> {
        self.records.get(&sequence)
    }

    /// First record holding the given content.
    pub fn find_by_hash(&self, content_hash: &str) -> Option<&ImageRecord> {
        self.records
            .values()
            .find(|r| r.content_hash() == content_hash)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when no further record can be admitted.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.max_images as usize
    }

    /// Sequence the next admitted record receives.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Capacity ceiling.
    pub fn max_images(&self) -> u32 {
        self.max_images
    }

    /// Duplicate handling the records were admitted under.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Occupancy summary.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::new(self.records.len(), self.max_images, self.next_sequence)
    }

    /// Every file name the records own.
    pub fn referenced_files(&self) -> HashSet<&str> {
        self.records.values().flat_map(|r| r.owned_files()).collect()
    }

    pub(crate) fn insert(&mut self, record: ImageRecord) {
        let sequence = *record.sequence();
        self.next_sequence = self.next_sequence.max(sequence + 1);
        self.records.insert(sequence, record);
    }

    pub(crate) fn remove(&mut self, sequence: u64) -> Option<ImageRecord> {
        self.records.remove(&sequence)
    }

    pub(crate) fn remove_oldest(&mut self) -> Option<ImageRecord> {
        self.records.pop_first().map(|(_, record)| record)
    }

    pub(crate) fn clear(&mut self) -> Vec<ImageRecord> {
        std::mem::take(&mut self.records).into_values().collect()
    }

    pub(crate) fn set_max_images(&mut self, max_images: u32) {
        self.max_images = max_images;
    }

    pub(crate) fn set_duplicate_policy(&mut self, duplicate_policy: DuplicatePolicy) {
        self.duplicate_policy = duplicate_policy;
    }
}

/// On-disk shape of the state.
#[derive(Debug, Serialize, Deserialize)]
struct MetadataDocument {
    #[serde(default = "default_version")]
    version: u32,
    next_sequence: u64,
    max_images: u32,
    /// Documents written before the policy was recorded were all `reject`.
    #[serde(default)]
    duplicate_policy: DuplicatePolicy,
    records: Vec<ImageRecord>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

fn corrupt(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorKind::MetadataCorrupt(message.into()))
}

/// A bare file name directly under the root, other than the document itself.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != METADATA_FILE
        && !name.contains(['/', '\\', '\0'])
}

impl From<&StorageState> for MetadataDocument {
    fn from(state: &StorageState) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            next_sequence: state.next_sequence,
            max_images: state.max_images,
            duplicate_policy: state.duplicate_policy,
            records: state.records.values().cloned().collect(),
        }
    }
}

impl TryFrom<MetadataDocument> for StorageState {
    type Error = StoreError;

    fn try_from(doc: MetadataDocument) -> Result<Self, Self::Error> {
        if doc.version != DOCUMENT_VERSION {
            return Err(corrupt(format!(
                "unsupported document version {}",
                doc.version
            )));
        }
        if doc.next_sequence == 0 {
            return Err(corrupt("next_sequence must be positive"));
        }

        let mut records = BTreeMap::new();
        let mut files = HashSet::new();
        for record in doc.records {
            let sequence = *record.sequence();
            if sequence == 0 || sequence >= doc.next_sequence {
                return Err(corrupt(format!(
                    "record sequence {} outside 1..{}",
                    sequence, doc.next_sequence
                )));
            }
            for file in record.owned_files() {
                if !is_plain_name(file) {
                    return Err(corrupt(format!(
                        "record {} names invalid file {:?}",
                        sequence, file
                    )));
                }
                if !files.insert(file.to_string()) {
                    return Err(corrupt(format!("file {} referenced twice", file)));
                }
            }
            if records.insert(sequence, record).is_some() {
                return Err(corrupt(format!("duplicate sequence {}", sequence)));
            }
        }

        Ok(Self {
            records,
            next_sequence: doc.next_sequence,
            max_images: doc.max_images,
            duplicate_policy: doc.duplicate_policy,
        })
    }
}

/// Loads and commits [`StorageState`] documents.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    files: FileStore,
}

impl MetadataStore {
    /// Persist state through the given file store.
    pub fn new(files: FileStore) -> Self {
        Self { files }
    }

    /// Read the persisted state.
    ///
    /// An absent document yields an empty state with the given ceiling and policy.
    ///
    /// # Errors
    ///
    /// Returns `MetadataCorrupt` if the document exists but cannot be parsed or
    /// violates the record invariants; nothing is discarded silently.
    #[instrument(skip(self))]
    pub async fn load(
        &self,
        max_images: u32,
        duplicate_policy: DuplicatePolicy,
    ) -> VitrineResult<StorageState> {
        let bytes = match self.files.read(METADATA_FILE).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                debug!("No metadata document; starting empty");
                return Ok(StorageState::empty(max_images, duplicate_policy));
            }
            Err(e) => return Err(e),
        };

        let doc: MetadataDocument = serde_json::from_slice(&bytes)
            .map_err(|e| corrupt(format!("{}: {}", METADATA_FILE, e)))?;
        let state = StorageState::try_from(doc)?;

        debug!(
            records = state.len(),
            next_sequence = state.next_sequence(),
            "Loaded metadata"
        );
        Ok(state)
    }

    /// Atomically replace the persisted document with `state`.
    #[instrument(skip(self, state), fields(records = state.len(), next_sequence = state.next_sequence()))]
    pub async fn commit(&self, state: &StorageState) -> VitrineResult<()> {
        let doc = MetadataDocument::from(state);
        let bytes = serde_json::to_vec_pretty(&doc).map_err(|e| {
            StoreError::new(StoreErrorKind::Io(format!("serialize metadata: {}", e)))
        })?;

        self.files.write(METADATA_FILE, &bytes).await?;
        debug!("Committed metadata");
        Ok(())
    }
}
