//! Startup repair of the storage root against the committed metadata.
//!
//! A crash can leave files that were written but never committed, or a
//! half-written temp file. Committed records always win: anything under the
//! root that no record references is removed, records whose image file has
//! gone missing are dropped, and a missing source document is detached from
//! its record.

use crate::{FileStore, METADATA_FILE, MetadataStore, StorageState};
use tracing::{info, instrument, warn};
use vitrine_core::StoreConfig;
use vitrine_error::{ConfigError, VitrineResult};

/// What reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_getters::Getters)]
pub struct ReconcileReport {
    /// Unreferenced files deleted from the root
    removed_files: Vec<String>,
    /// Sequences of oldest records dropped to fit a lowered capacity
    pruned_records: Vec<u64>,
    /// Sequences of records whose image file was missing
    dangling_records: Vec<u64>,
    /// Sequences of records whose source document was missing
    missing_sources: Vec<u64>,
}

impl ReconcileReport {
    /// True when the root already matched the metadata.
    pub fn is_clean(&self) -> bool {
        self.removed_files.is_empty()
            && self.pruned_records.is_empty()
            && self.dangling_records.is_empty()
            && self.missing_sources.is_empty()
    }
}

/// Bring `state` and the root directory into agreement.
///
/// Metadata changes are committed before any file is removed, so a crash
/// part way through leaves only more orphans for the next run.
///
/// # Errors
///
/// Returns `ConfigError` without touching the root when a store holding
/// records was created under a different duplicate policy.
#[instrument(skip(files, metadata, state, config), fields(records = state.len()))]
pub async fn reconcile(
    files: &FileStore,
    metadata: &MetadataStore,
    state: &mut StorageState,
    config: &StoreConfig,
) -> VitrineResult<ReconcileReport> {
    let max_images = *config.max_images();
    let policy = *config.duplicate_policy();
    let policy_changed = state.duplicate_policy() != policy;
    if policy_changed {
        if !state.is_empty() {
            return Err(ConfigError::invalid(
                "duplicate_policy",
                format!(
                    "store holds images admitted under {}, configured {}",
                    state.duplicate_policy(),
                    policy
                ),
            )
            .into());
        }
        info!(
            from = %state.duplicate_policy(),
            to = %policy,
            "Empty store adopts duplicate policy"
        );
        state.set_duplicate_policy(policy);
    }

    let mut report = ReconcileReport::default();
    let mut changed = policy_changed || state.max_images() != max_images;
    state.set_max_images(max_images);

    let present = files.list().await?;
    let dangling: Vec<u64> = state
        .records()
        .filter(|r| !present.iter().any(|name| name == r.file_path()))
        .map(|r| *r.sequence())
        .collect();
    for sequence in dangling {
        warn!(sequence, "Image file missing; dropping record");
        state.remove(sequence);
        report.dangling_records.push(sequence);
        changed = true;
    }

    let sourceless: Vec<u64> = state
        .records()
        .filter(|r| {
            r.source_path()
                .as_deref()
                .is_some_and(|source| !present.iter().any(|name| name == source))
        })
        .map(|r| *r.sequence())
        .collect();
    for sequence in sourceless {
        warn!(sequence, "Source document missing; detaching it from record");
        if let Some(record) = state.remove(sequence) {
            state.insert(record.without_source_path());
        }
        report.missing_sources.push(sequence);
        changed = true;
    }

    while state.len() > max_images as usize {
        let Some(record) = state.remove_oldest() else {
            break;
        };
        warn!(
            sequence = record.sequence(),
            max_images, "Over capacity; pruning oldest record"
        );
        report.pruned_records.push(*record.sequence());
        changed = true;
    }

    if changed {
        metadata.commit(state).await?;
    }

    let referenced = state.referenced_files();
    for name in present {
        if name == METADATA_FILE || referenced.contains(name.as_str()) {
            continue;
        }
        match files.delete(&name).await {
            Ok(()) => report.removed_files.push(name),
            Err(e) => warn!(file = %name, error = %e, "Failed to remove unreferenced file"),
        }
    }

    if !report.is_clean() {
        info!(
            removed = report.removed_files.len(),
            pruned = report.pruned_records.len(),
            dangling = report.dangling_records.len(),
            missing_sources = report.missing_sources.len(),
            "Reconciled storage root"
        );
    }
    Ok(report)
}
