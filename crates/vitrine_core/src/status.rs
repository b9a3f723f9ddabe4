//! Read-only store status.

use serde::{Deserialize, Serialize};

/// Point-in-time view of store occupancy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct StatusSnapshot {
    /// Records currently stored
    count: usize,
    /// Configured capacity ceiling
    max_images: u32,
    /// Whether uploads are currently refused for lack of capacity
    is_full: bool,
    /// Sequence the next admitted upload will receive
    next_sequence: u64,
}

impl StatusSnapshot {
    /// Build a snapshot; `is_full` is derived from the counts.
    pub fn new(count: usize, max_images: u32, next_sequence: u64) -> Self {
        Self {
            count,
            max_images,
            is_full: count >= max_images as usize,
            next_sequence,
        }
    }

    /// Free slots left before uploads are refused.
    pub fn remaining(&self) -> usize {
        (self.max_images as usize).saturating_sub(self.count)
    }
}
