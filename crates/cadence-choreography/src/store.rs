//! Sequence store
//!
//! Accepted sequences keyed by name. Re-uploading a name replaces the previous
//! sequence wholesale. Sessions hold an `Arc` to the entry they resolved at
//! start time, so replacing or deleting a sequence never disturbs playback
//! already in progress.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cadence_core::ChoreographySequence;
use parking_lot::RwLock;
use tracing::debug;

/// One accepted sequence and the corrections applied when it was accepted
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSequence {
    /// Sequence as accepted, after any non-strict corrections
    pub sequence: ChoreographySequence,
    /// Corrections made while accepting it
    pub warnings: Vec<String>,
    /// Store-wide upload counter at insertion time
    pub revision: u64,
}

/// Explicit, per-instance store of accepted sequences
#[derive(Debug, Default)]
pub struct SequenceStore {
    sequences: RwLock<BTreeMap<String, Arc<StoredSequence>>>,
    revisions: AtomicU64,
}

impl SequenceStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `sequence` under its name, returning the entry it replaced
    pub fn insert(
        &self,
        sequence: ChoreographySequence,
        warnings: Vec<String>,
    ) -> Option<Arc<StoredSequence>> {
        let revision = self.revisions.fetch_add(1, Ordering::Relaxed) + 1;
        let name = sequence.name.clone();
        let entry = Arc::new(StoredSequence {
            sequence,
            warnings,
            revision,
        });
        let previous = self.sequences.write().insert(name.clone(), entry);
        debug!(sequence = %name, revision, replaced = previous.is_some(), "sequence stored");
        previous
    }

    /// Entry stored under `name`
    pub fn get(&self, name: &str) -> Option<Arc<StoredSequence>> {
        self.sequences.read().get(name).cloned()
    }

    /// Delete `name`; sessions already playing it keep their copy
    pub fn remove(&self, name: &str) -> Option<Arc<StoredSequence>> {
        self.sequences.write().remove(name)
    }

    /// Stored names in lexical order
    pub fn names(&self) -> Vec<String> {
        self.sequences.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sequences.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.read().is_empty()
    }
}
