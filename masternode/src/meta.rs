//! Masternode metadata bookkeeping consumed by governance maintenance.

use orin_types::Hash256;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Tracks which governance objects each masternode subsystem component has
/// flagged dirty (votes needing a re-count) and which objects still exist.
#[derive(Default)]
pub struct MasternodeMetaStore {
    dirty_governance_hashes: Mutex<BTreeSet<Hash256>>,
}

impl MasternodeMetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag an object so the next maintenance pass re-validates its votes.
    pub fn mark_governance_object_dirty(&self, hash: Hash256) {
        self.dirty_governance_hashes
            .lock()
            .expect("meta lock poisoned")
            .insert(hash);
    }

    /// Drain the dirty set.
    pub fn get_and_clear_dirty_governance_hashes(&self) -> Vec<Hash256> {
        let mut set = self
            .dirty_governance_hashes
            .lock()
            .expect("meta lock poisoned");
        let drained: Vec<Hash256> = set.iter().copied().collect();
        set.clear();
        drained
    }

    /// Forget about an object that governance has erased.
    pub fn remove_governance_object(&self, hash: &Hash256) {
        self.dirty_governance_hashes
            .lock()
            .expect("meta lock poisoned")
            .remove(hash);
    }
}
