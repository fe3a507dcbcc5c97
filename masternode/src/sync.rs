//! Masternode sync state tracker.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Tracks how far this node has progressed through initial sync.
///
/// Governance ignores peer traffic until the blockchain is synced and does
/// not serve or relay data until the full masternode sync has finished.
#[derive(Default)]
pub struct MasternodeSync {
    blockchain_synced: AtomicBool,
    synced: AtomicBool,
    last_bump: AtomicI64,
}

impl MasternodeSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blockchain_synced(&self) -> bool {
        self.blockchain_synced.load(Ordering::Acquire)
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    pub fn set_blockchain_synced(&self, synced: bool) {
        self.blockchain_synced.store(synced, Ordering::Release);
    }

    pub fn set_synced(&self, synced: bool) {
        if synced {
            self.blockchain_synced.store(true, Ordering::Release);
        }
        self.synced.store(synced, Ordering::Release);
    }

    /// Record that sync-relevant data arrived, pushing back the timeout the
    /// sync state machine uses to decide an asset has finished.
    pub fn bump_asset_last_time(&self, now_secs: i64) {
        self.last_bump.store(now_secs, Ordering::Release);
    }

    pub fn last_bump(&self) -> i64 {
        self.last_bump.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synced_implies_blockchain_synced() {
        let sync = MasternodeSync::new();
        assert!(!sync.is_blockchain_synced());
        sync.set_synced(true);
        assert!(sync.is_blockchain_synced());
        assert!(sync.is_synced());
    }
}
