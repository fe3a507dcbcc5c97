//! Deterministic masternode list snapshots.
//!
//! The canonical list is derived from chain state by an external manager.
//! Governance obtains an immutable snapshot per operation and must never
//! cache one across block-tip advances.

use orin_types::{Hash256, OutPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One registered masternode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasternodeEntry {
    /// Collateral outpoint, the masternode's identity in governance.
    pub collateral: OutPoint,
    /// Ed25519 key authorized to sign governance votes.
    pub voting_key: [u8; 32],
    /// Ed25519 operator key; also accepted for non-funding vote signals.
    pub operator_key: [u8; 32],
    /// Voting weight (regular masternodes 1, high-performance nodes more).
    pub weight: u32,
    /// Whether the masternode is currently enabled (not PoSe-banned).
    pub valid: bool,
}

/// Snapshot of the deterministic masternode list at some height.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasternodeList {
    pub block_hash: Hash256,
    pub height: u32,
    entries: BTreeMap<OutPoint, MasternodeEntry>,
}

impl MasternodeList {
    pub fn new(block_hash: Hash256, height: u32) -> Self {
        Self {
            block_hash,
            height,
            entries: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, entry: MasternodeEntry) {
        self.entries.insert(entry.collateral, entry);
    }

    pub fn remove(&mut self, collateral: &OutPoint) {
        self.entries.remove(collateral);
    }

    pub fn get_by_collateral(&self, collateral: &OutPoint) -> Option<&MasternodeEntry> {
        self.entries.get(collateral)
    }

    pub fn has_collateral(&self, collateral: &OutPoint) -> bool {
        self.entries.contains_key(collateral)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MasternodeEntry> {
        self.entries.values()
    }

    /// Number of enabled masternodes.
    pub fn valid_count(&self) -> usize {
        self.entries.values().filter(|e| e.valid).count()
    }

    /// Sum of voting weights over enabled masternodes.
    pub fn valid_weighted_count(&self) -> u64 {
        self.entries
            .values()
            .filter(|e| e.valid)
            .map(|e| e.weight as u64)
            .sum()
    }

    /// Diff this snapshot against a newer one.
    ///
    /// Reports masternodes that were removed and masternodes whose voting or
    /// operator key changed; both invalidate previously cast votes.
    pub fn build_diff(&self, newer: &MasternodeList) -> MasternodeListDiff {
        let mut diff = MasternodeListDiff::default();
        for (collateral, old) in &self.entries {
            match newer.entries.get(collateral) {
                None => diff.removed.push(*collateral),
                Some(new) => {
                    if new.voting_key != old.voting_key || new.operator_key != old.operator_key {
                        diff.changed_keys.push(*collateral);
                    }
                }
            }
        }
        diff
    }
}

/// Key-relevant changes between two list snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MasternodeListDiff {
    pub removed: Vec<OutPoint>,
    pub changed_keys: Vec<OutPoint>,
}

impl MasternodeListDiff {
    /// Collaterals whose votes must be purged.
    pub fn vote_invalidating(&self) -> impl Iterator<Item = &OutPoint> {
        self.removed.iter().chain(self.changed_keys.iter())
    }
}

/// Source of masternode list snapshots (the external deterministic manager).
pub trait MasternodeListProvider: Send + Sync {
    /// The list at the current chain tip. Fetched fresh per operation.
    fn list_at_tip(&self) -> MasternodeList;
}
