//! The governance data container.
//!
//! Purely data: every cross-index the manager maintains lives here, and the
//! manager guards the whole store with a single mutex. While that lock is
//! held the indexes are mutually consistent: no dangling vote-to-object
//! entry, no orphan vote whose object is already present.

use std::collections::{BTreeMap, BTreeSet};

use orin_masternode::MasternodeList;
use orin_types::{Hash256, OutPoint};
use serde::{Deserialize, Serialize};

use crate::cache::{BoundedMap, BoundedMultiMap};
use crate::object::{GovernanceObject, ObjectType};
use crate::ratelimit::LastObjectRecord;
use crate::superblock::Superblock;
use crate::vote::GovernanceVote;
use crate::MAX_CACHE_SIZE;

/// A vote waiting for its parent object, with its expiry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrphanVote {
    pub vote: GovernanceVote,
    pub expires_at: i64,
}

/// Object counts by type, for status reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceCounts {
    pub objects_total: usize,
    pub proposals: usize,
    pub triggers: usize,
    pub other: usize,
    pub erased: usize,
    pub votes: usize,
}

pub struct GovernanceStore {
    /// Authoritative object set.
    pub objects: BTreeMap<Hash256, GovernanceObject>,
    /// Objects awaiting fee confirmation.
    pub postponed_objects: BTreeMap<Hash256, GovernanceObject>,
    /// Negative cache of erased object hashes and their retention expiry.
    pub erased_objects: BTreeMap<Hash256, i64>,
    /// Votes that failed permanently, to reject repeats cheaply.
    pub invalid_votes: BoundedMap<Hash256, GovernanceVote>,
    /// Votes whose parent object has not arrived, keyed by parent hash.
    pub orphan_votes: BoundedMultiMap<Hash256, OrphanVote>,
    /// Vote hash to parent object hash lookup index.
    pub vote_to_object: BoundedMap<Hash256, Hash256>,
    /// Per-masternode trigger rate state.
    pub last_masternode_object: BTreeMap<OutPoint, LastObjectRecord>,
    /// Hashes we asked peers for, with the response deadline.
    pub requested_hash_time: BTreeMap<Hash256, i64>,
    /// Trigger hashes scheduled for an extra relay pass.
    pub additional_relay_objects: BTreeSet<Hash256>,
    /// Materialized superblock views, one per live trigger object.
    pub triggers: BTreeMap<Hash256, Superblock>,
    /// Masternode list snapshot from the last invalid-vote purge.
    pub last_mn_list_for_voting_keys: MasternodeList,
    /// Height of the last seen chain tip.
    pub cached_block_height: u32,
}

impl GovernanceStore {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            postponed_objects: BTreeMap::new(),
            erased_objects: BTreeMap::new(),
            invalid_votes: BoundedMap::new(MAX_CACHE_SIZE),
            orphan_votes: BoundedMultiMap::new(MAX_CACHE_SIZE),
            vote_to_object: BoundedMap::new(MAX_CACHE_SIZE),
            last_masternode_object: BTreeMap::new(),
            requested_hash_time: BTreeMap::new(),
            additional_relay_objects: BTreeSet::new(),
            triggers: BTreeMap::new(),
            last_mn_list_for_voting_keys: MasternodeList::default(),
            cached_block_height: 0,
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.postponed_objects.clear();
        self.erased_objects.clear();
        self.invalid_votes.clear();
        self.orphan_votes.clear();
        self.vote_to_object.clear();
        self.last_masternode_object.clear();
        self.requested_hash_time.clear();
        self.additional_relay_objects.clear();
        self.triggers.clear();
    }

    pub fn counts(&self) -> GovernanceCounts {
        let mut counts = GovernanceCounts {
            objects_total: self.objects.len(),
            erased: self.erased_objects.len(),
            votes: self.vote_to_object.len(),
            ..Default::default()
        };
        for object in self.objects.values() {
            match object.object_type {
                ObjectType::Proposal => counts.proposals += 1,
                ObjectType::Trigger => counts.triggers += 1,
                ObjectType::Other => counts.other += 1,
            }
        }
        counts
    }

    pub fn summary(&self) -> String {
        let c = self.counts();
        format!(
            "Governance Objects: {} (Proposals: {}, Triggers: {}, Other: {}; Erased: {}), Votes: {}",
            c.objects_total, c.proposals, c.triggers, c.other, c.erased, c.votes
        )
    }
}

impl Default for GovernanceStore {
    fn default() -> Self {
        Self::new()
    }
}
