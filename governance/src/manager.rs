//! The governance manager: protocol and lifecycle on top of the store.
//!
//! Handles peer messages, rate limits, orphan and postponement logic,
//! the relay queue, vote-request pacing, and superblock election.
//!
//! Locking: one mutex guards the whole [`GovernanceStore`]; public methods
//! acquire it once and delegate to `*_internal` functions that take the
//! locked store. The relay queue has its own mutex and is only touched
//! after the store lock is released.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::SliceRandom;

use orin_masternode::{MasternodeList, MasternodeListProvider, MasternodeMetaStore, MasternodeSync};
use orin_protocol::{
    BloomFilter, FulfilledRequestTracker, GovernanceNet, Inv, InvRelay, InvType,
    MessageProcessingResult, MisbehavingError, PeerId, PeerInfo, MASTERNODE_SYNC_GOVOBJ,
    MASTERNODE_SYNC_GOVOBJ_VOTE, MAX_INV_SZ, MSG_GOVERNANCE_SYNC,
};
use orin_types::{BlockIndexEntry, Hash256, NetworkId, NetworkParams, OutPoint, Timestamp};

use crate::error::{GovernanceError, ObjectValidity};
use crate::object::{GovernanceObject, ObjectType};
use crate::persist::{GovernanceDb, PersistedState};
use crate::ratelimit::LastObjectRecord;
use crate::store::{GovernanceCounts, GovernanceStore, OrphanVote};
use crate::superblock::{GovernancePayment, SeenObjectStatus, Superblock};
use crate::validators::ProposalValidator;
use crate::vote::{GovernanceVote, VoteSignal};
use crate::{
    GOVERNANCE_DELETION_DELAY, GOVERNANCE_ORPHAN_EXPIRATION_TIME, MAX_TIME_FUTURE_DEVIATION,
    RELIABLE_PROPAGATION_TIME,
};

/// False-positive rate of the vote sync bloom filter.
const GOVERNANCE_FILTER_FP_RATE: f64 = 0.001;

/// How long a (hash, peer) vote request stays on the asked-recently list.
const VOTE_REQUEST_TIMEOUT: i64 = 60 * 60;

/// Votes one request is expected to pull in, used for inv budgeting.
const PROJECTED_VOTES_PER_REQUEST: usize = 2000;

/// Peers asked per object hash on real networks. Mockable chains are
/// unlimited so isolated test nodes still get queried.
const REALNET_PEERS_PER_HASH: usize = 3;

/// An inbound governance message, already deserialized from the wire.
#[derive(Clone, Debug)]
pub enum GovernanceMessage {
    /// `govsync`: a zero hash requests the full object list, anything else
    /// requests one object's votes filtered by the bloom filter.
    Sync { prop: Hash256, filter: BloomFilter },
    /// `govobj`
    Object(GovernanceObject),
    /// `govobjvote`
    Vote(GovernanceVote),
}

/// Whether spam rate checks apply to the current call.
///
/// Disabled while draining orphan votes and during maintenance re-counts,
/// where bursts are expected and already-accepted data is replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateChecks {
    Enabled,
    Disabled,
}

/// Chain state governance needs: the tip and collateral confirmations.
pub trait ChainAccess: Send + Sync {
    fn tip_height(&self) -> u32;
    /// Confirmation count of a proposal fee transaction, `None` if unknown.
    fn collateral_confirmations(&self, txid: &Hash256) -> Option<u32>;
}

pub struct GovernanceManager {
    store: Mutex<GovernanceStore>,
    relay_queue: Mutex<Vec<Inv>>,
    /// (object hash, peer address) pairs recently asked for votes. Owned
    /// here rather than process-global so tests can reset it.
    asked_recently: Mutex<BTreeMap<Hash256, BTreeMap<String, i64>>>,
    mn_sync: Arc<MasternodeSync>,
    mn_meta: Arc<MasternodeMetaStore>,
    mn_list_provider: Arc<dyn MasternodeListProvider>,
    chain: Arc<dyn ChainAccess>,
    params: NetworkParams,
}

impl GovernanceManager {
    pub fn new(
        params: NetworkParams,
        mn_sync: Arc<MasternodeSync>,
        mn_meta: Arc<MasternodeMetaStore>,
        mn_list_provider: Arc<dyn MasternodeListProvider>,
        chain: Arc<dyn ChainAccess>,
    ) -> Self {
        Self {
            store: Mutex::new(GovernanceStore::new()),
            relay_queue: Mutex::new(Vec::new()),
            asked_recently: Mutex::new(BTreeMap::new()),
            mn_sync,
            mn_meta,
            mn_list_provider,
            chain,
            params,
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, GovernanceStore> {
        self.store.lock().expect("governance store lock poisoned")
    }

    // ── Relay plane ─────────────────────────────────────────────────────

    /// Queue inventories for the next relay tick. Callers must not hold
    /// the store lock.
    fn enqueue_relays(&self, invs: Vec<Inv>) {
        if invs.is_empty() {
            return;
        }
        self.relay_queue
            .lock()
            .expect("relay lock poisoned")
            .extend(invs);
    }

    /// Hand all pending inventories to the peer manager. Driven by the
    /// relay scheduler job.
    pub fn flush_relay_queue(&self, relay: &dyn InvRelay) {
        let invs: Vec<Inv> = {
            let mut queue = self.relay_queue.lock().expect("relay lock poisoned");
            std::mem::take(&mut *queue)
        };
        for inv in invs {
            relay.relay_inv(inv);
        }
    }

    fn relay_object_inv(&self, relays: &mut Vec<Inv>, hash: Hash256) {
        if !self.mn_sync.is_synced() {
            tracing::debug!(hash = %hash, "won't relay object until fully synced");
            return;
        }
        relays.push(Inv::new(InvType::GovernanceObject, hash));
    }

    fn relay_vote_inv(&self, mn_list: &MasternodeList, relays: &mut Vec<Inv>, vote: &GovernanceVote) {
        if !self.mn_sync.is_synced() {
            tracing::debug!(hash = %vote.hash(), "won't relay vote until fully synced");
            return;
        }
        if mn_list
            .get_by_collateral(&vote.masternode_outpoint)
            .is_none()
        {
            return;
        }
        relays.push(Inv::new(InvType::GovernanceObjectVote, vote.hash()));
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn have_object_for_hash(&self, hash: &Hash256) -> bool {
        let store = self.lock_store();
        store.objects.contains_key(hash) || store.postponed_objects.contains_key(hash)
    }

    pub fn have_vote_for_hash(&self, hash: &Hash256) -> bool {
        let store = self.lock_store();
        store
            .vote_to_object
            .get(hash)
            .and_then(|parent| store.objects.get(parent))
            .map(|obj| obj.vote_file().has_vote(hash))
            .unwrap_or(false)
    }

    pub fn vote_count(&self) -> usize {
        self.lock_store().vote_to_object.len()
    }

    pub fn get_object(&self, hash: &Hash256) -> Option<GovernanceObject> {
        let store = self.lock_store();
        store
            .objects
            .get(hash)
            .or_else(|| store.postponed_objects.get(hash))
            .cloned()
    }

    pub fn find_object_by_data_hash(&self, data_hash: &Hash256) -> Option<GovernanceObject> {
        let store = self.lock_store();
        store
            .objects
            .values()
            .find(|obj| obj.data_hash() == *data_hash)
            .cloned()
    }

    /// Objects created at or after `more_than_time`.
    pub fn get_all_newer_than(&self, more_than_time: i64) -> Vec<GovernanceObject> {
        self.lock_store()
            .objects
            .values()
            .filter(|obj| obj.creation_time >= more_than_time)
            .cloned()
            .collect()
    }

    /// The current votes recorded for one object, optionally filtered to a
    /// single masternode collateral.
    pub fn get_current_votes(
        &self,
        parent: &Hash256,
        outpoint_filter: Option<OutPoint>,
    ) -> Vec<GovernanceVote> {
        let store = self.lock_store();
        let Some(obj) = store.objects.get(parent) else {
            return Vec::new();
        };
        let outpoints: Vec<OutPoint> = match outpoint_filter {
            Some(outpoint) => vec![outpoint],
            None => obj.voting_outpoints().copied().collect(),
        };
        let mut votes = Vec::new();
        for outpoint in outpoints {
            for signal in [
                VoteSignal::Funding,
                VoteSignal::Valid,
                VoteSignal::Delete,
                VoteSignal::Endorsed,
            ] {
                if let Some(instance) = obj.get_current_vote(&outpoint, signal) {
                    if let Some(vote) = obj.vote_file().get_vote(&instance.vote_hash) {
                        votes.push(vote.clone());
                    }
                }
            }
        }
        votes
    }

    pub fn counts(&self) -> GovernanceCounts {
        self.lock_store().counts()
    }

    pub fn summary(&self) -> String {
        self.lock_store().summary()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let counts = self.counts();
        serde_json::json!({
            "objects_total": counts.objects_total,
            "proposals": counts.proposals,
            "triggers": counts.triggers,
            "other": counts.other,
            "erased": counts.erased,
            "votes": counts.votes,
        })
    }

    pub fn clear(&self) {
        tracing::debug!("governance manager cleared");
        self.lock_store().clear();
    }

    // ── Requested-object tracking ───────────────────────────────────────

    /// Decide whether to request an announced inventory.
    ///
    /// Only governance types, only when not already held and not already on
    /// the request list. Success records `now + RELIABLE_PROPAGATION_TIME`;
    /// the eventual `accept_message` consumes the slot.
    pub fn confirm_inventory_request(&self, inv: &Inv, now: Timestamp) -> bool {
        if !self.mn_sync.is_blockchain_synced() {
            return false;
        }
        let mut store = self.lock_store();
        tracing::debug!(inv = %inv, "confirm inventory request");

        match inv.inv_type {
            InvType::GovernanceObject => {
                if store.objects.contains_key(&inv.hash)
                    || store.postponed_objects.contains_key(&inv.hash)
                {
                    return false;
                }
            }
            InvType::GovernanceObjectVote => {
                if store.vote_to_object.has_key(&inv.hash) {
                    return false;
                }
            }
        }

        let valid_until = now.as_secs() + RELIABLE_PROPAGATION_TIME;
        store.requested_hash_time.entry(inv.hash).or_insert(valid_until);
        true
    }

    /// Consume one requested-hash slot. Unsolicited hashes return `false`
    /// and the message is ignored.
    pub fn accept_message(&self, hash: &Hash256) -> bool {
        Self::accept_message_internal(&mut self.lock_store(), hash)
    }

    fn accept_message_internal(store: &mut GovernanceStore, hash: &Hash256) -> bool {
        store.requested_hash_time.remove(hash).is_some()
    }

    // ── Message processing ──────────────────────────────────────────────

    pub fn process_message(
        &self,
        peer: &PeerInfo,
        net: &dyn GovernanceNet,
        fulfilled: &FulfilledRequestTracker,
        msg: GovernanceMessage,
        now: Timestamp,
    ) -> MessageProcessingResult {
        if !self.mn_sync.is_blockchain_synced() {
            return MessageProcessingResult::default();
        }
        let mn_list = self.mn_list_provider.list_at_tip();
        match msg {
            GovernanceMessage::Sync { prop, filter } => {
                // Serving sync is heavy; wait until our own sync finished.
                if !self.mn_sync.is_synced() {
                    return MessageProcessingResult::default();
                }
                tracing::debug!(peer = peer.id, prop = %prop, "govsync from peer");
                let store = self.lock_store();
                if prop.is_zero() {
                    self.sync_objects_internal(&store, peer, net, fulfilled, now)
                } else {
                    self.sync_single_obj_votes_internal(&store, &mn_list, peer, &prop, &filter, net, now)
                }
            }
            GovernanceMessage::Object(obj) => self.process_object_message(peer, &mn_list, obj, now),
            GovernanceMessage::Vote(vote) => {
                self.process_vote_message(peer, net, &mn_list, vote, now)
            }
        }
    }

    fn process_object_message(
        &self,
        peer: &PeerInfo,
        mn_list: &MasternodeList,
        obj: GovernanceObject,
        now: Timestamp,
    ) -> MessageProcessingResult {
        let hash = obj.hash();
        let now_secs = now.as_secs();
        let mut ret = MessageProcessingResult {
            to_erase: Some(Inv::new(InvType::GovernanceObject, hash)),
            ..Default::default()
        };
        tracing::debug!(hash = %hash, peer = peer.id, "received governance object");

        let mut relays = Vec::new();
        {
            let mut store = self.lock_store();
            if !Self::accept_message_internal(&mut store, &hash) {
                tracing::debug!(hash = %hash, "received unrequested object");
                return ret;
            }
            if store.objects.contains_key(&hash)
                || store.postponed_objects.contains_key(&hash)
                || store.erased_objects.contains_key(&hash)
            {
                tracing::debug!(hash = %hash, "received already seen object");
                return ret;
            }

            let (rate_ok, bypassed) = self.masternode_rate_check_internal(
                &mut store,
                &obj,
                true,
                false,
                now_secs,
                RateChecks::Enabled,
            );
            if !rate_ok {
                tracing::debug!(hash = %hash, height = store.cached_block_height,
                    "masternode rate check failed");
                return ret;
            }

            let validity = obj.is_valid_locally(now_secs, mn_list, &*self.chain, &self.params, true);

            // The bypass skipped the rate math before signature checks; a
            // valid object must still pass the forced check.
            if bypassed && validity.is_valid() {
                let (rate_ok, _) = self.masternode_rate_check_internal(
                    &mut store,
                    &obj,
                    true,
                    true,
                    now_secs,
                    RateChecks::Enabled,
                );
                if !rate_ok {
                    tracing::debug!(hash = %hash,
                        "masternode rate check failed after signature verification");
                    return ret;
                }
            }

            match validity {
                ObjectValidity::MissingConfirmations(reason) => {
                    tracing::info!(hash = %hash, reason = %reason,
                        "not enough fee confirmations, postponing object");
                    store.postponed_objects.insert(hash, obj);
                    return ret;
                }
                ObjectValidity::Invalid(reason) => {
                    tracing::debug!(hash = %hash, reason = %reason, "governance object is invalid");
                    ret.error = Some(MisbehavingError::with_message(20, reason));
                    return ret;
                }
                ObjectValidity::Valid => {
                    self.add_governance_object_internal(
                        &mut store,
                        mn_list,
                        obj,
                        now_secs,
                        Some(peer),
                        &mut relays,
                    );
                }
            }
        }
        self.enqueue_relays(relays);
        ret
    }

    fn process_vote_message(
        &self,
        peer: &PeerInfo,
        net: &dyn GovernanceNet,
        mn_list: &MasternodeList,
        vote: GovernanceVote,
        now: Timestamp,
    ) -> MessageProcessingResult {
        let hash = vote.hash();
        let mut ret = MessageProcessingResult {
            to_erase: Some(Inv::new(InvType::GovernanceObjectVote, hash)),
            ..Default::default()
        };
        tracing::debug!(hash = %hash, peer = peer.id, "received governance vote");

        let mut relays = Vec::new();
        let mut request_parent = None;
        {
            let mut store = self.lock_store();
            if !Self::accept_message_internal(&mut store, &hash) {
                tracing::debug!(hash = %hash, "received unrequested vote");
                return ret;
            }
            match self.process_vote_internal(
                &mut store,
                mn_list,
                &vote,
                RateChecks::Enabled,
                now.as_secs(),
                &mut request_parent,
            ) {
                Ok(()) => {
                    tracing::debug!(hash = %hash, "new governance vote");
                    self.mn_sync.bump_asset_last_time(now.as_secs());
                    self.relay_vote_inv(mn_list, &mut relays, &vote);
                }
                Err(e) => {
                    tracing::debug!(hash = %hash, error = %e, "rejected vote");
                    if e.node_penalty() != 0 && self.mn_sync.is_synced() {
                        ret.error = Some(MisbehavingError::with_message(
                            e.node_penalty(),
                            e.to_string(),
                        ));
                    }
                }
            }
        }
        self.enqueue_relays(relays);
        if let Some(parent) = request_parent {
            net.request_object(peer.id, parent, BloomFilter::empty());
        }
        ret
    }

    // ── Sync serving ────────────────────────────────────────────────────

    fn sync_objects_internal(
        &self,
        store: &GovernanceStore,
        peer: &PeerInfo,
        net: &dyn GovernanceNet,
        fulfilled: &FulfilledRequestTracker,
        now: Timestamp,
    ) -> MessageProcessingResult {
        if fulfilled.has_fulfilled(&peer.addr, MSG_GOVERNANCE_SYNC, now) {
            // Asking for the whole list repeatedly in a short window is not
            // acceptable.
            tracing::debug!(peer = peer.id, "peer already asked for the full object list");
            return MisbehavingError::new(20).into();
        }
        fulfilled.add_fulfilled(&peer.addr, MSG_GOVERNANCE_SYNC, now);

        tracing::debug!(peer = peer.id, "syncing all governance objects to peer");
        let mut ret = MessageProcessingResult::default();
        for (hash, obj) in &store.objects {
            if obj.is_set_cached_delete() || obj.is_set_expired() {
                tracing::debug!(hash = %hash, "not syncing deleted/expired object");
                continue;
            }
            ret.inventory.push(Inv::new(InvType::GovernanceObject, *hash));
        }
        net.push_sync_status(peer.id, MASTERNODE_SYNC_GOVOBJ, ret.inventory.len());
        tracing::debug!(peer = peer.id, count = ret.inventory.len(), "sent objects to peer");
        ret
    }

    fn sync_single_obj_votes_internal(
        &self,
        store: &GovernanceStore,
        mn_list: &MasternodeList,
        peer: &PeerInfo,
        prop: &Hash256,
        filter: &BloomFilter,
        net: &dyn GovernanceNet,
        now: Timestamp,
    ) -> MessageProcessingResult {
        let Some(obj) = store.objects.get(prop) else {
            tracing::debug!(prop = %prop, peer = peer.id, "no matching object for vote sync");
            return MessageProcessingResult::default();
        };
        if obj.is_set_cached_delete() || obj.is_set_expired() {
            tracing::debug!(prop = %prop, peer = peer.id, "not syncing deleted/expired object");
            return MessageProcessingResult::default();
        }

        let mut ret = MessageProcessingResult::default();
        for vote in obj.vote_file().votes() {
            let vote_hash = vote.hash();
            let only_voting_key = obj.object_type == ObjectType::Proposal
                && vote.signal == VoteSignal::Funding;
            if filter.contains(&vote_hash)
                || !vote.is_valid(now.as_secs(), mn_list, only_voting_key)
            {
                continue;
            }
            ret.inventory
                .push(Inv::new(InvType::GovernanceObjectVote, vote_hash));
        }
        net.push_sync_status(peer.id, MASTERNODE_SYNC_GOVOBJ_VOTE, ret.inventory.len());
        tracing::debug!(peer = peer.id, count = ret.inventory.len(), "sent votes to peer");
        ret
    }

    // ── Object intake ───────────────────────────────────────────────────

    /// Insert a locally submitted (already validated) object.
    pub fn add_governance_object(&self, obj: GovernanceObject, now: Timestamp) {
        let mn_list = self.mn_list_provider.list_at_tip();
        let mut relays = Vec::new();
        {
            let mut store = self.lock_store();
            self.add_governance_object_internal(
                &mut store,
                &mn_list,
                obj,
                now.as_secs(),
                None,
                &mut relays,
            );
        }
        self.enqueue_relays(relays);
    }

    fn add_governance_object_internal(
        &self,
        store: &mut GovernanceStore,
        mn_list: &MasternodeList,
        mut obj: GovernanceObject,
        now: i64,
        from_peer: Option<&PeerInfo>,
        relays: &mut Vec<Inv>,
    ) {
        let hash = obj.hash();
        obj.update_sentinel_variables(mn_list, &self.params, now);

        let validity = obj.is_valid_locally(now, mn_list, &*self.chain, &self.params, true);
        if !validity.is_valid() {
            tracing::debug!(hash = %hash, height = store.cached_block_height,
                "refusing to add invalid governance object");
            return;
        }

        let object_type = obj.object_type;
        let outpoint = obj.masternode_outpoint;
        let creation_time = obj.creation_time;

        if store.objects.contains_key(&hash) {
            tracing::debug!(hash = %hash, "already have governance object");
            return;
        }
        store.objects.insert(hash, obj);
        tracing::debug!(hash = %hash, object_type = ?object_type,
            peer = from_peer.map(|p| p.id), "added governance object");

        if object_type == ObjectType::Trigger && !self.add_new_trigger(store, hash, now) {
            tracing::debug!(hash = %hash, "undo adding invalid trigger object");
            if let Some(stored) = store.objects.get_mut(&hash) {
                stored.prepare_deletion(now);
            }
            return;
        }

        self.relay_object_inv(relays, hash);
        self.masternode_rate_update(store, object_type, outpoint, creation_time, hash, now);
        self.mn_sync.bump_asset_last_time(now);

        // Pending votes may have arrived before the object.
        self.check_orphan_votes(store, mn_list, hash, now, relays);
    }

    /// Drain orphan votes keyed on a newly arrived object: relay the ones
    /// that apply, drop the rest.
    fn check_orphan_votes(
        &self,
        store: &mut GovernanceStore,
        mn_list: &MasternodeList,
        obj_hash: Hash256,
        now: i64,
        relays: &mut Vec<Inv>,
    ) {
        let pending = store.orphan_votes.get_all(&obj_hash);
        for orphan in pending {
            if orphan.expires_at >= now {
                let Some(obj) = store.objects.get_mut(&obj_hash) else {
                    break;
                };
                if obj
                    .process_vote(mn_list, &orphan.vote, now, RateChecks::Disabled)
                    .is_ok()
                {
                    store.vote_to_object.insert(orphan.vote.hash(), obj_hash);
                    self.relay_vote_inv(mn_list, relays, &orphan.vote);
                }
            }
            store.orphan_votes.erase_item(&obj_hash, &orphan);
        }
    }

    // ── Rate limiting ───────────────────────────────────────────────────

    /// Forced rate check, for callers outside the message path (e.g. the
    /// local trigger submitter).
    pub fn masternode_rate_check(
        &self,
        obj: &GovernanceObject,
        update_fail_status: bool,
        now: Timestamp,
        rate_checks: RateChecks,
    ) -> bool {
        let mut store = self.lock_store();
        self.masternode_rate_check_internal(
            &mut store,
            obj,
            update_fail_status,
            true,
            now.as_secs(),
            rate_checks,
        )
        .0
    }

    /// Returns (passed, bypassed). A masternode whose last object was fine
    /// skips the rate math until `force` re-runs it after signature
    /// verification, keeping signature work cheap for spammy peers.
    fn masternode_rate_check_internal(
        &self,
        store: &mut GovernanceStore,
        obj: &GovernanceObject,
        update_fail_status: bool,
        force: bool,
        now: i64,
        rate_checks: RateChecks,
    ) -> (bool, bool) {
        if !self.mn_sync.is_synced() || rate_checks == RateChecks::Disabled {
            return (true, false);
        }
        if obj.object_type != ObjectType::Trigger {
            return (true, false);
        }

        let timestamp = obj.creation_time;
        let cycle_seconds = self.params.superblock_cycle_seconds();

        if timestamp < now - 2 * cycle_seconds {
            tracing::debug!(hash = %obj.hash(), outpoint = %obj.masternode_outpoint,
                timestamp, now, "object rejected due to too old timestamp");
            return (false, false);
        }
        if timestamp > now + MAX_TIME_FUTURE_DEVIATION {
            tracing::debug!(hash = %obj.hash(), outpoint = %obj.masternode_outpoint,
                timestamp, now, "object rejected due to too new (future) timestamp");
            return (false, false);
        }

        let Some(record) = store.last_masternode_object.get_mut(&obj.masternode_outpoint) else {
            return (true, false);
        };
        if record.status_ok && !force {
            return (true, true);
        }

        // One trigger per masternode per cycle, with a small fudge factor.
        let max_rate = 2.0 * 1.1 / cycle_seconds as f64;

        // Speculative copy: test inclusion without mutating real state.
        let mut buffer = record.trigger_buffer.clone();
        buffer.add_timestamp(timestamp);
        let rate = buffer.rate();

        if rate < max_rate {
            return (true, false);
        }

        tracing::debug!(hash = %obj.hash(), outpoint = %obj.masternode_outpoint,
            rate, max_rate, "masternode rate too high");
        if update_fail_status {
            record.status_ok = false;
        }
        (false, false)
    }

    /// Commit an accepted object to the masternode's rate buffer.
    fn masternode_rate_update(
        &self,
        store: &mut GovernanceStore,
        object_type: ObjectType,
        outpoint: OutPoint,
        creation_time: i64,
        hash: Hash256,
        now: i64,
    ) {
        if object_type != ObjectType::Trigger {
            return;
        }
        let record = store
            .last_masternode_object
            .entry(outpoint)
            .or_insert_with(|| LastObjectRecord::new(true));
        record.trigger_buffer.add_timestamp(creation_time);
        record.status_ok = true;

        // Near-future objects get another relay pass once their timestamp
        // can propagate reliably.
        if creation_time > now + MAX_TIME_FUTURE_DEVIATION - RELIABLE_PROPAGATION_TIME {
            store.additional_relay_objects.insert(hash);
        }
    }

    // ── Votes ───────────────────────────────────────────────────────────

    /// Process a vote originating locally (e.g. RPC) and relay on success.
    pub fn process_vote_and_relay(
        &self,
        vote: &GovernanceVote,
        rate_checks: RateChecks,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let mn_list = self.mn_list_provider.list_at_tip();
        let mut relays = Vec::new();
        let result = {
            let mut store = self.lock_store();
            let mut unused = None;
            let result = self.process_vote_internal(
                &mut store,
                &mn_list,
                vote,
                rate_checks,
                now.as_secs(),
                &mut unused,
            );
            if result.is_ok() {
                self.relay_vote_inv(&mn_list, &mut relays, vote);
            }
            result
        };
        self.enqueue_relays(relays);
        result
    }

    fn process_vote_internal(
        &self,
        store: &mut GovernanceStore,
        mn_list: &MasternodeList,
        vote: &GovernanceVote,
        rate_checks: RateChecks,
        now: i64,
        request_parent: &mut Option<Hash256>,
    ) -> Result<(), GovernanceError> {
        let vote_hash = vote.hash();
        let parent_hash = vote.parent_hash;

        if store.vote_to_object.has_key(&vote_hash) {
            return Err(GovernanceError::DuplicateVote(vote_hash.to_string()));
        }
        if store.invalid_votes.has_key(&vote_hash) {
            return Err(GovernanceError::KnownInvalidVote(vote_hash.to_string()));
        }

        if !store.objects.contains_key(&parent_hash) {
            let inserted = store.orphan_votes.insert(
                parent_hash,
                OrphanVote {
                    vote: vote.clone(),
                    expires_at: now + GOVERNANCE_ORPHAN_EXPIRATION_TIME,
                },
            );
            if inserted {
                *request_parent = Some(parent_hash);
            }
            return Err(GovernanceError::UnknownParentObject(parent_hash.to_string()));
        }
        let obj = store
            .objects
            .get_mut(&parent_hash)
            .expect("presence checked above");

        if obj.is_set_cached_delete() || obj.is_set_expired() {
            return Err(GovernanceError::ObjectDeleted(parent_hash.to_string()));
        }

        match obj.process_vote(mn_list, vote, now, rate_checks) {
            Ok(()) => {
                store.vote_to_object.insert(vote_hash, parent_hash);
                Ok(())
            }
            Err(e @ GovernanceError::InvalidVoteSignature) => {
                store.invalid_votes.insert(vote_hash, vote.clone());
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // ── Postponed objects ───────────────────────────────────────────────

    pub fn add_postponed_object(&self, obj: GovernanceObject) {
        let mut store = self.lock_store();
        let hash = obj.hash();
        store.postponed_objects.insert(hash, obj);
    }

    pub fn postponed_count(&self) -> usize {
        self.lock_store().postponed_objects.len()
    }

    /// Retry postponed objects for fee confirmation and run additional
    /// trigger relays. Called on every chain-tip advance while synced.
    fn check_postponed_objects_internal(
        &self,
        store: &mut GovernanceStore,
        mn_list: &MasternodeList,
        now: i64,
        relays: &mut Vec<Inv>,
    ) {
        if !self.mn_sync.is_synced() {
            return;
        }

        let hashes: Vec<Hash256> = store.postponed_objects.keys().copied().collect();
        for hash in hashes {
            let Some(obj) = store.postponed_objects.get(&hash) else {
                continue;
            };
            debug_assert!(obj.object_type != ObjectType::Trigger);
            match obj.is_valid_locally(now, mn_list, &*self.chain, &self.params, true) {
                ObjectValidity::MissingConfirmations(_) => {} // keep waiting
                ObjectValidity::Valid => {
                    let obj = store
                        .postponed_objects
                        .remove(&hash)
                        .expect("postponed object present");
                    self.add_governance_object_internal(store, mn_list, obj, now, None, relays);
                }
                ObjectValidity::Invalid(reason) => {
                    tracing::debug!(hash = %hash, reason = %reason, "postponed object became invalid");
                    store.postponed_objects.remove(&hash);
                }
            }
        }

        let cycle_seconds = self.params.superblock_cycle_seconds();
        let additional: Vec<Hash256> = store.additional_relay_objects.iter().copied().collect();
        for hash in additional {
            let mut drop_entry = true;
            if let Some(obj) = store.objects.get(&hash) {
                let timestamp = obj.creation_time;
                let valid = timestamp <= now + MAX_TIME_FUTURE_DEVIATION
                    && timestamp >= now - 2 * cycle_seconds;
                let ready = timestamp <= now + MAX_TIME_FUTURE_DEVIATION - RELIABLE_PROPAGATION_TIME;
                if valid {
                    if ready {
                        tracing::debug!(hash = %hash, "additional relay of trigger");
                        self.relay_object_inv(relays, hash);
                    } else {
                        drop_entry = false;
                    }
                }
            } else {
                tracing::debug!(hash = %hash, "additional relay of unknown object");
            }
            if drop_entry {
                store.additional_relay_objects.remove(&hash);
            }
        }
    }

    // ── Scheduled maintenance ───────────────────────────────────────────

    /// The 5-minute maintenance pass: recompute dirty flags, clean expired
    /// triggers, erase deletion-pending objects, and sweep negative caches.
    pub fn check_and_remove(&self, now: Timestamp) {
        if !self.mn_sync.is_blockchain_synced() {
            return;
        }
        tracing::debug!("governance maintenance pass");

        let dirty_hashes = self.mn_meta.get_and_clear_dirty_governance_hashes();
        let mn_list = self.mn_list_provider.list_at_tip();
        let now_secs = now.as_secs();
        let cycle_seconds = self.params.superblock_cycle_seconds();

        let mut store = self.lock_store();
        let store = &mut *store;

        for hash in dirty_hashes {
            if let Some(obj) = store.objects.get_mut(&hash) {
                let removed = obj.clear_unknown_masternode_votes(&mn_list);
                for vote_hash in removed {
                    store.vote_to_object.erase(&vote_hash);
                }
            }
        }

        self.clean_and_remove_triggers_internal(store, now_secs);

        let hashes: Vec<Hash256> = store.objects.keys().copied().collect();
        for hash in hashes {
            let Some(obj) = store.objects.get_mut(&hash) else {
                continue;
            };
            if obj.flags.dirty {
                let validity =
                    obj.is_valid_locally(now_secs, &mn_list, &*self.chain, &self.params, false);
                obj.flags.valid = validity.is_valid();
                obj.update_sentinel_variables(&mn_list, &self.params, now_secs);
                obj.flags.dirty = false;
            }

            let erase = (obj.is_set_cached_delete() || obj.is_set_expired())
                && now_secs - obj.deletion_time >= GOVERNANCE_DELETION_DELAY;
            if erase {
                let retention = match obj.object_type {
                    // Erased proposal hashes are kept forever.
                    ObjectType::Proposal => i64::MAX,
                    _ => obj.creation_time + 2 * cycle_seconds + GOVERNANCE_DELETION_DELAY,
                };
                tracing::debug!(hash = %hash, "erasing governance object");
                self.mn_meta.remove_governance_object(&hash);

                let stale: Vec<Hash256> = store
                    .vote_to_object
                    .iter()
                    .filter(|(_, parent)| **parent == hash)
                    .map(|(vote_hash, _)| *vote_hash)
                    .collect();
                for vote_hash in stale {
                    store.vote_to_object.erase(&vote_hash);
                }

                store.erased_objects.insert(hash, retention);
                store.objects.remove(&hash);
            } else if obj.object_type == ObjectType::Proposal {
                if ProposalValidator::new(&obj.payload).validate().is_err() {
                    tracing::debug!(hash = %hash, "marking no-longer-valid proposal for deletion");
                    obj.prepare_deletion(now_secs);
                }
            }
        }

        store.erased_objects.retain(|_, retention| *retention >= now_secs);
        store.requested_hash_time.retain(|_, valid_until| *valid_until >= now_secs);

        tracing::debug!(summary = %store.summary(),
            requested = store.requested_hash_time.len(), "maintenance pass done");
    }

    /// Drop orphan votes whose wait expired.
    pub fn clean_orphan_votes(&self, now: Timestamp) {
        let now_secs = now.as_secs();
        self.lock_store()
            .orphan_votes
            .retain(|_, orphan| orphan.expires_at >= now_secs);
    }

    /// Ask every relay-capable peer for objects we only know orphan votes
    /// for.
    pub fn request_orphan_objects(&self, net: &dyn GovernanceNet) {
        let hashes: Vec<Hash256> = {
            let store = self.lock_store();
            store
                .orphan_votes
                .keys()
                .into_iter()
                .filter(|hash| !store.objects.contains_key(hash))
                .collect()
        };
        tracing::debug!(count = hashes.len(), "requesting orphan objects");
        for hash in hashes {
            for peer in net.peers() {
                if !peer.can_relay {
                    continue;
                }
                net.request_object(peer.id, hash, BloomFilter::empty());
            }
        }
    }

    fn clean_and_remove_triggers_internal(&self, store: &mut GovernanceStore, now: i64) {
        tracing::debug!(count = store.triggers.len(), "cleaning triggers");
        let hashes: Vec<Hash256> = store.triggers.keys().copied().collect();
        for hash in hashes {
            match store.objects.get(&hash) {
                Some(obj) if obj.object_type == ObjectType::Trigger => {}
                _ => {
                    tracing::debug!(hash = %hash, "unknown or non-trigger superblock");
                    if let Some(sb) = store.triggers.get_mut(&hash) {
                        sb.set_status(SeenObjectStatus::ErrorInvalid);
                    }
                }
            }

            let Some(sb) = store.triggers.get(&hash) else {
                continue;
            };
            let remove = match sb.status() {
                SeenObjectStatus::ErrorInvalid | SeenObjectStatus::Unknown => true,
                SeenObjectStatus::Valid | SeenObjectStatus::Executed => {
                    if sb.is_expired(store.cached_block_height, &self.params) {
                        if let Some(obj) = store.objects.get_mut(&hash) {
                            obj.set_expired();
                        }
                        true
                    } else {
                        false
                    }
                }
            };

            if remove {
                tracing::debug!(hash = %hash, "removing trigger view");
                if let Some(obj) = store.objects.get_mut(&hash) {
                    obj.prepare_deletion(now);
                }
                store.triggers.remove(&hash);
            }
        }
    }

    /// Materialize the trigger view for a freshly added trigger object.
    /// Returns `false` when the view is invalid or already expired.
    fn add_new_trigger(&self, store: &mut GovernanceStore, hash: Hash256, _now: i64) -> bool {
        if store.triggers.contains_key(&hash) {
            tracing::debug!(hash = %hash, "already have trigger");
            return false;
        }
        let Some(obj) = store.objects.get(&hash) else {
            return false;
        };
        let mut sb = match Superblock::from_object(obj, hash) {
            Ok(sb) => sb,
            Err(e) => {
                tracing::debug!(hash = %hash, error = %e, "error creating superblock");
                return false;
            }
        };
        sb.set_status(SeenObjectStatus::Valid);
        let expired = sb.is_expired(store.cached_block_height, &self.params);
        store.triggers.insert(hash, sb);
        !expired
    }

    // ── Chain-tip notifications ─────────────────────────────────────────

    pub fn updated_block_tip(&self, tip: &BlockIndexEntry, now: Timestamp) {
        let mn_list = self.mn_list_provider.list_at_tip();
        let now_secs = now.as_secs();
        tracing::debug!(height = tip.height, "governance tip update");

        let mut relays = Vec::new();
        {
            let mut store = self.lock_store();
            store.cached_block_height = tip.height;
            self.remove_invalid_votes_internal(&mut store, &mn_list);
            self.check_postponed_objects_internal(&mut store, &mn_list, now_secs, &mut relays);
            self.execute_best_superblock_internal(&mut store, &mn_list, tip.height, now_secs);
        }
        self.enqueue_relays(relays);
    }

    /// Purge votes from masternodes that were removed or rotated their
    /// keys since the last saved snapshot.
    fn remove_invalid_votes_internal(&self, store: &mut GovernanceStore, mn_list: &MasternodeList) {
        if !self.mn_sync.is_synced() {
            return;
        }
        let diff = store.last_mn_list_for_voting_keys.build_diff(mn_list);
        let changed: Vec<OutPoint> = diff.vote_invalidating().copied().collect();

        for outpoint in &changed {
            let hashes: Vec<Hash256> = store.objects.keys().copied().collect();
            for hash in hashes {
                let removed = store
                    .objects
                    .get_mut(&hash)
                    .map(|obj| obj.remove_votes_for(outpoint))
                    .unwrap_or_default();
                for vote_hash in removed {
                    store.vote_to_object.erase(&vote_hash);
                    store.invalid_votes.erase(&vote_hash);
                    store.orphan_votes.erase_key(&vote_hash);
                    store.requested_hash_time.remove(&vote_hash);
                }
            }
        }

        store.last_mn_list_for_voting_keys = mn_list.clone();
    }

    // ── Vote request pacing ─────────────────────────────────────────────

    /// Request one object's votes from a peer, seeding the bloom filter
    /// with the votes we already hold.
    pub fn request_governance_object(
        &self,
        peer: PeerId,
        hash: Hash256,
        net: &dyn GovernanceNet,
        use_filter: bool,
    ) {
        tracing::debug!(hash = %hash, peer, "requesting governance object");
        let mut filter = BloomFilter::empty();
        if use_filter {
            let store = self.lock_store();
            if let Some(obj) = store.objects.get(&hash) {
                filter = BloomFilter::new(
                    self.params.consensus.governance_filter_elements,
                    GOVERNANCE_FILTER_FP_RATE,
                    rand::random::<u32>() % 999_999,
                );
                for vote in obj.vote_file().votes() {
                    filter.insert(&vote.hash());
                }
            }
        }
        net.request_object(peer, hash, filter);
    }

    /// Spread vote requests over peers, triggers first. Returns the number
    /// of object hashes still unserved, or a negative sentinel when there
    /// was nothing to do.
    pub fn request_governance_object_votes(&self, net: &dyn GovernanceNet, now: Timestamp) -> i32 {
        let peers = net.peers();
        if peers.is_empty() {
            return -1;
        }
        let now_secs = now.as_secs();
        let peers_per_hash_max = if self.params.is_mockable() {
            usize::MAX
        } else {
            REALNET_PEERS_PER_HASH
        };

        // On mainnet one object per pass; elsewhere scale so a request
        // pulls roughly PROJECTED_VOTES_PER_REQUEST votes.
        let max_obj_requests = if self.params.id == NetworkId::Main {
            1
        } else {
            let mn_count = self.mn_list_provider.list_at_tip().valid_count().max(1);
            (PROJECTED_VOTES_PER_REQUEST / mn_count).max(1)
        };

        let mut asked = self.asked_recently.lock().expect("asked lock poisoned");

        let mut trigger_hashes = Vec::new();
        let mut other_hashes = Vec::new();
        {
            let store = self.lock_store();
            if store.objects.is_empty() {
                return -2;
            }
            for (hash, obj) in &store.objects {
                if obj.is_set_cached_delete() {
                    continue;
                }
                if let Some(peers_asked) = asked.get_mut(hash) {
                    peers_asked.retain(|_, expire| *expire >= now_secs);
                    if peers_asked.len() >= peers_per_hash_max {
                        continue;
                    }
                }
                if obj.object_type == ObjectType::Trigger {
                    trigger_hashes.push(*hash);
                } else {
                    other_hashes.push(*hash);
                }
            }
        }

        tracing::debug!(triggers = trigger_hashes.len(), other = other_hashes.len(),
            asked = asked.len(), "vote request pass start");

        let mut rng = rand::thread_rng();
        trigger_hashes.shuffle(&mut rng);
        other_hashes.shuffle(&mut rng);

        let mut budget = max_obj_requests;
        while budget > 0 {
            // Triggers first.
            let hash = match trigger_hashes.last().or(other_hashes.last()) {
                Some(hash) => *hash,
                None => break,
            };

            let mut asked_any = false;
            for peer in &peers {
                // Skip outbound non-relay connections; an inbound this
                // early on an active masternode is most likely another
                // masternode's connection, skip it too.
                if !peer.can_relay || (net.is_active_masternode() && peer.inbound) {
                    continue;
                }
                let projected = net.requested_object_count(peer.id) + PROJECTED_VOTES_PER_REQUEST;
                if projected > MAX_INV_SZ {
                    continue;
                }
                if asked
                    .get(&hash)
                    .map(|m| m.contains_key(&peer.addr))
                    .unwrap_or(false)
                {
                    continue;
                }

                self.request_governance_object(peer.id, hash, net, true);
                asked
                    .entry(hash)
                    .or_default()
                    .insert(peer.addr.clone(), now_secs + VOTE_REQUEST_TIMEOUT);
                asked_any = true;
                if asked.get(&hash).map(|m| m.len()).unwrap_or(0) >= peers_per_hash_max {
                    break;
                }
            }

            if !trigger_hashes.is_empty() {
                trigger_hashes.pop();
            } else {
                other_hashes.pop();
            }
            // An unserved hash does not consume the budget.
            if asked_any {
                budget -= 1;
            }
        }

        tracing::debug!(triggers = trigger_hashes.len(), other = other_hashes.len(),
            "vote request pass end");
        (trigger_hashes.len() + other_hashes.len()) as i32
    }

    /// Forget the asked-recently table (deterministic tests).
    pub fn reset_vote_request_pacing(&self) {
        self.asked_recently
            .lock()
            .expect("asked lock poisoned")
            .clear();
    }

    // ── Superblock election ─────────────────────────────────────────────

    /// Whether any funded trigger targets `height`.
    pub fn is_superblock_triggered(&self, height: u32, now: Timestamp) -> bool {
        if !Superblock::is_valid_block_height(height, &self.params) {
            return false;
        }
        let mn_list = self.mn_list_provider.list_at_tip();
        let mut store = self.lock_store();
        let trigger_hashes: Vec<(Hash256, u32)> = store
            .triggers
            .iter()
            .map(|(hash, sb)| (*hash, sb.block_height()))
            .collect();
        for (hash, sb_height) in trigger_hashes {
            if sb_height != height {
                continue;
            }
            let Some(obj) = store.objects.get_mut(&hash) else {
                continue;
            };
            obj.update_sentinel_variables(&mn_list, &self.params, now.as_secs());
            if obj.flags.funding {
                return true;
            }
        }
        false
    }

    /// The winning trigger for `height`: highest absolute YES count among
    /// funded candidates, ties broken by the numerically higher hash.
    fn get_best_superblock_internal(
        &self,
        store: &mut GovernanceStore,
        mn_list: &MasternodeList,
        height: u32,
        now: i64,
    ) -> Option<Hash256> {
        if !Superblock::is_valid_block_height(height, &self.params) {
            return None;
        }
        let trigger_hashes: Vec<(Hash256, u32)> = store
            .triggers
            .iter()
            .map(|(hash, sb)| (*hash, sb.block_height()))
            .collect();

        let mut best: Option<(i64, Hash256)> = None;
        for (hash, sb_height) in trigger_hashes {
            if sb_height != height {
                continue;
            }
            let Some(obj) = store.objects.get_mut(&hash) else {
                continue;
            };
            obj.update_sentinel_variables(mn_list, &self.params, now);
            if !obj.flags.funding {
                continue;
            }
            let yes_count = obj.get_absolute_yes_count(mn_list, VoteSignal::Funding);
            if yes_count <= 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_yes, best_hash)) => {
                    yes_count > best_yes
                        || (yes_count == best_yes
                            && hash.cmp_numeric(&best_hash) == std::cmp::Ordering::Greater)
                }
            };
            if better {
                best = Some((yes_count, hash));
            }
        }
        best.map(|(_, hash)| hash)
    }

    pub fn get_best_superblock(&self, height: u32, now: Timestamp) -> Option<Superblock> {
        let mn_list = self.mn_list_provider.list_at_tip();
        let mut store = self.lock_store();
        let hash = self.get_best_superblock_internal(&mut store, &mn_list, height, now.as_secs())?;
        store.triggers.get(&hash).cloned()
    }

    /// Outputs appended to the coinbase of a superblock at `height`.
    pub fn get_superblock_payments(&self, height: u32, now: Timestamp) -> Vec<GovernancePayment> {
        let Some(superblock) = self.get_best_superblock(height, now) else {
            tracing::debug!(height, "no superblock for height");
            return Vec::new();
        };
        for (i, payment) in superblock.payments().iter().enumerate() {
            tracing::debug!(height, output = i, amount = %payment.amount, "superblock payment");
        }
        superblock.payments().to_vec()
    }

    fn execute_best_superblock_internal(
        &self,
        store: &mut GovernanceStore,
        mn_list: &MasternodeList,
        height: u32,
        now: i64,
    ) {
        if let Some(hash) = self.get_best_superblock_internal(store, mn_list, height, now) {
            // The tip would not have advanced if the payout was wrong;
            // mark the winning trigger as executed.
            if let Some(sb) = store.triggers.get_mut(&hash) {
                sb.set_executed();
            }
        }
    }

    /// Proposals passing the funding threshold, ordered by absolute YES
    /// descending with ties broken by the numerically higher hash.
    pub fn get_approved_proposals(&self) -> Vec<GovernanceObject> {
        let mn_list = self.mn_list_provider.list_at_tip();
        let weighted_count = mn_list.valid_weighted_count() as i64;
        let abs_vote_req =
            (self.params.consensus.governance_min_quorum as i64).max(weighted_count / 10);

        let store = self.lock_store();
        let mut approved: Vec<(i64, Hash256, GovernanceObject)> = store
            .objects
            .iter()
            .filter(|(_, obj)| obj.object_type == ObjectType::Proposal)
            .filter_map(|(hash, obj)| {
                let yes = obj.get_absolute_yes_count(&mn_list, VoteSignal::Funding);
                (yes >= abs_vote_req).then(|| (yes, *hash, obj.clone()))
            })
            .collect();

        approved.sort_by(|(yes_a, hash_a, _), (yes_b, hash_b, _)| {
            yes_b
                .cmp(yes_a)
                .then_with(|| hash_b.cmp_numeric(hash_a))
        });
        approved.into_iter().map(|(_, _, obj)| obj).collect()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write the durable slice of the store to the cache file.
    pub fn store_cache(&self, db: &GovernanceDb) -> Result<(), GovernanceError> {
        let state = {
            let store = self.lock_store();
            PersistedState {
                objects: store.objects.clone(),
                erased_objects: store.erased_objects.clone(),
                last_masternode_object: store.last_masternode_object.clone(),
                last_mn_list_for_voting_keys: store.last_mn_list_for_voting_keys.clone(),
                cached_block_height: store.cached_block_height,
            }
        };
        db.store(&state)
    }

    /// Load the cache file and rebuild the volatile indexes.
    pub fn load_cache(&self, db: &GovernanceDb, now: Timestamp) -> Result<(), GovernanceError> {
        let state = db.load()?;
        {
            let mut store = self.lock_store();
            store.clear();
            store.objects = state.objects;
            store.erased_objects = state.erased_objects;
            store.last_masternode_object = state.last_masternode_object;
            store.last_mn_list_for_voting_keys = state.last_mn_list_for_voting_keys;
            store.cached_block_height = state.cached_block_height;
            self.init_on_load(&mut store, now.as_secs());
        }
        self.check_and_remove(now);
        Ok(())
    }

    /// Rebuild the vote index and trigger views from loaded objects.
    fn init_on_load(&self, store: &mut GovernanceStore, now: i64) {
        tracing::info!("preparing governance indexes and triggers");
        store.vote_to_object.clear();
        let hashes: Vec<Hash256> = store.objects.keys().copied().collect();
        for hash in &hashes {
            let vote_hashes: Vec<Hash256> = store.objects[hash]
                .vote_file()
                .votes()
                .map(|vote| vote.hash())
                .collect();
            for vote_hash in vote_hashes {
                store.vote_to_object.insert(vote_hash, *hash);
            }
        }

        for hash in hashes {
            let is_trigger = store
                .objects
                .get(&hash)
                .map(|obj| obj.object_type == ObjectType::Trigger)
                .unwrap_or(false);
            if is_trigger && !self.add_new_trigger(store, hash, now) {
                if let Some(obj) = store.objects.get_mut(&hash) {
                    obj.prepare_deletion(now);
                }
            }
        }
        tracing::info!(summary = %store.summary(), "governance cache loaded");
    }
}
