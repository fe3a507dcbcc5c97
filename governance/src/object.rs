//! Governance objects: proposals and triggers.

use std::collections::BTreeMap;

use orin_crypto::{sha256d, sign_message, verify_signature};
use orin_masternode::MasternodeList;
use orin_types::{Hash256, NetworkParams, OutPoint};
use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, ObjectValidity};
use crate::manager::{ChainAccess, RateChecks};
use crate::validators::ProposalValidator;
use crate::vote::{GovernanceVote, VoteOutcome, VoteSignal};
use crate::{GOVERNANCE_UPDATE_MIN, MAX_TIME_FUTURE_DEVIATION};

/// Kind of governance object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectType {
    /// Anything a future protocol version may define.
    Other = 0,
    /// A funding request voted on by masternodes.
    Proposal = 1,
    /// A proposed superblock payout table for a specific height.
    Trigger = 2,
}

/// The latest vote a masternode cast for one signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInstance {
    pub outcome: VoteOutcome,
    pub creation_time: i64,
    pub vote_hash: Hash256,
}

/// Per-masternode record of current votes, one instance per signal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub instances: BTreeMap<VoteSignal, VoteInstance>,
}

/// All votes ever accepted for an object, keyed by vote hash.
///
/// The file backs vote sync: peers receive exactly what is stored here.
/// Current-vote lookups go through the per-(outpoint, signal) cache on the
/// object instead of scanning the file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteFile {
    votes: BTreeMap<Hash256, GovernanceVote>,
}

impl VoteFile {
    pub fn add_vote(&mut self, vote: GovernanceVote) {
        self.votes.insert(vote.hash(), vote);
    }

    pub fn has_vote(&self, hash: &Hash256) -> bool {
        self.votes.contains_key(hash)
    }

    pub fn get_vote(&self, hash: &Hash256) -> Option<&GovernanceVote> {
        self.votes.get(hash)
    }

    pub fn remove_vote(&mut self, hash: &Hash256) {
        self.votes.remove(hash);
    }

    pub fn votes(&self) -> impl Iterator<Item = &GovernanceVote> {
        self.votes.values()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}

/// Validity, funding, and deletion state cached from the last vote count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFlags {
    pub funding: bool,
    pub valid: bool,
    pub delete: bool,
    pub endorsed: bool,
    pub expired: bool,
    /// Set whenever votes changed; cleared by the maintenance sweep after
    /// the flags above are recomputed.
    pub dirty: bool,
}

/// A proposal or trigger received from the network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceObject {
    pub object_type: ObjectType,
    /// Submitter-set creation time, validated against the adjusted clock.
    pub creation_time: i64,
    /// Fee transaction backing a proposal; zero for masternode objects.
    pub collateral_hash: Hash256,
    /// Collateral of the submitting masternode; null for fee-backed
    /// proposals.
    pub masternode_outpoint: OutPoint,
    pub signature: Vec<u8>,
    /// Opaque body bytes; JSON for proposals and triggers.
    pub payload: Vec<u8>,

    vote_file: VoteFile,
    current_votes: BTreeMap<OutPoint, VoteRecord>,
    pub flags: CachedFlags,
    /// Zero until the object is marked for deletion.
    pub deletion_time: i64,
}

impl GovernanceObject {
    pub fn new(
        object_type: ObjectType,
        creation_time: i64,
        collateral_hash: Hash256,
        masternode_outpoint: OutPoint,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            object_type,
            creation_time,
            collateral_hash,
            masternode_outpoint,
            signature: Vec::new(),
            payload,
            vote_file: VoteFile::default(),
            current_votes: BTreeMap::new(),
            flags: CachedFlags {
                valid: true,
                ..Default::default()
            },
            deletion_time: 0,
        }
    }

    /// Canonical content identifier.
    pub fn hash(&self) -> Hash256 {
        let fields = (
            self.object_type,
            self.creation_time,
            &self.collateral_hash,
            &self.masternode_outpoint,
            &self.payload,
        );
        let bytes = bincode::serialize(&fields).expect("object serialization is infallible");
        Hash256::new(sha256d(&bytes))
    }

    /// Hash of the payload body alone.
    pub fn data_hash(&self) -> Hash256 {
        Hash256::new(sha256d(&self.payload))
    }

    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    pub fn vote_file(&self) -> &VoteFile {
        &self.vote_file
    }

    /// Sign a masternode object (trigger) with the operator key.
    pub fn sign(&mut self, private_key: &[u8; 32]) {
        self.signature = sign_message(self.hash().as_bytes(), private_key).to_vec();
    }

    fn verify_signature_by(&self, public_key: &[u8; 32]) -> bool {
        let Ok(sig): Result<[u8; 64], _> = self.signature.as_slice().try_into() else {
            return false;
        };
        verify_signature(self.hash().as_bytes(), &sig, public_key)
    }

    /// Validate this object against local chain state.
    ///
    /// `check_collateral` is disabled when re-validating objects that
    /// already cleared fee confirmation.
    pub fn is_valid_locally(
        &self,
        now: i64,
        mn_list: &MasternodeList,
        chain: &dyn ChainAccess,
        params: &NetworkParams,
        check_collateral: bool,
    ) -> ObjectValidity {
        if self.creation_time > now + MAX_TIME_FUTURE_DEVIATION {
            return ObjectValidity::Invalid("creation time too far in the future".into());
        }
        match self.object_type {
            ObjectType::Proposal => {
                let validator = ProposalValidator::new(&self.payload);
                if let Err(e) = validator.validate() {
                    return ObjectValidity::Invalid(format!("invalid proposal data: {e}"));
                }
                if check_collateral {
                    return self.check_collateral(chain, params);
                }
                ObjectValidity::Valid
            }
            ObjectType::Trigger | ObjectType::Other => {
                if self.masternode_outpoint.is_null() {
                    return ObjectValidity::Invalid("masternode object without outpoint".into());
                }
                let Some(mn) = mn_list.get_by_collateral(&self.masternode_outpoint) else {
                    return ObjectValidity::Invalid(format!(
                        "masternode {} not found",
                        self.masternode_outpoint
                    ));
                };
                if !self.verify_signature_by(&mn.operator_key) {
                    return ObjectValidity::Invalid("invalid masternode signature".into());
                }
                ObjectValidity::Valid
            }
        }
    }

    fn check_collateral(&self, chain: &dyn ChainAccess, params: &NetworkParams) -> ObjectValidity {
        if self.collateral_hash.is_zero() {
            return ObjectValidity::Invalid("proposal without collateral".into());
        }
        let required = params.consensus.governance_fee_confirmations;
        match chain.collateral_confirmations(&self.collateral_hash) {
            None => ObjectValidity::Invalid(format!(
                "collateral tx {} not found",
                self.collateral_hash
            )),
            Some(confirmations) if confirmations < required => {
                ObjectValidity::MissingConfirmations(format!(
                    "collateral has {confirmations} of {required} confirmations"
                ))
            }
            Some(_) => ObjectValidity::Valid,
        }
    }

    /// Apply one vote to this object.
    ///
    /// `rate_checks` guards the per-(outpoint, signal) update spacing; it is
    /// disabled when draining orphan votes, which may arrive in bursts.
    pub fn process_vote(
        &mut self,
        mn_list: &MasternodeList,
        vote: &GovernanceVote,
        now: i64,
        rate_checks: RateChecks,
    ) -> Result<(), GovernanceError> {
        if mn_list
            .get_by_collateral(&vote.masternode_outpoint)
            .is_none()
        {
            return Err(GovernanceError::MasternodeUnknown(
                vote.masternode_outpoint.to_string(),
            ));
        }

        let record = self
            .current_votes
            .entry(vote.masternode_outpoint)
            .or_default();
        if let Some(existing) = record.instances.get(&vote.signal) {
            if vote.time <= existing.creation_time {
                return Err(GovernanceError::ObsoleteVote);
            }
            let elapsed = vote.time - existing.creation_time;
            if elapsed < GOVERNANCE_UPDATE_MIN && rate_checks == RateChecks::Enabled {
                return Err(GovernanceError::VoteTooFrequent { elapsed });
            }
        }

        let only_voting_key =
            self.object_type == ObjectType::Proposal && vote.signal == VoteSignal::Funding;
        if !vote.is_valid(now, mn_list, only_voting_key) {
            return Err(GovernanceError::InvalidVoteSignature);
        }

        record.instances.insert(
            vote.signal,
            VoteInstance {
                outcome: vote.outcome,
                creation_time: vote.time,
                vote_hash: vote.hash(),
            },
        );
        self.vote_file.add_vote(vote.clone());
        self.flags.dirty = true;
        Ok(())
    }

    /// The current vote of one masternode for one signal.
    pub fn get_current_vote(&self, outpoint: &OutPoint, signal: VoteSignal) -> Option<&VoteInstance> {
        self.current_votes.get(outpoint)?.instances.get(&signal)
    }

    /// Outpoints with at least one recorded vote.
    pub fn voting_outpoints(&self) -> impl Iterator<Item = &OutPoint> {
        self.current_votes.keys()
    }

    /// Weighted (yes, no, abstain) counts over enabled masternodes.
    pub fn count_signal(&self, mn_list: &MasternodeList, signal: VoteSignal) -> (i64, i64, i64) {
        let mut yes = 0i64;
        let mut no = 0i64;
        let mut abstain = 0i64;
        for (outpoint, record) in &self.current_votes {
            let Some(mn) = mn_list.get_by_collateral(outpoint) else {
                continue;
            };
            if !mn.valid {
                continue;
            }
            if let Some(instance) = record.instances.get(&signal) {
                let weight = mn.weight as i64;
                match instance.outcome {
                    VoteOutcome::Yes => yes += weight,
                    VoteOutcome::No => no += weight,
                    VoteOutcome::Abstain => abstain += weight,
                }
            }
        }
        (yes, no, abstain)
    }

    /// Weighted YES minus NO for a signal.
    pub fn get_absolute_yes_count(&self, mn_list: &MasternodeList, signal: VoteSignal) -> i64 {
        let (yes, no, _) = self.count_signal(mn_list, signal);
        yes - no
    }

    /// Recompute the funding/delete/endorsed flags from current votes.
    pub fn update_sentinel_variables(
        &mut self,
        mn_list: &MasternodeList,
        params: &NetworkParams,
        now: i64,
    ) {
        let mn_count = mn_list.valid_weighted_count() as i64;
        if mn_count == 0 {
            return;
        }
        let min_quorum = params.consensus.governance_min_quorum as i64;
        let abs_vote_req = min_quorum.max(mn_count / 10);
        let abs_delete_req = min_quorum.max(2 * mn_count / 3);

        self.flags.funding =
            self.get_absolute_yes_count(mn_list, VoteSignal::Funding) >= abs_vote_req;
        self.flags.endorsed =
            self.get_absolute_yes_count(mn_list, VoteSignal::Endorsed) >= abs_vote_req;

        if !self.flags.delete
            && self.get_absolute_yes_count(mn_list, VoteSignal::Delete) >= abs_delete_req
        {
            self.flags.delete = true;
            if self.deletion_time == 0 {
                self.deletion_time = now;
            }
        }
    }

    /// Mark for deletion; erased after the deletion delay elapses.
    pub fn prepare_deletion(&mut self, now: i64) {
        self.flags.delete = true;
        if self.deletion_time == 0 {
            self.deletion_time = now;
        }
    }

    pub fn set_expired(&mut self) {
        self.flags.expired = true;
    }

    /// An object in either of these states is never served to peers.
    pub fn is_set_cached_delete(&self) -> bool {
        self.flags.delete
    }

    pub fn is_set_expired(&self) -> bool {
        self.flags.expired
    }

    /// Drop every vote cast by `outpoint`. Returns the removed vote hashes
    /// so the manager can purge its cross-indexes.
    pub fn remove_votes_for(&mut self, outpoint: &OutPoint) -> Vec<Hash256> {
        if self.current_votes.remove(outpoint).is_none() {
            return Vec::new();
        }
        let removed: Vec<Hash256> = self
            .vote_file
            .votes()
            .filter(|v| v.masternode_outpoint == *outpoint)
            .map(|v| v.hash())
            .collect();
        for hash in &removed {
            self.vote_file.remove_vote(hash);
        }
        if !removed.is_empty() {
            self.flags.dirty = true;
        }
        removed
    }

    /// Drop votes from masternodes absent from the current list. Returns
    /// removed vote hashes.
    pub fn clear_unknown_masternode_votes(&mut self, mn_list: &MasternodeList) -> Vec<Hash256> {
        let stale: Vec<OutPoint> = self
            .current_votes
            .keys()
            .filter(|outpoint| !mn_list.has_collateral(outpoint))
            .copied()
            .collect();
        let mut removed = Vec::new();
        for outpoint in stale {
            removed.extend(self.remove_votes_for(&outpoint));
        }
        removed
    }
}
