//! Governance votes.

use orin_crypto::{sha256d, sign_message, verify_signature};
use orin_masternode::MasternodeList;
use orin_types::{Hash256, OutPoint};
use serde::{Deserialize, Serialize};

use crate::MAX_TIME_FUTURE_DEVIATION;

/// What a vote is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteSignal {
    Funding = 1,
    Valid = 2,
    Delete = 3,
    Endorsed = 4,
}

/// The direction of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VoteOutcome {
    Yes = 1,
    No = 2,
    Abstain = 3,
}

/// A masternode's vote on a governance object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceVote {
    pub masternode_outpoint: OutPoint,
    pub parent_hash: Hash256,
    pub signal: VoteSignal,
    pub outcome: VoteOutcome,
    pub time: i64,
    pub signature: Vec<u8>,
}

impl GovernanceVote {
    pub fn new(
        masternode_outpoint: OutPoint,
        parent_hash: Hash256,
        signal: VoteSignal,
        outcome: VoteOutcome,
        time: i64,
    ) -> Self {
        Self {
            masternode_outpoint,
            parent_hash,
            signal,
            outcome,
            time,
            signature: Vec::new(),
        }
    }

    /// The vote's identity: a hash over everything except the signature.
    pub fn hash(&self) -> Hash256 {
        Hash256::new(sha256d(&self.signing_payload()))
    }

    fn signing_payload(&self) -> Vec<u8> {
        let fields = (
            &self.masternode_outpoint,
            &self.parent_hash,
            self.signal,
            self.outcome,
            self.time,
        );
        bincode::serialize(&fields).expect("vote serialization is infallible")
    }

    pub fn sign(&mut self, private_key: &[u8; 32]) {
        self.signature = sign_message(&self.signing_payload(), private_key).to_vec();
    }

    fn verify(&self, public_key: &[u8; 32]) -> bool {
        let Ok(sig): Result<[u8; 64], _> = self.signature.as_slice().try_into() else {
            return false;
        };
        verify_signature(&self.signing_payload(), &sig, public_key)
    }

    /// Validate the vote against the deterministic masternode list.
    ///
    /// Rejects far-future timestamps and signatures not made by the
    /// masternode's voting key. Funding votes on proposals must come from
    /// the voting key; for other signals the operator key is also accepted
    /// when `only_voting_key_allowed` is false.
    pub fn is_valid(
        &self,
        now: i64,
        mn_list: &MasternodeList,
        only_voting_key_allowed: bool,
    ) -> bool {
        if self.time > now + MAX_TIME_FUTURE_DEVIATION {
            return false;
        }
        let Some(mn) = mn_list.get_by_collateral(&self.masternode_outpoint) else {
            return false;
        };
        if self.verify(&mn.voting_key) {
            return true;
        }
        if !only_voting_key_allowed && self.verify(&mn.operator_key) {
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orin_crypto::public_key;
    use orin_masternode::MasternodeEntry;

    fn list_with_mn(voting_seed: [u8; 32], operator_seed: [u8; 32]) -> (MasternodeList, OutPoint) {
        let outpoint = OutPoint::new(Hash256::from_low_u64(1), 0);
        let mut list = MasternodeList::new(Hash256::ZERO, 100);
        list.add(MasternodeEntry {
            collateral: outpoint,
            voting_key: public_key(&voting_seed),
            operator_key: public_key(&operator_seed),
            weight: 1,
            valid: true,
        });
        (list, outpoint)
    }

    fn make_vote(outpoint: OutPoint, time: i64) -> GovernanceVote {
        GovernanceVote::new(
            outpoint,
            Hash256::from_low_u64(7),
            VoteSignal::Funding,
            VoteOutcome::Yes,
            time,
        )
    }

    #[test]
    fn hash_ignores_signature() {
        let (_, outpoint) = list_with_mn([1; 32], [2; 32]);
        let mut vote = make_vote(outpoint, 1000);
        let unsigned = vote.hash();
        vote.sign(&[1; 32]);
        assert_eq!(vote.hash(), unsigned);
    }

    #[test]
    fn voting_key_signature_is_valid() {
        let (list, outpoint) = list_with_mn([1; 32], [2; 32]);
        let mut vote = make_vote(outpoint, 1000);
        vote.sign(&[1; 32]);
        assert!(vote.is_valid(1000, &list, true));
    }

    #[test]
    fn operator_key_only_when_allowed() {
        let (list, outpoint) = list_with_mn([1; 32], [2; 32]);
        let mut vote = make_vote(outpoint, 1000);
        vote.sign(&[2; 32]);
        assert!(!vote.is_valid(1000, &list, true));
        assert!(vote.is_valid(1000, &list, false));
    }

    #[test]
    fn unknown_masternode_is_invalid() {
        let (list, _) = list_with_mn([1; 32], [2; 32]);
        let mut vote = make_vote(OutPoint::new(Hash256::from_low_u64(99), 0), 1000);
        vote.sign(&[1; 32]);
        assert!(!vote.is_valid(1000, &list, true));
    }

    #[test]
    fn far_future_vote_is_invalid() {
        let (list, outpoint) = list_with_mn([1; 32], [2; 32]);
        let mut vote = make_vote(outpoint, 1000 + MAX_TIME_FUTURE_DEVIATION + 1);
        vote.sign(&[1; 32]);
        assert!(!vote.is_valid(1000, &list, true));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let (list, outpoint) = list_with_mn([1; 32], [2; 32]);
        let mut vote = make_vote(outpoint, 1000);
        vote.sign(&[9; 32]);
        assert!(!vote.is_valid(1000, &list, false));
    }
}
