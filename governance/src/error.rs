use thiserror::Error;

/// Errors raised while processing governance objects and votes.
///
/// Each error carries the ban-score penalty the sending peer earns;
/// transient conditions (orphans, duplicates) carry none.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("unknown parent object {0}")]
    UnknownParentObject(String),

    #[error("duplicate vote {0}")]
    DuplicateVote(String),

    #[error("old invalid vote {0}")]
    KnownInvalidVote(String),

    #[error("vote for expired or deleted object {0}")]
    ObjectDeleted(String),

    #[error("obsolete vote: timestamp not newer than the current vote")]
    ObsoleteVote,

    #[error("masternode updated its vote too often, only {elapsed}s since the last update")]
    VoteTooFrequent { elapsed: i64 },

    #[error("masternode {0} not found in the deterministic list")]
    MasternodeUnknown(String),

    #[error("invalid vote signature")]
    InvalidVoteSignature,

    #[error("invalid trigger payload: {0}")]
    InvalidTrigger(String),

    #[error("cache file error: {0}")]
    Cache(String),
}

impl GovernanceError {
    /// Ban score to apply to the peer that sent the offending message.
    pub fn node_penalty(&self) -> i32 {
        match self {
            GovernanceError::KnownInvalidVote(_) => 20,
            GovernanceError::VoteTooFrequent { .. } => 20,
            GovernanceError::InvalidVoteSignature => 20,
            _ => 0,
        }
    }
}

/// Outcome of validating a governance object against local chain state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObjectValidity {
    Valid,
    /// The collateral transaction exists but needs more confirmations;
    /// the object is postponed, not rejected.
    MissingConfirmations(String),
    Invalid(String),
}

impl ObjectValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, ObjectValidity::Valid)
    }
}
