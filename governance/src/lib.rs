//! Masternode governance.
//!
//! An in-memory, persistently-checkpointed store of governance objects
//! (proposals and triggers) and their votes, synchronized with peers via a
//! gossip protocol. Drives superblock selection and applies per-masternode
//! rate limiting and orphan/postponement logic to tolerate out-of-order
//! arrival.

pub mod cache;
pub mod error;
pub mod manager;
pub mod object;
pub mod persist;
pub mod ratelimit;
pub mod store;
pub mod superblock;
pub mod validators;
pub mod vote;

pub use error::{GovernanceError, ObjectValidity};
pub use manager::{ChainAccess, GovernanceManager, GovernanceMessage, RateChecks};
pub use object::{GovernanceObject, ObjectType};
pub use store::GovernanceStore;
pub use superblock::{GovernancePayment, Superblock};
pub use vote::{GovernanceVote, VoteOutcome, VoteSignal};

/// Capacity of the bounded caches (invalid votes, orphan votes, vote index).
pub const MAX_CACHE_SIZE: usize = 1_000_000;

/// Grace period between an object being marked for deletion and its erasure.
pub const GOVERNANCE_DELETION_DELAY: i64 = 10 * 60;

/// How long an orphan vote waits for its parent object.
pub const GOVERNANCE_ORPHAN_EXPIRATION_TIME: i64 = 10 * 60;

/// Maximum accepted clock skew on submitted objects.
pub const MAX_TIME_FUTURE_DEVIATION: i64 = 60 * 60;

/// How long a requested hash stays valid before the slot expires.
pub const RELIABLE_PROPAGATION_TIME: i64 = 60;

/// Minimum spacing between updates of the same (masternode, signal) vote.
pub const GOVERNANCE_UPDATE_MIN: i64 = 60 * 60;

/// Version tag of the on-disk governance cache format.
pub const SERIALIZATION_VERSION_STRING: &str = "CGovernanceManager-Version-16";
