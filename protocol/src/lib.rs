//! Wire-level vocabulary shared between the node's subsystems and the peer
//! manager: inventory types, bloom filters, the message-processing result
//! value, and the narrow traits through which governance talks to the
//! network layer.

pub mod bloom;
pub mod fulfilled;
pub mod inv;
pub mod msg_result;
pub mod net;

pub use bloom::BloomFilter;
pub use fulfilled::FulfilledRequestTracker;
pub use inv::{Inv, InvType};
pub use msg_result::{FilterPayload, MessageProcessingResult, MisbehavingError};
pub use net::{GovernanceNet, InvRelay, PeerId, PeerInfo};

/// Wire command for a governance sync request.
pub const MSG_GOVERNANCE_SYNC: &str = "govsync";
/// Wire command for a governance object broadcast.
pub const MSG_GOVERNANCE_OBJECT_CMD: &str = "govobj";
/// Wire command for a governance vote broadcast.
pub const MSG_GOVERNANCE_VOTE_CMD: &str = "govobjvote";

/// Sync-status asset id for governance objects.
pub const MASTERNODE_SYNC_GOVOBJ: u32 = 10;
/// Sync-status asset id for governance object votes.
pub const MASTERNODE_SYNC_GOVOBJ_VOTE: u32 = 11;

/// Maximum number of inventory entries a peer may have in flight.
pub const MAX_INV_SZ: usize = 50_000;
