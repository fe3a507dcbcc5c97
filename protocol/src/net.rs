//! Narrow traits through which governance reaches the network layer.
//!
//! The transport itself is out of scope here; these traits are the only
//! surface the core depends on, so tests can supply recording doubles.

use crate::bloom::BloomFilter;
use crate::inv::Inv;
use orin_types::Hash256;

pub type PeerId = u64;

/// A snapshot of one connected peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub addr: String,
    /// Whether this connection relays data (block-relay-only peers do not).
    pub can_relay: bool,
    pub inbound: bool,
}

/// Outbound operations governance needs from the connection manager.
pub trait GovernanceNet: Send + Sync {
    /// Fully connected peers, snapshot at call time.
    fn peers(&self) -> Vec<PeerInfo>;

    /// Send a `govsync` request for one object (or all, when `hash` is zero)
    /// with a filter of already-known vote hashes.
    fn request_object(&self, peer: PeerId, hash: Hash256, filter: BloomFilter);

    /// Push a sync-status count notification to a peer.
    fn push_sync_status(&self, peer: PeerId, asset: u32, count: usize);

    /// Number of objects currently requested from a peer (in-flight invs).
    fn requested_object_count(&self, peer: PeerId) -> usize;

    /// Whether this node is itself an active masternode.
    fn is_active_masternode(&self) -> bool;
}

/// Sink for inventory announcements, drained by the relay scheduler job.
pub trait InvRelay: Send + Sync {
    fn relay_inv(&self, inv: Inv);
}
