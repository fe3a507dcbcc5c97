//! Declarative result of processing one inbound peer message.
//!
//! Subsystem handlers (governance, locks) run outside the peer manager and
//! must not know its internals. Instead of calling back into it, a handler
//! returns a [`MessageProcessingResult`] enumerating its intents; the peer
//! manager applies them in the order {penalize, erase, relay-inv,
//! relay-filter, request-tx, relay-tx}.

use crate::inv::Inv;
use orin_types::{Hash256, Transaction};

/// A peer misbehaved; apply `score` to its ban score.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MisbehavingError {
    pub score: i32,
    pub message: String,
}

impl MisbehavingError {
    pub fn new(score: i32) -> Self {
        Self {
            score,
            message: String::new(),
        }
    }

    pub fn with_message(score: i32, message: impl Into<String>) -> Self {
        Self {
            score,
            message: message.into(),
        }
    }
}

/// Payload attached to a filtered inventory relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterPayload {
    /// Relay the full transaction to peers whose filters match.
    Tx(Transaction),
    /// Relay by hash only.
    Hash(Hash256),
}

/// Intents produced by an inbound message handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageProcessingResult {
    /// Triggers a misbehaving penalty against the sending peer.
    pub error: Option<MisbehavingError>,
    /// Inventories to announce to connected peers.
    pub inventory: Vec<Inv>,
    /// Inventory relayed only to peers whose filter matches the payload.
    pub inv_filter: Option<(Inv, FilterPayload)>,
    /// Ask connected peers to relay this transaction.
    pub request_tx: Option<Hash256>,
    /// Transactions ready for relay to tx-accepting peers.
    pub transactions: Vec<Hash256>,
    /// Erase this inventory from the peer manager's pending-request map.
    pub to_erase: Option<Inv>,
}

impl MessageProcessingResult {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Inv> for MessageProcessingResult {
    fn from(inv: Inv) -> Self {
        Self {
            inventory: vec![inv],
            ..Default::default()
        }
    }
}

impl From<MisbehavingError> for MessageProcessingResult {
    fn from(error: MisbehavingError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }
}
