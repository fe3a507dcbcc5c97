//! Transaction outpoint: a reference to a specific output of a transaction.

use crate::hash::Hash256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (txid, output index) pair identifying a transaction output.
///
/// Masternodes are identified throughout governance by their collateral
/// outpoint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    /// The null outpoint used by coinbase inputs and fee-backed proposals.
    pub const NULL: Self = Self {
        txid: Hash256::ZERO,
        vout: u32::MAX,
    };

    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Debug for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutPoint({:?}:{})", self.txid, self.vout)
    }
}

impl fmt::Display for OutPoint {
    /// Short form: first 8 hex chars of the txid plus the index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.txid.to_string();
        write!(f, "{}:{}", &hex[..8], self.vout)
    }
}
