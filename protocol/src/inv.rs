//! Inventory announcements.

use orin_types::Hash256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inventory type identifiers. Values are fixed by the wire protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum InvType {
    GovernanceObject = 23,
    GovernanceObjectVote = 24,
}

/// A (type, hash) inventory entry announced to peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inv {
    pub inv_type: InvType,
    pub hash: Hash256,
}

impl Inv {
    pub fn new(inv_type: InvType, hash: Hash256) -> Self {
        Self { inv_type, hash }
    }
}

impl fmt::Display for Inv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.inv_type {
            InvType::GovernanceObject => "govobj",
            InvType::GovernanceObjectVote => "govobjvote",
        };
        write!(f, "{} {}", name, self.hash)
    }
}
