//! Fundamental types for the Orin node.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, outpoints, addresses, amounts, scripts, transactions,
//! blocks, timestamps, and network parameters.

pub mod address;
pub mod amount;
pub mod block;
pub mod hash;
pub mod outpoint;
pub mod params;
pub mod script;
pub mod time;
pub mod transaction;

pub use address::Address;
pub use amount::Amount;
pub use block::{Block, BlockIndexEntry, BlockUndo, TxUndo};
pub use hash::Hash256;
pub use outpoint::OutPoint;
pub use params::{ConsensusParams, NetworkId, NetworkParams};
pub use script::Script;
pub use time::Timestamp;
pub use transaction::{Transaction, TxIn, TxOut};
