//! Blocks, block-index entries, and undo data.

use crate::hash::Hash256;
use crate::transaction::{Transaction, TxOut};
use serde::{Deserialize, Serialize};

/// A block: its hash, parent link, and transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: Hash256,
    pub prev_hash: Hash256,
    pub time: u64,
    pub transactions: Vec<Transaction>,
}

/// The chain position of a block, as handed out by the chain manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndexEntry {
    pub hash: Hash256,
    pub height: u32,
    pub time: u64,
}

/// Undo data for a single transaction: the outputs its inputs spent,
/// in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxUndo {
    pub spent_outputs: Vec<TxOut>,
}

/// Undo data for a block.
///
/// One entry per non-coinbase transaction, in block order (the coinbase
/// spends nothing and has no entry).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUndo {
    pub tx_undos: Vec<TxUndo>,
}
