//! Transactions.

use crate::amount::Amount;
use crate::hash::Hash256;
use crate::outpoint::OutPoint;
use crate::script::Script;
use orin_crypto::sha256d;
use serde::{Deserialize, Serialize};

/// A transaction input spending a previous output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
}

impl TxIn {
    pub fn new(prevout: OutPoint) -> Self {
        Self { prevout }
    }
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script: Script,
}

impl TxOut {
    pub fn new(value: Amount, script: Script) -> Self {
        Self { value, script }
    }
}

/// A transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u16,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// The transaction id: sha256d over the canonical serialization.
    pub fn txid(&self) -> Hash256 {
        let bytes = bincode::serialize(self).expect("transaction serialization is infallible");
        Hash256::new(sha256d(&bytes))
    }

    /// A coinbase transaction has exactly one input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    #[test]
    fn txid_is_deterministic() {
        let tx = Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::from_low_u64(1), 0))],
            vec![TxOut::new(
                Amount::from_coins(1),
                Script::pay_to_address(&Address::from_key_hash(&[1u8; 20])).unwrap(),
            )],
        );
        assert_eq!(tx.txid(), tx.txid());
    }

    #[test]
    fn coinbase_detection() {
        let coinbase = Transaction::new(vec![TxIn::new(OutPoint::NULL)], vec![]);
        assert!(coinbase.is_coinbase());

        let normal = Transaction::new(
            vec![TxIn::new(OutPoint::new(Hash256::from_low_u64(5), 1))],
            vec![],
        );
        assert!(!normal.is_coinbase());
    }
}
