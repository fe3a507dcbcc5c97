//! Superblock trigger views.
//!
//! A trigger object proposes the payout table of one superblock. The view
//! here is a materialized index over the trigger's payload, discarded
//! whenever the backing object is removed; it never owns the object.

use orin_types::{Address, Amount, Hash256, NetworkParams, Script};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::object::{GovernanceObject, ObjectType};

/// Lifecycle of a trigger view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeenObjectStatus {
    Unknown,
    Valid,
    Executed,
    ErrorInvalid,
}

/// One coinbase payout of a superblock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernancePayment {
    pub script: Script,
    pub amount: Amount,
}

/// JSON body of a trigger object.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct TriggerPayload {
    event_block_height: u32,
    payments: Vec<PaymentEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PaymentEntry {
    address: String,
    amount: i64,
}

/// Materialized view over one TRIGGER object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    governance_obj_hash: Hash256,
    block_height: u32,
    payments: Vec<GovernancePayment>,
    status: SeenObjectStatus,
}

impl Superblock {
    /// Parse the trigger payload of `obj` into a view.
    pub fn from_object(obj: &GovernanceObject, hash: Hash256) -> Result<Self, GovernanceError> {
        if obj.object_type != ObjectType::Trigger {
            return Err(GovernanceError::InvalidTrigger(
                "object is not a trigger".into(),
            ));
        }
        let payload: TriggerPayload = serde_json::from_slice(&obj.payload)
            .map_err(|e| GovernanceError::InvalidTrigger(format!("malformed payload: {e}")))?;

        if payload.payments.is_empty() {
            return Err(GovernanceError::InvalidTrigger("no payments".into()));
        }
        let mut payments = Vec::with_capacity(payload.payments.len());
        for entry in &payload.payments {
            let address = Address::new(entry.address.clone());
            let script = Script::pay_to_address(&address).ok_or_else(|| {
                GovernanceError::InvalidTrigger(format!("invalid address {}", entry.address))
            })?;
            if entry.amount <= 0 {
                return Err(GovernanceError::InvalidTrigger(format!(
                    "non-positive amount {}",
                    entry.amount
                )));
            }
            payments.push(GovernancePayment {
                script,
                amount: Amount::new(entry.amount),
            });
        }

        Ok(Self {
            governance_obj_hash: hash,
            block_height: payload.event_block_height,
            payments,
            status: SeenObjectStatus::Unknown,
        })
    }

    /// Build the canonical JSON payload for a trigger (used by submitters
    /// and tests).
    pub fn build_payload(event_block_height: u32, payments: &[(Address, Amount)]) -> Vec<u8> {
        let payload = TriggerPayload {
            event_block_height,
            payments: payments
                .iter()
                .map(|(address, amount)| PaymentEntry {
                    address: address.as_str().to_owned(),
                    amount: amount.units(),
                })
                .collect(),
        };
        serde_json::to_vec(&payload).expect("trigger payload serialization is infallible")
    }

    /// Superblocks occur only at cycle boundaries.
    pub fn is_valid_block_height(height: u32, params: &NetworkParams) -> bool {
        height > 0 && height % params.consensus.superblock_cycle == 0
    }

    /// A trigger expires one cycle past its target height.
    pub fn is_expired(&self, cached_height: u32, params: &NetworkParams) -> bool {
        cached_height > self.block_height.saturating_add(params.consensus.superblock_cycle)
    }

    pub fn governance_obj_hash(&self) -> Hash256 {
        self.governance_obj_hash
    }

    pub fn block_height(&self) -> u32 {
        self.block_height
    }

    pub fn payments(&self) -> &[GovernancePayment] {
        &self.payments
    }

    pub fn status(&self) -> SeenObjectStatus {
        self.status
    }

    pub fn set_status(&mut self, status: SeenObjectStatus) {
        self.status = status;
    }

    pub fn set_executed(&mut self) {
        self.status = SeenObjectStatus::Executed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orin_types::OutPoint;

    fn trigger_with_payload(payload: Vec<u8>) -> GovernanceObject {
        GovernanceObject::new(
            ObjectType::Trigger,
            1000,
            Hash256::ZERO,
            OutPoint::new(Hash256::from_low_u64(1), 0),
            payload,
        )
    }

    #[test]
    fn parses_valid_trigger() {
        let addr = Address::from_key_hash(&[3u8; 20]);
        let payload = Superblock::build_payload(100, &[(addr, Amount::from_coins(5))]);
        let obj = trigger_with_payload(payload);
        let sb = Superblock::from_object(&obj, obj.hash()).unwrap();
        assert_eq!(sb.block_height(), 100);
        assert_eq!(sb.payments().len(), 1);
        assert_eq!(sb.payments()[0].amount, Amount::from_coins(5));
    }

    #[test]
    fn rejects_bad_triggers() {
        let addr = Address::from_key_hash(&[3u8; 20]);
        let cases = [
            trigger_with_payload(b"nope".to_vec()),
            trigger_with_payload(Superblock::build_payload(100, &[])),
            trigger_with_payload(Superblock::build_payload(
                100,
                &[(Address::new("bogus"), Amount::from_coins(5))],
            )),
            trigger_with_payload(Superblock::build_payload(100, &[(addr, Amount::ZERO)])),
        ];
        for obj in cases {
            assert!(Superblock::from_object(&obj, obj.hash()).is_err());
        }
    }

    #[test]
    fn rejects_non_trigger_objects() {
        let mut obj = trigger_with_payload(Superblock::build_payload(
            100,
            &[(Address::from_key_hash(&[3u8; 20]), Amount::from_coins(5))],
        ));
        obj.object_type = ObjectType::Proposal;
        assert!(Superblock::from_object(&obj, obj.hash()).is_err());
    }

    #[test]
    fn height_validity_and_expiry() {
        let params = NetworkParams::regtest(); // cycle = 10
        assert!(Superblock::is_valid_block_height(10, &params));
        assert!(Superblock::is_valid_block_height(20, &params));
        assert!(!Superblock::is_valid_block_height(0, &params));
        assert!(!Superblock::is_valid_block_height(15, &params));

        let addr = Address::from_key_hash(&[3u8; 20]);
        let obj = trigger_with_payload(Superblock::build_payload(
            10,
            &[(addr, Amount::from_coins(5))],
        ));
        let sb = Superblock::from_object(&obj, obj.hash()).unwrap();
        assert!(!sb.is_expired(20, &params));
        assert!(sb.is_expired(21, &params));
    }
}
