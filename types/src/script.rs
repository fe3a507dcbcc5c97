//! Output scripts.
//!
//! Only the opcodes the node actually inspects are modelled: OP_RETURN data
//! carriers (unspendable outputs used for map-point payloads) and the
//! pay-to-pubkey-hash template used for destination extraction.

use crate::address::Address;
use serde::{Deserialize, Serialize};

pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;

/// Maximum script size; anything larger is unspendable by policy.
const MAX_SCRIPT_SIZE: usize = 10_000;

/// A raw output script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Build an OP_RETURN data carrier script.
    pub fn op_return(payload: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(payload.len() + 3);
        bytes.push(OP_RETURN);
        push_data(&mut bytes, payload);
        Self(bytes)
    }

    /// Build the standard pay-to-pubkey-hash script for an address.
    ///
    /// Returns `None` for addresses that do not decode to a key hash.
    pub fn pay_to_address(address: &Address) -> Option<Self> {
        let hash = address.key_hash()?;
        let mut bytes = Vec::with_capacity(25);
        bytes.push(OP_DUP);
        bytes.push(OP_HASH160);
        bytes.push(20);
        bytes.extend_from_slice(&hash);
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        Some(Self(bytes))
    }

    /// An output is unspendable when it is a data carrier or oversized.
    pub fn is_unspendable(&self) -> bool {
        (!self.0.is_empty() && self.0[0] == OP_RETURN) || self.0.len() > MAX_SCRIPT_SIZE
    }

    /// Extract the pushed payload from an `OP_RETURN <push>` script.
    ///
    /// Returns `None` unless the script starts with OP_RETURN followed by a
    /// single non-empty data push.
    pub fn op_return_payload(&self) -> Option<&[u8]> {
        let bytes = &self.0;
        if bytes.first() != Some(&OP_RETURN) {
            return None;
        }
        let (data, _) = read_push(&bytes[1..])?;
        if data.is_empty() {
            return None;
        }
        Some(data)
    }

    /// Extract the destination address from a standard spendable script.
    pub fn extract_destination(&self) -> Option<Address> {
        let b = &self.0;
        // Pay-to-pubkey-hash template.
        if b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == 20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
        {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&b[3..23]);
            return Some(Address::from_key_hash(&hash));
        }
        None
    }
}

/// Append a minimal push of `data` to `out`.
fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0..=75 => out.push(data.len() as u8),
        76..=255 => {
            out.push(OP_PUSHDATA1);
            out.push(data.len() as u8);
        }
        256..=65535 => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        }
        _ => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
}

/// Read a single data push from the front of `bytes`.
///
/// Returns the pushed data and the number of bytes consumed.
fn read_push(bytes: &[u8]) -> Option<(&[u8], usize)> {
    let opcode = *bytes.first()?;
    let (len, header) = match opcode {
        1..=75 => (opcode as usize, 1),
        OP_PUSHDATA1 => (*bytes.get(1)? as usize, 2),
        OP_PUSHDATA2 => {
            let len = u16::from_le_bytes([*bytes.get(1)?, *bytes.get(2)?]) as usize;
            (len, 3)
        }
        OP_PUSHDATA4 => {
            let len = u32::from_le_bytes([
                *bytes.get(1)?,
                *bytes.get(2)?,
                *bytes.get(3)?,
                *bytes.get(4)?,
            ]) as usize;
            (len, 5)
        }
        _ => return None,
    };
    let data = bytes.get(header..header + len)?;
    Some((data, header + len))
}
