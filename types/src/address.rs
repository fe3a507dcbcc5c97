//! Encoded destination addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A destination address string, as extracted from a spendable script.
///
/// The encoding is `orin1` followed by the hex of the 20-byte key hash.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

const PREFIX: &str = "orin1";

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Encode a 20-byte public key hash into its address form.
    pub fn from_key_hash(hash: &[u8; 20]) -> Self {
        let mut s = String::with_capacity(PREFIX.len() + 40);
        s.push_str(PREFIX);
        for b in hash {
            s.push_str(&format!("{:02x}", b));
        }
        Self(s)
    }

    /// Decode the 20-byte key hash, if this is a well-formed address.
    pub fn key_hash(&self) -> Option<[u8; 20]> {
        let hex = self.0.strip_prefix(PREFIX)?;
        if hex.len() != 40 {
            return None;
        }
        let mut out = [0u8; 20];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            out[i] = (hi * 16 + lo) as u8;
        }
        Some(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_hash_round_trip() {
        let hash = [0x5A; 20];
        let addr = Address::from_key_hash(&hash);
        assert_eq!(addr.key_hash(), Some(hash));
    }

    #[test]
    fn malformed_address_has_no_key_hash() {
        assert!(Address::new("not-an-address").key_hash().is_none());
        assert!(Address::new("orin1abcd").key_hash().is_none());
    }
}
