//! Proposal payload validation.
//!
//! Proposal bodies are JSON descriptors. Validation is pure text/shape
//! checking; chain-aware checks (collateral) live on the object.

use orin_types::Address;
use serde::{Deserialize, Serialize};

/// Maximum length of a proposal name.
const MAX_NAME_SIZE: usize = 40;
/// Maximum length of a proposal URL.
const MAX_URL_SIZE: usize = 255;

/// The JSON body of a proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalPayload {
    pub name: String,
    pub url: String,
    pub payment_address: String,
    /// Payment per superblock, in base units.
    pub payment_amount: i64,
    pub start_epoch: i64,
    pub end_epoch: i64,
}

/// Validates the plaintext form of a proposal payload.
pub struct ProposalValidator<'a> {
    payload: &'a [u8],
}

impl<'a> ProposalValidator<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn parse(&self) -> Result<ProposalPayload, String> {
        serde_json::from_slice(self.payload).map_err(|e| format!("malformed JSON: {e}"))
    }

    pub fn validate(&self) -> Result<(), String> {
        let proposal = self.parse()?;

        if proposal.name.is_empty() || proposal.name.len() > MAX_NAME_SIZE {
            return Err(format!(
                "invalid name length {} (1-{MAX_NAME_SIZE})",
                proposal.name.len()
            ));
        }
        if !proposal
            .name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
        {
            return Err("name contains invalid characters".into());
        }

        if proposal.url.len() < 4 || proposal.url.len() > MAX_URL_SIZE {
            return Err(format!(
                "invalid url length {} (4-{MAX_URL_SIZE})",
                proposal.url.len()
            ));
        }
        if !proposal.url.starts_with("http://") && !proposal.url.starts_with("https://") {
            return Err("url must start with http:// or https://".into());
        }

        if Address::new(proposal.payment_address.clone()).key_hash().is_none() {
            return Err(format!(
                "invalid payment address {}",
                proposal.payment_address
            ));
        }

        if proposal.payment_amount <= 0 {
            return Err("payment amount must be positive".into());
        }

        if proposal.start_epoch <= 0 || proposal.end_epoch <= 0 {
            return Err("epochs must be positive".into());
        }
        if proposal.start_epoch >= proposal.end_epoch {
            return Err("start epoch must precede end epoch".into());
        }

        Ok(())
    }
}
