//! Network and consensus parameters.

use serde::{Deserialize, Serialize};

/// Which network the node is running on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkId {
    Main,
    Testnet,
    /// Local test network with mockable timing.
    Regtest,
}

/// Consensus parameters relevant to governance and superblocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Number of blocks between superblocks.
    pub superblock_cycle: u32,
    /// Target block spacing in seconds.
    pub pow_target_spacing: u32,
    /// Minimum absolute YES votes for a proposal or trigger to act,
    /// regardless of masternode count.
    pub governance_min_quorum: u32,
    /// Element count used when building vote bloom filters.
    pub governance_filter_elements: u32,
    /// Confirmations a proposal collateral needs before the object goes live.
    pub governance_fee_confirmations: u32,
}

/// Full per-network parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub id: NetworkId,
    pub consensus: ConsensusParams,
}

impl NetworkParams {
    pub fn main() -> Self {
        Self {
            id: NetworkId::Main,
            consensus: ConsensusParams {
                superblock_cycle: 16616,
                pow_target_spacing: 150,
                governance_min_quorum: 10,
                governance_filter_elements: 20_000,
                governance_fee_confirmations: 6,
            },
        }
    }

    pub fn testnet() -> Self {
        Self {
            id: NetworkId::Testnet,
            consensus: ConsensusParams {
                superblock_cycle: 24,
                pow_target_spacing: 150,
                governance_min_quorum: 1,
                governance_filter_elements: 500,
                governance_fee_confirmations: 1,
            },
        }
    }

    pub fn regtest() -> Self {
        Self {
            id: NetworkId::Regtest,
            consensus: ConsensusParams {
                superblock_cycle: 10,
                pow_target_spacing: 1,
                governance_min_quorum: 1,
                governance_filter_elements: 100,
                governance_fee_confirmations: 1,
            },
        }
    }

    /// Length of one superblock cycle in seconds.
    pub fn superblock_cycle_seconds(&self) -> i64 {
        self.consensus.superblock_cycle as i64 * self.consensus.pow_target_spacing as i64
    }

    /// Mockable chains run with tighter timings in tests.
    pub fn is_mockable(&self) -> bool {
        self.id == NetworkId::Regtest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_seconds() {
        assert_eq!(NetworkParams::main().superblock_cycle_seconds(), 16616 * 150);
        assert_eq!(NetworkParams::regtest().superblock_cycle_seconds(), 10);
    }

    #[test]
    fn only_regtest_is_mockable() {
        assert!(!NetworkParams::main().is_mockable());
        assert!(!NetworkParams::testnet().is_mockable());
        assert!(NetworkParams::regtest().is_mockable());
    }
}
