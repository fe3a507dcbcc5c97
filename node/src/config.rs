//! Node configuration.

use orin_types::{NetworkId, NetworkParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level node configuration, deserialized from the config file with
/// every field optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Data directory holding the governance cache and indexes.
    pub data_dir: PathBuf,
    pub network: NetworkId,
    pub rpc_port: u16,
    /// "human" or "json".
    pub log_format: String,
    /// Default tracing filter, overridable via RUST_LOG.
    pub log_level: String,
    /// LMDB map size for the map-point index, in bytes.
    pub mappoint_index_map_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".orin"),
            network: NetworkId::Main,
            rpc_port: 9998,
            log_format: "human".to_owned(),
            log_level: "info".to_owned(),
            mappoint_index_map_size: 1 << 30,
        }
    }
}

impl NodeConfig {
    pub fn network_params(&self) -> NetworkParams {
        match self.network {
            NetworkId::Main => NetworkParams::main(),
            NetworkId::Testnet => NetworkParams::testnet(),
            NetworkId::Regtest => NetworkParams::regtest(),
        }
    }
}
