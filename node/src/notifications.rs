//! Chain-notification dispatch.
//!
//! The validation layer emits events as the tip moves; this handler fans
//! them out to the map-point index runtime and the governance manager.
//! Events are dispatched without any chain lock held, so the subsystems
//! are free to take their own mutexes.

use std::sync::Arc;

use orin_governance::GovernanceManager;
use orin_mappoint_index::IndexRuntime;
use orin_types::{Block, BlockIndexEntry, Timestamp};

/// A chain-tip movement.
#[derive(Clone, Debug)]
pub enum ChainEvent {
    BlockConnected {
        block: Block,
        entry: BlockIndexEntry,
    },
    BlocksDisconnected {
        from_tip: BlockIndexEntry,
        to_tip: BlockIndexEntry,
    },
}

pub struct ChainNotificationHandler {
    governance: Arc<GovernanceManager>,
    index_runtime: Arc<IndexRuntime>,
}

impl ChainNotificationHandler {
    pub fn new(governance: Arc<GovernanceManager>, index_runtime: Arc<IndexRuntime>) -> Self {
        Self {
            governance,
            index_runtime,
        }
    }

    /// Apply one event. Returns `false` when indexing failed and must halt;
    /// governance updates are applied regardless.
    pub fn handle(&self, event: &ChainEvent, now: Timestamp) -> bool {
        match event {
            ChainEvent::BlockConnected { block, entry } => {
                let indexed = self.index_runtime.on_block_connected(block, entry);
                self.governance.updated_block_tip(entry, now);
                indexed
            }
            ChainEvent::BlocksDisconnected { from_tip, to_tip } => {
                let rewound = self.index_runtime.on_blocks_disconnected(from_tip, to_tip);
                self.governance.updated_block_tip(to_tip, now);
                rewound
            }
        }
    }
}
