//! Chain-sync runtime for the map-point index.
//!
//! Keeps the index in line with the canonical chain: replays missed blocks
//! on startup, applies connect/disconnect notifications afterwards. Any
//! storage failure halts indexing until restart; `rebuild` wipes the store
//! and replays from genesis.

use std::sync::Arc;

use orin_types::{Block, BlockIndexEntry};

use crate::index::{MapPointIndex, UndoProvider};

/// Read access to the canonical chain, supplied by chain storage.
pub trait BlockSource: Send + Sync {
    fn tip(&self) -> Option<BlockIndexEntry>;
    fn entry_at_height(&self, height: u32) -> Option<BlockIndexEntry>;
    fn block_at_height(&self, height: u32) -> Option<Block>;
}

pub struct IndexRuntime {
    index: Arc<MapPointIndex>,
    source: Arc<dyn BlockSource>,
    undo: Arc<dyn UndoProvider>,
}

impl IndexRuntime {
    pub fn new(
        index: Arc<MapPointIndex>,
        source: Arc<dyn BlockSource>,
        undo: Arc<dyn UndoProvider>,
    ) -> Self {
        Self {
            index,
            source,
            undo,
        }
    }

    pub fn index(&self) -> &Arc<MapPointIndex> {
        &self.index
    }

    /// Replay every canonical block the index has not seen yet.
    ///
    /// Returns `false` when indexing must halt: a storage failure, or a
    /// best-block that is no longer on the canonical chain (a reorg the
    /// node processed while the index was offline; `rebuild` recovers).
    pub fn sync_to_tip(&self) -> bool {
        let Some(tip) = self.source.tip() else {
            return true;
        };

        let start = match self.index.best_block() {
            Ok(Some(best)) => {
                match self.source.entry_at_height(best.height) {
                    Some(entry) if entry.hash == best.hash => best.height + 1,
                    _ => {
                        tracing::error!(height = best.height, hash = %best.hash,
                            "indexed best block is not on the canonical chain; rebuild required");
                        return false;
                    }
                }
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::error!(error = %e, "failed to read indexed best block");
                return false;
            }
        };

        for height in start..=tip.height {
            let (Some(block), Some(entry)) = (
                self.source.block_at_height(height),
                self.source.entry_at_height(height),
            ) else {
                tracing::error!(height, "canonical block unavailable during index sync");
                return false;
            };
            if !self.index.write_block(&block, &entry, &*self.undo) {
                return false;
            }
        }
        if start <= tip.height {
            tracing::info!(from = start, to = tip.height, "map-point index synced");
        }
        true
    }

    /// A block was connected to the tip.
    pub fn on_block_connected(&self, block: &Block, entry: &BlockIndexEntry) -> bool {
        self.index.write_block(block, entry, &*self.undo)
    }

    /// The chain was rewound from `from_tip` to `to_tip`.
    pub fn on_blocks_disconnected(&self, from_tip: &BlockIndexEntry, to_tip: &BlockIndexEntry) -> bool {
        self.index.rewind(from_tip, to_tip)
    }

    /// Wipe the store and replay the whole chain.
    pub fn rebuild(&self) -> bool {
        if let Err(e) = self.index.rebuild() {
            tracing::error!(error = %e, "failed to wipe map-point index");
            return false;
        }
        self.sync_to_tip()
    }
}
