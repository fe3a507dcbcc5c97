//! The map-point index proper.
//!
//! Derives a queryable store of map points and ownership transfers by
//! replaying blocks of the canonical chain. All writes for one block happen
//! in a single LMDB write transaction, so a failure mid-block leaves no
//! partial state behind.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use orin_types::{Address, Block, BlockIndexEntry, BlockUndo, Hash256, Transaction};

use crate::db::{MapPointDb, MapPointInfo, PointRecord, TransferInfo, TransferRecord};
use crate::error::IndexError;
use crate::payload;

/// Default LMDB map size for the index (1 GiB).
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Source of block undo data (the outputs each transaction spent).
///
/// Undo data lives with chain storage, which is outside this subsystem;
/// the node supplies an implementation backed by its block store.
pub trait UndoProvider: Send + Sync {
    fn block_undo(&self, block_hash: &Hash256) -> Option<BlockUndo>;
}

/// A transfer discovered during the block scan, pending persistence.
struct PendingTransfer {
    origin: Hash256,
    transfer_txid: Hash256,
    height: u32,
    new_owner: Address,
    prev_owner: Address,
}

/// Block-driven index of map points and their ownership history.
pub struct MapPointIndex {
    db: RwLock<MapPointDb>,
    path: PathBuf,
    map_size: usize,
}

impl MapPointIndex {
    /// Open the index under `<data_dir>/indexes/mappoint`.
    pub fn open(data_dir: &std::path::Path, map_size: usize) -> Result<Self, IndexError> {
        let path = data_dir.join("indexes").join("mappoint");
        let db = MapPointDb::open(&path, map_size)?;
        Ok(Self {
            db: RwLock::new(db),
            path,
            map_size,
        })
    }

    /// Extract a creation record from a transaction, if it carries one.
    ///
    /// The first unspendable output that decodes as a map-point payload
    /// wins; the owner is the destination of the first spendable output.
    /// Coinbase transactions cannot create points.
    fn extract_record(tx: &Transaction) -> Option<PointRecord> {
        if tx.is_coinbase() {
            return None;
        }
        let payload_text = first_unspendable_payload(tx)?;
        let (encoded_lat, encoded_lon) = payload::parse_payload(&payload_text)?;
        let owner = extract_owner_address(tx)?;
        Some(PointRecord {
            height: 0,
            origin_owner: owner.clone(),
            current_owner: owner,
            encoded_lat,
            encoded_lon,
        })
    }

    /// Process every transaction in `block`. Returns `false` on storage
    /// failure; in that case nothing from the block was persisted and the
    /// caller must halt indexing.
    pub fn write_block(
        &self,
        block: &Block,
        entry: &BlockIndexEntry,
        undo_provider: &dyn UndoProvider,
    ) -> bool {
        match self.write_block_inner(block, entry, undo_provider) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(block = %entry.hash, height = entry.height, error = %e,
                    "map-point index failed to write block");
                false
            }
        }
    }

    fn write_block_inner(
        &self,
        block: &Block,
        entry: &BlockIndexEntry,
        undo_provider: &dyn UndoProvider,
    ) -> Result<(), IndexError> {
        let db = self.db.read().expect("index lock poisoned");
        let mut txn = db.write_txn()?;

        if let Some(best) = db.best_block(&txn)? {
            if entry.height <= best.height {
                // Already indexed; replaying is a no-op.
                return Ok(());
            }
            if entry.height != best.height + 1 {
                return Err(IndexError::NonContiguousBlock {
                    hash: entry.hash.to_string(),
                    height: entry.height,
                    tip_height: best.height,
                });
            }
        }

        let mut pending_points: BTreeMap<Hash256, PointRecord> = BTreeMap::new();
        let mut pending_transfers: Vec<PendingTransfer> = Vec::new();
        let mut block_undo: Option<BlockUndo> = None;

        for (tx_index, tx) in block.transactions.iter().enumerate() {
            if let Some(mut record) = Self::extract_record(tx) {
                record.height = entry.height;
                pending_points.insert(tx.txid(), record);
                continue;
            }

            if tx.is_coinbase() {
                continue;
            }
            let Some(payload_text) = first_unspendable_payload(tx) else {
                continue;
            };
            let Some(origin_txid) = payload::parse_transfer_payload(&payload_text) else {
                continue;
            };

            if block_undo.is_none() {
                block_undo = Some(
                    undo_provider
                        .block_undo(&entry.hash)
                        .ok_or_else(|| IndexError::MissingUndoData(entry.hash.to_string()))?,
                );
            }
            let undo = block_undo.as_ref().expect("undo loaded above");
            if tx_index == 0 || tx_index - 1 >= undo.tx_undos.len() {
                continue;
            }
            let tx_undo = &undo.tx_undos[tx_index - 1];

            let prev_owner = if let Some(pending) = pending_points.get(&origin_txid) {
                pending.current_owner.clone()
            } else {
                match db.get_point(&txn, &origin_txid)? {
                    Some(existing) => existing.current_owner,
                    None => continue,
                }
            };
            if prev_owner.is_empty() {
                continue;
            }

            // The sender must prove ownership by spending an output that
            // pays the current owner.
            let owns_input = tx
                .inputs
                .iter()
                .zip(tx_undo.spent_outputs.iter())
                .any(|(_, spent)| {
                    !spent.script.is_unspendable()
                        && spent.script.extract_destination().as_ref() == Some(&prev_owner)
                });
            if !owns_input {
                continue;
            }

            let Some(new_owner) = extract_owner_address(tx) else {
                continue;
            };
            if new_owner.is_empty() || new_owner == prev_owner {
                continue;
            }

            if let Some(pending) = pending_points.get_mut(&origin_txid) {
                pending.current_owner = new_owner.clone();
            }

            pending_transfers.push(PendingTransfer {
                origin: origin_txid,
                transfer_txid: tx.txid(),
                height: entry.height,
                new_owner,
                prev_owner,
            });
        }

        if !pending_points.is_empty() {
            let creations: Vec<(Hash256, PointRecord)> = pending_points.into_iter().collect();
            db.put_points(&mut txn, &creations)?;
        }

        for transfer in &pending_transfers {
            let Some(mut record) = db.get_point(&txn, &transfer.origin)? else {
                continue;
            };
            let current_owner = record.current_owner.clone();
            record.current_owner = transfer.new_owner.clone();
            db.put_record(&mut txn, &transfer.origin, &record)?;
            db.update_owner_index(&mut txn, &current_owner, &transfer.new_owner, &transfer.origin)?;
            db.put_transfer(
                &mut txn,
                &transfer.origin,
                &transfer.transfer_txid,
                &TransferRecord {
                    height: transfer.height,
                    new_owner: transfer.new_owner.clone(),
                    previous_owner: transfer.prev_owner.clone(),
                },
            )?;
        }

        db.put_best_block(&mut txn, entry)?;
        txn.commit()?;
        Ok(())
    }

    /// Roll the index back to `to_tip`.
    ///
    /// Transfer rollback runs before point erasure so ownership updates that
    /// touch surviving points are well-defined; origins removed outright
    /// have all their transfers erased unconditionally afterwards.
    pub fn rewind(&self, from_tip: &BlockIndexEntry, to_tip: &BlockIndexEntry) -> bool {
        match self.rewind_inner(to_tip) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(from = from_tip.height, to = to_tip.height, error = %e,
                    "map-point index failed to rewind");
                false
            }
        }
    }

    fn rewind_inner(&self, to_tip: &BlockIndexEntry) -> Result<(), IndexError> {
        let db = self.db.read().expect("index lock poisoned");
        let mut txn = db.write_txn()?;

        let owner_updates = db.remove_transfers_above_height(&mut txn, to_tip.height)?;
        for (origin, previous_owner) in owner_updates {
            let Some(mut record) = db.get_point(&txn, &origin)? else {
                continue;
            };
            let current_owner = record.current_owner.clone();
            record.current_owner = previous_owner.clone();
            db.put_record(&mut txn, &origin, &record)?;
            db.update_owner_index(&mut txn, &current_owner, &previous_owner, &origin)?;
        }

        let removed = db.erase_points_above_height(&mut txn, to_tip.height)?;
        for origin in removed {
            db.remove_all_transfers_for_origin(&mut txn, &origin)?;
        }

        db.put_best_block(&mut txn, to_tip)?;
        txn.commit()?;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Single point lookup; attaches the full transfer history.
    pub fn get_point(&self, txid: &Hash256) -> Result<Option<MapPointInfo>, IndexError> {
        let db = self.db.read().expect("index lock poisoned");
        let txn = db.read_txn()?;
        let Some(record) = db.get_point(&txn, txid)? else {
            return Ok(None);
        };
        let transfers = db.read_transfers(&txn, txid)?;
        Ok(Some(MapPointInfo {
            origin_txid: *txid,
            height: record.height,
            origin_owner: record.origin_owner,
            current_owner: record.current_owner,
            encoded_lat: record.encoded_lat,
            encoded_lon: record.encoded_lon,
            transfers,
        }))
    }

    /// Points currently owned by any of `owners`, created in [from, to].
    pub fn points_for_owner(
        &self,
        owners: &[Address],
        from_height: u32,
        to_height: u32,
    ) -> Result<Vec<MapPointInfo>, IndexError> {
        if owners.is_empty() {
            return Ok(Vec::new());
        }
        let db = self.db.read().expect("index lock poisoned");
        let txn = db.read_txn()?;
        db.read_owners(&txn, owners, from_height, to_height)
    }

    /// Points created in [from, to], in height order.
    pub fn points_in_height_range(
        &self,
        from_height: u32,
        to_height: u32,
    ) -> Result<Vec<MapPointInfo>, IndexError> {
        let db = self.db.read().expect("index lock poisoned");
        let txn = db.read_txn()?;
        db.read_by_height(&txn, from_height, to_height)
    }

    /// Transfer history of one origin.
    pub fn get_transfers(&self, origin: &Hash256) -> Result<Vec<TransferInfo>, IndexError> {
        let db = self.db.read().expect("index lock poisoned");
        let txn = db.read_txn()?;
        db.read_transfers(&txn, origin)
    }

    /// The best block the index has processed.
    pub fn best_block(&self) -> Result<Option<BlockIndexEntry>, IndexError> {
        let db = self.db.read().expect("index lock poisoned");
        let txn = db.read_txn()?;
        db.best_block(&txn)
    }

    /// Drop the persistent store. The chain-sync runtime re-enters the
    /// initial-sync path on its next pass.
    pub fn rebuild(&self) -> Result<(), IndexError> {
        let db = self.db.write().expect("index lock poisoned");
        let mut txn = db.write_txn()?;
        db.clear(&mut txn)?;
        txn.commit()?;
        tracing::info!(path = %self.path.display(), "map-point index wiped for rebuild");
        Ok(())
    }

    /// LMDB map size this index was opened with.
    pub fn map_size(&self) -> usize {
        self.map_size
    }
}

/// First decodable payload among the unspendable outputs.
fn first_unspendable_payload(tx: &Transaction) -> Option<String> {
    for output in &tx.outputs {
        if !output.script.is_unspendable() {
            continue;
        }
        if let Some(data) = output.script.op_return_payload() {
            if let Ok(text) = std::str::from_utf8(data) {
                return Some(text.to_owned());
            }
        }
    }
    None
}

/// Destination of the first spendable output.
fn extract_owner_address(tx: &Transaction) -> Option<Address> {
    tx.outputs
        .iter()
        .filter(|out| !out.script.is_unspendable())
        .find_map(|out| out.script.extract_destination())
}
