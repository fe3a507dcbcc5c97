//! LMDB storage for the map-point index.
//!
//! One database holds five keyspaces distinguished by a one-byte prefix:
//! - `p` point-record: `txid(32)` → [`PointRecord`].
//! - `h` height index: `height_be(4) ++ txid(32)` → empty. Big-endian
//!   heights sort lexicographically by height, enabling range scans.
//! - `o` owner index: `owner_bytes ++ txid(32)` → empty.
//! - `t` transfer: `origin(32) ++ transfer_txid(32)` → [`TransferRecord`].
//! - `y` transfer-height index: `height_be(4) ++ origin(32) ++ transfer(32)`
//!   → empty, for ordered rollback during rewind.
//!
//! A sixth prefix `m` stores index metadata (the best indexed block).

use std::ops::Bound;
use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use serde::{Deserialize, Serialize};

use orin_types::{Address, BlockIndexEntry, Hash256};

use crate::error::IndexError;

const DB_POINT: u8 = b'p';
const DB_HEIGHT: u8 = b'h';
const DB_OWNER: u8 = b'o';
const DB_TRANSFER: u8 = b't';
const DB_TRANSFER_HEIGHT: u8 = b'y';
const DB_META: u8 = b'm';

const BEST_BLOCK_KEY: &[u8] = b"best_block";

/// Stored record of a map point, keyed by its origin txid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub height: u32,
    pub origin_owner: Address,
    pub current_owner: Address,
    pub encoded_lat: i64,
    pub encoded_lon: i64,
}

/// Stored record of an ownership transfer, keyed by (origin, transfer txid).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub height: u32,
    pub new_owner: Address,
    pub previous_owner: Address,
}

/// Query projection of a point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPointInfo {
    pub origin_txid: Hash256,
    pub height: u32,
    pub origin_owner: Address,
    pub current_owner: Address,
    pub encoded_lat: i64,
    pub encoded_lon: i64,
    /// Filled only by single-point lookups.
    pub transfers: Vec<TransferInfo>,
}

/// Query projection of a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInfo {
    pub transfer_txid: Hash256,
    pub height: u32,
    pub new_owner: Address,
}

fn point_key(txid: &Hash256) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[0] = DB_POINT;
    key[1..].copy_from_slice(txid.as_bytes());
    key
}

fn height_key(height: u32, txid: &Hash256) -> [u8; 37] {
    let mut key = [0u8; 37];
    key[0] = DB_HEIGHT;
    key[1..5].copy_from_slice(&height.to_be_bytes());
    key[5..].copy_from_slice(txid.as_bytes());
    key
}

fn owner_key(owner: &Address, txid: &Hash256) -> Vec<u8> {
    let owner_bytes = owner.as_str().as_bytes();
    let mut key = Vec::with_capacity(1 + owner_bytes.len() + 32);
    key.push(DB_OWNER);
    key.extend_from_slice(owner_bytes);
    key.extend_from_slice(txid.as_bytes());
    key
}

fn transfer_key(origin: &Hash256, transfer: &Hash256) -> [u8; 65] {
    let mut key = [0u8; 65];
    key[0] = DB_TRANSFER;
    key[1..33].copy_from_slice(origin.as_bytes());
    key[33..].copy_from_slice(transfer.as_bytes());
    key
}

fn transfer_height_key(height: u32, origin: &Hash256, transfer: &Hash256) -> [u8; 69] {
    let mut key = [0u8; 69];
    key[0] = DB_TRANSFER_HEIGHT;
    key[1..5].copy_from_slice(&height.to_be_bytes());
    key[5..37].copy_from_slice(origin.as_bytes());
    key[37..].copy_from_slice(transfer.as_bytes());
    key
}

fn meta_key(name: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + name.len());
    key.push(DB_META);
    key.extend_from_slice(name);
    key
}

fn hash_from_slice(bytes: &[u8]) -> Hash256 {
    let mut arr = [0u8; 32];
    arr.copy_from_slice(bytes);
    Hash256::new(arr)
}

/// Lexicographically increment `prefix` to form an exclusive upper bound.
/// Returns `None` when the prefix is all 0xFF (scan to the end instead).
fn increment_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    for i in (0..upper.len()).rev() {
        if upper[i] != 0xFF {
            upper[i] += 1;
            upper.truncate(i + 1);
            return Some(upper);
        }
    }
    None
}

/// The LMDB environment and database handle for the map-point index.
pub struct MapPointDb {
    env: Env,
    db: Database<Bytes, Bytes>,
}

impl MapPointDb {
    /// Open or create the index database at `path`.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, IndexError> {
        std::fs::create_dir_all(path)
            .map_err(|e| IndexError::Heed(format!("failed to create directory: {e}")))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(1)
                .map_size(map_size)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let db = env.create_database(&mut wtxn, Some("mappoint"))?;
        wtxn.commit()?;

        Ok(Self { env, db })
    }

    pub fn write_txn(&self) -> Result<RwTxn<'_>, IndexError> {
        Ok(self.env.write_txn()?)
    }

    pub fn read_txn(&self) -> Result<RoTxn<'_>, IndexError> {
        Ok(self.env.read_txn()?)
    }

    /// Collect every key in a prefix range.
    fn keys_with_prefix(&self, txn: &RoTxn<'_>, prefix: &[u8]) -> Result<Vec<Vec<u8>>, IndexError> {
        let upper = increment_prefix(prefix);
        let bounds = (
            Bound::Included(prefix),
            match &upper {
                Some(u) => Bound::Excluded(u.as_slice()),
                None => Bound::Unbounded,
            },
        );
        let mut keys = Vec::new();
        for result in self.db.range(txn, &bounds)? {
            let (key, _) = result?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    // ── Points ──────────────────────────────────────────────────────────

    /// Write point records along with their height and owner index entries.
    pub fn put_points(
        &self,
        txn: &mut RwTxn<'_>,
        records: &[(Hash256, PointRecord)],
    ) -> Result<(), IndexError> {
        for (txid, record) in records {
            let bytes = bincode::serialize(record)?;
            self.db.put(txn, &point_key(txid), &bytes)?;
            self.db.put(txn, &height_key(record.height, txid), &[])?;
            if !record.current_owner.is_empty() {
                self.db
                    .put(txn, &owner_key(&record.current_owner, txid), &[])?;
            }
        }
        Ok(())
    }

    /// Overwrite a point record without touching the secondary indexes.
    pub fn put_record(
        &self,
        txn: &mut RwTxn<'_>,
        txid: &Hash256,
        record: &PointRecord,
    ) -> Result<(), IndexError> {
        let bytes = bincode::serialize(record)?;
        self.db.put(txn, &point_key(txid), &bytes)?;
        Ok(())
    }

    pub fn get_point(
        &self,
        txn: &RoTxn<'_>,
        txid: &Hash256,
    ) -> Result<Option<PointRecord>, IndexError> {
        match self.db.get(txn, &point_key(txid))? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    /// Move a point's owner index entry from `old_owner` to `new_owner`.
    pub fn update_owner_index(
        &self,
        txn: &mut RwTxn<'_>,
        old_owner: &Address,
        new_owner: &Address,
        origin: &Hash256,
    ) -> Result<(), IndexError> {
        if !old_owner.is_empty() {
            self.db.delete(txn, &owner_key(old_owner, origin))?;
        }
        if !new_owner.is_empty() {
            self.db.put(txn, &owner_key(new_owner, origin), &[])?;
        }
        Ok(())
    }

    /// Read all points with `start <= height <= stop`, in height order.
    pub fn read_by_height(
        &self,
        txn: &RoTxn<'_>,
        start: u32,
        stop: u32,
    ) -> Result<Vec<MapPointInfo>, IndexError> {
        let lower = height_key(start, &Hash256::ZERO);
        let mut out = Vec::new();
        let bounds = (Bound::Included(&lower[..]), Bound::Unbounded);
        for result in self.db.range(txn, &bounds)? {
            let (key, _) = result?;
            if key.len() != 37 || key[0] != DB_HEIGHT {
                break;
            }
            let height = u32::from_be_bytes([key[1], key[2], key[3], key[4]]);
            if height > stop {
                break;
            }
            let txid = hash_from_slice(&key[5..]);
            if let Some(record) = self.get_point(txn, &txid)? {
                out.push(make_info(txid, record));
            }
        }
        Ok(out)
    }

    /// Read all points currently owned by any of `owners`, filtered to
    /// `start <= height <= stop`.
    pub fn read_owners(
        &self,
        txn: &RoTxn<'_>,
        owners: &[Address],
        start: u32,
        stop: u32,
    ) -> Result<Vec<MapPointInfo>, IndexError> {
        let mut out = Vec::new();
        for owner in owners {
            let mut prefix = vec![DB_OWNER];
            prefix.extend_from_slice(owner.as_str().as_bytes());
            for key in self.keys_with_prefix(txn, &prefix)? {
                if key.len() < prefix.len() + 32 {
                    continue;
                }
                let txid = hash_from_slice(&key[key.len() - 32..]);
                if let Some(record) = self.get_point(txn, &txid)? {
                    if record.height >= start && record.height <= stop {
                        out.push(make_info(txid, record));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Erase every point created above `height`, together with its height
    /// and owner index entries. Returns the removed origin txids.
    pub fn erase_points_above_height(
        &self,
        txn: &mut RwTxn<'_>,
        height: u32,
    ) -> Result<Vec<Hash256>, IndexError> {
        let lower = height_key(height.saturating_add(1), &Hash256::ZERO);
        let mut stale_keys = Vec::new();
        {
            let bounds = (Bound::Included(&lower[..]), Bound::Unbounded);
            for result in self.db.range(txn, &bounds)? {
                let (key, _) = result?;
                if key.len() != 37 || key[0] != DB_HEIGHT {
                    break;
                }
                stale_keys.push(key.to_vec());
            }
        }

        let mut removed = Vec::new();
        for key in stale_keys {
            let txid = hash_from_slice(&key[5..]);
            if let Some(record) = self.get_point(txn, &txid)? {
                self.db.delete(txn, &point_key(&txid))?;
                if !record.current_owner.is_empty() {
                    self.db
                        .delete(txn, &owner_key(&record.current_owner, &txid))?;
                }
                removed.push(txid);
            }
            self.db.delete(txn, &key)?;
        }
        Ok(removed)
    }

    // ── Transfers ───────────────────────────────────────────────────────

    /// Write a transfer record and its height index entry.
    pub fn put_transfer(
        &self,
        txn: &mut RwTxn<'_>,
        origin: &Hash256,
        transfer: &Hash256,
        record: &TransferRecord,
    ) -> Result<(), IndexError> {
        let bytes = bincode::serialize(record)?;
        self.db.put(txn, &transfer_key(origin, transfer), &bytes)?;
        self.db
            .put(txn, &transfer_height_key(record.height, origin, transfer), &[])?;
        Ok(())
    }

    /// All transfers of an origin, ordered by (height, transfer txid).
    pub fn read_transfers(
        &self,
        txn: &RoTxn<'_>,
        origin: &Hash256,
    ) -> Result<Vec<TransferInfo>, IndexError> {
        let mut prefix = vec![DB_TRANSFER];
        prefix.extend_from_slice(origin.as_bytes());
        let mut out = Vec::new();
        let upper = increment_prefix(&prefix);
        let bounds = (
            Bound::Included(prefix.as_slice()),
            match &upper {
                Some(u) => Bound::Excluded(u.as_slice()),
                None => Bound::Unbounded,
            },
        );
        for result in self.db.range(txn, &bounds)? {
            let (key, value) = result?;
            if key.len() != 65 {
                continue;
            }
            let record: TransferRecord = bincode::deserialize(value)?;
            out.push(TransferInfo {
                transfer_txid: hash_from_slice(&key[33..]),
                height: record.height,
                new_owner: record.new_owner,
            });
        }
        out.sort_by(|a, b| {
            a.height
                .cmp(&b.height)
                .then_with(|| a.transfer_txid.cmp(&b.transfer_txid))
        });
        Ok(out)
    }

    /// Remove every transfer above `height`.
    ///
    /// Returns (origin, previous_owner) pairs in reverse block order so a
    /// chain of transfers on one origin rolls back to the oldest surviving
    /// owner.
    pub fn remove_transfers_above_height(
        &self,
        txn: &mut RwTxn<'_>,
        height: u32,
    ) -> Result<Vec<(Hash256, Address)>, IndexError> {
        let lower = transfer_height_key(height.saturating_add(1), &Hash256::ZERO, &Hash256::ZERO);
        let mut stale_keys = Vec::new();
        {
            let bounds = (Bound::Included(&lower[..]), Bound::Unbounded);
            for result in self.db.range(txn, &bounds)? {
                let (key, _) = result?;
                if key.len() != 69 || key[0] != DB_TRANSFER_HEIGHT {
                    break;
                }
                stale_keys.push(key.to_vec());
            }
        }

        let mut owner_updates = Vec::new();
        for key in &stale_keys {
            let origin = hash_from_slice(&key[5..37]);
            let transfer = hash_from_slice(&key[37..]);
            let tkey = transfer_key(&origin, &transfer);
            if let Some(bytes) = self.db.get(txn, &tkey)? {
                let record: TransferRecord = bincode::deserialize(bytes)?;
                self.db.delete(txn, &tkey)?;
                owner_updates.push((origin, record.previous_owner));
            }
            self.db.delete(txn, key)?;
        }
        owner_updates.reverse();
        Ok(owner_updates)
    }

    /// Remove all transfers referencing `origin` (both keyspaces).
    pub fn remove_all_transfers_for_origin(
        &self,
        txn: &mut RwTxn<'_>,
        origin: &Hash256,
    ) -> Result<(), IndexError> {
        let mut prefix = vec![DB_TRANSFER];
        prefix.extend_from_slice(origin.as_bytes());
        for key in self.keys_with_prefix(txn, &prefix)? {
            if key.len() != 65 {
                continue;
            }
            let transfer = hash_from_slice(&key[33..]);
            if let Some(bytes) = self.db.get(txn, &key)? {
                let record: TransferRecord = bincode::deserialize(bytes)?;
                self.db
                    .delete(txn, &transfer_height_key(record.height, origin, &transfer))?;
            }
            self.db.delete(txn, &key)?;
        }
        Ok(())
    }

    // ── Metadata ────────────────────────────────────────────────────────

    pub fn best_block(&self, txn: &RoTxn<'_>) -> Result<Option<BlockIndexEntry>, IndexError> {
        match self.db.get(txn, &meta_key(BEST_BLOCK_KEY))? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_best_block(
        &self,
        txn: &mut RwTxn<'_>,
        entry: &BlockIndexEntry,
    ) -> Result<(), IndexError> {
        let bytes = bincode::serialize(entry)?;
        self.db.put(txn, &meta_key(BEST_BLOCK_KEY), &bytes)?;
        Ok(())
    }

    /// Drop every entry in the database.
    pub fn clear(&self, txn: &mut RwTxn<'_>) -> Result<(), IndexError> {
        self.db.clear(txn)?;
        Ok(())
    }
}

fn make_info(txid: Hash256, record: PointRecord) -> MapPointInfo {
    MapPointInfo {
        origin_txid: txid,
        height: record.height,
        origin_owner: record.origin_owner,
        current_owner: record.current_owner,
        encoded_lat: record.encoded_lat,
        encoded_lon: record.encoded_lon,
        transfers: Vec::new(),
    }
}
