//! Flat-file persistence of the governance cache.
//!
//! Layout: magic bytes, then a bincode body of (version string, payload),
//! preceded by a sha256d checksum of the body. A mismatched magic, version,
//! or checksum rejects the file and the node restarts from an empty store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use orin_crypto::sha256d;
use orin_masternode::MasternodeList;
use orin_types::{Hash256, OutPoint};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;
use crate::object::GovernanceObject;
use crate::ratelimit::LastObjectRecord;
use crate::SERIALIZATION_VERSION_STRING;

const CACHE_FILENAME: &str = "governance.dat";
const CACHE_MAGIC: &[u8] = b"magicGovernanceCache";

/// The durable slice of the governance store.
///
/// Volatile state (requested hashes, relay queue, orphan votes, bounded
/// caches) is rebuilt after load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedState {
    pub objects: BTreeMap<Hash256, GovernanceObject>,
    pub erased_objects: BTreeMap<Hash256, i64>,
    pub last_masternode_object: BTreeMap<OutPoint, LastObjectRecord>,
    pub last_mn_list_for_voting_keys: MasternodeList,
    pub cached_block_height: u32,
}

#[derive(Serialize, Deserialize)]
struct CacheBody {
    version: String,
    payload: Vec<u8>,
}

/// Reads and writes `governance.dat` in the data directory.
pub struct GovernanceDb {
    path: PathBuf,
}

impl GovernanceDb {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CACHE_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, state: &PersistedState) -> Result<(), GovernanceError> {
        let payload = bincode::serialize(state)
            .map_err(|e| GovernanceError::Cache(format!("serialize: {e}")))?;
        let body = bincode::serialize(&CacheBody {
            version: SERIALIZATION_VERSION_STRING.to_owned(),
            payload,
        })
        .map_err(|e| GovernanceError::Cache(format!("serialize: {e}")))?;

        let mut file = Vec::with_capacity(CACHE_MAGIC.len() + 32 + body.len());
        file.extend_from_slice(CACHE_MAGIC);
        file.extend_from_slice(&sha256d(&body));
        file.extend_from_slice(&body);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| GovernanceError::Cache(format!("create dir: {e}")))?;
        }
        fs::write(&self.path, file).map_err(|e| GovernanceError::Cache(format!("write: {e}")))?;
        tracing::info!(path = %self.path.display(), "governance cache written");
        Ok(())
    }

    pub fn load(&self) -> Result<PersistedState, GovernanceError> {
        let data =
            fs::read(&self.path).map_err(|e| GovernanceError::Cache(format!("read: {e}")))?;

        let Some(rest) = data.strip_prefix(CACHE_MAGIC) else {
            return Err(GovernanceError::Cache("invalid magic".into()));
        };
        if rest.len() < 32 {
            return Err(GovernanceError::Cache("truncated file".into()));
        }
        let (checksum, body) = rest.split_at(32);
        if sha256d(body).as_slice() != checksum {
            return Err(GovernanceError::Cache("checksum mismatch".into()));
        }

        let body: CacheBody = bincode::deserialize(body)
            .map_err(|e| GovernanceError::Cache(format!("deserialize: {e}")))?;
        if body.version != SERIALIZATION_VERSION_STRING {
            return Err(GovernanceError::Cache(format!(
                "unknown cache version {}",
                body.version
            )));
        }
        bincode::deserialize(&body.payload)
            .map_err(|e| GovernanceError::Cache(format!("deserialize payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{GovernanceObject, ObjectType};

    fn sample_state() -> PersistedState {
        let obj = GovernanceObject::new(
            ObjectType::Trigger,
            1000,
            Hash256::ZERO,
            OutPoint::new(Hash256::from_low_u64(1), 0),
            b"{}".to_vec(),
        );
        let mut objects = BTreeMap::new();
        objects.insert(obj.hash(), obj);
        let mut erased = BTreeMap::new();
        erased.insert(Hash256::from_low_u64(9), i64::MAX);
        PersistedState {
            objects,
            erased_objects: erased,
            last_masternode_object: BTreeMap::new(),
            last_mn_list_for_voting_keys: MasternodeList::default(),
            cached_block_height: 42,
        }
    }

    #[test]
    fn store_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = GovernanceDb::new(dir.path());
        let state = sample_state();
        db.store(&state).unwrap();

        let loaded = db.load().unwrap();
        assert_eq!(loaded.objects.len(), 1);
        assert_eq!(loaded.erased_objects, state.erased_objects);
        assert_eq!(loaded.cached_block_height, 42);
    }

    #[test]
    fn corrupted_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = GovernanceDb::new(dir.path());
        db.store(&sample_state()).unwrap();

        let mut bytes = fs::read(db.path()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(db.path(), bytes).unwrap();

        assert!(matches!(db.load(), Err(GovernanceError::Cache(_))));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = GovernanceDb::new(dir.path());
        fs::write(db.path(), b"not-a-cache-file").unwrap();
        assert!(matches!(db.load(), Err(GovernanceError::Cache(_))));
    }
}
