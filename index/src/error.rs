use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("index is corrupted: {0}")]
    Corruption(String),

    #[error("block {hash} at height {height} is not contiguous with indexed tip {tip_height}")]
    NonContiguousBlock {
        hash: String,
        height: u32,
        tip_height: u32,
    },

    #[error("undo data unavailable for block {0}")]
    MissingUndoData(String),
}

impl From<heed::Error> for IndexError {
    fn from(e: heed::Error) -> Self {
        IndexError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for IndexError {
    fn from(e: bincode::Error) -> Self {
        IndexError::Serialization(e.to_string())
    }
}
