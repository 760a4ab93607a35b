use thiserror::Error;
use wot_types::BlockHeight;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("block out of order: expected height {expected}, got {got}")]
    OutOfOrder {
        expected: BlockHeight,
        got: BlockHeight,
    },

    #[error("block at height {height} does not extend the current tip")]
    ParentMismatch { height: BlockHeight },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
