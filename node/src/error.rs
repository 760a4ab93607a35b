use thiserror::Error;

use wot_types::{BlockHash, BlockHeight, WotError};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] wot_store::StoreError),

    #[error("lmdb error: {0}")]
    Lmdb(#[from] wot_store_lmdb::LmdbError),

    #[error("bond ledger error: {0}")]
    Bond(#[from] wot_bonds::BondError),

    #[error("invalid trust parameters: {0}")]
    Params(#[from] WotError),

    #[error("block {height} ({hash}) does not extend tip {tip_height}")]
    NotConnected {
        height: BlockHeight,
        hash: BlockHash,
        tip_height: BlockHeight,
    },

    #[error("block {height} ({hash}) is not the current tip")]
    NotTip { height: BlockHeight, hash: BlockHash },

    #[error("processor halted after a store failure; rebuild required")]
    Halted,

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeError {
    /// Errors that leave the store in an unknown state.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Lmdb(_) | Self::Bond(_))
    }
}
