//! Full-content export of a store, used to compare states across backends
//! and across reorgs.

use serde::{Deserialize, Serialize};

use crate::delta::UndoRecord;
use crate::meta::StoreMeta;
use crate::record::{Bond, BondedVote, Reputation, TrustEdge};
use crate::StoreError;

/// Every record of a store, each table in primary key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub meta: StoreMeta,
    pub edges: Vec<TrustEdge>,
    pub votes: Vec<BondedVote>,
    pub bonds: Vec<Bond>,
    pub reputation: Vec<Reputation>,
    pub undo: Vec<UndoRecord>,
}

impl StoreSnapshot {
    /// Blake2b-256 over the bincode encoding of the snapshot.
    pub fn digest(&self) -> Result<[u8; 32], StoreError> {
        use blake2::digest::consts::U32;
        use blake2::{Blake2b, Digest};

        let encoded = bincode::serialize(self)?;
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(&encoded);

        let result = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&result);
        Ok(out)
    }
}
