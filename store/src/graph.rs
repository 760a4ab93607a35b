//! The trust graph store trait.

use serde::{Deserialize, Serialize};
use wot_types::{Address, BlockHeight, ChainTip, TxId};

use crate::delta::{BlockDelta, UndoRecord};
use crate::meta::GraphStats;
use crate::record::{Bond, BondedVote, Reputation, TrustEdge};
use crate::snapshot::StoreSnapshot;
use crate::StoreError;

/// Everything known about one address, read from a single snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSummary {
    pub outgoing: Vec<TrustEdge>,
    pub incoming: Vec<TrustEdge>,
    pub votes_received: Vec<BondedVote>,
    pub reputation: Option<Reputation>,
}

/// Persistent trust graph with per-block atomic apply and exact undo.
///
/// Writes are block-granular: a delta is applied entirely or not at all,
/// and concurrent readers observe either the state before or after it.
pub trait TrustGraphStore: Send + Sync {
    /// Apply one block's post-images and record its undo data.
    fn apply_block(&self, delta: &BlockDelta) -> Result<(), StoreError>;

    /// Revert the tip block. A missing undo record or a height other than
    /// the tip is reported as corruption.
    fn undo_block(&self, height: BlockHeight) -> Result<UndoRecord, StoreError>;

    fn tip(&self) -> Result<Option<ChainTip>, StoreError>;

    /// Sequence id the next appended vote must carry.
    fn next_vote_seq(&self) -> Result<u64, StoreError>;

    fn get_edge(&self, source: &Address, target: &Address)
        -> Result<Option<TrustEdge>, StoreError>;

    fn outgoing_edges(&self, source: &Address) -> Result<Vec<TrustEdge>, StoreError>;

    fn incoming_edges(&self, target: &Address) -> Result<Vec<TrustEdge>, StoreError>;

    /// Votes targeting `target`, in sequence order.
    fn votes_for(&self, target: &Address) -> Result<Vec<BondedVote>, StoreError>;

    fn get_bond(&self, statement: &TxId) -> Result<Option<Bond>, StoreError>;

    /// Locked bonds whose unlock height is at or below `height`.
    fn bonds_due(&self, height: BlockHeight) -> Result<Vec<Bond>, StoreError>;

    fn get_reputation(&self, address: &Address) -> Result<Option<Reputation>, StoreError>;

    fn summary(&self, address: &Address) -> Result<AddressSummary, StoreError>;

    fn stats(&self) -> Result<GraphStats, StoreError>;

    fn undo_record(&self, height: BlockHeight) -> Result<Option<UndoRecord>, StoreError>;

    /// Export every record in key order.
    fn snapshot(&self) -> Result<StoreSnapshot, StoreError>;
}
