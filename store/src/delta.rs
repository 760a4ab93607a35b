//! Per-block change sets and their inverses.

use serde::{Deserialize, Serialize};
use wot_types::{Address, BlockHash, BlockHeight, ChainTip, TxId};

use crate::meta::StoreMeta;
use crate::record::{Bond, BondedVote, Reputation, TrustEdge};

/// Post-images produced by connecting one block.
///
/// Keys are unique within a delta: the producer resolves in-block overrides
/// before handing the delta to the store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDelta {
    pub height: BlockHeight,
    pub hash: BlockHash,
    pub parent: BlockHash,
    /// Edges to insert or replace.
    pub edges: Vec<TrustEdge>,
    /// Votes to append, with contiguous sequence ids starting at the
    /// store's next vote sequence.
    pub votes: Vec<BondedVote>,
    /// New or transitioned bonds.
    pub bonds: Vec<Bond>,
    pub reputation: Vec<Reputation>,
}

impl BlockDelta {
    pub fn new(height: BlockHeight, hash: BlockHash, parent: BlockHash) -> Self {
        Self {
            height,
            hash,
            parent,
            ..Self::default()
        }
    }

    pub fn tip(&self) -> ChainTip {
        ChainTip::new(self.height, self.hash)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
            && self.votes.is_empty()
            && self.bonds.is_empty()
            && self.reputation.is_empty()
    }
}

/// Pre-images of everything a block touched, sufficient to restore the
/// exact state before it was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoRecord {
    pub height: BlockHeight,
    pub hash: BlockHash,
    /// Tip, vote sequence, and stats before the block.
    pub prior_meta: StoreMeta,
    pub edges: Vec<((Address, Address), Option<TrustEdge>)>,
    /// Number of votes the block appended, starting at
    /// `prior_meta.next_vote_seq`.
    pub votes_appended: u64,
    pub bonds: Vec<(TxId, Option<Bond>)>,
    pub reputation: Vec<(Address, Option<Reputation>)>,
}
