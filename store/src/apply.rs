//! Block apply and undo, shared by every backend.

use std::collections::BTreeSet;

use wot_types::{Address, Amount, BlockHeight, TxId};

use crate::delta::{BlockDelta, UndoRecord};
use crate::meta::StoreMeta;
use crate::record::{Bond, BondedVote, Reputation, TrustEdge};
use crate::StoreError;

/// Keyed access to the records inside one atomic write unit.
///
/// Implementations keep their own secondary indexes consistent on every
/// put and delete; callers only ever address primary keys.
pub trait RecordWriter {
    fn meta(&self) -> Result<StoreMeta, StoreError>;
    fn put_meta(&mut self, meta: &StoreMeta) -> Result<(), StoreError>;

    fn edge(&self, source: &Address, target: &Address) -> Result<Option<TrustEdge>, StoreError>;
    fn put_edge(&mut self, edge: &TrustEdge) -> Result<(), StoreError>;
    fn delete_edge(&mut self, source: &Address, target: &Address) -> Result<(), StoreError>;

    fn vote(&self, seq: u64) -> Result<Option<BondedVote>, StoreError>;
    fn put_vote(&mut self, vote: &BondedVote) -> Result<(), StoreError>;
    fn delete_vote(&mut self, vote: &BondedVote) -> Result<(), StoreError>;

    fn bond(&self, id: &TxId) -> Result<Option<Bond>, StoreError>;
    /// `previous` is the record being replaced, if any.
    fn put_bond(&mut self, bond: &Bond, previous: Option<&Bond>) -> Result<(), StoreError>;
    fn delete_bond(&mut self, bond: &Bond) -> Result<(), StoreError>;

    fn reputation(&self, address: &Address) -> Result<Option<Reputation>, StoreError>;
    fn put_reputation(&mut self, reputation: &Reputation) -> Result<(), StoreError>;
    fn delete_reputation(&mut self, address: &Address) -> Result<(), StoreError>;

    fn undo(&self, height: BlockHeight) -> Result<Option<UndoRecord>, StoreError>;
    fn put_undo(&mut self, record: &UndoRecord) -> Result<(), StoreError>;
    fn delete_undo(&mut self, height: BlockHeight) -> Result<(), StoreError>;
}

/// Write a block's post-images and its undo record, and advance the tip.
///
/// The caller commits or aborts the surrounding unit; on error nothing
/// written here may become visible.
pub fn apply_delta<W: RecordWriter + ?Sized>(
    writer: &mut W,
    delta: &BlockDelta,
) -> Result<UndoRecord, StoreError> {
    let prior = writer.meta()?;
    if let Some(tip) = prior.tip {
        if delta.height != tip.height + 1 {
            return Err(StoreError::OutOfOrder {
                expected: tip.height + 1,
                got: delta.height,
            });
        }
        if delta.parent != tip.hash {
            return Err(StoreError::ParentMismatch {
                height: delta.height,
            });
        }
    }
    if writer.undo(delta.height)?.is_some() {
        return Err(StoreError::Duplicate(format!(
            "undo record at height {}",
            delta.height
        )));
    }

    let mut meta = prior.clone();
    let mut undo = UndoRecord {
        height: delta.height,
        hash: delta.hash,
        prior_meta: prior,
        edges: Vec::new(),
        votes_appended: 0,
        bonds: Vec::new(),
        reputation: Vec::new(),
    };

    let mut seen_edges = BTreeSet::new();
    for edge in &delta.edges {
        let previous = writer.edge(&edge.source, &edge.target)?;
        if seen_edges.insert(edge.key()) {
            if previous.is_none() {
                meta.stats.edge_count += 1;
            }
            undo.edges.push((edge.key(), previous));
        }
        writer.put_edge(edge)?;
    }

    for vote in &delta.votes {
        if vote.seq != meta.next_vote_seq {
            return Err(StoreError::Corruption(format!(
                "vote sequence {} where {} was expected",
                vote.seq, meta.next_vote_seq
            )));
        }
        writer.put_vote(vote)?;
        meta.next_vote_seq += 1;
        meta.stats.vote_count += 1;
        undo.votes_appended += 1;
    }

    let mut seen_bonds = BTreeSet::new();
    for bond in &delta.bonds {
        let previous = writer.bond(&bond.statement)?;
        let released = previous.as_ref().map_or(Amount::ZERO, Bond::locked_value);
        meta.stats.locked_value = meta
            .stats
            .locked_value
            .checked_sub(released)
            .and_then(|v| v.checked_add(bond.locked_value()))
            .ok_or_else(|| StoreError::Corruption("locked bond value out of range".into()))?;
        writer.put_bond(bond, previous.as_ref())?;
        if seen_bonds.insert(bond.statement) {
            undo.bonds.push((bond.statement, previous));
        }
    }

    let mut seen_reputation = BTreeSet::new();
    for reputation in &delta.reputation {
        let previous = writer.reputation(&reputation.address)?;
        writer.put_reputation(reputation)?;
        if seen_reputation.insert(reputation.address) {
            undo.reputation.push((reputation.address, previous));
        }
    }

    meta.tip = Some(delta.tip());
    writer.put_meta(&meta)?;
    writer.put_undo(&undo)?;
    Ok(undo)
}

/// Restore the state from before the block at `height`, which must be the
/// current tip. Returns the consumed undo record.
pub fn revert_block<W: RecordWriter + ?Sized>(
    writer: &mut W,
    height: BlockHeight,
) -> Result<UndoRecord, StoreError> {
    let meta = writer.meta()?;
    let tip = meta
        .tip
        .ok_or_else(|| StoreError::Corruption(format!("undo at height {height} with no tip")))?;
    if tip.height != height {
        return Err(StoreError::Corruption(format!(
            "undo at height {height} but tip is at {}",
            tip.height
        )));
    }
    let undo = writer
        .undo(height)?
        .ok_or_else(|| StoreError::Corruption(format!("missing undo record at {height}")))?;
    if undo.hash != tip.hash {
        return Err(StoreError::Corruption(format!(
            "undo record at {height} is for block {}, tip is {}",
            undo.hash, tip.hash
        )));
    }

    for ((source, target), previous) in undo.edges.iter().rev() {
        match previous {
            Some(edge) => writer.put_edge(edge)?,
            None => writer.delete_edge(source, target)?,
        }
    }

    let first_seq = undo.prior_meta.next_vote_seq;
    for seq in (first_seq..first_seq + undo.votes_appended).rev() {
        let vote = writer
            .vote(seq)?
            .ok_or_else(|| StoreError::Corruption(format!("missing vote {seq}")))?;
        writer.delete_vote(&vote)?;
    }

    for (id, previous) in undo.bonds.iter().rev() {
        let current = writer.bond(id)?;
        match (previous, current) {
            (Some(bond), current) => writer.put_bond(bond, current.as_ref())?,
            (None, Some(current)) => writer.delete_bond(&current)?,
            (None, None) => {
                return Err(StoreError::Corruption(format!("missing bond {id}")));
            }
        }
    }

    for (address, previous) in undo.reputation.iter().rev() {
        match previous {
            Some(reputation) => writer.put_reputation(reputation)?,
            None => writer.delete_reputation(address)?,
        }
    }

    writer.put_meta(&undo.prior_meta)?;
    writer.delete_undo(height)?;
    Ok(undo)
}
