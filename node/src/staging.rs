//! In-memory overlay of one block's pending changes.
//!
//! Reads fall through to the store for anything the block has not touched
//! yet, so later transactions see earlier ones in the same block.

use std::collections::{BTreeMap, BTreeSet};

use wot_store::{
    BlockDelta, Bond, BondState, BondedVote, Reputation, StoreError, TrustEdge, TrustGraphStore,
};
use wot_types::{Address, BlockHash, BlockHeight, TxId};

pub(crate) struct StagedBlock<'s, S: ?Sized> {
    store: &'s S,
    height: BlockHeight,
    hash: BlockHash,
    parent: BlockHash,
    edges: BTreeMap<(Address, Address), TrustEdge>,
    votes: Vec<BondedVote>,
    next_vote_seq: u64,
    bonds: BTreeMap<TxId, Bond>,
    touched: BTreeSet<Address>,
}

impl<'s, S: TrustGraphStore + ?Sized> StagedBlock<'s, S> {
    pub(crate) fn new(
        store: &'s S,
        height: BlockHeight,
        hash: BlockHash,
        parent: BlockHash,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            store,
            height,
            hash,
            parent,
            edges: BTreeMap::new(),
            votes: Vec::new(),
            next_vote_seq: store.next_vote_seq()?,
            bonds: BTreeMap::new(),
            touched: BTreeSet::new(),
        })
    }

    pub(crate) fn height(&self) -> BlockHeight {
        self.height
    }

    pub(crate) fn edge(
        &self,
        source: &Address,
        target: &Address,
    ) -> Result<Option<TrustEdge>, StoreError> {
        match self.edges.get(&(*source, *target)) {
            Some(edge) => Ok(Some(edge.clone())),
            None => self.store.get_edge(source, target),
        }
    }

    pub(crate) fn put_edge(&mut self, edge: TrustEdge) {
        self.touched.insert(edge.target);
        self.edges.insert(edge.key(), edge);
    }

    /// Append a vote, assigning the next sequence id.
    pub(crate) fn push_vote(&mut self, mut vote: BondedVote) -> u64 {
        vote.seq = self.next_vote_seq;
        self.next_vote_seq += 1;
        self.touched.insert(vote.target);
        self.votes.push(vote);
        self.next_vote_seq - 1
    }

    pub(crate) fn bond(&self, id: &TxId) -> Result<Option<Bond>, StoreError> {
        match self.bonds.get(id) {
            Some(bond) => Ok(Some(bond.clone())),
            None => self.store.get_bond(id),
        }
    }

    /// Stage a new or transitioned bond; its subject gets rescored.
    pub(crate) fn put_bond(&mut self, bond: Bond) {
        self.touched.insert(bond.subject);
        self.bonds.insert(bond.statement, bond);
    }

    /// Locked bonds due at this height, persisted or staged, in id order.
    pub(crate) fn bonds_due(&self) -> Result<Vec<Bond>, StoreError> {
        let mut due = BTreeMap::new();
        for bond in self.store.bonds_due(self.height)? {
            due.insert(bond.statement, bond);
        }
        for bond in self.bonds.values() {
            due.insert(bond.statement, bond.clone());
        }
        Ok(due
            .into_values()
            .filter(|b| b.state == BondState::Locked && b.unlock_height <= self.height)
            .collect())
    }

    /// Incoming edges of `target` with this block's changes applied.
    pub(crate) fn incoming_edges(&self, target: &Address) -> Result<Vec<TrustEdge>, StoreError> {
        let mut by_source: BTreeMap<Address, TrustEdge> = self
            .store
            .incoming_edges(target)?
            .into_iter()
            .map(|e| (e.source, e))
            .collect();
        for edge in self.edges.values().filter(|e| e.target == *target) {
            by_source.insert(edge.source, edge.clone());
        }
        Ok(by_source.into_values().collect())
    }

    pub(crate) fn votes_for(&self, target: &Address) -> Result<Vec<BondedVote>, StoreError> {
        let mut votes = self.store.votes_for(target)?;
        votes.extend(self.votes.iter().filter(|v| v.target == *target).cloned());
        Ok(votes)
    }

    /// Addresses whose incoming statements or their bonds changed.
    pub(crate) fn touched(&self) -> impl Iterator<Item = &Address> {
        self.touched.iter()
    }

    pub(crate) fn into_delta(self, reputation: Vec<Reputation>) -> BlockDelta {
        let mut delta = BlockDelta::new(self.height, self.hash, self.parent);
        delta.edges = self.edges.into_values().collect();
        delta.votes = self.votes;
        delta.bonds = self.bonds.into_values().collect();
        delta.reputation = reputation;
        delta
    }
}
