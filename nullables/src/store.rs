//! Nullable store: thread-safe in-memory trust graph for testing.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard};

use wot_store::{
    apply_delta, revert_block, AddressSummary, BlockDelta, Bond, BondState, BondedVote,
    GraphStats, RecordWriter, Reputation, StoreError, StoreMeta, StoreSnapshot, TrustEdge,
    TrustGraphStore, UndoRecord,
};
use wot_types::{Address, BlockHeight, ChainTip, TxId};

#[derive(Clone, Default)]
struct Tables {
    meta: StoreMeta,
    edges: BTreeMap<(Address, Address), TrustEdge>,
    edges_in: BTreeMap<(Address, Address), ()>,
    votes: BTreeMap<u64, BondedVote>,
    votes_by_target: BTreeMap<(Address, u64), ()>,
    bonds: BTreeMap<TxId, Bond>,
    bonds_due: BTreeMap<(BlockHeight, TxId), ()>,
    reputation: BTreeMap<Address, Reputation>,
    undo: BTreeMap<BlockHeight, UndoRecord>,
}

impl Tables {
    fn outgoing(&self, source: &Address) -> Vec<TrustEdge> {
        self.edges
            .range((*source, Address::ZERO)..)
            .take_while(|((s, _), _)| s == source)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn incoming(&self, target: &Address) -> Vec<TrustEdge> {
        self.edges_in
            .range((*target, Address::ZERO)..)
            .take_while(|((t, _), _)| t == target)
            .filter_map(|((t, s), _)| self.edges.get(&(*s, *t)).cloned())
            .collect()
    }

    fn votes_for(&self, target: &Address) -> Vec<BondedVote> {
        self.votes_by_target
            .range((*target, 0)..)
            .take_while(|((t, _), _)| t == target)
            .filter_map(|((_, seq), _)| self.votes.get(seq).cloned())
            .collect()
    }
}

impl RecordWriter for Tables {
    fn meta(&self) -> Result<StoreMeta, StoreError> {
        Ok(self.meta.clone())
    }

    fn put_meta(&mut self, meta: &StoreMeta) -> Result<(), StoreError> {
        self.meta = meta.clone();
        Ok(())
    }

    fn edge(&self, source: &Address, target: &Address) -> Result<Option<TrustEdge>, StoreError> {
        Ok(self.edges.get(&(*source, *target)).cloned())
    }

    fn put_edge(&mut self, edge: &TrustEdge) -> Result<(), StoreError> {
        self.edges.insert((edge.source, edge.target), edge.clone());
        self.edges_in.insert((edge.target, edge.source), ());
        Ok(())
    }

    fn delete_edge(&mut self, source: &Address, target: &Address) -> Result<(), StoreError> {
        self.edges.remove(&(*source, *target));
        self.edges_in.remove(&(*target, *source));
        Ok(())
    }

    fn vote(&self, seq: u64) -> Result<Option<BondedVote>, StoreError> {
        Ok(self.votes.get(&seq).cloned())
    }

    fn put_vote(&mut self, vote: &BondedVote) -> Result<(), StoreError> {
        self.votes.insert(vote.seq, vote.clone());
        self.votes_by_target.insert((vote.target, vote.seq), ());
        Ok(())
    }

    fn delete_vote(&mut self, vote: &BondedVote) -> Result<(), StoreError> {
        self.votes.remove(&vote.seq);
        self.votes_by_target.remove(&(vote.target, vote.seq));
        Ok(())
    }

    fn bond(&self, id: &TxId) -> Result<Option<Bond>, StoreError> {
        Ok(self.bonds.get(id).cloned())
    }

    fn put_bond(&mut self, bond: &Bond, previous: Option<&Bond>) -> Result<(), StoreError> {
        if let Some(prev) = previous.filter(|b| b.state == BondState::Locked) {
            self.bonds_due.remove(&(prev.unlock_height, prev.statement));
        }
        self.bonds.insert(bond.statement, bond.clone());
        if bond.state == BondState::Locked {
            self.bonds_due.insert((bond.unlock_height, bond.statement), ());
        }
        Ok(())
    }

    fn delete_bond(&mut self, bond: &Bond) -> Result<(), StoreError> {
        self.bonds.remove(&bond.statement);
        self.bonds_due.remove(&(bond.unlock_height, bond.statement));
        Ok(())
    }

    fn reputation(&self, address: &Address) -> Result<Option<Reputation>, StoreError> {
        Ok(self.reputation.get(address).cloned())
    }

    fn put_reputation(&mut self, reputation: &Reputation) -> Result<(), StoreError> {
        self.reputation.insert(reputation.address, reputation.clone());
        Ok(())
    }

    fn delete_reputation(&mut self, address: &Address) -> Result<(), StoreError> {
        self.reputation.remove(address);
        Ok(())
    }

    fn undo(&self, height: BlockHeight) -> Result<Option<UndoRecord>, StoreError> {
        Ok(self.undo.get(&height).cloned())
    }

    fn put_undo(&mut self, record: &UndoRecord) -> Result<(), StoreError> {
        self.undo.insert(record.height, record.clone());
        Ok(())
    }

    fn delete_undo(&mut self, height: BlockHeight) -> Result<(), StoreError> {
        self.undo.remove(&height);
        Ok(())
    }
}

/// An in-memory trust graph store for testing.
///
/// Writes go to a private copy of the tables which replaces the shared one
/// only on success, so a failed block leaves no trace. Thread-safe; readers
/// see whole blocks.
#[derive(Default)]
pub struct NullTrustStore {
    tables: RwLock<Tables>,
    fail_writes: RwLock<bool>,
}

impl NullTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent apply and undo fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.write().unwrap() = fail;
    }

    /// Drop the undo record at `height`, as a damaged store would.
    pub fn discard_undo(&self, height: BlockHeight) {
        self.tables.write().unwrap().undo.remove(&height);
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap()
    }

    fn write_with<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if *self.fail_writes.read().unwrap() {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        let mut guard = self.tables.write().unwrap();
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        *guard = staged;
        Ok(out)
    }
}

impl TrustGraphStore for NullTrustStore {
    fn apply_block(&self, delta: &BlockDelta) -> Result<(), StoreError> {
        self.write_with(|tables| apply_delta(tables, delta).map(|_| ()))
    }

    fn undo_block(&self, height: BlockHeight) -> Result<UndoRecord, StoreError> {
        self.write_with(|tables| revert_block(tables, height))
    }

    fn tip(&self) -> Result<Option<ChainTip>, StoreError> {
        Ok(self.read().meta.tip)
    }

    fn next_vote_seq(&self) -> Result<u64, StoreError> {
        Ok(self.read().meta.next_vote_seq)
    }

    fn get_edge(
        &self,
        source: &Address,
        target: &Address,
    ) -> Result<Option<TrustEdge>, StoreError> {
        self.read().edge(source, target)
    }

    fn outgoing_edges(&self, source: &Address) -> Result<Vec<TrustEdge>, StoreError> {
        Ok(self.read().outgoing(source))
    }

    fn incoming_edges(&self, target: &Address) -> Result<Vec<TrustEdge>, StoreError> {
        Ok(self.read().incoming(target))
    }

    fn votes_for(&self, target: &Address) -> Result<Vec<BondedVote>, StoreError> {
        Ok(self.read().votes_for(target))
    }

    fn get_bond(&self, statement: &TxId) -> Result<Option<Bond>, StoreError> {
        self.read().bond(statement)
    }

    fn bonds_due(&self, height: BlockHeight) -> Result<Vec<Bond>, StoreError> {
        let tables = self.read();
        tables
            .bonds_due
            .range(..=(height, TxId::new([0xFF; 32])))
            .map(|((_, id), _)| {
                tables
                    .bonds
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StoreError::Corruption(format!("due index names missing bond {id}")))
            })
            .collect()
    }

    fn get_reputation(&self, address: &Address) -> Result<Option<Reputation>, StoreError> {
        self.read().reputation(address)
    }

    fn summary(&self, address: &Address) -> Result<AddressSummary, StoreError> {
        let tables = self.read();
        Ok(AddressSummary {
            outgoing: tables.outgoing(address),
            incoming: tables.incoming(address),
            votes_received: tables.votes_for(address),
            reputation: tables.reputation.get(address).cloned(),
        })
    }

    fn stats(&self) -> Result<GraphStats, StoreError> {
        Ok(self.read().meta.stats)
    }

    fn undo_record(&self, height: BlockHeight) -> Result<Option<UndoRecord>, StoreError> {
        self.read().undo(height)
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let tables = self.read();
        Ok(StoreSnapshot {
            meta: tables.meta.clone(),
            edges: tables.edges.values().cloned().collect(),
            votes: tables.votes.values().cloned().collect(),
            bonds: tables.bonds.values().cloned().collect(),
            reputation: tables.reputation.values().cloned().collect(),
            undo: tables.undo.values().cloned().collect(),
        })
    }
}
