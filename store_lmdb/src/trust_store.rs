//! LMDB implementation of [`TrustGraphStore`].

use std::ops::Bound;
use std::path::Path;

use heed::RoTxn;
use tracing::{debug, warn};

use wot_store::{
    apply_delta, revert_block, AddressSummary, BlockDelta, Bond, BondedVote, GraphStats,
    Reputation, StoreError, StoreSnapshot, TrustEdge, TrustGraphStore, UndoRecord,
};
use wot_types::{Address, BlockHeight, ChainTip, TxId};

use crate::environment::collect_all;
use crate::integrity::check_integrity;
use crate::{keys, LmdbEnvironment, LmdbError};

/// Durable trust graph. Each block is one LMDB write transaction; readers
/// get MVCC snapshots and never block the writer.
pub struct LmdbTrustStore {
    env: LmdbEnvironment,
}

impl LmdbTrustStore {
    /// Open the store and run the startup integrity check.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        let env = LmdbEnvironment::open(path, map_size)?;
        let report = check_integrity(&env)?;
        if !report.is_healthy() {
            for error in &report.errors {
                warn!(%error, "trust store integrity check");
            }
        }
        debug!(
            tables = report.databases_checked,
            entries = report.total_entries,
            "trust store integrity checked"
        );
        Ok(Self { env })
    }

    pub fn environment(&self) -> &LmdbEnvironment {
        &self.env
    }

    fn outgoing_in(&self, txn: &RoTxn, source: &Address) -> Result<Vec<TrustEdge>, LmdbError> {
        let prefix = source.as_bytes();
        let upper = keys::prefix_upper_bound(prefix);
        let bounds = keys::prefix_bounds(prefix, upper.as_deref());
        let mut edges = Vec::new();
        for entry in self.env.edges_db.range(txn, &bounds)? {
            let (_key, value) = entry?;
            edges.push(bincode::deserialize(value)?);
        }
        Ok(edges)
    }

    fn incoming_in(&self, txn: &RoTxn, target: &Address) -> Result<Vec<TrustEdge>, LmdbError> {
        let prefix = target.as_bytes();
        let upper = keys::prefix_upper_bound(prefix);
        let bounds = keys::prefix_bounds(prefix, upper.as_deref());
        let mut edges = Vec::new();
        for entry in self.env.edges_in_db.range(txn, &bounds)? {
            let (key, _) = entry?;
            let source = keys::second_address(key)
                .ok_or_else(|| LmdbError::Serialization("malformed edges_in key".into()))?;
            let edge = self
                .env
                .read_edge(txn, &source, target)?
                .ok_or_else(|| LmdbError::NotFound(format!("edge {source} -> {target}")))?;
            edges.push(edge);
        }
        Ok(edges)
    }

    fn votes_in(&self, txn: &RoTxn, target: &Address) -> Result<Vec<BondedVote>, LmdbError> {
        let prefix = target.as_bytes();
        let upper = keys::prefix_upper_bound(prefix);
        let bounds = keys::prefix_bounds(prefix, upper.as_deref());
        let mut votes = Vec::new();
        for entry in self.env.votes_by_target_db.range(txn, &bounds)? {
            let (key, _) = entry?;
            let seq = keys::trailing_seq(key)
                .ok_or_else(|| LmdbError::Serialization("malformed votes_by_target key".into()))?;
            let vote = self
                .env
                .read_vote(txn, seq)?
                .ok_or_else(|| LmdbError::NotFound(format!("vote {seq}")))?;
            votes.push(vote);
        }
        Ok(votes)
    }
}

impl TrustGraphStore for LmdbTrustStore {
    fn apply_block(&self, delta: &BlockDelta) -> Result<(), StoreError> {
        let mut batch = self.env.write_batch()?;
        let undo = apply_delta(&mut batch, delta)?;
        batch.commit()?;
        debug!(
            height = delta.height,
            edges = undo.edges.len(),
            votes = undo.votes_appended,
            bonds = undo.bonds.len(),
            "applied block to trust store"
        );
        Ok(())
    }

    fn undo_block(&self, height: BlockHeight) -> Result<UndoRecord, StoreError> {
        let mut batch = self.env.write_batch()?;
        let undo = revert_block(&mut batch, height)?;
        batch.commit()?;
        debug!(height, "reverted block in trust store");
        Ok(undo)
    }

    fn tip(&self) -> Result<Option<ChainTip>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_meta(&txn)?.tip)
    }

    fn next_vote_seq(&self) -> Result<u64, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_meta(&txn)?.next_vote_seq)
    }

    fn get_edge(
        &self,
        source: &Address,
        target: &Address,
    ) -> Result<Option<TrustEdge>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_edge(&txn, source, target)?)
    }

    fn outgoing_edges(&self, source: &Address) -> Result<Vec<TrustEdge>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.outgoing_in(&txn, source)?)
    }

    fn incoming_edges(&self, target: &Address) -> Result<Vec<TrustEdge>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.incoming_in(&txn, target)?)
    }

    fn votes_for(&self, target: &Address) -> Result<Vec<BondedVote>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.votes_in(&txn, target)?)
    }

    fn get_bond(&self, statement: &TxId) -> Result<Option<Bond>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_bond(&txn, statement)?)
    }

    fn bonds_due(&self, height: BlockHeight) -> Result<Vec<Bond>, StoreError> {
        let txn = self.env.read_txn()?;
        let upper = keys::bond_due_key(height, &TxId::new([0xFF; 32]));
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (Bound::Unbounded, Bound::Included(&upper));
        let mut bonds = Vec::new();
        for entry in self.env.bonds_due_db.range(&txn, &bounds).map_err(LmdbError::from)? {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let id = keys::trailing_txid(key)
                .ok_or_else(|| LmdbError::Serialization("malformed bonds_due key".into()))?;
            let bond = self
                .env
                .read_bond(&txn, &id)?
                .ok_or_else(|| StoreError::Corruption(format!("due index names missing bond {id}")))?;
            bonds.push(bond);
        }
        Ok(bonds)
    }

    fn get_reputation(&self, address: &Address) -> Result<Option<Reputation>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_reputation(&txn, address)?)
    }

    fn summary(&self, address: &Address) -> Result<AddressSummary, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(AddressSummary {
            outgoing: self.outgoing_in(&txn, address)?,
            incoming: self.incoming_in(&txn, address)?,
            votes_received: self.votes_in(&txn, address)?,
            reputation: self.env.read_reputation(&txn, address)?,
        })
    }

    fn stats(&self) -> Result<GraphStats, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_meta(&txn)?.stats)
    }

    fn undo_record(&self, height: BlockHeight) -> Result<Option<UndoRecord>, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(self.env.read_undo(&txn, height)?)
    }

    fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let txn = self.env.read_txn()?;
        Ok(StoreSnapshot {
            meta: self.env.read_meta(&txn)?,
            edges: collect_all(&self.env.edges_db, &txn)?,
            votes: collect_all(&self.env.votes_db, &txn)?,
            bonds: collect_all(&self.env.bonds_db, &txn)?,
            reputation: collect_all(&self.env.reputation_db, &txn)?,
            undo: collect_all(&self.env.undo_db, &txn)?,
        })
    }
}
