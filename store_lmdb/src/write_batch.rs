//! Write batching: one LMDB write transaction per block.
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use wot_store::{
    Bond, BondState, BondedVote, RecordWriter, Reputation, StoreError, StoreMeta, TrustEdge,
    UndoRecord,
};
use wot_types::{Address, BlockHeight, TxId};

use crate::environment::{LmdbEnvironment, META_KEY};
use crate::{keys, LmdbError};

/// Groups every record write of one block into a single LMDB write
/// transaction, keeping the secondary indexes in step.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env().write_txn()?;
        Ok(Self { txn, env })
    }

    /// Commit the batch atomically.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

impl RecordWriter for WriteBatch<'_> {
    fn meta(&self) -> Result<StoreMeta, StoreError> {
        Ok(self.env.read_meta(&self.txn)?)
    }

    fn put_meta(&mut self, meta: &StoreMeta) -> Result<(), StoreError> {
        let bytes = bincode::serialize(meta).map_err(LmdbError::from)?;
        self.env
            .meta_db
            .put(&mut self.txn, META_KEY, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Edges ───────────────────────────────────────────────────────────

    fn edge(&self, source: &Address, target: &Address) -> Result<Option<TrustEdge>, StoreError> {
        Ok(self.env.read_edge(&self.txn, source, target)?)
    }

    fn put_edge(&mut self, edge: &TrustEdge) -> Result<(), StoreError> {
        let bytes = bincode::serialize(edge).map_err(LmdbError::from)?;
        self.env
            .edges_db
            .put(&mut self.txn, &keys::edge_key(&edge.source, &edge.target), &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .edges_in_db
            .put(&mut self.txn, &keys::edge_in_key(&edge.target, &edge.source), &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_edge(&mut self, source: &Address, target: &Address) -> Result<(), StoreError> {
        self.env
            .edges_db
            .delete(&mut self.txn, &keys::edge_key(source, target))
            .map_err(LmdbError::from)?;
        self.env
            .edges_in_db
            .delete(&mut self.txn, &keys::edge_in_key(target, source))
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Votes ───────────────────────────────────────────────────────────

    fn vote(&self, seq: u64) -> Result<Option<BondedVote>, StoreError> {
        Ok(self.env.read_vote(&self.txn, seq)?)
    }

    fn put_vote(&mut self, vote: &BondedVote) -> Result<(), StoreError> {
        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        self.env
            .votes_db
            .put(&mut self.txn, &keys::vote_key(vote.seq), &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .votes_by_target_db
            .put(&mut self.txn, &keys::vote_by_target_key(&vote.target, vote.seq), &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_vote(&mut self, vote: &BondedVote) -> Result<(), StoreError> {
        self.env
            .votes_db
            .delete(&mut self.txn, &keys::vote_key(vote.seq))
            .map_err(LmdbError::from)?;
        self.env
            .votes_by_target_db
            .delete(&mut self.txn, &keys::vote_by_target_key(&vote.target, vote.seq))
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Bonds ───────────────────────────────────────────────────────────

    fn bond(&self, id: &TxId) -> Result<Option<Bond>, StoreError> {
        Ok(self.env.read_bond(&self.txn, id)?)
    }

    /// Maintains the maturity index: only Locked bonds are listed there.
    fn put_bond(&mut self, bond: &Bond, previous: Option<&Bond>) -> Result<(), StoreError> {
        if let Some(prev) = previous.filter(|b| b.state == BondState::Locked) {
            self.env
                .bonds_due_db
                .delete(&mut self.txn, &keys::bond_due_key(prev.unlock_height, &prev.statement))
                .map_err(LmdbError::from)?;
        }
        let bytes = bincode::serialize(bond).map_err(LmdbError::from)?;
        self.env
            .bonds_db
            .put(&mut self.txn, bond.statement.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        if bond.state == BondState::Locked {
            self.env
                .bonds_due_db
                .put(&mut self.txn, &keys::bond_due_key(bond.unlock_height, &bond.statement), &[])
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn delete_bond(&mut self, bond: &Bond) -> Result<(), StoreError> {
        self.env
            .bonds_db
            .delete(&mut self.txn, bond.statement.as_bytes())
            .map_err(LmdbError::from)?;
        self.env
            .bonds_due_db
            .delete(&mut self.txn, &keys::bond_due_key(bond.unlock_height, &bond.statement))
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Reputation ──────────────────────────────────────────────────────

    fn reputation(&self, address: &Address) -> Result<Option<Reputation>, StoreError> {
        Ok(self.env.read_reputation(&self.txn, address)?)
    }

    fn put_reputation(&mut self, reputation: &Reputation) -> Result<(), StoreError> {
        let bytes = bincode::serialize(reputation).map_err(LmdbError::from)?;
        self.env
            .reputation_db
            .put(&mut self.txn, reputation.address.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_reputation(&mut self, address: &Address) -> Result<(), StoreError> {
        self.env
            .reputation_db
            .delete(&mut self.txn, address.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Undo ────────────────────────────────────────────────────────────

    fn undo(&self, height: BlockHeight) -> Result<Option<UndoRecord>, StoreError> {
        Ok(self.env.read_undo(&self.txn, height)?)
    }

    fn put_undo(&mut self, record: &UndoRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .undo_db
            .put(&mut self.txn, &keys::undo_key(record.height), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_undo(&mut self, height: BlockHeight) -> Result<(), StoreError> {
        self.env
            .undo_db
            .delete(&mut self.txn, &keys::undo_key(height))
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wot_types::{Amount, OutPoint};
    use wot_store::StatementKind;

    use super::*;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("failed to open env");
        (dir, env)
    }

    fn sample_edge() -> TrustEdge {
        TrustEdge {
            source: Address::new([1; 20]),
            target: Address::new([2; 20]),
            weight: 10,
            bond: Amount::new(110_000_000),
            origin: TxId::new([3; 32]),
            height: 1,
            memo: b"hi".to_vec(),
        }
    }

    fn sample_bond(state: BondState) -> Bond {
        Bond {
            statement: TxId::new([3; 32]),
            kind: StatementKind::Edge,
            owner: Address::new([1; 20]),
            subject: Address::new([2; 20]),
            amount: Amount::new(110_000_000),
            collateral: OutPoint::new(TxId::new([3; 32]), 1),
            created_height: 1,
            unlock_height: 1441,
            state,
        }
    }

    #[test]
    fn committed_batch_is_visible() {
        let (_dir, env) = temp_env();
        let edge = sample_edge();

        let mut batch = env.write_batch().expect("write_batch");
        batch.put_edge(&edge).expect("put_edge");
        batch.commit().expect("commit");

        let txn = env.read_txn().unwrap();
        let stored = env.read_edge(&txn, &edge.source, &edge.target).unwrap();
        assert_eq!(stored, Some(edge.clone()));
        let indexed = env
            .edges_in_db
            .get(&txn, &keys::edge_in_key(&edge.target, &edge.source))
            .unwrap();
        assert!(indexed.is_some());
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();
        let edge = sample_edge();

        {
            let mut batch = env.write_batch().expect("write_batch");
            batch.put_edge(&edge).expect("put_edge");
            // batch is dropped here, implicit rollback
        }

        let txn = env.read_txn().unwrap();
        assert_eq!(env.read_edge(&txn, &edge.source, &edge.target).unwrap(), None);
    }

    #[test]
    fn due_index_follows_bond_state() {
        let (_dir, env) = temp_env();
        let locked = sample_bond(BondState::Locked);
        let matured = sample_bond(BondState::Matured);
        let due_key = keys::bond_due_key(locked.unlock_height, &locked.statement);

        let mut batch = env.write_batch().unwrap();
        batch.put_bond(&locked, None).unwrap();
        batch.commit().unwrap();
        {
            let txn = env.read_txn().unwrap();
            assert!(env.bonds_due_db.get(&txn, &due_key).unwrap().is_some());
        }

        let mut batch = env.write_batch().unwrap();
        batch.put_bond(&matured, Some(&locked)).unwrap();
        batch.commit().unwrap();

        let txn = env.read_txn().unwrap();
        assert!(env.bonds_due_db.get(&txn, &due_key).unwrap().is_none());
        assert_eq!(env.read_bond(&txn, &matured.statement).unwrap(), Some(matured));
    }
}
