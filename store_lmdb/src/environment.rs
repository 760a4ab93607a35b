//! LMDB environment setup and table reads.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use wot_store::{Bond, BondedVote, Reputation, StoreMeta, TrustEdge, UndoRecord, SCHEMA_VERSION};
use wot_types::{Address, BlockHeight, TxId};

use crate::keys;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

pub(crate) const META_KEY: &[u8] = b"graph_meta";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Number of named databases opened below.
pub const MAX_DBS: u32 = 9;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) edges_db: Database<Bytes, Bytes>,
    pub(crate) edges_in_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) votes_by_target_db: Database<Bytes, Bytes>,
    pub(crate) bonds_db: Database<Bytes, Bytes>,
    pub(crate) bonds_due_db: Database<Bytes, Bytes>,
    pub(crate) reputation_db: Database<Bytes, Bytes>,
    pub(crate) undo_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and path; no
        // other handle maps the same file concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let edges_db = env.create_database(&mut wtxn, Some("edges"))?;
        let edges_in_db = env.create_database(&mut wtxn, Some("edges_in"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let votes_by_target_db = env.create_database(&mut wtxn, Some("votes_by_target"))?;
        let bonds_db = env.create_database(&mut wtxn, Some("bonds"))?;
        let bonds_due_db = env.create_database(&mut wtxn, Some("bonds_due"))?;
        let reputation_db = env.create_database(&mut wtxn, Some("reputation"))?;
        let undo_db = env.create_database(&mut wtxn, Some("undo"))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;

        match meta_db.get(&wtxn, SCHEMA_VERSION_KEY)? {
            None => {
                meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_le_bytes())?;
                info!(path = %path.display(), version = SCHEMA_VERSION, "initialised trust store");
            }
            Some(bytes) => {
                let found = <[u8; 4]>::try_from(bytes)
                    .map(u32::from_le_bytes)
                    .map_err(|_| {
                        LmdbError::Serialization("schema_version has unexpected byte length".into())
                    })?;
                if found != SCHEMA_VERSION {
                    return Err(LmdbError::SchemaMismatch {
                        found,
                        expected: SCHEMA_VERSION,
                    });
                }
                debug!(path = %path.display(), version = found, "opened trust store");
            }
        }
        wtxn.commit()?;

        Ok(Self {
            env,
            edges_db,
            edges_in_db,
            votes_db,
            votes_by_target_db,
            bonds_db,
            bonds_due_db,
            reputation_db,
            undo_db,
            meta_db,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Begin a write batch. Dropping it without committing aborts.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, LmdbError> {
        WriteBatch::new(self)
    }

    pub fn read_txn(&self) -> Result<RoTxn<'_>, LmdbError> {
        Ok(self.env.read_txn()?)
    }

    // ── Reads shared by snapshots and write batches ──────────────────────

    pub(crate) fn read_meta(&self, txn: &RoTxn) -> Result<StoreMeta, LmdbError> {
        match self.meta_db.get(txn, META_KEY)? {
            Some(bytes) => Ok(bincode::deserialize(bytes)?),
            None => Ok(StoreMeta::default()),
        }
    }

    pub(crate) fn read_edge(
        &self,
        txn: &RoTxn,
        source: &Address,
        target: &Address,
    ) -> Result<Option<TrustEdge>, LmdbError> {
        decode_opt(self.edges_db.get(txn, &keys::edge_key(source, target))?)
    }

    pub(crate) fn read_vote(&self, txn: &RoTxn, seq: u64) -> Result<Option<BondedVote>, LmdbError> {
        decode_opt(self.votes_db.get(txn, &keys::vote_key(seq))?)
    }

    pub(crate) fn read_bond(&self, txn: &RoTxn, id: &TxId) -> Result<Option<Bond>, LmdbError> {
        decode_opt(self.bonds_db.get(txn, id.as_bytes())?)
    }

    pub(crate) fn read_reputation(
        &self,
        txn: &RoTxn,
        address: &Address,
    ) -> Result<Option<Reputation>, LmdbError> {
        decode_opt(self.reputation_db.get(txn, address.as_bytes())?)
    }

    pub(crate) fn read_undo(
        &self,
        txn: &RoTxn,
        height: BlockHeight,
    ) -> Result<Option<UndoRecord>, LmdbError> {
        decode_opt(self.undo_db.get(txn, &keys::undo_key(height))?)
    }
}

/// Deserialize every value of `db` in key order.
pub(crate) fn collect_all<T: DeserializeOwned>(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
) -> Result<Vec<T>, LmdbError> {
    let mut out = Vec::new();
    for entry in db.iter(txn)? {
        let (_key, value) = entry?;
        out.push(bincode::deserialize(value)?);
    }
    Ok(out)
}

fn decode_opt<T: DeserializeOwned>(bytes: Option<&[u8]>) -> Result<Option<T>, LmdbError> {
    bytes
        .map(|b| bincode::deserialize(b).map_err(LmdbError::from))
        .transpose()
}
