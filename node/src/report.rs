//! Per-block outcome reports.

use wot_bonds::BondError;
use wot_payload::PayloadError;
use wot_store::{BondState, StatementKind};
use wot_types::{Address, BlockHash, BlockHeight, TxId};

/// A statement that was validated and staged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedStatement {
    pub txid: TxId,
    pub kind: StatementKind,
    pub source: Address,
    pub target: Address,
    /// Edge weight or vote delta.
    pub value: i16,
}

/// Why a statement or slash flag had no effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Protocol magic present but the payload failed to decode.
    Malformed(PayloadError),
    /// The host could not attribute the inputs to one address.
    MissingSender,
    SelfReference,
    /// A bond already exists for this statement id.
    DuplicateStatement,
    Bond(BondError),
    /// Slash flag naming a statement with no bond.
    UnknownSlashTarget,
    /// Slash flag naming a bond that is no longer active.
    InactiveSlashTarget(BondState),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedStatement {
    pub txid: TxId,
    pub reason: SkipReason,
}

/// What connecting one block did to the trust graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectReport {
    pub height: BlockHeight,
    pub hash: BlockHash,
    pub accepted: Vec<AcceptedStatement>,
    /// Origins of edges replaced by a later edge on the same pair.
    pub superseded: Vec<TxId>,
    pub matured: Vec<TxId>,
    /// Bonds released by supersession or collateral spend.
    pub released: Vec<TxId>,
    pub slashed: Vec<TxId>,
    pub skipped: Vec<SkippedStatement>,
    /// Trust payloads carrying an op type this version ignores.
    pub unknown_ops: usize,
    /// Addresses whose cached score was recomputed.
    pub rescored: Vec<Address>,
}

impl ConnectReport {
    pub(crate) fn new(height: BlockHeight, hash: BlockHash) -> Self {
        Self {
            height,
            hash,
            ..Self::default()
        }
    }

    pub(crate) fn skip(&mut self, txid: TxId, reason: SkipReason) {
        self.skipped.push(SkippedStatement { txid, reason });
    }
}

/// What disconnecting one block restored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisconnectReport {
    pub height: BlockHeight,
    pub hash: BlockHash,
    pub edges_restored: usize,
    pub votes_removed: u64,
    pub bonds_restored: usize,
    pub scores_restored: usize,
}
