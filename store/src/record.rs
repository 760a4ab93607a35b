//! Persisted trust graph records.

use serde::{Deserialize, Serialize};
use wot_types::{Address, Amount, BlockHeight, OutPoint, TxId};

/// The active directed trust statement from `source` to `target`.
///
/// At most one exists per `(source, target)`; a newer statement replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEdge {
    pub source: Address,
    pub target: Address,
    pub weight: i16,
    pub bond: Amount,
    /// Transaction that published this edge; also the id of its bond.
    pub origin: TxId,
    pub height: BlockHeight,
    pub memo: Vec<u8>,
}

impl TrustEdge {
    pub fn key(&self) -> (Address, Address) {
        (self.source, self.target)
    }
}

/// A bonded score adjustment. Votes are append-only events keyed by `seq`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondedVote {
    pub seq: u64,
    pub voter: Address,
    pub target: Address,
    pub delta: i16,
    pub bond: Amount,
    pub origin: TxId,
    pub height: BlockHeight,
    pub memo: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondState {
    /// Collateral is time-locked and backs its statement.
    Locked,
    /// Unlock height reached; still backs its statement until spent.
    Matured,
    /// Superseded or collateral spent.
    Released,
    /// Forfeited by an accepted slash flag; its statement no longer counts.
    Slashed,
}

impl BondState {
    /// Whether the bond's value is still committed as collateral.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Locked | Self::Matured)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Edge,
    Vote,
}

/// Collateral backing one accepted statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// Id of the owning statement (its origin transaction).
    pub statement: TxId,
    pub kind: StatementKind,
    pub owner: Address,
    /// Target of the owning statement.
    pub subject: Address,
    pub amount: Amount,
    pub collateral: OutPoint,
    pub created_height: BlockHeight,
    pub unlock_height: BlockHeight,
    pub state: BondState,
}

impl Bond {
    /// Value counted toward the locked-collateral total.
    pub fn locked_value(&self) -> Amount {
        if self.state.is_active() {
            self.amount
        } else {
            Amount::ZERO
        }
    }
}

/// Cached reputation score of an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reputation {
    pub address: Address,
    pub score: i32,
    pub updated_height: BlockHeight,
}
