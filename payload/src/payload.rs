//! Decoded statement payloads.

use serde::{Deserialize, Serialize};
use wot_types::{Address, Amount};

/// Statement kinds understood by this protocol version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum OpType {
    TrustEdge = 0x0004,
    BondedVote = 0x0005,
}

impl OpType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0x0004 => Some(Self::TrustEdge),
            0x0005 => Some(Self::BondedVote),
            _ => None,
        }
    }

    pub fn tag(self) -> u16 {
        self as u16
    }

    /// Encoded length including the header.
    pub fn payload_len(self) -> usize {
        match self {
            Self::TrustEdge => crate::EDGE_PAYLOAD_LEN,
            Self::BondedVote => crate::VOTE_PAYLOAD_LEN,
        }
    }

    pub fn memo_max(self) -> usize {
        match self {
            Self::TrustEdge => crate::EDGE_MEMO_MAX,
            Self::BondedVote => crate::VOTE_MEMO_MAX,
        }
    }
}

/// A directed, weighted trust statement from the signer to `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustEdgePayload {
    pub target: Address,
    pub weight: i16,
    pub bond: Amount,
    pub memo: Vec<u8>,
}

impl TrustEdgePayload {
    pub fn new(target: Address, weight: i16, bond: Amount, memo: impl Into<Vec<u8>>) -> Self {
        Self {
            target,
            weight,
            bond,
            memo: memo.into(),
        }
    }
}

/// A one-off score adjustment from the signer toward `target`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondedVotePayload {
    pub target: Address,
    pub delta: i16,
    pub bond: Amount,
    pub memo: Vec<u8>,
}

impl BondedVotePayload {
    pub fn new(target: Address, delta: i16, bond: Amount, memo: impl Into<Vec<u8>>) -> Self {
        Self {
            target,
            delta,
            bond,
            memo: memo.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustPayload {
    Edge(TrustEdgePayload),
    Vote(BondedVotePayload),
}

impl TrustPayload {
    pub fn op_type(&self) -> OpType {
        match self {
            Self::Edge(_) => OpType::TrustEdge,
            Self::Vote(_) => OpType::BondedVote,
        }
    }

    pub fn target(&self) -> Address {
        match self {
            Self::Edge(e) => e.target,
            Self::Vote(v) => v.target,
        }
    }

    /// Edge weight or vote delta.
    pub fn value(&self) -> i16 {
        match self {
            Self::Edge(e) => e.weight,
            Self::Vote(v) => v.delta,
        }
    }

    pub fn bond(&self) -> Amount {
        match self {
            Self::Edge(e) => e.bond,
            Self::Vote(v) => v.bond,
        }
    }

    pub fn memo(&self) -> &[u8] {
        match self {
            Self::Edge(e) => &e.memo,
            Self::Vote(v) => &v.memo,
        }
    }
}

impl From<TrustEdgePayload> for TrustPayload {
    fn from(edge: TrustEdgePayload) -> Self {
        Self::Edge(edge)
    }
}

impl From<BondedVotePayload> for TrustPayload {
    fn from(vote: BondedVotePayload) -> Self {
        Self::Vote(vote)
    }
}
