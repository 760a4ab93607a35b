//! The host chain's view of blocks and transactions.
//!
//! The host has already validated everything here for consensus. This core
//! only reads the pieces the trust protocol needs: the data-carrier output,
//! the collateral output, spent outpoints, and the signing address.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, BlockHash, BlockHeight, TxId};

/// Reference to a specific output of a previous transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: TxId, vout: u32) -> Self {
        Self { txid, vout }
    }
}

/// What an output locks its value to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// Ordinary spendable payment.
    Payment { recipient: Address },
    /// Unspendable output carrying protocol bytes.
    DataCarrier { data: Vec<u8> },
    /// Script-locked collateral: spendable by `owner` only once the chain
    /// reaches `unlock_height`.
    Collateral {
        owner: Address,
        unlock_height: BlockHeight,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Amount,
    pub kind: OutputKind,
}

impl TxOutput {
    pub fn payment(recipient: Address, value: Amount) -> Self {
        Self {
            value,
            kind: OutputKind::Payment { recipient },
        }
    }

    pub fn data_carrier(data: Vec<u8>) -> Self {
        Self {
            value: Amount::ZERO,
            kind: OutputKind::DataCarrier { data },
        }
    }

    pub fn collateral(owner: Address, value: Amount, unlock_height: BlockHeight) -> Self {
        Self {
            value,
            kind: OutputKind::Collateral {
                owner,
                unlock_height,
            },
        }
    }
}

/// A transaction as delivered by the host chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: TxId,
    /// Address that signed the inputs, resolved by the host. `None` when the
    /// host cannot attribute the inputs to a single address.
    pub sender: Option<Address>,
    pub inputs: Vec<OutPoint>,
    pub outputs: Vec<TxOutput>,
    /// Height-based lock time; `0` means final at any height.
    pub lock_time: BlockHeight,
    pub fee: Amount,
    /// Virtual size in bytes, used by fee-rate selection.
    pub vsize: u32,
    pub coinbase: bool,
}

impl Transaction {
    /// The first data-carrier output, with its index.
    pub fn data_carrier(&self) -> Option<(u32, &[u8])> {
        self.outputs
            .iter()
            .enumerate()
            .find_map(|(i, out)| match &out.kind {
                OutputKind::DataCarrier { data } => Some((i as u32, data.as_slice())),
                _ => None,
            })
    }

    /// The first collateral output, with its index.
    pub fn collateral(&self) -> Option<(u32, &TxOutput)> {
        self.outputs
            .iter()
            .enumerate()
            .find(|(_, out)| matches!(out.kind, OutputKind::Collateral { .. }))
            .map(|(i, out)| (i as u32, out))
    }

    pub fn data_carrier_count(&self) -> usize {
        self.outputs
            .iter()
            .filter(|out| matches!(out.kind, OutputKind::DataCarrier { .. }))
            .count()
    }

    /// Sum of all output values, saturating.
    pub fn output_value(&self) -> Amount {
        self.outputs
            .iter()
            .fold(Amount::ZERO, |acc, out| acc.saturating_add(out.value))
    }
}

/// A connected (or disconnected) block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: BlockHeight,
    pub hash: BlockHash,
    pub parent: BlockHash,
    /// Transactions in canonical block order.
    pub transactions: Vec<Transaction>,
    /// Statement ids accepted as fraudulent by the host's dispute rules at
    /// this height. Their bonds are slashed when the block connects.
    #[serde(default)]
    pub slash_flags: Vec<TxId>,
}
