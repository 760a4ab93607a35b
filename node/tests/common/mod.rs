//! Shared builders for node integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use wot_node::BlockProcessor;
use wot_nullables::NullTrustStore;
use wot_payload::{BondedVotePayload, PayloadCodec, TrustEdgePayload, TrustPayload};
use wot_store_lmdb::LmdbTrustStore;
use wot_types::{
    Address, Amount, Block, BlockHash, BlockHeight, OutPoint, OutputKind, Transaction, TrustParams,
    TxId, TxOutput,
};

pub const A: u8 = 0xA;
pub const B: u8 = 0xB;
pub const C: u8 = 0xC;
pub const D: u8 = 0xD;

/// Unlock height comfortably past the default minimum lock.
pub const LONG_LOCK: BlockHeight = 5_000;

pub fn addr(b: u8) -> Address {
    Address::new([b; 20])
}

pub fn txid(n: u8) -> TxId {
    TxId::new([n; 32])
}

pub fn coins(whole: u64, cents: u64) -> Amount {
    Amount::from_coins_cents(whole, cents)
}

pub fn block_hash(height: BlockHeight) -> BlockHash {
    let mut bytes = [0x5A; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    BlockHash::new(bytes)
}

pub fn block(height: BlockHeight, transactions: Vec<Transaction>) -> Block {
    Block {
        height,
        hash: block_hash(height),
        parent: if height == 0 {
            BlockHash::ZERO
        } else {
            block_hash(height - 1)
        },
        transactions,
        slash_flags: Vec::new(),
    }
}

/// A statement transaction whose collateral exactly covers the declared bond.
pub fn statement_tx(id: TxId, source: u8, payload: TrustPayload, unlock: BlockHeight) -> Transaction {
    let data = PayloadCodec::default()
        .encode(&payload)
        .expect("test payload encodes");
    Transaction {
        txid: id,
        sender: Some(addr(source)),
        inputs: vec![OutPoint::new(TxId::new([0xEE; 32]), u32::from(id.as_bytes()[0]))],
        outputs: vec![
            TxOutput::data_carrier(data),
            TxOutput::collateral(addr(source), payload.bond(), unlock),
            TxOutput::payment(addr(source), coins(0, 10)),
        ],
        lock_time: 0,
        fee: Amount::new(2_000),
        vsize: 300,
        coinbase: false,
    }
}

pub fn edge_tx(id: u8, source: u8, target: u8, weight: i16, bond: Amount) -> Transaction {
    let payload = TrustEdgePayload::new(addr(target), weight, bond, "edge");
    statement_tx(txid(id), source, payload.into(), LONG_LOCK)
}

pub fn vote_tx(id: u8, source: u8, target: u8, delta: i16, bond: Amount) -> Transaction {
    let payload = BondedVotePayload::new(addr(target), delta, bond, "vote");
    statement_tx(txid(id), source, payload.into(), LONG_LOCK)
}

/// Spend the collateral output of statement `statement`.
pub fn spend_tx(id: u8, owner: u8, statement: TxId) -> Transaction {
    Transaction {
        txid: txid(id),
        sender: Some(addr(owner)),
        inputs: vec![OutPoint::new(statement, 1)],
        outputs: vec![TxOutput::payment(addr(owner), coins(1, 0))],
        lock_time: 0,
        fee: Amount::new(1_000),
        vsize: 200,
        coinbase: false,
    }
}

pub fn payment_tx(id: u8, from: u8, to: u8, value: Amount) -> Transaction {
    Transaction {
        txid: txid(id),
        sender: Some(addr(from)),
        inputs: vec![OutPoint::new(TxId::new([0xDD; 32]), u32::from(id))],
        outputs: vec![TxOutput::payment(addr(to), value)],
        lock_time: 0,
        fee: Amount::new(1_000),
        vsize: 200,
        coinbase: false,
    }
}

pub fn lmdb_processor(params: &TrustParams) -> (tempfile::TempDir, BlockProcessor<LmdbTrustStore>) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = LmdbTrustStore::open(dir.path(), 32 * 1024 * 1024).expect("failed to open store");
    let processor = BlockProcessor::new(Arc::new(store), params).expect("valid params");
    (dir, processor)
}

pub fn null_processor(params: &TrustParams) -> BlockProcessor<NullTrustStore> {
    BlockProcessor::new(Arc::new(NullTrustStore::new()), params).expect("valid params")
}

/// Minimal value ledger standing in for the host chain's UTXO set.
#[derive(Default)]
pub struct UtxoSet {
    outputs: BTreeMap<OutPoint, TxOutput>,
}

impl UtxoSet {
    pub fn connect(&mut self, block: &Block) {
        for tx in &block.transactions {
            for input in &tx.inputs {
                self.outputs.remove(input);
            }
            for (vout, output) in tx.outputs.iter().enumerate() {
                if !matches!(output.kind, OutputKind::DataCarrier { .. }) {
                    self.outputs.insert(OutPoint::new(tx.txid, vout as u32), output.clone());
                }
            }
        }
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.outputs.get(outpoint)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }
}
