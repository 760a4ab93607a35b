//! Property tests over randomly generated statement chains.
//!
//! Whatever the block contents, undoing the tip must restore the exact
//! prior state, and replaying a block must reproduce the same state.

mod common;

use proptest::prelude::*;

use common::*;
use wot_node::BlockProcessor;
use wot_nullables::NullTrustStore;
use wot_payload::{BondedVotePayload, TrustEdgePayload, TrustPayload};
use wot_store::TrustGraphStore;
use wot_types::{Block, BlockHeight, Transaction, TrustParams, TxId};

#[derive(Clone, Debug)]
enum Op {
    Edge { source: u8, target: u8, weight: i16 },
    Vote { source: u8, target: u8, delta: i16 },
    /// Spend the collateral of an earlier statement, by index.
    Spend { statement: usize },
    /// Slash an earlier statement, by index.
    Slash { statement: usize },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u8..6, 1u8..6, -100i16..=100).prop_map(|(source, target, weight)| Op::Edge { source, target, weight }),
        3 => (1u8..6, 1u8..6, -100i16..=100).prop_map(|(source, target, delta)| Op::Vote { source, target, delta }),
        1 => any::<usize>().prop_map(|statement| Op::Spend { statement }),
        1 => any::<usize>().prop_map(|statement| Op::Slash { statement }),
    ]
}

fn arb_chain() -> impl Strategy<Value = Vec<Vec<Op>>> {
    prop::collection::vec(prop::collection::vec(arb_op(), 0..8), 1..6)
}

fn unique_txid(height: BlockHeight, index: usize) -> TxId {
    let mut bytes = [0x33; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    bytes[8..16].copy_from_slice(&(index as u64).to_be_bytes());
    TxId::new(bytes)
}

/// Turn generated ops into concrete blocks, resolving statement indexes
/// against the statements issued so far.
fn build_chain(ops: &[Vec<Op>]) -> Vec<Block> {
    let params = TrustParams::default();
    let mut issued: Vec<(TxId, u8)> = Vec::new();
    let mut blocks = Vec::new();
    for (i, block_ops) in ops.iter().enumerate() {
        let height = i as BlockHeight + 1;
        let mut txs: Vec<Transaction> = Vec::new();
        let mut slash_flags = Vec::new();
        for (j, op) in block_ops.iter().enumerate() {
            let id = unique_txid(height, j);
            match *op {
                Op::Edge { source, target, weight } => {
                    let bond = params.required_bond(weight).unwrap();
                    let payload: TrustPayload =
                        TrustEdgePayload::new(addr(target), weight, bond, "").into();
                    txs.push(statement_tx(id, source, payload, LONG_LOCK));
                    issued.push((id, source));
                }
                Op::Vote { source, target, delta } => {
                    let bond = params.required_bond(delta).unwrap();
                    let payload: TrustPayload =
                        BondedVotePayload::new(addr(target), delta, bond, "").into();
                    txs.push(statement_tx(id, source, payload, LONG_LOCK));
                    issued.push((id, source));
                }
                Op::Spend { statement } if !issued.is_empty() => {
                    let (origin, owner) = issued[statement % issued.len()];
                    let mut spend = spend_tx(0, owner, origin);
                    spend.txid = id;
                    txs.push(spend);
                }
                Op::Slash { statement } if !issued.is_empty() => {
                    slash_flags.push(issued[statement % issued.len()].0);
                }
                Op::Spend { .. } | Op::Slash { .. } => {}
            }
        }
        let mut b = block(height, txs);
        b.slash_flags = slash_flags;
        blocks.push(b);
    }
    blocks
}

fn processor() -> BlockProcessor<NullTrustStore> {
    null_processor(&TrustParams::default())
}

fn digest(processor: &BlockProcessor<NullTrustStore>) -> [u8; 32] {
    processor.store().snapshot().unwrap().digest().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_restores_every_prior_state(ops in arb_chain()) {
        let chain = build_chain(&ops);
        let processor = processor();

        let mut digests = vec![digest(&processor)];
        for b in &chain {
            processor.on_connect(b).unwrap();
            digests.push(digest(&processor));
        }
        for (i, b) in chain.iter().enumerate().rev() {
            processor.on_disconnect(b).unwrap();
            prop_assert_eq!(digest(&processor), digests[i]);
        }
        prop_assert_eq!(processor.stats().unwrap(), wot_store::GraphStats::default());
    }

    #[test]
    fn replaying_a_chain_is_deterministic(ops in arb_chain()) {
        let chain = build_chain(&ops);
        let first = processor();
        let second = processor();

        for b in &chain {
            let a = first.on_connect(b).unwrap();
            let c = second.on_connect(b).unwrap();
            prop_assert_eq!(a, c);
        }
        prop_assert_eq!(digest(&first), digest(&second));

        let tip = chain.last().unwrap();
        let before = digest(&first);
        first.on_disconnect(tip).unwrap();
        first.on_connect(tip).unwrap();
        prop_assert_eq!(digest(&first), before);
    }

    #[test]
    fn scores_stay_in_range(ops in arb_chain()) {
        let chain = build_chain(&ops);
        let processor = processor();
        for b in &chain {
            processor.on_connect(b).unwrap();
        }
        let bounds = TrustParams::default().reputation;
        for a in 1u8..6 {
            let score = processor.query(&addr(a)).unwrap().score;
            prop_assert!((bounds.min_score..=bounds.max_score).contains(&score));
        }
        let stats = processor.stats().unwrap();
        prop_assert_eq!(stats.vote_count, processor.store().next_vote_seq().unwrap());
    }
}
