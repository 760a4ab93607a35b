//! Block connection and disconnection against the trust graph.
//!
//! Each connected block is scanned in canonical transaction order. Payload
//! decoding may fan out over the rayon pool, but every state decision is
//! made sequentially on a [`StagedBlock`] overlay and committed as one
//! delta. A store failure halts the processor until the store is rebuilt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use wot_bonds::BondLedger;
use wot_payload::{Decoded, PayloadCodec, PayloadError, TrustPayload};
use wot_reputation::{ReputationEngine, TrustGraphView, TrustPath};
use wot_store::{
    Bond, BondedVote, GraphStats, Reputation, StoreError, TrustEdge, TrustGraphStore,
};
use wot_types::{Address, Block, BlockHeight, ChainTip, Transaction, TrustParams, TxId};

use crate::report::{AcceptedStatement, ConnectReport, DisconnectReport, SkipReason};
use crate::staging::StagedBlock;
use crate::tracing_spans::{block_connect_span, block_disconnect_span};
use crate::NodeError;

/// Decoder output for one transaction; `None` when it has no data carrier
/// or is a coinbase.
type DecodeResult = Option<Result<Decoded, PayloadError>>;

/// Trust view of one address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustSummary {
    pub address: Address,
    pub score: i32,
    /// Height of the last rescoring; `None` while the score is the baseline.
    pub scored_at: Option<BlockHeight>,
    pub outgoing: Vec<TrustEdge>,
    pub incoming: Vec<TrustEdge>,
    pub votes_received: Vec<BondedVote>,
}

pub struct BlockProcessor<S: TrustGraphStore + ?Sized> {
    store: Arc<S>,
    codec: PayloadCodec,
    ledger: BondLedger,
    engine: ReputationEngine,
    parallel_decode: bool,
    /// Serializes connect and disconnect; readers never take it.
    write_lock: Mutex<()>,
    halted: AtomicBool,
}

impl<S: TrustGraphStore + ?Sized> BlockProcessor<S> {
    pub fn new(store: Arc<S>, params: &TrustParams) -> Result<Self, NodeError> {
        params.validate()?;
        Ok(Self {
            store,
            codec: PayloadCodec::new(params),
            ledger: BondLedger::new(params),
            engine: ReputationEngine::new(params.reputation.clone()),
            parallel_decode: true,
            write_lock: Mutex::new(()),
            halted: AtomicBool::new(false),
        })
    }

    pub fn with_parallel_decode(mut self, enabled: bool) -> Self {
        self.parallel_decode = enabled;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Apply the trust effects of `block`, which must extend the tip.
    pub fn on_connect(&self, block: &Block) -> Result<ConnectReport, NodeError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_running()?;
        let span = block_connect_span(block.height, &block.hash);
        let _enter = span.enter();

        let result = self.connect(block);
        self.halt_on_fatal(result)
    }

    /// Revert the trust effects of `block`, which must be the tip.
    pub fn on_disconnect(&self, block: &Block) -> Result<DisconnectReport, NodeError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_running()?;
        let span = block_disconnect_span(block.height, &block.hash);
        let _enter = span.enter();

        let result = self.disconnect(block);
        self.halt_on_fatal(result)
    }

    /// Score and statements of `address`. Addresses with no cached entry
    /// report the baseline score.
    pub fn query(&self, address: &Address) -> Result<TrustSummary, NodeError> {
        let summary = self.store.summary(address)?;
        let (score, scored_at) = match &summary.reputation {
            Some(reputation) => (reputation.score, Some(reputation.updated_height)),
            None => (self.engine.baseline(), None),
        };
        Ok(TrustSummary {
            address: *address,
            score,
            scored_at,
            outgoing: summary.outgoing,
            incoming: summary.incoming,
            votes_received: summary.votes_received,
        })
    }

    /// Score of `target` from `viewer`'s position in the trust graph.
    ///
    /// Edges, votes and paths backed by a slashed bond are left out. Each
    /// store read is its own snapshot, so a block committed mid-query may
    /// be seen partially.
    pub fn weighted_reputation(
        &self,
        viewer: &Address,
        target: &Address,
    ) -> Result<i32, NodeError> {
        let store = &*self.store;
        let graph = CountedGraph { store };
        let incoming = counted(store.incoming_edges(target)?, |e| e.origin, |id| {
            store.get_bond(id)
        })?;
        let votes = counted(store.votes_for(target)?, |v| v.origin, |id| store.get_bond(id))?;
        Ok(self
            .engine
            .weighted_score(&graph, viewer, target, &incoming, &votes)?)
    }

    /// Trust paths from `viewer` to `target`, strongest first.
    pub fn trust_paths(
        &self,
        viewer: &Address,
        target: &Address,
    ) -> Result<Vec<TrustPath>, NodeError> {
        let graph = CountedGraph { store: &*self.store };
        Ok(self.engine.trust_paths(&graph, viewer, target)?)
    }

    pub fn stats(&self) -> Result<GraphStats, NodeError> {
        Ok(self.store.stats()?)
    }

    pub fn tip(&self) -> Result<Option<ChainTip>, NodeError> {
        Ok(self.store.tip()?)
    }

    fn ensure_running(&self) -> Result<(), NodeError> {
        if self.is_halted() {
            return Err(NodeError::Halted);
        }
        Ok(())
    }

    fn halt_on_fatal<T>(&self, result: Result<T, NodeError>) -> Result<T, NodeError> {
        if let Err(e) = &result {
            if e.is_fatal() {
                self.halted.store(true, Ordering::SeqCst);
                error!(error = %e, "trust store failure, halting block processing");
            }
        }
        result
    }

    fn connect(&self, block: &Block) -> Result<ConnectReport, NodeError> {
        if let Some(tip) = self.store.tip()? {
            if block.height != tip.height + 1 || block.parent != tip.hash {
                return Err(NodeError::NotConnected {
                    height: block.height,
                    hash: block.hash,
                    tip_height: tip.height,
                });
            }
        }

        let decoded = self.decode_all(block);
        let mut staged = StagedBlock::new(&*self.store, block.height, block.hash, block.parent)?;
        let mut report = ConnectReport::new(block.height, block.hash);

        for (tx, decoded) in block.transactions.iter().zip(decoded) {
            if tx.coinbase {
                continue;
            }
            self.release_spent_collateral(&mut staged, tx, &mut report)?;
            match decoded {
                None | Some(Ok(Decoded::NotApplicable)) => {}
                Some(Ok(Decoded::UnknownOp(tag))) => {
                    debug!(txid = %tx.txid, tag, "ignoring unknown trust op");
                    report.unknown_ops += 1;
                }
                Some(Err(e)) => {
                    warn!(txid = %tx.txid, error = %e, "malformed trust payload");
                    report.skip(tx.txid, SkipReason::Malformed(e));
                }
                Some(Ok(Decoded::Payload(payload))) => {
                    self.stage_statement(&mut staged, tx, payload, &mut report)?;
                }
            }
        }

        self.apply_slash_flags(&mut staged, &block.slash_flags, &mut report)?;
        self.mature_due_bonds(&mut staged, &mut report)?;
        let reputation = self.rescore(&staged, &mut report)?;

        let delta = staged.into_delta(reputation);
        self.store.apply_block(&delta)?;
        info!(
            accepted = report.accepted.len(),
            skipped = report.skipped.len(),
            matured = report.matured.len(),
            released = report.released.len(),
            slashed = report.slashed.len(),
            "block connected"
        );
        Ok(report)
    }

    fn disconnect(&self, block: &Block) -> Result<DisconnectReport, NodeError> {
        if self.store.tip()? != Some(ChainTip::new(block.height, block.hash)) {
            return Err(NodeError::NotTip {
                height: block.height,
                hash: block.hash,
            });
        }
        match self.store.undo_record(block.height)? {
            None => {
                return Err(StoreError::Corruption(format!(
                    "no undo record for tip block {}",
                    block.height
                ))
                .into())
            }
            Some(record) if record.hash != block.hash => {
                return Err(StoreError::Corruption(format!(
                    "undo record at {} belongs to block {}",
                    block.height, record.hash
                ))
                .into())
            }
            Some(_) => {}
        }

        let undo = self.store.undo_block(block.height)?;
        info!(
            edges = undo.edges.len(),
            votes = undo.votes_appended,
            bonds = undo.bonds.len(),
            "block disconnected"
        );
        Ok(DisconnectReport {
            height: block.height,
            hash: block.hash,
            edges_restored: undo.edges.len(),
            votes_removed: undo.votes_appended,
            bonds_restored: undo.bonds.len(),
            scores_restored: undo.reputation.len(),
        })
    }

    /// Decode every data carrier, preserving transaction order.
    fn decode_all(&self, block: &Block) -> Vec<DecodeResult> {
        let codec = self.codec;
        let decode = move |tx: &Transaction| -> DecodeResult {
            if tx.coinbase {
                return None;
            }
            tx.data_carrier().map(|(_, data)| codec.decode(data))
        };
        if self.parallel_decode {
            block.transactions.par_iter().map(decode).collect()
        } else {
            block.transactions.iter().map(decode).collect()
        }
    }

    fn release_spent_collateral(
        &self,
        staged: &mut StagedBlock<'_, S>,
        tx: &Transaction,
        report: &mut ConnectReport,
    ) -> Result<(), NodeError> {
        for input in &tx.inputs {
            let Some(mut bond) = staged.bond(&input.txid)? else {
                continue;
            };
            if !BondLedger::is_collateral_spend(&bond, input) || !bond.state.is_active() {
                continue;
            }
            self.ledger.release(&mut bond)?;
            debug!(statement = %bond.statement, spender = %tx.txid, "collateral spent");
            report.released.push(bond.statement);
            staged.put_bond(bond);
        }
        Ok(())
    }

    fn stage_statement(
        &self,
        staged: &mut StagedBlock<'_, S>,
        tx: &Transaction,
        payload: TrustPayload,
        report: &mut ConnectReport,
    ) -> Result<(), NodeError> {
        let Some(source) = tx.sender else {
            warn!(txid = %tx.txid, "trust statement without a single sender");
            report.skip(tx.txid, SkipReason::MissingSender);
            return Ok(());
        };
        let target = payload.target();
        if source == target {
            warn!(txid = %tx.txid, %source, "self-referencing trust statement");
            report.skip(tx.txid, SkipReason::SelfReference);
            return Ok(());
        }
        if staged.bond(&tx.txid)?.is_some() {
            warn!(txid = %tx.txid, "statement already bonded");
            report.skip(tx.txid, SkipReason::DuplicateStatement);
            return Ok(());
        }
        let bond = match self.ledger.lock(tx, source, &payload, staged.height()) {
            Ok(bond) => bond,
            Err(e) => {
                warn!(txid = %tx.txid, error = %e, "trust statement bond rejected");
                report.skip(tx.txid, SkipReason::Bond(e));
                return Ok(());
            }
        };

        let kind = bond.kind;
        let value = payload.value();
        let height = staged.height();
        match payload {
            TrustPayload::Edge(edge) => {
                if let Some(previous) = staged.edge(&source, &edge.target)? {
                    self.release_superseded(staged, &previous, report)?;
                }
                staged.put_edge(TrustEdge {
                    source,
                    target: edge.target,
                    weight: edge.weight,
                    bond: edge.bond,
                    origin: tx.txid,
                    height,
                    memo: edge.memo,
                });
            }
            TrustPayload::Vote(vote) => {
                let seq = staged.push_vote(BondedVote {
                    seq: 0,
                    voter: source,
                    target: vote.target,
                    delta: vote.delta,
                    bond: vote.bond,
                    origin: tx.txid,
                    height,
                    memo: vote.memo,
                });
                debug!(seq, "vote appended");
            }
        }
        staged.put_bond(bond);

        debug!(txid = %tx.txid, ?kind, %source, %target, value, "statement accepted");
        report.accepted.push(AcceptedStatement {
            txid: tx.txid,
            kind,
            source,
            target,
            value,
        });
        Ok(())
    }

    fn release_superseded(
        &self,
        staged: &mut StagedBlock<'_, S>,
        previous: &TrustEdge,
        report: &mut ConnectReport,
    ) -> Result<(), NodeError> {
        report.superseded.push(previous.origin);
        let mut bond = require_bond(staged, &previous.origin)?;
        if bond.state.is_active() {
            self.ledger.release(&mut bond)?;
            report.released.push(bond.statement);
            staged.put_bond(bond);
        }
        Ok(())
    }

    fn apply_slash_flags(
        &self,
        staged: &mut StagedBlock<'_, S>,
        flags: &[TxId],
        report: &mut ConnectReport,
    ) -> Result<(), NodeError> {
        for id in flags {
            match staged.bond(id)? {
                None => {
                    warn!(statement = %id, "slash flag names no bonded statement");
                    report.skip(*id, SkipReason::UnknownSlashTarget);
                }
                Some(bond) if !bond.state.is_active() => {
                    warn!(statement = %id, state = ?bond.state, "slash flag on inactive bond");
                    report.skip(*id, SkipReason::InactiveSlashTarget(bond.state));
                }
                Some(mut bond) => {
                    self.ledger.slash(&mut bond)?;
                    info!(statement = %id, amount = %bond.amount, "bond slashed");
                    report.slashed.push(*id);
                    staged.put_bond(bond);
                }
            }
        }
        Ok(())
    }

    fn mature_due_bonds(
        &self,
        staged: &mut StagedBlock<'_, S>,
        report: &mut ConnectReport,
    ) -> Result<(), NodeError> {
        let height = staged.height();
        for mut bond in staged.bonds_due()? {
            if self.ledger.mature(&mut bond, height) {
                report.matured.push(bond.statement);
                staged.put_bond(bond);
            }
        }
        Ok(())
    }

    /// Recompute the cached score of every address whose incoming
    /// statements or their bonds changed in this block.
    fn rescore(
        &self,
        staged: &StagedBlock<'_, S>,
        report: &mut ConnectReport,
    ) -> Result<Vec<Reputation>, NodeError> {
        let mut updates = Vec::new();
        for address in staged.touched() {
            let edges = counted(staged.incoming_edges(address)?, |e| e.origin, |id| {
                staged.bond(id)
            })?;
            let votes = counted(staged.votes_for(address)?, |v| v.origin, |id| staged.bond(id))?;
            let reputation = self
                .engine
                .evaluate(*address, &edges, &votes, staged.height());
            debug!(%address, score = reputation.score, "rescored");
            report.rescored.push(*address);
            updates.push(reputation);
        }
        Ok(updates)
    }
}

fn require_bond<S: TrustGraphStore + ?Sized>(
    staged: &StagedBlock<'_, S>,
    statement: &TxId,
) -> Result<Bond, StoreError> {
    staged
        .bond(statement)?
        .ok_or_else(|| StoreError::Corruption(format!("statement {statement} has no bond")))
}

/// Keep the statements whose bond still counts toward reputation.
fn counted<T>(
    statements: Vec<T>,
    origin: impl Fn(&T) -> TxId,
    bond_of: impl Fn(&TxId) -> Result<Option<Bond>, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let mut kept = Vec::with_capacity(statements.len());
    for statement in statements {
        let id = origin(&statement);
        let bond = bond_of(&id)?
            .ok_or_else(|| StoreError::Corruption(format!("statement {id} has no bond")))?;
        if BondLedger::counts_toward_score(&bond) {
            kept.push(statement);
        }
    }
    Ok(kept)
}

/// Committed graph with slashed edges hidden.
struct CountedGraph<'a, S: ?Sized> {
    store: &'a S,
}

impl<S: TrustGraphStore + ?Sized> TrustGraphView for CountedGraph<'_, S> {
    type Error = StoreError;

    fn counted_outgoing(&self, source: &Address) -> Result<Vec<TrustEdge>, StoreError> {
        counted(self.store.outgoing_edges(source)?, |e| e.origin, |id| {
            self.store.get_bond(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use wot_nullables::NullTrustStore;
    use wot_payload::{BondedVotePayload, TrustEdgePayload};
    use wot_types::{Amount, BlockHash, OutPoint, TxOutput, COIN};

    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn hash(height: BlockHeight) -> BlockHash {
        let mut bytes = [0xAB; 32];
        bytes[..8].copy_from_slice(&height.to_be_bytes());
        BlockHash::new(bytes)
    }

    fn block(height: BlockHeight, transactions: Vec<Transaction>) -> Block {
        Block {
            height,
            hash: hash(height),
            parent: if height == 0 { BlockHash::ZERO } else { hash(height - 1) },
            transactions,
            slash_flags: Vec::new(),
        }
    }

    fn statement_tx(id: u8, source: u8, payload: TrustPayload, unlock: BlockHeight) -> Transaction {
        let data = PayloadCodec::default().encode(&payload).unwrap();
        Transaction {
            txid: TxId::new([id; 32]),
            sender: Some(addr(source)),
            inputs: vec![OutPoint::new(TxId::new([0xEE; 32]), id as u32)],
            outputs: vec![
                TxOutput::data_carrier(data),
                TxOutput::collateral(addr(source), payload.bond(), unlock),
            ],
            lock_time: 0,
            fee: Amount::new(1_000),
            vsize: 250,
            coinbase: false,
        }
    }

    fn edge_tx(id: u8, source: u8, target: u8, weight: i16) -> Transaction {
        let bond = Amount::new(COIN + COIN / 100 * u64::from(weight.unsigned_abs()));
        let payload = TrustEdgePayload::new(addr(target), weight, bond, "");
        statement_tx(id, source, payload.into(), 10_000)
    }

    fn vote_tx(id: u8, source: u8, target: u8, delta: i16) -> Transaction {
        let bond = Amount::new(COIN + COIN / 100 * u64::from(delta.unsigned_abs()));
        let payload = BondedVotePayload::new(addr(target), delta, bond, "");
        statement_tx(id, source, payload.into(), 10_000)
    }

    fn processor() -> BlockProcessor<NullTrustStore> {
        BlockProcessor::new(Arc::new(NullTrustStore::new()), &TrustParams::default()).unwrap()
    }

    #[test]
    fn later_edge_in_block_supersedes_earlier() {
        let processor = processor();
        let report = processor
            .on_connect(&block(1, vec![edge_tx(1, 0xA, 0xB, 10), edge_tx(2, 0xA, 0xB, 20)]))
            .unwrap();

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.superseded, vec![TxId::new([1; 32])]);
        assert_eq!(report.released, vec![TxId::new([1; 32])]);

        let b = processor.query(&addr(0xB)).unwrap();
        assert_eq!(b.incoming.len(), 1);
        assert_eq!(b.incoming[0].weight, 20);
        assert_eq!(b.score, 20);
        assert_eq!(processor.stats().unwrap().edge_count, 1);
    }

    #[test]
    fn unattributed_and_self_statements_are_skipped() {
        let processor = processor();
        let mut anonymous = edge_tx(1, 0xA, 0xB, 10);
        anonymous.sender = None;
        let report = processor
            .on_connect(&block(1, vec![anonymous, edge_tx(2, 0xA, 0xA, 10)]))
            .unwrap();

        assert!(report.accepted.is_empty());
        let reasons: Vec<_> = report.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(reasons, vec![SkipReason::MissingSender, SkipReason::SelfReference]);
        assert_eq!(processor.stats().unwrap(), GraphStats::default());
    }

    #[test]
    fn repeated_statement_id_is_rejected() {
        let processor = processor();
        processor.on_connect(&block(1, vec![edge_tx(1, 0xA, 0xB, 10)])).unwrap();
        let report = processor
            .on_connect(&block(2, vec![edge_tx(1, 0xA, 0xC, 10)]))
            .unwrap();
        assert_eq!(report.skipped[0].reason, SkipReason::DuplicateStatement);
        assert!(processor.query(&addr(0xC)).unwrap().incoming.is_empty());
    }

    #[test]
    fn viewer_weighted_reputation_follows_unslashed_paths() {
        let processor = processor();
        processor
            .on_connect(&block(
                1,
                vec![edge_tx(1, 0xA, 0xB, 80), edge_tx(2, 0xB, 0xC, 50), edge_tx(3, 0xD, 0xC, 10)],
            ))
            .unwrap();

        // Bond-weighted global view.
        assert_eq!(processor.query(&addr(0xC)).unwrap().score, 33);
        // A -> B -> C at 80% * 50%.
        assert_eq!(processor.weighted_reputation(&addr(0xA), &addr(0xC)).unwrap(), 40);
        assert_eq!(processor.weighted_reputation(&addr(0xD), &addr(0xC)).unwrap(), 10);
        // No path from E, and C about itself: unweighted (50 + 10) / 2.
        assert_eq!(processor.weighted_reputation(&addr(0xE), &addr(0xC)).unwrap(), 30);
        assert_eq!(processor.weighted_reputation(&addr(0xC), &addr(0xC)).unwrap(), 30);

        let mut slash = block(2, vec![]);
        slash.slash_flags = vec![TxId::new([1; 32])];
        processor.on_connect(&slash).unwrap();

        assert!(processor.trust_paths(&addr(0xA), &addr(0xC)).unwrap().is_empty());
        assert_eq!(processor.weighted_reputation(&addr(0xA), &addr(0xC)).unwrap(), 30);
        assert_eq!(processor.trust_paths(&addr(0xB), &addr(0xC)).unwrap().len(), 1);
    }

    #[test]
    fn coinbase_payloads_are_ignored() {
        let processor = processor();
        let mut coinbase = edge_tx(1, 0xA, 0xB, 10);
        coinbase.coinbase = true;
        let report = processor.on_connect(&block(1, vec![coinbase])).unwrap();
        assert!(report.accepted.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn votes_get_contiguous_sequence_ids() {
        let processor = processor();
        processor
            .on_connect(&block(1, vec![vote_tx(1, 0xA, 0xC, 5), vote_tx(2, 0xB, 0xC, 7)]))
            .unwrap();
        processor.on_connect(&block(2, vec![vote_tx(3, 0xA, 0xC, 1)])).unwrap();

        let seqs: Vec<_> = processor
            .query(&addr(0xC))
            .unwrap()
            .votes_received
            .iter()
            .map(|v| v.seq)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(processor.store().next_vote_seq().unwrap(), 3);
    }

    #[test]
    fn disconnect_requires_tip() {
        let processor = processor();
        let first = block(1, vec![edge_tx(1, 0xA, 0xB, 10)]);
        let second = block(2, vec![]);
        processor.on_connect(&first).unwrap();
        processor.on_connect(&second).unwrap();

        assert!(matches!(
            processor.on_disconnect(&first),
            Err(NodeError::NotTip { height: 1, .. })
        ));
        assert!(!processor.is_halted());

        let report = processor.on_disconnect(&second).unwrap();
        assert_eq!(report.height, 2);
        let report = processor.on_disconnect(&first).unwrap();
        assert_eq!(report.edges_restored, 1);
        assert_eq!(processor.tip().unwrap(), None);
    }

    #[test]
    fn unconnected_block_is_refused_without_halting() {
        let processor = processor();
        processor.on_connect(&block(1, vec![])).unwrap();
        assert!(matches!(
            processor.on_connect(&block(3, vec![])),
            Err(NodeError::NotConnected { height: 3, tip_height: 1, .. })
        ));
        let mut forked = block(2, vec![]);
        forked.parent = BlockHash::new([0x11; 32]);
        assert!(matches!(
            processor.on_connect(&forked),
            Err(NodeError::NotConnected { .. })
        ));
        assert!(!processor.is_halted());
        processor.on_connect(&block(2, vec![])).unwrap();
    }

    #[test]
    fn store_failure_halts_processing() {
        let store = Arc::new(NullTrustStore::new());
        let processor = BlockProcessor::new(store.clone(), &TrustParams::default()).unwrap();
        processor.on_connect(&block(1, vec![])).unwrap();

        store.fail_writes(true);
        assert!(matches!(
            processor.on_connect(&block(2, vec![])),
            Err(NodeError::Store(StoreError::Backend(_)))
        ));
        assert!(processor.is_halted());

        store.fail_writes(false);
        assert!(matches!(processor.on_connect(&block(2, vec![])), Err(NodeError::Halted)));
        assert!(matches!(processor.on_disconnect(&block(1, vec![])), Err(NodeError::Halted)));
        // Reads still work.
        assert_eq!(processor.tip().unwrap().map(|t| t.height), Some(1));
    }

    #[test]
    fn sequential_and_parallel_decode_agree() {
        let transactions: Vec<_> = (1..=20u8)
            .map(|i| edge_tx(i, i, 0xF0, i as i16))
            .collect();

        let sequential = processor().with_parallel_decode(false);
        let parallel = processor();
        let a = sequential.on_connect(&block(1, transactions.clone())).unwrap();
        let b = parallel.on_connect(&block(1, transactions)).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            sequential.store().snapshot().unwrap(),
            parallel.store().snapshot().unwrap()
        );
    }

    #[test]
    fn invalid_params_are_refused() {
        let params = TrustParams {
            min_value: 5,
            max_value: -5,
            ..TrustParams::default()
        };
        assert!(matches!(
            BlockProcessor::new(Arc::new(NullTrustStore::new()), &params),
            Err(NodeError::Params(_))
        ));
    }
}
