//! Block-template selection contract.
//!
//! Whatever heuristics a block assembler uses, a trust transaction that is
//! standard, final and pays the minimum fee rate must be admitted. Pairing
//! a data-carrier output with a time-locked collateral output is never by
//! itself a reason to exclude.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use wot_payload::MAGIC;
use wot_types::{Amount, BlockHeight, OutputKind, Transaction, TxId};

/// Limits applied by [`StandardPolicy`] and [`BlockAssembler`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Minimum fee rate in base units per 1000 virtual bytes.
    pub min_fee_rate: u64,
    /// Value below which a payment or collateral output is dust.
    pub dust_threshold: Amount,
    pub max_data_carriers: usize,
    pub max_data_carrier_bytes: usize,
    pub max_block_vsize: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_fee_rate: 1_000,
            dust_threshold: Amount::new(546),
            max_data_carriers: 1,
            max_data_carrier_bytes: 80,
            max_block_vsize: 1_000_000,
        }
    }
}

/// Why a candidate transaction was left out of a block template.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Exclusion {
    #[error("coinbase transactions are not candidates")]
    Coinbase,

    #[error("lock time {lock_time} is not final at height {height}")]
    NotFinal {
        lock_time: BlockHeight,
        height: BlockHeight,
    },

    #[error("fee rate {rate} below minimum {min}")]
    FeeRateTooLow { rate: u64, min: u64 },

    #[error("output {vout} value {value} is dust")]
    Dust { vout: u32, value: Amount },

    #[error("{count} data-carrier outputs, at most {max} allowed")]
    TooManyDataCarriers { count: usize, max: usize },

    #[error("data-carrier output of {len} bytes exceeds {max}")]
    DataCarrierTooLarge { len: usize, max: usize },

    #[error("transaction of {vsize} vbytes does not fit the remaining {remaining}")]
    BlockFull { vsize: u64, remaining: u64 },

    #[error("excluded by policy: {0}")]
    Policy(String),
}

/// Decides whether a mempool transaction may enter the next block.
pub trait SelectionPolicy: Send + Sync {
    fn admit(&self, tx: &Transaction, next_height: BlockHeight) -> Result<(), Exclusion>;
}

/// Fee rate in base units per 1000 virtual bytes.
pub fn fee_rate(tx: &Transaction) -> u64 {
    let vsize = u64::from(tx.vsize.max(1));
    tx.fee.units().saturating_mul(1_000) / vsize
}

/// Whether `tx` carries a trust statement: a protocol data carrier paired
/// with a collateral output.
pub fn is_trust_transaction(tx: &Transaction) -> bool {
    let tagged = tx
        .data_carrier()
        .is_some_and(|(_, data)| data.starts_with(&MAGIC));
    tagged && tx.collateral().is_some()
}

/// Reference policy: standardness, finality and minimum fee rate.
#[derive(Clone, Debug, Default)]
pub struct StandardPolicy {
    config: SelectionConfig,
}

impl StandardPolicy {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    fn check_outputs(&self, tx: &Transaction) -> Result<(), Exclusion> {
        let carriers = tx.data_carrier_count();
        if carriers > self.config.max_data_carriers {
            return Err(Exclusion::TooManyDataCarriers {
                count: carriers,
                max: self.config.max_data_carriers,
            });
        }
        for (vout, output) in tx.outputs.iter().enumerate() {
            match &output.kind {
                OutputKind::DataCarrier { data } => {
                    if data.len() > self.config.max_data_carrier_bytes {
                        return Err(Exclusion::DataCarrierTooLarge {
                            len: data.len(),
                            max: self.config.max_data_carrier_bytes,
                        });
                    }
                }
                OutputKind::Payment { .. } | OutputKind::Collateral { .. } => {
                    if output.value < self.config.dust_threshold {
                        return Err(Exclusion::Dust {
                            vout: vout as u32,
                            value: output.value,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl SelectionPolicy for StandardPolicy {
    fn admit(&self, tx: &Transaction, next_height: BlockHeight) -> Result<(), Exclusion> {
        if tx.coinbase {
            return Err(Exclusion::Coinbase);
        }
        // Zero never locks; otherwise the lock height must lie strictly below.
        if tx.lock_time != 0 && tx.lock_time >= next_height {
            return Err(Exclusion::NotFinal {
                lock_time: tx.lock_time,
                height: next_height,
            });
        }
        let rate = fee_rate(tx);
        if rate < self.config.min_fee_rate {
            return Err(Exclusion::FeeRateTooLow {
                rate,
                min: self.config.min_fee_rate,
            });
        }
        self.check_outputs(tx)
    }
}

/// A policy excluded a trust transaction the reference policy admits.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("trust transaction {txid} wrongly excluded: {exclusion}")]
pub struct SelectionViolation {
    pub txid: TxId,
    pub exclusion: Exclusion,
}

/// Flag `policy` if it rejects a compliant trust transaction.
///
/// A transaction is compliant when it carries a trust statement and the
/// `reference` policy admits it. Anything else is out of scope and passes.
pub fn check_selection_invariant<P: SelectionPolicy + ?Sized>(
    policy: &P,
    reference: &StandardPolicy,
    tx: &Transaction,
    next_height: BlockHeight,
) -> Result<(), SelectionViolation> {
    if !is_trust_transaction(tx) || reference.admit(tx, next_height).is_err() {
        return Ok(());
    }
    policy
        .admit(tx, next_height)
        .map_err(|exclusion| SelectionViolation {
            txid: tx.txid,
            exclusion,
        })
}

/// Outcome of one template assembly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assembly {
    /// Selected transactions in template order.
    pub selected: Vec<TxId>,
    pub excluded: Vec<(TxId, Exclusion)>,
    pub total_vsize: u64,
    pub total_fees: Amount,
}

/// Greedy fee-rate ordered template builder.
pub struct BlockAssembler<P> {
    policy: P,
    max_block_vsize: u64,
}

impl<P: SelectionPolicy> BlockAssembler<P> {
    pub fn new(policy: P, max_block_vsize: u64) -> Self {
        Self {
            policy,
            max_block_vsize,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Select candidates by descending fee rate (ties by txid) until the
    /// size limit, recording why each left-out transaction was excluded.
    pub fn assemble(&self, candidates: &[Transaction], next_height: BlockHeight) -> Assembly {
        let mut assembly = Assembly::default();
        let mut admitted = Vec::with_capacity(candidates.len());
        for tx in candidates {
            match self.policy.admit(tx, next_height) {
                Ok(()) => admitted.push(tx),
                Err(exclusion) => {
                    debug!(txid = %tx.txid, %exclusion, "candidate excluded");
                    assembly.excluded.push((tx.txid, exclusion));
                }
            }
        }

        admitted.sort_by(|a, b| compare_fee_rate(b, a).then_with(|| a.txid.cmp(&b.txid)));

        for tx in admitted {
            let vsize = u64::from(tx.vsize);
            let remaining = self.max_block_vsize - assembly.total_vsize;
            if vsize > remaining {
                assembly
                    .excluded
                    .push((tx.txid, Exclusion::BlockFull { vsize, remaining }));
                continue;
            }
            assembly.total_vsize += vsize;
            assembly.total_fees = assembly.total_fees.saturating_add(tx.fee);
            assembly.selected.push(tx.txid);
        }
        assembly
    }
}

/// Exact fee-rate comparison without integer division.
fn compare_fee_rate(a: &Transaction, b: &Transaction) -> Ordering {
    let lhs = u128::from(a.fee.units()) * u128::from(b.vsize.max(1));
    let rhs = u128::from(b.fee.units()) * u128::from(a.vsize.max(1));
    lhs.cmp(&rhs)
}

#[cfg(test)]
mod tests {
    use wot_payload::{PayloadCodec, TrustEdgePayload, TrustPayload};
    use wot_types::{Address, TxOutput, COIN};

    use super::*;

    fn trust_tx(id: u8, fee: u64, vsize: u32) -> Transaction {
        let payload = TrustPayload::from(TrustEdgePayload::new(
            Address::new([0xB; 20]),
            50,
            Amount::new(3 * COIN / 2),
            "ok",
        ));
        let data = PayloadCodec::default().encode(&payload).unwrap();
        Transaction {
            txid: TxId::new([id; 32]),
            sender: Some(Address::new([0xA; 20])),
            inputs: vec![],
            outputs: vec![
                TxOutput::data_carrier(data),
                TxOutput::collateral(Address::new([0xA; 20]), Amount::new(3 * COIN / 2), 2_000),
            ],
            lock_time: 0,
            fee: Amount::new(fee),
            vsize,
            coinbase: false,
        }
    }

    fn payment_tx(id: u8, fee: u64, vsize: u32) -> Transaction {
        Transaction {
            txid: TxId::new([id; 32]),
            sender: Some(Address::new([1; 20])),
            inputs: vec![],
            outputs: vec![TxOutput::payment(Address::new([2; 20]), Amount::new(10_000))],
            lock_time: 0,
            fee: Amount::new(fee),
            vsize,
            coinbase: false,
        }
    }

    /// Rejects every transaction that pairs a data carrier with a
    /// time-locked output, the way a broken miner did.
    struct CarrierWithLockFilter(StandardPolicy);

    impl SelectionPolicy for CarrierWithLockFilter {
        fn admit(&self, tx: &Transaction, next_height: BlockHeight) -> Result<(), Exclusion> {
            self.0.admit(tx, next_height)?;
            if tx.data_carrier().is_some() && tx.collateral().is_some() {
                return Err(Exclusion::Policy("data carrier with time lock".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn standard_policy_admits_trust_transaction() {
        let policy = StandardPolicy::default();
        assert_eq!(policy.admit(&trust_tx(1, 500, 250), 100), Ok(()));
    }

    #[test]
    fn standard_policy_exclusions() {
        let policy = StandardPolicy::default();

        let mut tx = trust_tx(1, 500, 250);
        tx.coinbase = true;
        assert_eq!(policy.admit(&tx, 100), Err(Exclusion::Coinbase));

        let mut tx = trust_tx(1, 500, 250);
        tx.lock_time = 100;
        assert_eq!(
            policy.admit(&tx, 100),
            Err(Exclusion::NotFinal { lock_time: 100, height: 100 })
        );
        assert!(matches!(policy.admit(&tx, 99), Err(Exclusion::NotFinal { .. })));
        assert_eq!(policy.admit(&tx, 101), Ok(()));

        let mut tx = trust_tx(1, 500, 250);
        tx.lock_time = 0;
        assert_eq!(policy.admit(&tx, 0), Ok(()));

        let tx = trust_tx(1, 100, 250);
        assert_eq!(
            policy.admit(&tx, 100),
            Err(Exclusion::FeeRateTooLow { rate: 400, min: 1_000 })
        );

        let mut tx = trust_tx(1, 500, 250);
        tx.outputs.push(TxOutput::payment(Address::new([3; 20]), Amount::new(10)));
        assert!(matches!(policy.admit(&tx, 100), Err(Exclusion::Dust { vout: 2, .. })));

        let mut tx = trust_tx(1, 500, 250);
        tx.outputs.push(TxOutput::data_carrier(vec![0; 4]));
        assert!(matches!(
            policy.admit(&tx, 100),
            Err(Exclusion::TooManyDataCarriers { count: 2, max: 1 })
        ));

        let mut tx = trust_tx(1, 500, 250);
        tx.outputs[0] = TxOutput::data_carrier(vec![0; 81]);
        assert!(matches!(
            policy.admit(&tx, 100),
            Err(Exclusion::DataCarrierTooLarge { len: 81, max: 80 })
        ));
    }

    #[test]
    fn carrier_with_lock_filter_violates_invariant() {
        let reference = StandardPolicy::default();
        let defective = CarrierWithLockFilter(StandardPolicy::default());
        let tx = trust_tx(7, 500, 250);

        let violation = check_selection_invariant(&defective, &reference, &tx, 100).unwrap_err();
        assert_eq!(violation.txid, tx.txid);
        assert!(matches!(violation.exclusion, Exclusion::Policy(_)));

        assert_eq!(check_selection_invariant(&reference, &reference, &tx, 100), Ok(()));
    }

    #[test]
    fn invariant_ignores_non_compliant_and_non_trust_transactions() {
        let reference = StandardPolicy::default();
        let defective = CarrierWithLockFilter(StandardPolicy::default());

        // Below the fee floor, so the reference rejects it too.
        let cheap = trust_tx(1, 10, 250);
        assert_eq!(check_selection_invariant(&defective, &reference, &cheap, 100), Ok(()));

        let payment = payment_tx(2, 500, 250);
        assert!(!is_trust_transaction(&payment));
        assert_eq!(check_selection_invariant(&defective, &reference, &payment, 100), Ok(()));
    }

    #[test]
    fn assembler_orders_by_fee_rate_then_txid() {
        let assembler = BlockAssembler::new(StandardPolicy::default(), 1_000_000);
        let candidates = vec![
            payment_tx(3, 500, 250),
            trust_tx(2, 1_000, 250),
            payment_tx(1, 500, 250),
        ];
        let assembly = assembler.assemble(&candidates, 100);
        assert_eq!(
            assembly.selected,
            vec![TxId::new([2; 32]), TxId::new([1; 32]), TxId::new([3; 32])]
        );
        assert_eq!(assembly.total_vsize, 750);
        assert_eq!(assembly.total_fees, Amount::new(2_000));
        assert!(assembly.excluded.is_empty());
    }

    #[test]
    fn assembler_reports_every_exclusion() {
        let assembler = BlockAssembler::new(StandardPolicy::default(), 500);
        let mut coinbase = payment_tx(9, 0, 100);
        coinbase.coinbase = true;
        let candidates = vec![
            trust_tx(1, 2_000, 300),
            trust_tx(2, 1_000, 300),
            coinbase,
        ];
        let assembly = assembler.assemble(&candidates, 100);
        assert_eq!(assembly.selected, vec![TxId::new([1; 32])]);
        assert_eq!(assembly.excluded.len(), 2);
        assert!(assembly
            .excluded
            .contains(&(TxId::new([9; 32]), Exclusion::Coinbase)));
        assert!(assembly.excluded.contains(&(
            TxId::new([2; 32]),
            Exclusion::BlockFull {
                vsize: 300,
                remaining: 200
            }
        )));
    }

    #[test]
    fn defective_policy_silently_drops_trust_transactions() {
        let assembler = BlockAssembler::new(CarrierWithLockFilter(StandardPolicy::default()), 1_000_000);
        let candidates = vec![trust_tx(1, 1_000, 250), payment_tx(2, 500, 250)];
        let assembly = assembler.assemble(&candidates, 100);
        assert_eq!(assembly.selected, vec![TxId::new([2; 32])]);

        let reference = StandardPolicy::default();
        let flagged: Vec<_> = candidates
            .iter()
            .filter(|tx| {
                check_selection_invariant(assembler.policy(), &reference, tx, 100).is_err()
            })
            .map(|tx| tx.txid)
            .collect();
        assert_eq!(flagged, vec![TxId::new([1; 32])]);
    }
}
