//! Bond creation and state transitions.

use wot_payload::TrustPayload;
use wot_store::{Bond, BondState, StatementKind};
use wot_types::{Address, Amount, BlockHeight, OutPoint, OutputKind, Transaction, TrustParams};

use crate::BondError;

/// Validates collateral and moves bonds between states.
///
/// Holds no bond records itself: the caller owns them (staged or persisted)
/// and the ledger only decides what each transition produces.
#[derive(Clone, Debug)]
pub struct BondLedger {
    params: TrustParams,
}

impl BondLedger {
    pub fn new(params: &TrustParams) -> Self {
        Self {
            params: params.clone(),
        }
    }

    /// `min_bond + bond_per_point * |value|`.
    pub fn required_bond(&self, value: i16) -> Result<Amount, BondError> {
        self.params
            .required_bond(value)
            .map_err(|_| BondError::Overflow)
    }

    /// Check the collateral backing `payload` and create its Locked bond.
    ///
    /// The collateral output must exist in `tx`, belong to `source`, hold at
    /// least the declared bond, and stay locked for at least the minimum
    /// lock period past `height`. The declared bond itself must cover the
    /// required bond for the statement's value.
    pub fn lock(
        &self,
        tx: &Transaction,
        source: Address,
        payload: &TrustPayload,
        height: BlockHeight,
    ) -> Result<Bond, BondError> {
        let declared = payload.bond();
        let required = self.required_bond(payload.value())?;
        if declared < required {
            return Err(BondError::BelowRequired { declared, required });
        }

        let (vout, output) = tx.collateral().ok_or(BondError::MissingCollateral)?;
        let &OutputKind::Collateral {
            owner,
            unlock_height,
        } = &output.kind
        else {
            return Err(BondError::MissingCollateral);
        };
        if owner != source {
            return Err(BondError::WrongOwner {
                expected: source,
                found: owner,
            });
        }
        if output.value < declared {
            return Err(BondError::InsufficientCollateral {
                declared,
                available: output.value,
            });
        }
        let min_unlock = height
            .checked_add(self.params.min_lock_blocks)
            .ok_or(BondError::Overflow)?;
        if unlock_height < min_unlock {
            return Err(BondError::LockTooShort {
                unlock_height,
                required: min_unlock,
            });
        }

        let kind = match payload {
            TrustPayload::Edge(_) => StatementKind::Edge,
            TrustPayload::Vote(_) => StatementKind::Vote,
        };
        Ok(Bond {
            statement: tx.txid,
            kind,
            owner: source,
            subject: payload.target(),
            amount: declared,
            collateral: OutPoint::new(tx.txid, vout),
            created_height: height,
            unlock_height,
            state: BondState::Locked,
        })
    }

    /// Locked → Matured once the chain reaches the unlock height. Returns
    /// whether the bond changed.
    pub fn mature(&self, bond: &mut Bond, height: BlockHeight) -> bool {
        if bond.state == BondState::Locked && height >= bond.unlock_height {
            bond.state = BondState::Matured;
            true
        } else {
            false
        }
    }

    /// Locked or Matured → Released, on supersession or collateral spend.
    pub fn release(&self, bond: &mut Bond) -> Result<(), BondError> {
        if !bond.state.is_active() {
            return Err(BondError::InvalidTransition {
                from: bond.state,
                action: "release",
            });
        }
        bond.state = BondState::Released;
        Ok(())
    }

    /// Locked or Matured → Slashed, on an accepted slash flag.
    pub fn slash(&self, bond: &mut Bond) -> Result<(), BondError> {
        if !bond.state.is_active() {
            return Err(BondError::InvalidTransition {
                from: bond.state,
                action: "slash",
            });
        }
        bond.state = BondState::Slashed;
        Ok(())
    }

    /// Whether a statement backed by `bond` still contributes to reputation.
    pub fn counts_toward_score(bond: &Bond) -> bool {
        bond.state != BondState::Slashed
    }

    /// Whether spending `outpoint` releases `bond`.
    pub fn is_collateral_spend(bond: &Bond, outpoint: &OutPoint) -> bool {
        bond.collateral == *outpoint
    }
}

impl Default for BondLedger {
    fn default() -> Self {
        Self::new(&TrustParams::default())
    }
}

#[cfg(test)]
mod tests {
    use wot_payload::{BondedVotePayload, TrustEdgePayload};
    use wot_types::{TxId, TxOutput, COIN};

    use super::*;

    const HEIGHT: BlockHeight = 100;

    fn alice() -> Address {
        Address::new([0xA1; 20])
    }

    fn bob() -> Address {
        Address::new([0xB0; 20])
    }

    fn statement_tx(collateral: Option<TxOutput>) -> Transaction {
        let mut outputs = vec![TxOutput::data_carrier(vec![0; 54])];
        outputs.extend(collateral);
        Transaction {
            txid: TxId::new([7; 32]),
            sender: Some(alice()),
            inputs: vec![],
            outputs,
            lock_time: 0,
            fee: Amount::new(1_000),
            vsize: 200,
            coinbase: false,
        }
    }

    fn edge(weight: i16, bond: Amount) -> TrustPayload {
        TrustEdgePayload::new(bob(), weight, bond, Vec::new()).into()
    }

    fn enough_collateral(value: Amount) -> Option<TxOutput> {
        Some(TxOutput::collateral(alice(), value, HEIGHT + 1440))
    }

    #[test]
    fn lock_creates_locked_bond() {
        let ledger = BondLedger::default();
        let bond_amount = Amount::from_coins_cents(1, 50);
        let tx = statement_tx(enough_collateral(bond_amount));

        let bond = ledger.lock(&tx, alice(), &edge(50, bond_amount), HEIGHT).unwrap();
        assert_eq!(bond.state, BondState::Locked);
        assert_eq!(bond.amount, bond_amount);
        assert_eq!(bond.kind, StatementKind::Edge);
        assert_eq!(bond.subject, bob());
        assert_eq!(bond.collateral, OutPoint::new(tx.txid, 1));
        assert_eq!(bond.unlock_height, HEIGHT + 1440);
    }

    #[test]
    fn vote_bond_kind() {
        let ledger = BondLedger::default();
        let amount = Amount::from_coins_cents(1, 80);
        let tx = statement_tx(enough_collateral(amount));
        let vote: TrustPayload = BondedVotePayload::new(bob(), 80, amount, Vec::new()).into();
        let bond = ledger.lock(&tx, alice(), &vote, HEIGHT).unwrap();
        assert_eq!(bond.kind, StatementKind::Vote);
    }

    #[test]
    fn declared_bond_must_cover_requirement() {
        let ledger = BondLedger::default();
        let tx = statement_tx(enough_collateral(Amount::new(10 * COIN)));
        assert_eq!(
            ledger.lock(&tx, alice(), &edge(50, Amount::from_coins_cents(1, 49)), HEIGHT),
            Err(BondError::BelowRequired {
                declared: Amount::from_coins_cents(1, 49),
                required: Amount::from_coins_cents(1, 50),
            })
        );
    }

    #[test]
    fn collateral_checks() {
        let ledger = BondLedger::default();
        let amount = Amount::from_coins_cents(1, 50);

        let tx = statement_tx(None);
        assert_eq!(
            ledger.lock(&tx, alice(), &edge(50, amount), HEIGHT),
            Err(BondError::MissingCollateral)
        );

        let tx = statement_tx(Some(TxOutput::collateral(bob(), amount, HEIGHT + 1440)));
        assert!(matches!(
            ledger.lock(&tx, alice(), &edge(50, amount), HEIGHT),
            Err(BondError::WrongOwner { .. })
        ));

        let tx = statement_tx(enough_collateral(Amount::from_coins_cents(1, 0)));
        assert!(matches!(
            ledger.lock(&tx, alice(), &edge(50, amount), HEIGHT),
            Err(BondError::InsufficientCollateral { .. })
        ));

        let tx = statement_tx(Some(TxOutput::collateral(alice(), amount, HEIGHT + 1439)));
        assert_eq!(
            ledger.lock(&tx, alice(), &edge(50, amount), HEIGHT),
            Err(BondError::LockTooShort {
                unlock_height: HEIGHT + 1439,
                required: HEIGHT + 1440,
            })
        );
    }

    #[test]
    fn lifecycle() {
        let ledger = BondLedger::default();
        let amount = Amount::from_coins_cents(1, 50);
        let tx = statement_tx(enough_collateral(amount));
        let mut bond = ledger.lock(&tx, alice(), &edge(50, amount), HEIGHT).unwrap();

        assert!(!ledger.mature(&mut bond, HEIGHT + 1439));
        assert!(ledger.mature(&mut bond, HEIGHT + 1440));
        assert_eq!(bond.state, BondState::Matured);
        assert!(!ledger.mature(&mut bond, HEIGHT + 5000));

        ledger.release(&mut bond).unwrap();
        assert_eq!(bond.state, BondState::Released);
        assert!(ledger.release(&mut bond).is_err());
        assert!(ledger.slash(&mut bond).is_err());
        assert!(BondLedger::counts_toward_score(&bond));
    }

    #[test]
    fn slashed_bond_stops_counting() {
        let ledger = BondLedger::default();
        let amount = Amount::from_coins_cents(1, 50);
        let tx = statement_tx(enough_collateral(amount));
        let mut bond = ledger.lock(&tx, alice(), &edge(50, amount), HEIGHT).unwrap();

        ledger.slash(&mut bond).unwrap();
        assert_eq!(bond.state, BondState::Slashed);
        assert!(!BondLedger::counts_toward_score(&bond));
        assert!(!ledger.mature(&mut bond, u64::MAX));
    }
}
