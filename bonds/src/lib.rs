//! Bond lifecycle for trust statements.
//!
//! Every accepted statement is backed by a time-locked collateral output in
//! the same transaction. The ledger checks that collateral at acceptance and
//! drives the bond through its states as a pure function of chain height,
//! supersession, collateral spends, and slash flags.

pub mod error;
pub mod ledger;

pub use error::BondError;
pub use ledger::BondLedger;
