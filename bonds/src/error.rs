//! Bond-specific errors.

use thiserror::Error;
use wot_store::BondState;
use wot_types::{Address, Amount, BlockHeight};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BondError {
    #[error("transaction has no collateral output")]
    MissingCollateral,

    #[error("collateral owned by {found}, statement signed by {expected}")]
    WrongOwner { expected: Address, found: Address },

    #[error("collateral holds {available}, declared bond is {declared}")]
    InsufficientCollateral { declared: Amount, available: Amount },

    #[error("declared bond {declared} below required {required}")]
    BelowRequired { declared: Amount, required: Amount },

    #[error("collateral unlocks at {unlock_height}, must be at least {required}")]
    LockTooShort {
        unlock_height: BlockHeight,
        required: BlockHeight,
    },

    #[error("cannot {action} a bond in state {from:?}")]
    InvalidTransition {
        from: BondState,
        action: &'static str,
    },

    #[error("arithmetic overflow in bond computation")]
    Overflow,
}
