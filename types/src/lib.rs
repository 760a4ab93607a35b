//! Fundamental types for the Web-of-Trust core.
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace: addresses, identifiers, amounts, the host chain's transaction
//! and block model, and the network-wide trust parameters.

pub mod address;
pub mod amount;
pub mod block;
pub mod chain;
pub mod error;
pub mod hash;
pub mod params;

pub use address::Address;
pub use amount::{Amount, COIN};
pub use block::{BlockHash, BlockHeight, ChainTip};
pub use chain::{Block, OutPoint, OutputKind, Transaction, TxOutput};
pub use error::WotError;
pub use hash::TxId;
pub use params::{ReputationParams, TrustParams};
