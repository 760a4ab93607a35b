//! Top-level error type shared across crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WotError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid trust parameters: {0}")]
    InvalidParams(String),

    #[error("arithmetic overflow")]
    Overflow,
}
