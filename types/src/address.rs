//! Account address type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::WotError;

/// A 20-byte account address (the hash of the owner's public key).
///
/// The host chain derives addresses from signing keys; this core only
/// compares and stores them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const LEN: usize = 20;
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice that must be exactly 20 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, WotError> {
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| WotError::InvalidAddress(format!("expected 20 bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }

    /// Parse a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, WotError> {
        let bytes = hex::decode(s).map_err(|e| WotError::InvalidAddress(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
