//! Table key layouts.
//!
//! Integers are big-endian so LMDB's lexicographic order matches numeric
//! order.

use std::ops::Bound;

use wot_types::{Address, BlockHeight, TxId};

pub const ADDRESS_LEN: usize = Address::LEN;

/// `source ‖ target`
pub fn edge_key(source: &Address, target: &Address) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..20].copy_from_slice(source.as_bytes());
    key[20..].copy_from_slice(target.as_bytes());
    key
}

/// `target ‖ source`
pub fn edge_in_key(target: &Address, source: &Address) -> [u8; 40] {
    edge_key(target, source)
}

pub fn vote_key(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

/// `target ‖ seq`
pub fn vote_by_target_key(target: &Address, seq: u64) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..20].copy_from_slice(target.as_bytes());
    key[20..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// `unlock_height ‖ statement`
pub fn bond_due_key(unlock_height: BlockHeight, statement: &TxId) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..8].copy_from_slice(&unlock_height.to_be_bytes());
    key[8..].copy_from_slice(statement.as_bytes());
    key
}

pub fn undo_key(height: BlockHeight) -> [u8; 8] {
    height.to_be_bytes()
}

/// Trailing address of a 40-byte pair key.
pub fn second_address(key: &[u8]) -> Option<Address> {
    key.get(ADDRESS_LEN..2 * ADDRESS_LEN)
        .and_then(|bytes| Address::from_slice(bytes).ok())
}

/// Trailing sequence number of a `target ‖ seq` key.
pub fn trailing_seq(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.get(ADDRESS_LEN..ADDRESS_LEN + 8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Trailing statement id of a bond-due key.
pub fn trailing_txid(key: &[u8]) -> Option<TxId> {
    let bytes: [u8; 32] = key.get(8..40)?.try_into().ok()?;
    Some(TxId::new(bytes))
}

/// Exclusive upper bound covering every key that starts with `prefix`.
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

/// Range bounds over all keys with `prefix`.
pub fn prefix_bounds<'a>(prefix: &'a [u8], upper: Option<&'a [u8]>) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    let end = match upper {
        Some(upper) => Bound::Excluded(upper),
        None => Bound::Unbounded,
    };
    (Bound::Included(prefix), end)
}
