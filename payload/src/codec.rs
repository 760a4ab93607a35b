//! Encoding and decoding of trust payloads.

use wot_types::{Address, Amount, TrustParams};

use crate::payload::{BondedVotePayload, OpType, TrustEdgePayload, TrustPayload};
use crate::{PayloadError, HEADER_LEN, MAGIC};

const TARGET_OFFSET: usize = HEADER_LEN;
const VALUE_OFFSET: usize = TARGET_OFFSET + Address::LEN;
const BOND_OFFSET: usize = VALUE_OFFSET + 2;
const MEMO_LEN_OFFSET: usize = BOND_OFFSET + 8;
const MEMO_OFFSET: usize = MEMO_LEN_OFFSET + 1;

/// Outcome of inspecting a data-carrier output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// No trust magic: the output belongs to some other protocol.
    NotApplicable,
    /// Trust magic with an op type this version does not know.
    UnknownOp(u16),
    Payload(TrustPayload),
}

/// Stateless codec bound to the network's value range.
#[derive(Clone, Copy, Debug)]
pub struct PayloadCodec {
    min_value: i16,
    max_value: i16,
}

impl PayloadCodec {
    pub fn new(params: &TrustParams) -> Self {
        Self {
            min_value: params.min_value,
            max_value: params.max_value,
        }
    }

    /// Serialize a statement. Rejects out-of-range values and over-long
    /// memos before producing any bytes.
    pub fn encode(&self, payload: &TrustPayload) -> Result<Vec<u8>, PayloadError> {
        let op = payload.op_type();
        self.check_value(payload.value())?;
        let memo = payload.memo();
        if memo.len() > op.memo_max() {
            return Err(PayloadError::MemoTooLong {
                len: memo.len(),
                max: op.memo_max(),
            });
        }

        let mut out = vec![0u8; op.payload_len()];
        out[..4].copy_from_slice(&MAGIC);
        out[4..HEADER_LEN].copy_from_slice(&op.tag().to_le_bytes());
        out[TARGET_OFFSET..VALUE_OFFSET].copy_from_slice(payload.target().as_bytes());
        out[VALUE_OFFSET..BOND_OFFSET].copy_from_slice(&payload.value().to_le_bytes());
        out[BOND_OFFSET..MEMO_LEN_OFFSET].copy_from_slice(&payload.bond().units().to_le_bytes());
        out[MEMO_LEN_OFFSET] = memo.len() as u8;
        out[MEMO_OFFSET..MEMO_OFFSET + memo.len()].copy_from_slice(memo);
        Ok(out)
    }

    /// Inspect the bytes of a data-carrier output.
    ///
    /// Never panics on arbitrary input.
    pub fn decode(&self, data: &[u8]) -> Result<Decoded, PayloadError> {
        if data.len() < MAGIC.len() || data[..MAGIC.len()] != MAGIC {
            return Ok(Decoded::NotApplicable);
        }
        if data.len() < HEADER_LEN {
            return Err(PayloadError::TruncatedHeader(data.len()));
        }

        let tag = u16::from_le_bytes([data[4], data[5]]);
        let Some(op) = OpType::from_tag(tag) else {
            return Ok(Decoded::UnknownOp(tag));
        };

        if data.len() != op.payload_len() {
            return Err(PayloadError::LengthMismatch {
                op: tag,
                expected: op.payload_len(),
                actual: data.len(),
            });
        }

        let mut target = [0u8; Address::LEN];
        target.copy_from_slice(&data[TARGET_OFFSET..VALUE_OFFSET]);
        let target = Address::new(target);

        let value = i16::from_le_bytes([data[VALUE_OFFSET], data[VALUE_OFFSET + 1]]);
        self.check_value(value)?;

        let mut bond = [0u8; 8];
        bond.copy_from_slice(&data[BOND_OFFSET..MEMO_LEN_OFFSET]);
        let bond = Amount::new(u64::from_le_bytes(bond));

        let memo_len = usize::from(data[MEMO_LEN_OFFSET]);
        if memo_len > op.memo_max() {
            return Err(PayloadError::MemoTooLong {
                len: memo_len,
                max: op.memo_max(),
            });
        }
        let memo_end = MEMO_OFFSET + memo_len;
        if data[memo_end..].iter().any(|&b| b != 0) {
            return Err(PayloadError::NonZeroPadding);
        }
        let memo = data[MEMO_OFFSET..memo_end].to_vec();

        let payload = match op {
            OpType::TrustEdge => TrustPayload::Edge(TrustEdgePayload {
                target,
                weight: value,
                bond,
                memo,
            }),
            OpType::BondedVote => TrustPayload::Vote(BondedVotePayload {
                target,
                delta: value,
                bond,
                memo,
            }),
        };
        Ok(Decoded::Payload(payload))
    }

    fn check_value(&self, value: i16) -> Result<(), PayloadError> {
        if value < self.min_value || value > self.max_value {
            return Err(PayloadError::ValueOutOfRange {
                value,
                min: self.min_value,
                max: self.max_value,
            });
        }
        Ok(())
    }
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self::new(&TrustParams::default())
    }
}
