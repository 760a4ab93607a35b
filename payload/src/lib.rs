//! Trust payload codec.
//!
//! Trust statements ride inside a transaction's data-carrier output as a
//! fixed-size binary record:
//!
//! ```text
//! offset  size  field
//!      0     4  magic "WOT1"
//!      4     2  op type (u16 LE)
//!      6    20  target address
//!     26     2  weight / delta (i16 LE)
//!     28     8  declared bond (u64 LE)
//!     36     1  memo length
//!     37     n  memo, zero padded (17 bytes for edges, 16 for votes)
//! ```
//!
//! Bytes that do not start with the magic are simply not ours. Bytes that
//! do, but carry an op type we do not know, are ignored so that later
//! protocol versions can add statement kinds without a fork.

pub mod codec;
pub mod error;
pub mod payload;

pub use codec::{Decoded, PayloadCodec};
pub use error::PayloadError;
pub use payload::{BondedVotePayload, OpType, TrustEdgePayload, TrustPayload};

/// Marker at the start of every trust payload.
pub const MAGIC: [u8; 4] = *b"WOT1";

/// Magic plus the op type tag.
pub const HEADER_LEN: usize = 6;

/// Total encoded size of a trust edge, header included.
pub const EDGE_PAYLOAD_LEN: usize = 54;

/// Total encoded size of a bonded vote, header included.
pub const VOTE_PAYLOAD_LEN: usize = 53;

pub const EDGE_MEMO_MAX: usize = 17;
pub const VOTE_MEMO_MAX: usize = 16;
