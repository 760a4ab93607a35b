//! Store-wide bookkeeping kept alongside the graph.

use serde::{Deserialize, Serialize};
use wot_types::{Amount, ChainTip};

/// Current on-disk layout version.
pub const SCHEMA_VERSION: u32 = 1;

/// Aggregate counters, maintained incrementally by every apply and undo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub edge_count: u64,
    pub vote_count: u64,
    /// Sum of bonds in Locked or Matured state.
    pub locked_value: Amount,
}

/// Everything besides the keyed records that an undo must restore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub tip: Option<ChainTip>,
    pub next_vote_seq: u64,
    pub stats: GraphStats,
}
