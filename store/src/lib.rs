//! Abstract storage for the trust graph.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`TrustGraphStore`]. The block-level write path is shared: a backend only
//! exposes keyed reads and writes inside one atomic unit through
//! [`RecordWriter`], and [`apply_delta`] / [`revert_block`] do the rest, so
//! every backend produces byte-identical state and undo records.

pub mod apply;
pub mod delta;
pub mod error;
pub mod graph;
pub mod meta;
pub mod record;
pub mod snapshot;

pub use apply::{apply_delta, revert_block, RecordWriter};
pub use delta::{BlockDelta, UndoRecord};
pub use error::StoreError;
pub use graph::{AddressSummary, TrustGraphStore};
pub use meta::{GraphStats, StoreMeta, SCHEMA_VERSION};
pub use record::{Bond, BondState, BondedVote, Reputation, StatementKind, TrustEdge};
pub use snapshot::StoreSnapshot;
