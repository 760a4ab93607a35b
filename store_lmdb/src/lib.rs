//! LMDB storage backend for the trust graph.
//!
//! Implements [`wot_store::TrustGraphStore`] using the `heed` LMDB bindings.
//! Every table lives in one environment so a block's edges, votes, bonds,
//! reputation entries, undo record, and tip commit in a single write
//! transaction.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod trust_store;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use trust_store::LmdbTrustStore;
pub use write_batch::WriteBatch;
