//! Nullable infrastructure for deterministic testing.
//!
//! Storage is abstracted behind [`wot_store::TrustGraphStore`]. This crate
//! provides a test-friendly implementation that:
//! - Produces the same records and undo data as the durable backend
//! - Can be inspected and compared programmatically
//! - Never touches the filesystem
//!
//! Usage: swap the LMDB store for [`NullTrustStore`] in tests.

pub mod store;

pub use store::NullTrustStore;
