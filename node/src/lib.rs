//! Web-of-Trust block-processing node.
//!
//! Consumes blocks the host chain has already validated and maintains the
//! trust graph alongside them:
//! - Decodes trust payloads from data-carrier outputs
//! - Locks, matures, releases and slashes statement bonds
//! - Commits each block's trust effects atomically and undoes them on reorg
//! - Keeps per-address reputation scores current
//! - States the block-template selection contract for trust transactions

pub mod block_processor;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod report;
pub mod selection;
mod staging;
pub mod tracing_spans;

pub use block_processor::{BlockProcessor, TrustSummary};
pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::TrustNode;
pub use report::{AcceptedStatement, ConnectReport, DisconnectReport, SkipReason, SkippedStatement};
pub use selection::{
    check_selection_invariant, fee_rate, is_trust_transaction, Assembly, BlockAssembler,
    Exclusion, SelectionConfig, SelectionPolicy, SelectionViolation, StandardPolicy,
};
