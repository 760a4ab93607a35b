//! Reputation scoring.
//!
//! Scores are a pure function of an address's counted incoming edges and
//! votes plus the network's [`ReputationParams`]. No clock, no randomness,
//! and integer-only arithmetic, so every node derives identical scores.
//!
//! [`ReputationEngine::weighted_score`] additionally answers how a target
//! looks from one viewer's position in the graph, following trust paths
//! outward from the viewer.
//!
//! [`ReputationParams`]: wot_types::ReputationParams

pub mod engine;
pub mod paths;

pub use engine::ReputationEngine;
pub use paths::{find_trust_paths, TrustGraphView, TrustPath};
