//! Network-wide trust parameters.
//!
//! Every node on a network must run with identical values: they feed the
//! payload bounds, the bond requirement, and the reputation formula, all of
//! which have to produce the same graph from the same chain.

use serde::{Deserialize, Serialize};

use crate::{Amount, WotError, COIN};

/// Parameters governing statement validity and bond requirements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustParams {
    // ── Value bounds ─────────────────────────────────────────────────────
    /// Lowest accepted edge weight / vote delta.
    pub min_value: i16,

    /// Highest accepted edge weight / vote delta.
    pub max_value: i16,

    // ── Bonds ────────────────────────────────────────────────────────────
    /// Bond every statement must carry regardless of its value (base units).
    /// Default: 1 coin.
    pub min_bond: u64,

    /// Additional bond per point of `|weight|` or `|delta|` (base units).
    /// Default: 0.01 coin.
    pub bond_per_point: u64,

    /// Minimum distance between the inclusion height and the collateral's
    /// unlock height. Default: 1440 blocks.
    pub min_lock_blocks: u64,

    // ── Reputation ───────────────────────────────────────────────────────
    pub reputation: ReputationParams,
}

/// Parameters of the reputation aggregation formula.
///
/// `score = clamp(baseline + edge_avg * edge_weight_bps / 10_000
///                + vote_sum * vote_weight_bps / 10_000, min_score, max_score)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationParams {
    /// Score of an address with no incoming signals.
    pub baseline: i32,
    pub min_score: i32,
    pub max_score: i32,
    /// Contribution of the averaged incoming edge weight, in basis points.
    pub edge_weight_bps: u32,
    /// Contribution of the summed incoming vote deltas, in basis points.
    pub vote_weight_bps: u32,
    /// Weight each incoming edge by its bond amount when averaging.
    pub bond_weighted: bool,

    // ── Viewer-relative scoring ──────────────────────────────────────────
    /// Longest trust path, in hops, followed from a viewer to a target.
    /// Default: 3.
    pub max_trust_path_depth: u8,
    /// Edges weaker than this are not followed when searching for paths.
    /// Default: 10.
    pub min_path_hop_weight: i16,
}

impl Default for TrustParams {
    fn default() -> Self {
        Self {
            min_value: -100,
            max_value: 100,
            min_bond: COIN,
            bond_per_point: COIN / 100,
            min_lock_blocks: 1440,
            reputation: ReputationParams::default(),
        }
    }
}

impl Default for ReputationParams {
    fn default() -> Self {
        Self {
            baseline: 0,
            min_score: 0,
            max_score: 100,
            edge_weight_bps: 10_000,
            vote_weight_bps: 5_000,
            bond_weighted: true,
            max_trust_path_depth: 3,
            min_path_hop_weight: 10,
        }
    }
}

impl TrustParams {
    /// Whether `value` lies inside the configured weight/delta range.
    pub fn value_in_range(&self, value: i16) -> bool {
        (self.min_value..=self.max_value).contains(&value)
    }

    /// Bond required to back a statement of the given weight or delta:
    /// `min_bond + bond_per_point * |value|`.
    pub fn required_bond(&self, value: i16) -> Result<Amount, WotError> {
        let points = u64::from(value.unsigned_abs());
        self.bond_per_point
            .checked_mul(points)
            .and_then(|per_point| per_point.checked_add(self.min_bond))
            .map(Amount::new)
            .ok_or(WotError::Overflow)
    }

    /// Reject parameter sets that could not produce a coherent graph.
    pub fn validate(&self) -> Result<(), WotError> {
        if self.min_value > self.max_value {
            return Err(WotError::InvalidParams(format!(
                "min_value {} exceeds max_value {}",
                self.min_value, self.max_value
            )));
        }
        self.required_bond(self.min_value)?;
        self.required_bond(self.max_value)?;
        self.reputation.validate()
    }
}

impl ReputationParams {
    pub fn validate(&self) -> Result<(), WotError> {
        if self.min_score > self.max_score {
            return Err(WotError::InvalidParams(format!(
                "min_score {} exceeds max_score {}",
                self.min_score, self.max_score
            )));
        }
        if self.min_path_hop_weight <= 0 {
            return Err(WotError::InvalidParams(format!(
                "min_path_hop_weight {} must be positive",
                self.min_path_hop_weight
            )));
        }
        Ok(())
    }
}
