//! Viewer-relative trust: simple paths through the positive trust graph.
//!
//! A path's strength is the product of its hop weights on a 0..=100 scale,
//! kept in parts per million so that every node truncates identically.

use std::collections::BTreeSet;

use wot_store::TrustEdge;
use wot_types::Address;

/// Full strength of an empty path.
pub const FULL_STRENGTH_PPM: u64 = 1_000_000;

const WEIGHT_SCALE: i16 = 100;

/// Read access to the edges a path search may follow.
pub trait TrustGraphView {
    type Error;

    /// Outgoing edges of `source` whose bond still counts toward reputation.
    fn counted_outgoing(&self, source: &Address) -> Result<Vec<TrustEdge>, Self::Error>;
}

/// One simple path from a viewer to a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustPath {
    /// Addresses after the viewer, ending with the target.
    pub hops: Vec<Address>,
    /// Weight of the edge leading into each hop.
    pub weights: Vec<i16>,
    pub strength_ppm: u64,
}

impl TrustPath {
    fn empty() -> Self {
        Self {
            hops: Vec::new(),
            weights: Vec::new(),
            strength_ppm: FULL_STRENGTH_PPM,
        }
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Strength expressed on the edge weight scale (0..=100).
    pub fn strength_points(&self) -> i128 {
        i128::from(self.strength_ppm) * i128::from(WEIGHT_SCALE) / i128::from(FULL_STRENGTH_PPM)
    }
}

/// Multiplier of one hop, in hundredths.
fn hop_factor(weight: i16) -> u64 {
    u64::from(weight.clamp(0, WEIGHT_SCALE).unsigned_abs())
}

/// Every simple path from `from` to `to` of at most `max_depth` hops that
/// only follows edges of weight `min_hop_weight` or more.
///
/// Strongest paths come first; equal strengths order by length, then by the
/// hop addresses, so the result is independent of storage order.
pub fn find_trust_paths<G: TrustGraphView + ?Sized>(
    graph: &G,
    from: &Address,
    to: &Address,
    max_depth: u8,
    min_hop_weight: i16,
) -> Result<Vec<TrustPath>, G::Error> {
    let mut search = PathSearch {
        graph,
        target: *to,
        min_hop_weight,
        visited: BTreeSet::new(),
        current: TrustPath::empty(),
        found: Vec::new(),
    };
    if from != to {
        search.walk(*from, max_depth)?;
    }

    let mut paths = search.found;
    paths.sort_by(|a, b| {
        b.strength_ppm
            .cmp(&a.strength_ppm)
            .then_with(|| a.len().cmp(&b.len()))
            .then_with(|| a.hops.cmp(&b.hops))
    });
    Ok(paths)
}

struct PathSearch<'g, G: ?Sized> {
    graph: &'g G,
    target: Address,
    min_hop_weight: i16,
    visited: BTreeSet<Address>,
    current: TrustPath,
    found: Vec<TrustPath>,
}

impl<G: TrustGraphView + ?Sized> PathSearch<'_, G> {
    fn walk(&mut self, at: Address, remaining: u8) -> Result<(), G::Error> {
        if at == self.target && !self.current.is_empty() {
            self.found.push(self.current.clone());
            return Ok(());
        }
        if remaining == 0 {
            return Ok(());
        }

        self.visited.insert(at);
        let mut outgoing = self.graph.counted_outgoing(&at)?;
        outgoing.sort_by(|a, b| a.target.cmp(&b.target));
        for edge in outgoing {
            if edge.weight < self.min_hop_weight || self.visited.contains(&edge.target) {
                continue;
            }
            let before = self.current.strength_ppm;
            self.current.strength_ppm = before * hop_factor(edge.weight) / hop_factor(WEIGHT_SCALE);
            self.current.hops.push(edge.target);
            self.current.weights.push(edge.weight);

            let walked = self.walk(edge.target, remaining - 1);

            self.current.hops.pop();
            self.current.weights.pop();
            self.current.strength_ppm = before;
            walked?;
        }
        self.visited.remove(&at);
        Ok(())
    }
}
