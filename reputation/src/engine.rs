use wot_store::{BondedVote, Reputation, TrustEdge};
use wot_types::{Address, BlockHeight, ReputationParams};

use crate::paths::{find_trust_paths, TrustGraphView, TrustPath};

const BPS: i128 = 10_000;

#[derive(Clone, Debug)]
pub struct ReputationEngine {
    params: ReputationParams,
}

impl ReputationEngine {
    pub fn new(params: ReputationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ReputationParams {
        &self.params
    }

    /// Score from counted incoming signals. Callers pass only statements
    /// whose bond has not been slashed.
    ///
    /// `baseline + edge_avg * edge_bps / 10000 + vote_sum * vote_bps / 10000`,
    /// clamped to the score range. The edge term is evaluated as a single
    /// fraction so the average is not truncated before scaling.
    pub fn score<'e, 'v, E, V>(&self, edges: E, votes: V) -> i32
    where
        E: IntoIterator<Item = &'e TrustEdge>,
        V: IntoIterator<Item = &'v BondedVote>,
    {
        let edge_term = self.edge_term(edges);
        self.combine(edge_term, votes)
    }

    /// Score of `target` as seen from `viewer`.
    ///
    /// The edge term comes from the strongest trust path leading from the
    /// viewer to the target. Without such a path, or when the viewer asks
    /// about itself, it falls back to the unweighted average of `incoming`.
    /// Votes count the same either way. `incoming` and `votes` must already
    /// exclude slashed statements, as must the graph view.
    pub fn weighted_score<G: TrustGraphView + ?Sized>(
        &self,
        graph: &G,
        viewer: &Address,
        target: &Address,
        incoming: &[TrustEdge],
        votes: &[BondedVote],
    ) -> Result<i32, G::Error> {
        let bps = i128::from(self.params.edge_weight_bps);
        let edge_term = match self.trust_paths(graph, viewer, target)?.first() {
            Some(strongest) => strongest.strength_points() * bps / BPS,
            None => Self::plain_average(incoming, bps),
        };
        Ok(self.combine(edge_term, votes))
    }

    /// Trust paths from `viewer` to `target` within the configured depth,
    /// strongest first.
    pub fn trust_paths<G: TrustGraphView + ?Sized>(
        &self,
        graph: &G,
        viewer: &Address,
        target: &Address,
    ) -> Result<Vec<TrustPath>, G::Error> {
        find_trust_paths(
            graph,
            viewer,
            target,
            self.params.max_trust_path_depth,
            self.params.min_path_hop_weight,
        )
    }

    /// Build the cached record for `address` at `height`.
    pub fn evaluate<'e, 'v, E, V>(
        &self,
        address: Address,
        edges: E,
        votes: V,
        height: BlockHeight,
    ) -> Reputation
    where
        E: IntoIterator<Item = &'e TrustEdge>,
        V: IntoIterator<Item = &'v BondedVote>,
    {
        Reputation {
            address,
            score: self.score(edges, votes),
            updated_height: height,
        }
    }

    /// Score of an address nobody has spoken about.
    pub fn baseline(&self) -> i32 {
        self.params
            .baseline
            .clamp(self.params.min_score, self.params.max_score)
    }

    fn combine<'v>(&self, edge_term: i128, votes: impl IntoIterator<Item = &'v BondedVote>) -> i32 {
        let p = &self.params;
        let vote_sum: i128 = votes.into_iter().map(|v| i128::from(v.delta)).sum();
        let total =
            i128::from(p.baseline) + edge_term + vote_sum * i128::from(p.vote_weight_bps) / BPS;
        total.clamp(i128::from(p.min_score), i128::from(p.max_score)) as i32
    }

    fn plain_average(edges: &[TrustEdge], bps: i128) -> i128 {
        if edges.is_empty() {
            return 0;
        }
        let sum: i128 = edges.iter().map(|e| i128::from(e.weight)).sum();
        sum * bps / (edges.len() as i128 * BPS)
    }

    fn edge_term<'a>(&self, edges: impl IntoIterator<Item = &'a TrustEdge>) -> i128 {
        let mut weighted = 0i128;
        let mut total_bond = 0i128;
        let mut plain = 0i128;
        let mut count = 0i128;
        for edge in edges {
            let weight = i128::from(edge.weight);
            let bond = i128::from(edge.bond.units());
            weighted += weight * bond;
            total_bond += bond;
            plain += weight;
            count += 1;
        }
        if count == 0 {
            return 0;
        }

        let bps = i128::from(self.params.edge_weight_bps);
        if self.params.bond_weighted && total_bond > 0 {
            weighted * bps / (total_bond * BPS)
        } else {
            plain * bps / (count * BPS)
        }
    }
}

impl Default for ReputationEngine {
    fn default() -> Self {
        Self::new(ReputationParams::default())
    }
}
