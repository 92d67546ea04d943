//! Propagation results: visit counts turned into weights and seed shares.

use crate::graph::{AttributedGraph, LabeledGraph};
use crate::propagation::WalkState;
use crate::seed::{SeedSelectionStrategy, SeedSet};
use crate::topk::top_k;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a walk stopped. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The current node has no neighbors.
    DeadEnd,
    /// Revisits are disallowed, every neighbor was visited and none is a seed.
    AllNeighborsVisited,
    /// The cumulative score reached `max_cumulative_score`.
    MaxScoreReached,
    /// The walk took `max_steps` steps.
    MaxStepsReached,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeadEnd => "dead_end",
            Self::AllNeighborsVisited => "all_neighbors_visited",
            Self::MaxScoreReached => "max_score_reached",
            Self::MaxStepsReached => "max_steps_reached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkStats {
    pub cumulative_score: f64,
    /// Transitions taken; the starting placement is not a step.
    ///
    /// This is one less than the number of visits: the total of
    /// `visit_counts` (and `path.len()`) is `steps + 1`.
    pub steps: usize,
    /// Restart draws that moved the walk to a different node.
    pub restarts: usize,
    pub termination_reason: TerminationReason,
    pub seed_nodes: Vec<String>,
    #[serde(rename = "seed_selection_strategy")]
    pub strategy: SeedSelectionStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationResult {
    /// Share of all visits per visited node; sums to 1.
    pub node_weights: BTreeMap<String, f64>,
    pub visit_counts: BTreeMap<String, usize>,
    pub path: Vec<String>,
    pub walk_stats: WalkStats,
    /// `seed -> node -> share of that node's visits made while the seed was active`.
    pub seed_contributions: BTreeMap<String, BTreeMap<String, f64>>,
    /// Wall-clock seconds spent in the walk.
    pub execution_time: f64,
}

impl PropagationResult {
    /// The `k` heaviest nodes, descending.
    pub fn top_nodes(&self, k: usize) -> Vec<(&str, f64)> {
        top_k(self.node_weights.iter().map(|(id, &w)| (id.as_str(), w)), k)
    }

    /// Weights keyed by display label (`name`, `GeneSymbol`, else id).
    ///
    /// Nodes that share a label have their weights summed.
    pub fn label_weights(&self, graph: &AttributedGraph) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (id, &w) in &self.node_weights {
            let Some(idx) = graph.index_of(id) else { continue };
            *out.entry(graph.label(idx).to_string()).or_insert(0.0) += w;
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

pub(crate) fn aggregate<G: LabeledGraph>(
    graph: &G,
    seeds: &SeedSet,
    strategy: SeedSelectionStrategy,
    state: WalkState,
    reason: TerminationReason,
    execution_time: f64,
) -> PropagationResult {
    let total: usize = state.visit_counts.values().sum();
    let id = |n: usize| graph.node_id(n).to_string();

    let mut node_weights = BTreeMap::new();
    let mut visit_counts = BTreeMap::new();
    for (&n, &count) in &state.visit_counts {
        if count == 0 {
            continue;
        }
        node_weights.insert(id(n), count as f64 / total as f64);
        visit_counts.insert(id(n), count);
    }

    let mut seed_contributions = BTreeMap::new();
    for (pos, &seed) in seeds.nodes().iter().enumerate() {
        let per_seed = &state.seed_contributions[pos];
        let shares: BTreeMap<String, f64> = state
            .visit_counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&n, &count)| {
                let mine = per_seed.get(&n).copied().unwrap_or(0);
                (id(n), mine as f64 / count as f64)
            })
            .collect();
        seed_contributions.insert(id(seed), shares);
    }

    PropagationResult {
        node_weights,
        visit_counts,
        path: state.path.iter().map(|&n| id(n)).collect(),
        walk_stats: WalkStats {
            cumulative_score: state.cumulative_score,
            steps: state.steps,
            restarts: state.restarts,
            termination_reason: reason,
            seed_nodes: seeds.nodes().iter().map(|&s| id(s)).collect(),
            strategy,
        },
        seed_contributions,
        execution_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn triangle() -> AttributedGraph {
        let mut g = AttributedGraph::new();
        let mut attrs = crate::network::Attributes::new();
        attrs.insert("name".into(), "ALPHA".into());
        g.add_node_with("a", None, attrs).unwrap();
        g.add_node("b", None).unwrap();
        g.add_node("c", None).unwrap();
        g.add_edge("a", "b");
        g.add_edge("b", "c");
        g.add_edge("c", "a");
        g
    }

    #[test]
    fn weights_are_visit_shares_and_contributions_split_visits() {
        let g = triangle();
        let seeds = SeedSet::new(&g, &["a", "c"]).unwrap();
        // path a b c a ; a active for a,b ; c active for c,a
        let state = WalkState {
            current: 0,
            current_seed: 1,
            path: vec![0, 1, 2, 0],
            cumulative_score: 4.0,
            steps: 3,
            restarts: 1,
            visit_counts: HashMap::from([(0, 2), (1, 1), (2, 1)]),
            seed_contributions: vec![HashMap::from([(0, 1), (1, 1)]), HashMap::from([(2, 1), (0, 1)])],
        };
        let reason = TerminationReason::MaxStepsReached;
        let r = aggregate(&g, &seeds, SeedSelectionStrategy::Uniform, state, reason, 0.0);

        assert_eq!(r.node_weights["a"], 0.5);
        assert_eq!(r.node_weights["b"], 0.25);
        let sum: f64 = r.node_weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(r.path, vec!["a", "b", "c", "a"]);
        assert_eq!(r.walk_stats.seed_nodes, vec!["a", "c"]);

        assert_eq!(r.seed_contributions["a"]["a"], 0.5);
        assert_eq!(r.seed_contributions["a"]["b"], 1.0);
        assert_eq!(r.seed_contributions["a"]["c"], 0.0);
        assert_eq!(r.seed_contributions["c"]["a"], 0.5);
        assert_eq!(r.seed_contributions["c"]["c"], 1.0);

        assert_eq!(r.top_nodes(1), vec![("a", 0.5)]);
        let labels = r.label_weights(&g);
        assert_eq!(labels["ALPHA"], 0.5);
        assert_eq!(labels["c"], 0.25);
    }

    #[test]
    fn serializes_with_snake_case_reason() {
        let g = triangle();
        let seeds = SeedSet::new(&g, &["b"]).unwrap();
        let state = WalkState {
            current: 1,
            current_seed: 0,
            path: vec![1],
            cumulative_score: 1.0,
            steps: 0,
            restarts: 0,
            visit_counts: HashMap::from([(1, 1)]),
            seed_contributions: vec![HashMap::from([(1, 1)])],
        };
        let reason = TerminationReason::MaxScoreReached;
        let r = aggregate(&g, &seeds, SeedSelectionStrategy::Weighted, state, reason, 0.25);
        let v = r.to_json().unwrap();
        assert_eq!(v["walk_stats"]["termination_reason"], "max_score_reached");
        assert_eq!(v["walk_stats"]["seed_selection_strategy"], "weighted");
        assert_eq!(v["node_weights"]["b"], 1.0);
        let back: PropagationResult = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }
}
