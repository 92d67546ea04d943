//! Score-bounded random walk with restart from one or more seeds.
//!
//! The walk starts on a seed drawn by the [`SeedSelector`], then repeatedly
//! either restarts (with probability `restart_prob`) to a freshly drawn seed or
//! moves to a uniformly chosen neighbor. Every visit adds the node's type score
//! to a running total; the walk stops when that total reaches
//! `max_cumulative_score`, after `max_steps` transitions, at a dead end, or
//! (revisits disallowed) when it is boxed in with no seed in reach.
//!
//! Invariants:
//! - `path.len() == steps + 1 == sum(visit_counts)`; the starting placement is
//!   not a step.
//! - Every visit is attributed to exactly one seed: the one most recently
//!   restarted to (initially the starting seed).
//! - All randomness comes from one `ChaCha8Rng` seeded with `rng_seed`.

use crate::graph::LabeledGraph;
use crate::result::{aggregate, PropagationResult, TerminationReason};
use crate::score::{NodeScorer, TypeScoreTable};
use crate::seed::{SeedSelectionStrategy, SeedSelector, SeedSet};
use crate::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Per-step probability of jumping back to a seed.
    pub restart_prob: f64,
    pub max_cumulative_score: f64,
    /// Maximum number of transitions.
    pub max_steps: usize,
    pub type_scores: TypeScoreTable,
    pub allow_revisits: bool,
    #[serde(rename = "seed_selection_strategy")]
    pub strategy: SeedSelectionStrategy,
    /// Seed for the walk's PRNG.
    pub rng_seed: u64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            restart_prob: 0.2,
            max_cumulative_score: 10.0,
            max_steps: 100,
            type_scores: TypeScoreTable::default(),
            allow_revisits: true,
            strategy: SeedSelectionStrategy::Uniform,
            rng_seed: 42,
        }
    }
}

impl PropagationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.restart_prob.is_finite() || !(0.0..=1.0).contains(&self.restart_prob) {
            return Err(Error::InvalidParameter(
                "restart_prob must be in [0,1]".to_string(),
            ));
        }
        if !self.max_cumulative_score.is_finite() || self.max_cumulative_score <= 0.0 {
            return Err(Error::InvalidParameter(
                "max_cumulative_score must be finite and > 0".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidParameter(
                "max_steps must be > 0".to_string(),
            ));
        }
        self.type_scores.validate()
    }
}

/// Mutable state of one walk. Created and consumed inside a single call.
#[derive(Debug, Clone)]
pub(crate) struct WalkState {
    pub(crate) current: usize,
    /// Position in the seed set of the seed visits are attributed to.
    pub(crate) current_seed: usize,
    pub(crate) path: Vec<usize>,
    pub(crate) cumulative_score: f64,
    pub(crate) steps: usize,
    pub(crate) restarts: usize,
    /// Sparse: only visited nodes have an entry.
    pub(crate) visit_counts: HashMap<usize, usize>,
    /// Indexed by seed position; sparse per seed.
    pub(crate) seed_contributions: Vec<HashMap<usize, usize>>,
}

impl WalkState {
    fn start(node: usize, seed_pos: usize, seed_count: usize, score: f64) -> Self {
        let mut seed_contributions = vec![HashMap::new(); seed_count];
        seed_contributions[seed_pos].insert(node, 1);
        Self {
            current: node,
            current_seed: seed_pos,
            path: vec![node],
            cumulative_score: score,
            steps: 0,
            restarts: 0,
            visit_counts: HashMap::from([(node, 1)]),
            seed_contributions,
        }
    }

    fn visited(&self, node: usize) -> bool {
        self.visit_counts.contains_key(&node)
    }

    fn advance(&mut self, next: usize, score: f64) {
        self.path.push(next);
        *self.visit_counts.entry(next).or_insert(0) += 1;
        *self.seed_contributions[self.current_seed].entry(next).or_insert(0) += 1;
        self.cumulative_score += score;
        self.steps += 1;
        self.current = next;
    }
}

/// Multi-seed propagation from seed ids.
///
/// Ids absent from `graph` are ignored; if none remain the call fails with
/// [`Error::InvalidSeedSet`] before any walk state exists.
pub fn propagate<G, S>(graph: &G, seeds: &[S], config: &PropagationConfig) -> Result<PropagationResult>
where
    G: LabeledGraph,
    S: AsRef<str>,
{
    config.validate()?;
    let seeds = SeedSet::new(graph, seeds)?;
    Ok(run(graph, &seeds, config))
}

/// Multi-seed propagation from an already validated [`SeedSet`].
pub fn propagate_from<G: LabeledGraph>(
    graph: &G,
    seeds: &SeedSet,
    config: &PropagationConfig,
) -> Result<PropagationResult> {
    config.validate()?;
    Ok(run(graph, seeds, config))
}

/// Single-seed propagation.
///
/// Same as [`propagate`] with `[seed]` and the uniform strategy; the
/// configured strategy is ignored.
pub fn propagate_single<G: LabeledGraph>(
    graph: &G,
    seed: &str,
    config: &PropagationConfig,
) -> Result<PropagationResult> {
    let config = PropagationConfig {
        strategy: SeedSelectionStrategy::Uniform,
        ..config.clone()
    };
    propagate(graph, &[seed], &config)
}

fn run<G: LabeledGraph>(graph: &G, seeds: &SeedSet, config: &PropagationConfig) -> PropagationResult {
    let _span = tracing::debug_span!(
        "propagate",
        seeds = seeds.len(),
        strategy = %config.strategy,
        rng_seed = config.rng_seed,
    )
    .entered();
    let started = Instant::now();

    let scorer = config.type_scores.bind(graph);
    let selector = SeedSelector::new(graph, seeds, config.strategy, &scorer);
    let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);

    let seed_pos = selector.select_position(&mut rng);
    let start = seeds.nodes()[seed_pos];
    let mut state = WalkState::start(start, seed_pos, seeds.len(), scorer.score(graph, start));

    let reason = walk(graph, seeds, &selector, &scorer, config, &mut state, &mut rng);

    let elapsed = started.elapsed().as_secs_f64();
    tracing::debug!(
        steps = state.steps,
        restarts = state.restarts,
        cumulative_score = state.cumulative_score,
        visited = state.visit_counts.len(),
        reason = reason.as_str(),
        "walk finished"
    );
    aggregate(graph, seeds, config.strategy, state, reason, elapsed)
}

fn walk<G: LabeledGraph, R: Rng>(
    graph: &G,
    seeds: &SeedSet,
    selector: &SeedSelector<'_>,
    scorer: &NodeScorer,
    config: &PropagationConfig,
    state: &mut WalkState,
    rng: &mut R,
) -> TerminationReason {
    let mut unvisited: Vec<usize> = Vec::new();

    while state.cumulative_score < config.max_cumulative_score && state.steps < config.max_steps {
        let neighbors = graph.neighbors_ref(state.current);
        if neighbors.is_empty() {
            return TerminationReason::DeadEnd;
        }

        let candidates: &[usize] = if config.allow_revisits {
            neighbors
        } else {
            unvisited.clear();
            unvisited.extend(neighbors.iter().copied().filter(|&n| !state.visited(n)));
            if !unvisited.is_empty() {
                unvisited.as_slice()
            } else if !neighbors.iter().any(|&n| seeds.contains(n)) {
                // Boxed in and no seed adjacent.
                return TerminationReason::AllNeighborsVisited;
            } else {
                neighbors
            }
        };

        let next = if rng.random::<f64>() < config.restart_prob {
            let pos = selector.select_position(rng);
            let target = seeds.nodes()[pos];
            if target != state.current {
                state.restarts += 1;
            }
            state.current_seed = pos;
            target
        } else {
            candidates[rng.random_range(0..candidates.len())]
        };

        state.advance(next, scorer.score(graph, next));
    }

    if state.cumulative_score >= config.max_cumulative_score {
        TerminationReason::MaxScoreReached
    } else {
        TerminationReason::MaxStepsReached
    }
}
