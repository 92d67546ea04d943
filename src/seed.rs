//! Seed sets and restart-target selection.

use crate::graph::{AttributedGraph, LabeledGraph};
use crate::score::NodeScorer;
use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a restart picks the seed to jump to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedSelectionStrategy {
    /// Every seed equally likely.
    #[default]
    Uniform,
    /// Proportional to the seed's node score.
    Weighted,
    /// Proportional to the seed's degree.
    Proportional,
}

impl SeedSelectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Weighted => "weighted",
            Self::Proportional => "proportional",
        }
    }
}

impl fmt::Display for SeedSelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedSelectionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "weighted" => Ok(Self::Weighted),
            "proportional" => Ok(Self::Proportional),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// Non-empty, duplicate-free list of seed nodes, all present in one graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSet {
    nodes: Vec<usize>,
}

impl SeedSet {
    /// Keep the ids present in `graph`, in first-occurrence order.
    ///
    /// Fails with [`Error::InvalidSeedSet`] when none are present.
    pub fn new<G, S>(graph: &G, ids: &[S]) -> Result<Self>
    where
        G: LabeledGraph,
        S: AsRef<str>,
    {
        Self::collect(ids, |id| graph.index_of(id))
    }

    /// Like [`SeedSet::new`], but each key may also be a node `name` or `GeneSymbol`.
    pub fn resolve<S: AsRef<str>>(graph: &AttributedGraph, keys: &[S]) -> Result<Self> {
        Self::collect(keys, |key| graph.resolve(key))
    }

    pub fn from_indices<G: LabeledGraph>(graph: &G, nodes: &[usize]) -> Result<Self> {
        let ids: Vec<&str> = nodes
            .iter()
            .filter(|&&n| n < graph.node_count())
            .map(|&n| graph.node_id(n))
            .collect();
        Self::new(graph, ids.as_slice())
    }

    fn collect<S, F>(keys: &[S], lookup: F) -> Result<Self>
    where
        S: AsRef<str>,
        F: Fn(&str) -> Option<usize>,
    {
        let mut nodes = Vec::with_capacity(keys.len());
        for key in keys {
            match lookup(key.as_ref()) {
                Some(idx) if !nodes.contains(&idx) => nodes.push(idx),
                Some(_) => {}
                None => tracing::debug!(seed = key.as_ref(), "seed not found in graph, ignored"),
            }
        }
        if nodes.is_empty() {
            return Err(Error::InvalidSeedSet {
                requested: keys.len(),
            });
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// Position of `node` in the set.
    pub fn position(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }
}

/// Draws restart targets from a [`SeedSet`].
///
/// Non-uniform strategies precompute a prefix-sum table once and draw with a
/// binary search. A zero total weight falls back to a uniform draw.
#[derive(Debug, Clone)]
pub struct SeedSelector<'s> {
    seeds: &'s SeedSet,
    cumulative: Option<Vec<f64>>,
}

impl<'s> SeedSelector<'s> {
    pub fn new<G: LabeledGraph>(
        graph: &G,
        seeds: &'s SeedSet,
        strategy: SeedSelectionStrategy,
        scorer: &NodeScorer,
    ) -> Self {
        let weights: Option<Vec<f64>> = match strategy {
            SeedSelectionStrategy::Uniform => None,
            SeedSelectionStrategy::Weighted => Some(
                seeds
                    .nodes()
                    .iter()
                    .map(|&s| scorer.score(graph, s).max(0.0))
                    .collect(),
            ),
            SeedSelectionStrategy::Proportional => Some(
                seeds
                    .nodes()
                    .iter()
                    .map(|&s| graph.out_degree(s) as f64)
                    .collect(),
            ),
        };
        let cumulative = weights.and_then(|w| {
            let mut acc = 0.0;
            let cdf: Vec<f64> = w
                .iter()
                .map(|&x| {
                    acc += x;
                    acc
                })
                .collect();
            (acc > 0.0).then_some(cdf)
        });
        Self { seeds, cumulative }
    }

    /// Whether draws use the weighted table (false: uniform).
    pub fn is_weighted(&self) -> bool {
        self.cumulative.is_some()
    }

    /// Draw a seed node.
    pub fn select<R: Rng>(&self, rng: &mut R) -> usize {
        self.seeds.nodes()[self.select_position(rng)]
    }

    /// Draw a seed, returned as its position in the [`SeedSet`].
    pub fn select_position<R: Rng>(&self, rng: &mut R) -> usize {
        match &self.cumulative {
            None => rng.random_range(0..self.seeds.len()),
            Some(cdf) => sample_cdf(rng, cdf),
        }
    }
}

/// Index `i` with probability `(cdf[i] - cdf[i-1]) / cdf[last]`.
fn sample_cdf<R: Rng>(rng: &mut R, cdf: &[f64]) -> usize {
    let total = cdf[cdf.len() - 1];
    let r = rng.random::<f64>() * total;
    cdf.partition_point(|&c| c <= r).min(cdf.len() - 1)
}
