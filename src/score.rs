//! Node scoring by type.
//!
//! A [`TypeScoreTable`] always carries a default, so a lookup never fails.
//! Before a walk it is bound to a graph's interned types ([`NodeScorer`]),
//! which turns every per-step lookup into a slice index and reports table
//! entries that match no type in the graph (usually a misspelled type name).

use crate::graph::{LabeledGraph, DEFAULT_TYPE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeScoreTable {
    #[serde(default = "default_score")]
    default_score: f64,
    #[serde(default)]
    scores: BTreeMap<String, f64>,
}

fn default_score() -> f64 {
    1.0
}

impl Default for TypeScoreTable {
    fn default() -> Self {
        Self::with_default(default_score())
    }
}

impl TypeScoreTable {
    pub fn with_default(default_score: f64) -> Self {
        Self {
            default_score,
            scores: BTreeMap::new(),
        }
    }

    /// Build from a flat `type -> score` map, as found in type-score files.
    pub fn from_map<I, K>(scores: I, default_score: f64) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            default_score,
            scores: scores.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn with(mut self, node_type: impl Into<String>, score: f64) -> Self {
        self.scores.insert(node_type.into(), score);
        self
    }

    pub fn default_score(&self) -> f64 {
        self.default_score
    }

    /// Score for a type name; unmapped types get the default.
    pub fn get(&self, node_type: &str) -> f64 {
        self.scores.get(node_type).copied().unwrap_or(self.default_score)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.default_score.is_finite() {
            return Err(Error::InvalidParameter(
                "default_score must be finite".to_string(),
            ));
        }
        if let Some((ty, _)) = self.scores.iter().find(|(_, s)| !s.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "score for type '{ty}' must be finite"
            )));
        }
        Ok(())
    }

    /// Resolve the table against the types present in `graph`.
    pub fn bind<G: LabeledGraph>(&self, graph: &G) -> NodeScorer {
        let by_type: Vec<f64> = (0..graph.type_count())
            .map(|ty| self.get(graph.type_name(ty)))
            .collect();
        for ty in self.scores.keys() {
            let present = (0..graph.type_count()).any(|t| graph.type_name(t) == ty);
            if !present && ty != DEFAULT_TYPE {
                tracing::warn!(node_type = %ty, "type score entry matches no node type in the graph");
            }
        }
        NodeScorer { by_type }
    }
}

/// A [`TypeScoreTable`] resolved to one graph's type ids.
#[derive(Debug, Clone)]
pub struct NodeScorer {
    by_type: Vec<f64>,
}

impl NodeScorer {
    pub fn score<G: LabeledGraph>(&self, graph: &G, node: usize) -> f64 {
        self.by_type[graph.type_of(node)]
    }
}
