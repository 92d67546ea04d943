//! `seedwalk`: score-bounded random walk with restart from multiple seeds.
//!
//! The engine propagates influence from seed nodes across an attributed,
//! undirected graph and reports each visited node's share of the walk. The
//! result can be projected back onto the source network as a weighted
//! sub-network.
//!
//! Public invariants (must not drift):
//! - **Purity**: a run is a function of (graph, seeds, config); no I/O and no
//!   ambient randomness. `config.rng_seed` fixes the whole walk.
//! - **Normalization**: `node_weights` covers visited nodes only and sums to 1.
//! - **Bounded**: at most `max_steps` transitions, whatever the graph.
//! - **Seeds**: unknown seed ids are dropped; an empty remainder is an error
//!   raised before any walk state exists.
//!
//! ```
//! use seedwalk::{propagate, AttributedGraph, PropagationConfig};
//!
//! let mut g = AttributedGraph::new();
//! for id in ["a", "b", "c"] {
//!     g.add_node(id, Some("protein")).unwrap();
//! }
//! g.add_edge("a", "b");
//! g.add_edge("b", "c");
//!
//! let result = propagate(&g, &["a"], &PropagationConfig::default()).unwrap();
//! let total: f64 = result.node_weights.values().sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

pub mod batch;
pub mod graph;
pub mod network;
pub mod output;
pub mod propagation;
pub mod result;
pub mod score;
pub mod seed;
pub mod topk;

pub use batch::{propagate_each, run_rng_seed, SeedRun};
#[cfg(feature = "parallel")]
pub use batch::propagate_each_parallel;
pub use graph::{AttributedGraph, Edge, GraphRef, LabeledGraph, Node, DEFAULT_TYPE};
pub use network::{Attributes, Network, NetworkEdge, NetworkNode};
pub use output::{build_output_network, OutputNetworkBuilder, WEIGHT_ATTRIBUTE};
pub use propagation::{propagate, propagate_from, propagate_single, PropagationConfig};
pub use result::{PropagationResult, TerminationReason, WalkStats};
pub use score::{NodeScorer, TypeScoreTable};
pub use seed::{SeedSelectionStrategy, SeedSelector, SeedSet};
pub use topk::top_k;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid seed set: none of the {requested} requested seed(s) are in the graph")]
    InvalidSeedSet { requested: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown seed selection strategy: {0}")]
    UnknownStrategy(String),
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
