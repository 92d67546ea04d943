//! Graph adapter traits and the attributed graph the walk runs on.

use crate::network::{display_label, Attributes, Network};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Type name given to nodes that carry no `type` attribute.
pub const DEFAULT_TYPE: &str = "default";

/// A graph view that can return **borrowed** neighbor slices.
///
/// Avoids allocating a new `Vec` on every step of a walk.
pub trait GraphRef {
    fn node_count(&self) -> usize;
    fn neighbors_ref(&self, node: usize) -> &[usize];
    fn out_degree(&self, node: usize) -> usize {
        self.neighbors_ref(node).len()
    }
}

/// A [`GraphRef`] whose nodes have string ids and interned type ids.
///
/// Requirements:
/// - `type_of(node) < type_count()` for every node.
/// - `index_of(node_id(i)) == Some(i)`.
pub trait LabeledGraph: GraphRef {
    fn node_id(&self, node: usize) -> &str;
    fn index_of(&self, id: &str) -> Option<usize>;
    fn type_count(&self) -> usize;
    fn type_of(&self, node: usize) -> usize;
    fn type_name(&self, ty: usize) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub node_type: Option<String>,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub attributes: Attributes,
}

/// Undirected graph with string node ids, node types and attribute bags.
///
/// Neighbor lists are de-duplicated and keep edge insertion order, so walks
/// over the same construction sequence are reproducible.
#[derive(Debug, Clone, Default)]
pub struct AttributedGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adj: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
    type_names: Vec<String>,
    type_index: HashMap<String, usize>,
    node_types: Vec<usize>,
}

impl AttributedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<String>, node_type: Option<&str>) -> Result<usize> {
        self.add_node_with(id, node_type, Attributes::new())
    }

    pub fn add_node_with(
        &mut self,
        id: impl Into<String>,
        node_type: Option<&str>,
        attributes: Attributes,
    ) -> Result<usize> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateNode(id));
        }
        let idx = self.nodes.len();
        let ty = self.intern_type(node_type.unwrap_or(DEFAULT_TYPE));
        self.index.insert(id.clone(), idx);
        self.nodes.push(Node {
            id,
            node_type: node_type.map(str::to_string),
            attributes,
        });
        self.adj.push(Vec::new());
        self.node_types.push(ty);
        Ok(idx)
    }

    /// Add an undirected edge by node id.
    ///
    /// Returns `false` (and adds nothing) when either endpoint is unknown.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        self.add_edge_with(source, target, Attributes::new())
    }

    pub fn add_edge_with(&mut self, source: &str, target: &str, attributes: Attributes) -> bool {
        let (Some(&s), Some(&t)) = (self.index.get(source), self.index.get(target)) else {
            return false;
        };
        self.edges.push(Edge {
            source: s,
            target: t,
            attributes,
        });
        if !self.adj[s].contains(&t) {
            self.adj[s].push(t);
        }
        if s != t && !self.adj[t].contains(&s) {
            self.adj[t].push(s);
        }
        true
    }

    /// Build from the serializable form.
    ///
    /// The node type comes from the `type` attribute. Edges with a missing
    /// endpoint are dropped.
    pub fn from_network(network: &Network) -> Result<Self> {
        let mut g = Self::new();
        for n in &network.nodes {
            let ty = n.attributes.get("type").and_then(Value::as_str);
            g.add_node_with(n.id.clone(), ty, n.attributes.clone())?;
        }
        let mut dropped = 0usize;
        for e in &network.edges {
            if !g.add_edge_with(&e.source, &e.target, e.attributes.clone()) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "edges with unknown endpoints skipped");
        }
        Ok(g)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Display label of a node: `name`, then `GeneSymbol`, then its id.
    pub fn label(&self, idx: usize) -> &str {
        let n = &self.nodes[idx];
        display_label(&n.id, &n.attributes)
    }

    /// Resolve a user-facing key to a node: exact id first, then a node whose
    /// `name` equals the key, then a node whose `GeneSymbol` does.
    pub fn resolve(&self, key: &str) -> Option<usize> {
        if let Some(&idx) = self.index.get(key) {
            return Some(idx);
        }
        ["name", "GeneSymbol"].iter().find_map(|attr| {
            self.nodes
                .iter()
                .position(|n| n.attributes.get(*attr).and_then(Value::as_str) == Some(key))
        })
    }

    /// Nodes whose boolean attribute `flag` is true or whose type is `node_type`.
    ///
    /// Useful to collect seed candidates such as viral proteins.
    pub fn flagged_nodes(&self, flag: &str, node_type: &str) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| {
                n.attributes.get(flag).and_then(Value::as_bool).unwrap_or(false)
                    || n.node_type.as_deref() == Some(node_type)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn intern_type(&mut self, name: &str) -> usize {
        if let Some(&ty) = self.type_index.get(name) {
            return ty;
        }
        let ty = self.type_names.len();
        self.type_names.push(name.to_string());
        self.type_index.insert(name.to_string(), ty);
        ty
    }
}

impl GraphRef for AttributedGraph {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn neighbors_ref(&self, node: usize) -> &[usize] {
        self.adj.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl LabeledGraph for AttributedGraph {
    fn node_id(&self, node: usize) -> &str {
        &self.nodes[node].id
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    fn type_count(&self) -> usize {
        self.type_names.len()
    }

    fn type_of(&self, node: usize) -> usize {
        self.node_types[node]
    }

    fn type_name(&self, ty: usize) -> &str {
        &self.type_names[ty]
    }
}
