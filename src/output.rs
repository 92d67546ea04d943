//! Projecting a propagation result back onto a network.
//!
//! [`OutputNetworkBuilder`] borrows the original [`Network`] and produces a new
//! one; the original is never mutated, so one source network can feed any
//! number of concurrent runs.
//!
//! Build order:
//! 1. copy nodes, setting `propagation_weight` on weighted ones (stale ids skipped);
//! 2. unless `include_all_nodes`, keep only weighted nodes and the edges between them;
//! 3. set network metadata, then caller overlays;
//! 4. fill in every original network attribute and aspect not already set.

use crate::network::{
    id_value_string, Attributes, Network, NetworkEdge, NetworkNode, EDGE_BYPASSES, NODE_BYPASSES,
};
use crate::result::PropagationResult;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

pub const WEIGHT_ATTRIBUTE: &str = "propagation_weight";
pub const OUTPUT_VERSION: &str = "1.0";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NAMED_SEEDS: usize = 3;

#[derive(Debug, Clone)]
pub struct OutputNetworkBuilder<'a> {
    original: &'a Network,
    weights: &'a BTreeMap<String, f64>,
    seeds: Vec<String>,
    include_all_nodes: bool,
    name: Option<String>,
    timestamp: Option<String>,
    overlays: Attributes,
}

impl<'a> OutputNetworkBuilder<'a> {
    pub fn new(original: &'a Network, weights: &'a BTreeMap<String, f64>) -> Self {
        Self {
            original,
            weights,
            seeds: Vec::new(),
            include_all_nodes: false,
            name: None,
            timestamp: None,
            overlays: Attributes::new(),
        }
    }

    /// Builder preloaded with a result's weights and seed list.
    pub fn from_result(original: &'a Network, result: &'a PropagationResult) -> Self {
        Self::new(original, &result.node_weights).seeds(result.walk_stats.seed_nodes.iter())
    }

    pub fn seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.seeds = seeds.into_iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn include_all_nodes(mut self, include: bool) -> Self {
        self.include_all_nodes = include;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fixed timestamp string instead of the local time at build.
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Extra network attribute set after the computed metadata.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overlays.insert(key.into(), value.into());
        self
    }

    pub fn build(&self) -> Network {
        let timestamp = self
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(TIMESTAMP_FORMAT).to_string());

        let mut nodes: Vec<NetworkNode> = Vec::with_capacity(self.original.nodes.len());
        for node in &self.original.nodes {
            let weight = self.weights.get(&node.id).copied();
            if weight.is_none() && !self.include_all_nodes {
                continue;
            }
            let mut node = node.clone();
            match weight {
                Some(w) => {
                    node.attributes.insert(WEIGHT_ATTRIBUTE.to_string(), Value::from(w));
                }
                // A weight left over from an earlier run is not this run's.
                None => {
                    node.attributes.remove(WEIGHT_ATTRIBUTE);
                }
            }
            nodes.push(node);
        }

        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<NetworkEdge> = self
            .original
            .edges
            .iter()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .cloned()
            .collect();

        let mut attributes = Attributes::new();
        attributes.insert(
            "name".to_string(),
            Value::from(self.name.clone().unwrap_or_else(|| self.derived_name(&timestamp))),
        );
        attributes.insert(
            "description".to_string(),
            Value::from(format!("Propagation network from {} seed nodes", self.seeds.len())),
        );
        attributes.insert(
            "seed_nodes".to_string(),
            Value::from(seed_list_json(&self.seeds)),
        );
        attributes.insert("propagation_timestamp".to_string(), Value::from(timestamp));
        attributes.insert("include_all_nodes".to_string(), Value::from(self.include_all_nodes));
        attributes.insert("version".to_string(), Value::from(OUTPUT_VERSION));
        for (k, v) in &self.overlays {
            attributes.insert(k.clone(), v.clone());
        }
        for (k, v) in &self.original.attributes {
            attributes.entry(k.clone()).or_insert_with(|| v.clone());
        }

        let node_ids = kept;
        let edge_ids: HashSet<&str> = edges.iter().filter_map(|e| e.id.as_deref()).collect();
        let mut aspects = BTreeMap::new();
        for (k, v) in &self.original.aspects {
            let v = match k.as_str() {
                NODE_BYPASSES => retain_bypasses(v, &node_ids),
                EDGE_BYPASSES => retain_bypasses(v, &edge_ids),
                _ => v.clone(),
            };
            aspects.insert(k.clone(), v);
        }

        Network {
            attributes,
            nodes,
            edges,
            aspects,
        }
    }

    /// "Propagation from A, B, C and 2 more - <timestamp>".
    fn derived_name(&self, timestamp: &str) -> String {
        let labels: Vec<&str> = self
            .seeds
            .iter()
            .filter_map(|id| self.original.node(id))
            .map(NetworkNode::label)
            .collect();
        let mut seeds = labels.iter().take(NAMED_SEEDS).copied().collect::<Vec<_>>().join(", ");
        if labels.len() > NAMED_SEEDS {
            seeds.push_str(&format!(" and {} more", labels.len() - NAMED_SEEDS));
        }
        format!("Propagation from {seeds} - {timestamp}")
    }
}

/// Shorthand for `OutputNetworkBuilder::new(..).seeds(..).include_all_nodes(..)`.
pub fn build_output_network<S: AsRef<str>>(
    original: &Network,
    weights: &BTreeMap<String, f64>,
    seeds: &[S],
    include_all_nodes: bool,
    name: Option<&str>,
) -> Network {
    let mut builder = OutputNetworkBuilder::new(original, weights)
        .seeds(seeds)
        .include_all_nodes(include_all_nodes);
    if let Some(name) = name {
        builder = builder.name(name);
    }
    builder.build()
}

/// JSON list of seed ids with `", "` between items, e.g. `["v1", "h2"]`.
fn seed_list_json(seeds: &[String]) -> String {
    let items: Vec<String> = seeds.iter().map(|s| Value::from(s.as_str()).to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Drop bypass entries whose `id` refers to an element no longer present.
///
/// Ids are compared the way the network document reads them, so numeric
/// bypass ids match numeric element ids.
fn retain_bypasses(aspect: &Value, present: &HashSet<&str>) -> Value {
    let Value::Array(entries) = aspect else {
        return aspect.clone();
    };
    let kept = entries
        .iter()
        .filter(|entry| match entry.get("id").and_then(id_value_string) {
            Some(id) => present.contains(id.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    Value::Array(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn original() -> Network {
        let doc = json!({
            "attributes": { "name": "source", "organism": "human" },
            "nodes": [
                { "id": "1", "attributes": { "name": "NS1", "type": "viral" }, "x": 1.0, "y": 2.0 },
                { "id": "2", "attributes": { "name": "STAT2" } },
                { "id": "3", "attributes": { "GeneSymbol": "IRF3" } },
                { "id": "4", "attributes": {} }
            ],
            "edges": [
                { "id": "e12", "source": "1", "target": "2" },
                { "id": "e23", "source": "2", "target": "3" },
                { "id": "e34", "source": "3", "target": "4" }
            ],
            "visualProperties": [ { "default": { "node": { "NODE_SHAPE": "ellipse" } } } ],
            "nodeBypasses": [ { "id": 1, "v": { "COLOR": "#f00" } }, { "id": 4, "v": {} } ],
            "edgeBypasses": [ { "id": "e34", "v": {} }, { "id": "e12", "v": {} } ]
        });
        serde_json::from_value(doc).unwrap()
    }

    fn weights() -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("1".to_string(), 0.5),
            ("2".to_string(), 0.3),
            ("stale".to_string(), 0.2),
        ])
    }

    #[test]
    fn filtered_output_keeps_weighted_nodes_and_connecting_edges() {
        let src = original();
        let w = weights();
        let out = OutputNetworkBuilder::new(&src, &w)
            .seeds(["1"])
            .timestamp("2024-01-01 00:00:00")
            .build();

        let ids: Vec<&str> = out.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].id.as_deref(), Some("e12"));
        assert_eq!(out.nodes[0].attributes[WEIGHT_ATTRIBUTE], json!(0.5));
        assert_eq!(out.nodes[0].extra["x"], json!(1.0));

        assert_eq!(out.attributes["name"], json!("Propagation from NS1 - 2024-01-01 00:00:00"));
        assert_eq!(out.attributes["seed_nodes"], json!("[\"1\"]"));
        assert_eq!(out.attributes["include_all_nodes"], json!(false));
        assert_eq!(out.attributes["version"], json!("1.0"));
        assert_eq!(out.attributes["organism"], json!("human"));

        assert!(out.aspects.contains_key("visualProperties"));
        assert_eq!(out.aspects[NODE_BYPASSES], json!([{ "id": 1, "v": { "COLOR": "#f00" } }]));
        assert_eq!(out.aspects[EDGE_BYPASSES], json!([{ "id": "e12", "v": {} }]));

        // Source untouched.
        assert_eq!(src, original());
    }

    #[test]
    fn include_all_nodes_keeps_everything() {
        let src = original();
        let w = weights();
        let out = build_output_network(&src, &w, &["1", "2"], true, Some("custom"));
        assert_eq!(out.nodes.len(), 4);
        assert_eq!(out.edges.len(), 3);
        assert!(!out.nodes[3].attributes.contains_key(WEIGHT_ATTRIBUTE));
        assert_eq!(out.attributes["name"], json!("custom"));
        assert_eq!(out.attributes["include_all_nodes"], json!(true));
        assert_eq!(out.attributes["description"], json!("Propagation network from 2 seed nodes"));
        assert_eq!(out.aspects[NODE_BYPASSES].as_array().unwrap().len(), 2);
    }

    #[test]
    fn stale_weight_is_cleared_when_node_unweighted() {
        let mut src = original();
        src.nodes[0]
            .attributes
            .insert(WEIGHT_ATTRIBUTE.to_string(), json!(0.9));
        let w = BTreeMap::from([("2".to_string(), 1.0)]);
        let out = build_output_network(&src, &w, &["2"], true, None);

        assert_eq!(out.nodes.len(), 4);
        assert!(!out.nodes[0].attributes.contains_key(WEIGHT_ATTRIBUTE));
        let total: f64 = out
            .nodes
            .iter()
            .filter_map(|n| n.attributes.get(WEIGHT_ATTRIBUTE).and_then(Value::as_f64))
            .sum();
        assert_eq!(total, 1.0);
        // Source keeps its own attribute.
        assert_eq!(src.nodes[0].attributes[WEIGHT_ATTRIBUTE], json!(0.9));
    }

    #[test]
    fn edge_visual_fields_are_carried_over() {
        let doc = json!({
            "nodes": [ { "id": "a" }, { "id": "b" } ],
            "edges": [ { "id": "e", "source": "a", "target": "b", "v": { "EDGE_WIDTH": 3 } } ]
        });
        let src: Network = serde_json::from_value(doc).unwrap();
        let w = BTreeMap::from([("a".to_string(), 0.5), ("b".to_string(), 0.5)]);
        let out = build_output_network(&src, &w, &["a"], false, None);
        let edge = out.to_json_value().unwrap()["edges"][0].clone();
        assert_eq!(edge["v"], json!({ "EDGE_WIDTH": 3 }));
    }

    #[test]
    fn seed_list_uses_comma_space_separator() {
        let src = original();
        let w = weights();
        let out = build_output_network(&src, &w, &["1", "2"], false, None);
        assert_eq!(out.attributes["seed_nodes"], json!("[\"1\", \"2\"]"));
        assert_eq!(seed_list_json(&[]), "[]");
    }

    #[test]
    fn derived_name_lists_three_seeds_then_counts() {
        let mut src = original();
        src.nodes.push(NetworkNode::new("5").with_attribute("name", "MAVS"));
        let w = weights();
        let out = OutputNetworkBuilder::new(&src, &w)
            .seeds(["1", "2", "3", "4", "5", "ghost"])
            .timestamp("T")
            .build();
        assert_eq!(
            out.attributes["name"],
            json!("Propagation from NS1, STAT2, IRF3 and 2 more - T")
        );
    }

    #[test]
    fn overlays_win_over_original_but_not_lost() {
        let src = original();
        let w = weights();
        let out = OutputNetworkBuilder::new(&src, &w)
            .seeds(["1"])
            .attribute("viral_protein_id", "1")
            .attribute("organism", "dengue")
            .build();
        assert_eq!(out.attributes["viral_protein_id"], json!("1"));
        assert_eq!(out.attributes["organism"], json!("dengue"));
        assert_ne!(out.attributes["name"], json!("source"));
    }
}
