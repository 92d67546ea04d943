//! Serializable network form.
//!
//! This is the document shape exchanged with whatever loads and stores networks:
//! network-level attributes, node and edge lists, and any further aspects
//! (visual properties, bypasses, layout hints) kept as opaque JSON.
//!
//! Ids are strings. Documents that use numeric node or edge ids are accepted
//! and the ids are read as their decimal form.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute bag shared by networks, nodes and edges.
pub type Attributes = Map<String, Value>;

/// Aspect holding per-node visual overrides (`[{ "id": .., "v": {..} }]`).
pub const NODE_BYPASSES: &str = "nodeBypasses";
/// Aspect holding per-edge visual overrides.
pub const EDGE_BYPASSES: &str = "edgeBypasses";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub edges: Vec<NetworkEdge>,
    /// Everything else: styles, bypasses, editor state.
    #[serde(flatten)]
    pub aspects: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Layout and other per-node fields outside the attribute bag (`x`, `y`, ...).
    #[serde(flatten)]
    pub extra: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_id_string"
    )]
    pub id: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub source: String,
    #[serde(deserialize_with = "id_string")]
    pub target: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Per-edge fields outside the attribute bag (visual values, ...).
    #[serde(flatten)]
    pub extra: Attributes,
}

impl Network {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn to_json_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

impl NetworkNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Human-readable label: `name`, then `GeneSymbol`, then the id.
    pub fn label(&self) -> &str {
        display_label(&self.id, &self.attributes)
    }
}

impl NetworkEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            attributes: Attributes::new(),
            extra: Attributes::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Id as a string; JSON numbers are accepted and rendered in decimal.
pub(crate) fn id_value_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    id_value_string(&v).ok_or_else(|| D::Error::custom(format!("expected a string or numeric id, got {v}")))
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(v) => id_value_string(&v)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a string or numeric id, got {v}"))),
    }
}

pub(crate) fn display_label<'a>(id: &'a str, attributes: &'a Attributes) -> &'a str {
    ["name", "GeneSymbol"]
        .iter()
        .filter_map(|k| attributes.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or(id)
}
