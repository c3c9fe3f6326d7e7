//! Data contracts for recorded swarm simulation runs.
//!
//! A run is a JSON object produced by the external simulation process:
//! graph descriptors plus parallel per-step keyframe sequences. Every
//! top-level field is optional; ingestion only fails when a present field
//! is structurally invalid. [`Dataset`] keeps the verbatim JSON value next
//! to the typed view so export reproduces exactly what was loaded.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Identifier of a graph node.
///
/// Producers emit node ids as JSON strings or numbers interchangeably;
/// both normalize to the same id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(StringOrNumber("node id"))
            .map(NodeId)
    }
}

/// Free-form label attached to an edge endpoint (string or number).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortLabel(String);

impl PortLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PortLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PortLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(StringOrNumber("port label"))
            .map(PortLabel)
    }
}

/// Visitor normalizing a JSON string or number into its string form.
struct StringOrNumber(&'static str);

impl Visitor<'_> for StringOrNumber {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a string or number {}", self.0)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(format!("{}", value as i64))
        } else {
            Ok(value.to_string())
        }
    }
}

/// Per-agent settlement status.
///
/// The producer encodes statuses as small integers (0 settled, 1
/// unsettled, 2 settled-wait); older captures carry status names as
/// strings. Unrecognized codes and names are carried through verbatim
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentStatus {
    Settled,
    Unsettled,
    SettledWait,
    Other(String),
}

impl AgentStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => AgentStatus::Settled,
            1 => AgentStatus::Unsettled,
            2 => AgentStatus::SettledWait,
            other => AgentStatus::Other(other.to_string()),
        }
    }

    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "settled" => AgentStatus::Settled,
            "unsettled" => AgentStatus::Unsettled,
            "settledwait" => AgentStatus::SettledWait,
            _ => AgentStatus::Other(name.to_string()),
        }
    }

    /// Statuses whose tooltip entry carries the recorded home node.
    pub fn shows_home(&self) -> bool {
        matches!(self, AgentStatus::Settled | AgentStatus::SettledWait)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Settled => f.write_str("settled"),
            AgentStatus::Unsettled => f.write_str("unsettled"),
            AgentStatus::SettledWait => f.write_str("settledWait"),
            AgentStatus::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for AgentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AgentStatus::Settled => serializer.serialize_i64(0),
            AgentStatus::Unsettled => serializer.serialize_i64(1),
            AgentStatus::SettledWait => serializer.serialize_i64(2),
            AgentStatus::Other(raw) => match raw.parse::<i64>() {
                Ok(code) => serializer.serialize_i64(code),
                Err(_) => serializer.serialize_str(raw),
            },
        }
    }
}

impl<'de> Deserialize<'de> for AgentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl Visitor<'_> for StatusVisitor {
            type Value = AgentStatus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an agent status code or name")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<AgentStatus, E> {
                Ok(AgentStatus::from_code(value))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<AgentStatus, E> {
                Ok(AgentStatus::from_code(value as i64))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<AgentStatus, E> {
                if value.is_finite() && value.fract() == 0.0 {
                    Ok(AgentStatus::from_code(value as i64))
                } else {
                    Ok(AgentStatus::Other(value.to_string()))
                }
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<AgentStatus, E> {
                Ok(AgentStatus::from_name(value))
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// Layout coordinate of a node element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Overlay edge present at a single step.
///
/// Accepts either the keyed object shape `{"u": .., "v": ..}` (extra keys
/// ignored) or a positional pair `[u, v]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeEdgeRepr")]
pub struct TreeEdge {
    pub u: NodeId,
    pub v: NodeId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TreeEdgeRepr {
    Keyed { u: NodeId, v: NodeId },
    Positional(Vec<NodeId>),
}

impl TryFrom<TreeEdgeRepr> for TreeEdge {
    type Error = String;

    fn try_from(repr: TreeEdgeRepr) -> Result<Self, Self::Error> {
        match repr {
            TreeEdgeRepr::Keyed { u, v } => Ok(TreeEdge { u, v }),
            TreeEdgeRepr::Positional(mut ends) => {
                if ends.len() < 2 {
                    return Err("tree edge needs two endpoints".to_string());
                }
                let v = ends.swap_remove(1);
                let u = ends.swap_remove(0);
                Ok(TreeEdge { u, v })
            }
        }
    }
}

/// Per-node settlement flags for one step.
///
/// The producer writes per-node state objects (or null when the node hosts
/// nothing); a JSON bool is taken verbatim, null is false, any other value
/// counts as set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeFlags(pub BTreeMap<NodeId, bool>);

impl<'de> Deserialize<'de> for NodeFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<NodeId, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(node, value)| {
                    let flag = match value {
                        serde_json::Value::Null => false,
                        serde_json::Value::Bool(b) => b,
                        _ => true,
                    };
                    (node, flag)
                })
                .collect(),
        ))
    }
}

/// One `(label, values)` keyframe of a per-step sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframe<T> {
    pub label: String,
    pub values: T,
}

impl<T> Keyframe<T> {
    pub fn new(label: impl Into<String>, values: T) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

impl<T: Serialize> Serialize for Keyframe<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.label, &self.values).serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyframe<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (label, values) = <(String, T)>::deserialize(deserializer)?;
        Ok(Self { label, values })
    }
}

/// Ordered per-step sequence, one keyframe per recorded step.
pub type Keyframes<T> = Vec<Keyframe<T>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
}

/// Render-surface node descriptor with an optional preset position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(
        default,
        rename = "srcPort",
        skip_serializing_if = "Option::is_none"
    )]
    pub src_port: Option<PortLabel>,
    #[serde(
        default,
        rename = "dstPort",
        skip_serializing_if = "Option::is_none"
    )]
    pub dst_port: Option<PortLabel>,
}

/// Static graph edge descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    pub data: EdgeData,
}

/// A recorded simulation run as produced by the external simulation
/// process. Every field is optional on the wire; the `positions` sequence
/// is authoritative for step count and step labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationData {
    pub nodes: Vec<NodeDescriptor>,
    pub edges: Vec<EdgeDescriptor>,
    pub positions: Keyframes<Vec<NodeId>>,
    pub statuses: Keyframes<Vec<AgentStatus>>,
    pub homes: Keyframes<Vec<Option<NodeId>>>,
    pub leaders: Keyframes<Vec<f64>>,
    pub levels: Keyframes<Vec<f64>>,
    pub tree_edges: Keyframes<Vec<TreeEdge>>,
    pub node_settled_states: Keyframes<NodeFlags>,
}

impl SimulationData {
    /// Number of recorded steps (positions is authoritative).
    pub fn step_count(&self) -> usize {
        self.positions.len()
    }
}

/// Error raised at the ingestion boundary. A malformed present field
/// aborts the load wholesale; nothing partial is retained.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("payload is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("payload root must be a JSON object")]
    NotAnObject,
    #[error("malformed step data: {detail}")]
    Malformed { detail: String },
}

/// A loaded run: the typed view the engine consumes plus the verbatim
/// JSON value it was parsed from. Export reproduces the original object,
/// not a re-serialization of the typed view.
#[derive(Debug, Clone)]
pub struct Dataset {
    raw: serde_json::Value,
    data: SimulationData,
}

impl Dataset {
    pub fn from_json_str(text: &str) -> Result<Self, IngestError> {
        let raw: serde_json::Value = serde_json::from_str(text).map_err(IngestError::Parse)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: serde_json::Value) -> Result<Self, IngestError> {
        if !raw.is_object() {
            return Err(IngestError::NotAnObject);
        }
        let data: SimulationData =
            serde_json::from_value(raw.clone()).map_err(|err| IngestError::Malformed {
                detail: err.to_string(),
            })?;
        Ok(Self { raw, data })
    }

    pub fn data(&self) -> &SimulationData {
        &self.data
    }

    /// The JSON object exactly as loaded.
    pub fn export_value(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.raw).expect("dataset re-serialization failed")
    }
}
