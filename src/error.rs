use crate::graph::{NodeId, ParamKind};
use std::fmt;

#[derive(Debug)]
pub enum SynthError {
    Graph(GraphError),
    Preset(PresetError),
    Config(ConfigError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The node was never created or has already been removed.
    UnknownNode(NodeId),
    /// The node does not expose the requested automation parameter.
    UnknownParam { node: NodeId, param: ParamKind },
    /// Connecting would close a loop in the graph.
    Cycle { from: NodeId, to: NodeId },
    /// The operation is not valid for the node's current state
    /// (e.g. stopping a source that already finished).
    InvalidState { node: NodeId, reason: &'static str },
}

#[derive(Debug)]
pub enum PresetError {
    Json(serde_json::Error),
    NotFound(String),
    ReadOnly(String),
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSampleRate(f64),
    InvalidValue { field: &'static str, value: f64 },
    Json(serde_json::Error),
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::Graph(e) => write!(f, "Graph error: {e}"),
            SynthError::Preset(e) => write!(f, "Preset error: {e}"),
            SynthError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for SynthError {}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::UnknownNode(id) => write!(f, "Unknown node {id}"),
            GraphError::UnknownParam { node, param } => {
                write!(f, "Node {node} has no {param:?} parameter")
            }
            GraphError::Cycle { from, to } => {
                write!(f, "Connecting {from} -> {to} would create a cycle")
            }
            GraphError::InvalidState { node, reason } => write!(f, "Node {node}: {reason}"),
        }
    }
}

impl std::error::Error for GraphError {}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::Json(e) => write!(f, "Invalid preset JSON: {e}"),
            PresetError::NotFound(name) => write!(f, "No preset named '{name}'"),
            PresetError::ReadOnly(name) => write!(f, "Preset '{name}' is built-in and cannot be changed"),
        }
    }
}

impl std::error::Error for PresetError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSampleRate(sr) => write!(f, "Invalid sample rate {sr}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value {value} for '{field}'")
            }
            ConfigError::Json(e) => write!(f, "Invalid config JSON: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<GraphError> for SynthError {
    fn from(e: GraphError) -> Self {
        SynthError::Graph(e)
    }
}

impl From<PresetError> for SynthError {
    fn from(e: PresetError) -> Self {
        SynthError::Preset(e)
    }
}

impl From<ConfigError> for SynthError {
    fn from(e: ConfigError) -> Self {
        SynthError::Config(e)
    }
}

impl From<serde_json::Error> for PresetError {
    fn from(e: serde_json::Error) -> Self {
        PresetError::Json(e)
    }
}
