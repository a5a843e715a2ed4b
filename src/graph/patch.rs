//! Declarative sub-graph builder.
//!
//! A [`Patch`] is a list of labelled node specs plus the edges between them.
//! The topology can be inspected (and tested) as plain data before any node
//! exists; [`Patch::instantiate`] then creates every node first and wires
//! the edges second.

use super::node::NodeSpec;
use super::{Graph, NodeId, ParamKind, Port};
use crate::error::GraphError;
use tracing::trace;

/// Index of a node within a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchNode(usize);

/// Edge target inside or outside the patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    Input(PatchNode),
    Param(PatchNode, ParamKind),
    /// A port on a node that already exists in the graph.
    External(Port),
}

#[derive(Debug, Clone, Default)]
pub struct Patch {
    nodes: Vec<(&'static str, NodeSpec)>,
    edges: Vec<(PatchNode, Endpoint)>,
}

/// Node ids of an instantiated patch.
#[derive(Debug, Clone)]
pub struct PatchInstance {
    ids: Vec<NodeId>,
}

impl PatchInstance {
    pub fn id(&self, node: PatchNode) -> NodeId {
        self.ids[node.0]
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &'static str, spec: NodeSpec) -> PatchNode {
        self.nodes.push((label, spec));
        PatchNode(self.nodes.len() - 1)
    }

    pub fn connect(&mut self, from: PatchNode, to: Endpoint) {
        self.edges.push((from, to));
    }

    /// Chain `nodes` input to output.
    pub fn chain(&mut self, nodes: &[PatchNode]) {
        for pair in nodes.windows(2) {
            self.connect(pair[0], Endpoint::Input(pair[1]));
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn label(&self, node: PatchNode) -> &'static str {
        self.nodes[node.0].0
    }

    pub fn spec(&self, node: PatchNode) -> &NodeSpec {
        &self.nodes[node.0].1
    }

    /// Edges as `("from", "to")` labels. Parameter targets read
    /// `"node.param"`; ports outside the patch read `"external"` or
    /// `"external.param"`.
    pub fn edge_labels(&self) -> Vec<(&'static str, String)> {
        self.edges
            .iter()
            .map(|(from, to)| {
                let target = match *to {
                    Endpoint::Input(n) => self.label(n).to_string(),
                    Endpoint::Param(n, kind) => format!("{}.{}", self.label(n), kind.name()),
                    Endpoint::External(Port::Input(_)) => "external".to_string(),
                    Endpoint::External(Port::Param(_, kind)) => format!("external.{}", kind.name()),
                };
                (self.label(*from), target)
            })
            .collect()
    }

    /// Create the nodes, then the connections. On failure every node this
    /// call created is removed again.
    pub fn instantiate(&self, graph: &mut Graph) -> Result<PatchInstance, GraphError> {
        let ids: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|(_, spec)| graph.add(spec.clone()))
            .collect();

        for (from, to) in &self.edges {
            let port = match *to {
                Endpoint::Input(n) => Port::Input(ids[n.0]),
                Endpoint::Param(n, kind) => Port::Param(ids[n.0], kind),
                Endpoint::External(port) => port,
            };
            if let Err(e) = graph.connect(ids[from.0], port) {
                for id in &ids {
                    if let Err(cleanup) = graph.remove(*id) {
                        trace!("patch rollback: {cleanup}");
                    }
                }
                return Err(e);
            }
        }

        Ok(PatchInstance { ids })
    }
}
