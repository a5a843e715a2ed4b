//! A small render-quantum audio graph.
//!
//! Nodes live in a generational arena and are wired with directed
//! connections to either a node's audio input or one of its automation
//! parameters. Connections never form cycles (feedback lives inside the
//! delay node), so every quantum is rendered in a single topological pass:
//!
//! 1. Sum the outputs feeding each node's input.
//! 2. Evaluate each parameter's timeline a-rate, add the mono sum of any
//!    modulation sources connected to it, clamp to the nominal range.
//! 3. Process the node into its output buffer.
//!
//! The graph keeps its own frame counter; `current_time()` is the audio
//! clock every automation event is anchored to.

pub mod node;
pub mod param;
pub mod patch;

use crate::error::GraphError;
use node::{Node, NodeSpec, RenderContext};
use param::AudioParam;
use std::collections::VecDeque;
use std::fmt;

/// Frames rendered per graph pass.
pub const RENDER_QUANTUM: usize = 128;

/// Handle to a node. Stale handles (of removed nodes) are detected by
/// generation and never alias a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Automation parameters a node may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Frequency,
    Detune,
    Gain,
    Q,
    DelayTime,
    Feedback,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Frequency => "frequency",
            ParamKind::Detune => "detune",
            ParamKind::Gain => "gain",
            ParamKind::Q => "Q",
            ParamKind::DelayTime => "delayTime",
            ParamKind::Feedback => "feedback",
        }
    }
}

/// Connection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// The node's audio input; all connections are summed.
    Input(NodeId),
    /// Additive modulation of a parameter (mono sum of the sources).
    Param(NodeId, ParamKind),
}

impl Port {
    pub fn node(&self) -> NodeId {
        match *self {
            Port::Input(id) | Port::Param(id, _) => id,
        }
    }
}

/// One quantum of stereo audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub channels: [[f32; RENDER_QUANTUM]; 2],
}

impl Block {
    pub fn silent() -> Self {
        Block {
            channels: [[0.0; RENDER_QUANTUM]; 2],
        }
    }

    pub fn add(&mut self, other: &Block) {
        for (dst, src) in self.channels.iter_mut().zip(&other.channels) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
    }

    #[inline]
    pub fn mono(&self, i: usize) -> f32 {
        0.5 * (self.channels[0][i] + self.channels[1][i])
    }

    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |m, s| m.max(s.abs()))
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Precomputed per-node work for a topology.
struct Step {
    index: usize,
    inputs: Vec<usize>,
    /// (parameter slot, modulation source indices)
    modulators: Vec<(usize, Vec<usize>)>,
}

pub struct Graph {
    sample_rate: f64,
    frame: u64,
    slots: Vec<Slot>,
    free: Vec<u32>,
    connections: Vec<(NodeId, Port)>,
    destination: NodeId,
    plan: Vec<Step>,
    dirty: bool,
    outputs: Vec<Block>,
    input_scratch: Block,
    value_scratch: Vec<[f64; RENDER_QUANTUM]>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("sample_rate", &self.sample_rate)
            .field("frame", &self.frame)
            .field("nodes", &self.node_count())
            .field("connections", &self.connections.len())
            .finish()
    }
}

impl Graph {
    pub fn new(sample_rate: f64) -> Self {
        let mut graph = Graph {
            sample_rate,
            frame: 0,
            slots: Vec::new(),
            free: Vec::new(),
            connections: Vec::new(),
            destination: NodeId {
                index: 0,
                generation: 0,
            },
            plan: Vec::new(),
            dirty: true,
            outputs: Vec::new(),
            input_scratch: Block::silent(),
            value_scratch: Vec::new(),
        };
        graph.destination = graph.insert(Node::destination());
        graph
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The single output node. Whatever reaches its input is rendered.
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Audio clock in seconds.
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn connections(&self) -> &[(NodeId, Port)] {
        &self.connections
    }

    pub fn add(&mut self, spec: NodeSpec) -> NodeId {
        self.insert(Node::from_spec(spec, self.sample_rate))
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.dirty = true;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            self.outputs.push(Block::silent());
            NodeId { index, generation: 0 }
        }
    }

    /// Remove a node and every connection touching it.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        if id == self.destination {
            return Err(GraphError::InvalidState {
                node: id,
                reason: "the destination cannot be removed",
            });
        }
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.node.is_some())
            .ok_or(GraphError::UnknownNode(id))?;
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.connections.retain(|(from, to)| *from != id && to.node() != id);
        self.dirty = true;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.slot(id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or(GraphError::UnknownNode(id))
    }

    fn slot(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn param_mut(&mut self, id: NodeId, kind: ParamKind) -> Result<&mut AudioParam, GraphError> {
        self.node_mut(id)?
            .param_mut(kind)
            .ok_or(GraphError::UnknownParam { node: id, param: kind })
    }

    /// Connect `from`'s output to `to`. Connecting the same pair twice is a
    /// no-op; a connection that would close a loop is rejected.
    pub fn connect(&mut self, from: NodeId, to: Port) -> Result<(), GraphError> {
        self.node(from)?;
        let target = self.node(to.node())?;
        if let Port::Param(node, param) = to {
            if target.param(param).is_none() {
                return Err(GraphError::UnknownParam { node, param });
            }
        }
        if from == self.destination {
            return Err(GraphError::InvalidState {
                node: from,
                reason: "the destination has no output",
            });
        }
        if self.connections.contains(&(from, to)) {
            return Ok(());
        }
        if self.reaches(to.node(), from) {
            return Err(GraphError::Cycle { from, to: to.node() });
        }
        self.connections.push((from, to));
        self.dirty = true;
        Ok(())
    }

    /// Drop every outgoing connection of `from`.
    pub fn disconnect(&mut self, from: NodeId) -> Result<(), GraphError> {
        self.node(from)?;
        self.connections.retain(|(f, _)| *f != from);
        self.dirty = true;
        Ok(())
    }

    /// Drop a single connection. Returns whether it existed.
    pub fn disconnect_port(&mut self, from: NodeId, to: Port) -> Result<bool, GraphError> {
        self.node(from)?;
        let before = self.connections.len();
        self.connections.retain(|c| *c != (from, to));
        let removed = self.connections.len() != before;
        self.dirty |= removed;
        Ok(removed)
    }

    /// Whether a path of connections leads from `start` to `goal`.
    fn reaches(&self, start: NodeId, goal: NodeId) -> bool {
        let mut stack = vec![start];
        let mut seen = Vec::new();
        while let Some(n) = stack.pop() {
            if n == goal {
                return true;
            }
            if seen.contains(&n) {
                continue;
            }
            seen.push(n);
            stack.extend(
                self.connections
                    .iter()
                    .filter(|(f, _)| *f == n)
                    .map(|(_, to)| to.node()),
            );
        }
        false
    }

    /// Schedule a source node to start playing at `when` (seconds).
    pub fn start(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        let schedule = self
            .node_mut(id)?
            .schedule_mut()
            .ok_or(GraphError::InvalidState {
                node: id,
                reason: "not a source",
            })?;
        if schedule.start.is_some() {
            return Err(GraphError::InvalidState {
                node: id,
                reason: "already started",
            });
        }
        schedule.start = Some(when);
        Ok(())
    }

    /// Schedule a source node to stop at `when`. Stopping a source that has
    /// already stopped (or never started) is an `InvalidState` error.
    pub fn stop(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        let now = self.current_time();
        let schedule = self
            .node_mut(id)?
            .schedule_mut()
            .ok_or(GraphError::InvalidState {
                node: id,
                reason: "not a source",
            })?;
        if schedule.start.is_none() {
            return Err(GraphError::InvalidState {
                node: id,
                reason: "not started",
            });
        }
        if schedule.stop.is_some_and(|stop| stop <= now) {
            return Err(GraphError::InvalidState {
                node: id,
                reason: "already stopped",
            });
        }
        schedule.stop = Some(when.max(now));
        Ok(())
    }

    /// Kahn's algorithm over the live nodes and connections.
    fn rebuild_plan(&mut self) {
        let n = self.slots.len();
        let mut indegree = vec![0usize; n];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (from, to) in &self.connections {
            let (f, t) = (from.index as usize, to.node().index as usize);
            outgoing[f].push(t);
            indegree[t] += 1;
        }

        let mut queue: VecDeque<usize> = (0..n)
            .filter(|&i| self.slots[i].node.is_some() && indegree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &t in &outgoing[i] {
                indegree[t] -= 1;
                if indegree[t] == 0 {
                    queue.push_back(t);
                }
            }
        }

        let mut max_params = 0;
        self.plan = order
            .into_iter()
            .filter_map(|index| {
                let node = self.slots[index].node.as_ref()?;
                max_params = max_params.max(node.params().len());
                let inputs = self
                    .connections
                    .iter()
                    .filter(|(_, to)| *to == Port::Input(self.id_at(index)))
                    .map(|(from, _)| from.index as usize)
                    .collect();
                let modulators = node
                    .params()
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, (kind, _))| {
                        let port = Port::Param(self.id_at(index), *kind);
                        let sources: Vec<usize> = self
                            .connections
                            .iter()
                            .filter(|(_, to)| *to == port)
                            .map(|(from, _)| from.index as usize)
                            .collect();
                        (!sources.is_empty()).then_some((slot, sources))
                    })
                    .collect();
                Some(Step {
                    index,
                    inputs,
                    modulators,
                })
            })
            .collect();
        self.value_scratch = vec![[0.0; RENDER_QUANTUM]; max_params];
        self.dirty = false;
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            index: index as u32,
            generation: self.slots[index].generation,
        }
    }

    /// Render one quantum and advance the clock. Returns the destination's
    /// output.
    pub fn render_quantum(&mut self) -> &Block {
        if self.dirty {
            self.rebuild_plan();
        }
        let ctx = RenderContext {
            frame: self.frame,
            sample_rate: self.sample_rate,
        };
        let start = self.current_time();

        for step in &self.plan {
            let input = &mut self.input_scratch;
            *input = Block::silent();
            for &src in &step.inputs {
                input.add(&self.outputs[src]);
            }

            let Some(node) = self.slots[step.index].node.as_mut() else {
                continue;
            };
            for (slot, (_, param)) in node.params().iter().enumerate() {
                param.fill(start, self.sample_rate, &mut self.value_scratch[slot]);
            }
            for (slot, sources) in &step.modulators {
                let values = &mut self.value_scratch[*slot];
                for &src in sources {
                    let modulation = &self.outputs[src];
                    for (i, v) in values.iter_mut().enumerate() {
                        *v += modulation.mono(i) as f64;
                    }
                }
            }
            for (slot, (_, param)) in node.params().iter().enumerate() {
                for v in self.value_scratch[slot].iter_mut() {
                    *v = param.clamp(*v);
                }
            }

            let params = node.params().len();
            node.process(
                ctx,
                &self.input_scratch,
                &self.value_scratch[..params],
                &mut self.outputs[step.index],
            );
        }

        self.frame += RENDER_QUANTUM as u64;
        let now = self.current_time();
        for slot in &mut self.slots {
            if let Some(node) = slot.node.as_mut() {
                for param in node.params_mut() {
                    param.prune_before(now);
                }
            }
        }

        &self.outputs[self.destination.index as usize]
    }
}
