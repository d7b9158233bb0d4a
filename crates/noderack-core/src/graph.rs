//! Node arena and graph-building API.
//!
//! [`AudioGraph`] owns every node. Edges are stored as [`NodeId`] handles in
//! each node's input list, so a node referenced by several parents (fan-in,
//! diamonds) still has exactly one owner and one slot.
//!
//! Cycles are rejected when an edge is added. [`AudioGraph::validate`] repeats
//! the check with a depth-first walk before a [`Processor`](crate::Processor)
//! takes ownership.

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec, vec::Vec};

use crate::node::{AudioNode, NodeId};
use crate::nodes::{FunctionNode, SineNode, SummingNode};
use crate::properties::NodeProperties;

/// Errors that can occur while building or validating a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    NodeNotFound(NodeId),
    /// The edge would make a node depend on itself.
    CycleDetected,
    /// The edge from the first node to the second already exists.
    DuplicateEdge(NodeId, NodeId),
    /// The node already has as many inputs as its variant accepts.
    TooManyInputs(NodeId),
    /// The node has fewer inputs than its variant requires.
    MissingInputs(NodeId),
}

#[cfg(feature = "std")]
impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::CycleDetected => write!(f, "graph contains a cycle"),
            Self::DuplicateEdge(a, b) => write!(f, "edge from {a} to {b} already exists"),
            Self::TooManyInputs(id) => write!(f, "node {id} accepts no more inputs"),
            Self::MissingInputs(id) => write!(f, "node {id} is missing required inputs"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GraphError {}

/// A boxed node as stored in the arena.
pub type BoxedNode = Box<dyn AudioNode + Send>;

struct NodeEntry {
    node: BoxedNode,
    inputs: Vec<NodeId>,
}

/// Arena of processing nodes wired into a directed acyclic graph.
///
/// # Usage
///
/// 1. Add nodes: [`add_node()`](Self::add_node), or the shortcuts
///    [`add_sine()`](Self::add_sine), [`add_sum()`](Self::add_sum),
///    [`add_function()`](Self::add_function)
/// 2. Wire inputs: [`connect()`](Self::connect)
/// 3. Hand the graph and its root to [`Processor::new()`](crate::Processor::new)
///
/// ```rust
/// use noderack_core::AudioGraph;
///
/// let mut graph = AudioGraph::new();
/// let low = graph.add_sine(220.0);
/// let high = graph.add_sine(440.0);
/// let sum = graph.add_sum(&[low, high])?;
/// let out = graph.add_function(sum, |s| s * 0.5)?;
///
/// assert_eq!(graph.all_input_nodes(out)?, vec![sum, low, high]);
/// # Ok::<(), noderack_core::GraphError>(())
/// ```
#[derive(Default)]
pub struct AudioGraph {
    nodes: Vec<NodeEntry>,
}

impl AudioGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    // --- Node mutations ---

    /// Adds a node with no inputs. Returns its handle.
    pub fn add_node(&mut self, node: impl AudioNode + Send + 'static) -> NodeId {
        self.add_boxed(Box::new(node))
    }

    /// Adds an already boxed node. Returns its handle.
    pub fn add_boxed(&mut self, node: BoxedNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", node.name());
        self.nodes.push(NodeEntry {
            node,
            inputs: Vec::new(),
        });
        id
    }

    /// Adds a [`SineNode`] at `frequency` Hz.
    pub fn add_sine(&mut self, frequency: f32) -> NodeId {
        self.add_node(SineNode::new(frequency))
    }

    /// Adds a [`SummingNode`] fed by `inputs`, in order.
    ///
    /// On error the graph is left as it was.
    pub fn add_sum(&mut self, inputs: &[NodeId]) -> Result<NodeId, GraphError> {
        self.add_wired(Box::new(SummingNode::new()), inputs)
    }

    /// Adds a [`FunctionNode`] applying `function` to `input`.
    ///
    /// On error the graph is left as it was.
    pub fn add_function<F>(&mut self, input: NodeId, function: F) -> Result<NodeId, GraphError>
    where
        F: Fn(f32) -> f32 + Send + 'static,
    {
        self.add_wired(Box::new(FunctionNode::new(function)), &[input])
    }

    /// Adds `node` and connects `inputs` to it, removing it again if any
    /// edge is rejected. Only the new node's input list is touched, so
    /// popping it restores the arena exactly.
    fn add_wired(&mut self, node: BoxedNode, inputs: &[NodeId]) -> Result<NodeId, GraphError> {
        for &input in inputs {
            self.entry(input)?;
        }
        let id = self.add_boxed(node);
        for &input in inputs {
            if let Err(e) = self.connect(input, id) {
                self.nodes.pop();
                return Err(e);
            }
        }
        Ok(id)
    }

    /// Appends `from` to the input list of `to`.
    ///
    /// Returns an error if:
    /// - Either node doesn't exist
    /// - `to` already has as many inputs as it accepts
    /// - The edge already exists
    /// - The edge would create a cycle
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.entry(from)?;
        let sink = self.entry(to)?;

        if !sink.node.arity().accepts(sink.inputs.len() + 1) {
            return Err(GraphError::TooManyInputs(to));
        }
        if sink.inputs.contains(&from) {
            return Err(GraphError::DuplicateEdge(from, to));
        }
        // A cycle exists if `to` already feeds `from`.
        if from == to || self.depends_on(from, to) {
            return Err(GraphError::CycleDetected);
        }

        self.nodes[to.slot()].inputs.push(from);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(())
    }

    // --- Queries ---

    /// Returns the number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if `id` refers to a node in this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.slot() < self.nodes.len()
    }

    /// Returns the node behind `id`.
    pub fn node(&self, id: NodeId) -> Option<&(dyn AudioNode + Send)> {
        self.nodes.get(id.slot()).map(|e| e.node.as_ref())
    }

    /// Returns the direct inputs of `id`, in order.
    pub fn inputs(&self, id: NodeId) -> Result<&[NodeId], GraphError> {
        Ok(&self.entry(id)?.inputs)
    }

    /// Returns every node feeding `id`: each direct input followed,
    /// depth-first, by that input's own inputs.
    ///
    /// A node reachable along several paths appears once per path.
    pub fn all_input_nodes(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.entry(id)?;
        let mut out = Vec::new();
        self.collect_inputs(id, &mut out);
        Ok(out)
    }

    /// Returns the output properties of `id`, aggregated through its inputs.
    pub fn properties(&self, id: NodeId) -> Result<NodeProperties, GraphError> {
        self.entry(id)?;
        let mut cache = vec![None; self.nodes.len()];
        Ok(self.resolve_properties(id, &mut cache))
    }

    /// Returns `root` and everything feeding it, each distinct node once.
    ///
    /// Inputs come first in depth-first order; `root` is last.
    ///
    /// Same order as [`all_input_nodes()`](Self::all_input_nodes) with repeats
    /// dropped, but a node seen before is not expanded again, so shared
    /// subgraphs cost one walk.
    pub fn flatten(&self, root: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.entry(root)?;
        let mut seen = vec![false; self.nodes.len()];
        let mut out = Vec::new();
        self.collect_unique_inputs(root, &mut seen, &mut out);
        if !core::mem::replace(&mut seen[root.slot()], true) {
            out.push(root);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_flatten: {} nodes under {root}", out.len());
        Ok(out)
    }

    /// Checks the subgraph feeding `root`: no cycles, and every node has at
    /// least as many inputs as its variant requires.
    pub fn validate(&self, root: NodeId) -> Result<(), GraphError> {
        self.entry(root)?;
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        self.visit(root, &mut marks)
    }

    // --- Internals ---

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, GraphError> {
        self.nodes.get(id.slot()).ok_or(GraphError::NodeNotFound(id))
    }

    /// Resolves properties bottom-up, visiting each node once.
    pub(crate) fn resolve_properties(
        &self,
        id: NodeId,
        cache: &mut [Option<NodeProperties>],
    ) -> NodeProperties {
        if let Some(props) = cache[id.slot()] {
            return props;
        }
        let entry = &self.nodes[id.slot()];
        let input_properties: Vec<NodeProperties> = entry
            .inputs
            .iter()
            .map(|&input| self.resolve_properties(input, cache))
            .collect();
        let props = entry.node.properties(&input_properties);
        cache[id.slot()] = Some(props);
        props
    }

    fn collect_unique_inputs(&self, id: NodeId, seen: &mut [bool], out: &mut Vec<NodeId>) {
        for &input in &self.nodes[id.slot()].inputs {
            if core::mem::replace(&mut seen[input.slot()], true) {
                continue;
            }
            out.push(input);
            self.collect_unique_inputs(input, seen, out);
        }
    }

    fn collect_inputs(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &input in &self.nodes[id.slot()].inputs {
            out.push(input);
            self.collect_inputs(input, out);
        }
    }

    /// Returns true if `target` is `start` or feeds it, directly or not.
    fn depends_on(&self, start: NodeId, target: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if core::mem::replace(&mut visited[id.slot()], true) {
                continue;
            }
            stack.extend_from_slice(&self.nodes[id.slot()].inputs);
        }
        false
    }

    fn visit(&self, id: NodeId, marks: &mut [Mark]) -> Result<(), GraphError> {
        match marks[id.slot()] {
            Mark::Done => return Ok(()),
            Mark::Visiting => return Err(GraphError::CycleDetected),
            Mark::Unvisited => {}
        }
        marks[id.slot()] = Mark::Visiting;

        let entry = &self.nodes[id.slot()];
        if entry.inputs.len() < entry.node.arity().min {
            return Err(GraphError::MissingInputs(id));
        }
        for &input in &entry.inputs {
            self.visit(input, marks)?;
        }

        marks[id.slot()] = Mark::Done;
        Ok(())
    }

    pub(crate) fn node_and_inputs_mut(&mut self, id: NodeId) -> (&mut BoxedNode, &[NodeId]) {
        let entry = &mut self.nodes[id.slot()];
        (&mut entry.node, &entry.inputs)
    }
}

impl core::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        for (i, entry) in self.nodes.iter().enumerate() {
            list.entry(&(i, entry.node.name(), &entry.inputs));
        }
        list.finish()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (AudioGraph, [NodeId; 4]) {
        let mut graph = AudioGraph::new();
        let source = graph.add_sine(220.0);
        let left = graph.add_function(source, |s| s * 0.5).unwrap();
        let right = graph.add_function(source, |s| -s).unwrap();
        let sum = graph.add_sum(&[left, right]).unwrap();
        (graph, [source, left, right, sum])
    }

    #[test]
    fn ids_are_sequential() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(100.0);
        let b = graph.add_sine(200.0);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node(a).map(|n| n.name()), Some("sine"));
    }

    #[test]
    fn all_input_nodes_is_depth_first_with_repeats() {
        let (graph, [source, left, right, sum]) = diamond();
        assert_eq!(
            graph.all_input_nodes(sum).unwrap(),
            vec![left, source, right, source]
        );
        assert!(graph.all_input_nodes(source).unwrap().is_empty());
    }

    #[test]
    fn flatten_dedups_by_identity() {
        let (graph, [source, left, right, sum]) = diamond();
        assert_eq!(graph.flatten(sum).unwrap(), vec![left, source, right, sum]);
    }

    #[test]
    fn flatten_skips_unreachable_nodes() {
        let (mut graph, [source, left, ..]) = diamond();
        let stray = graph.add_sine(1.0);
        let flat = graph.flatten(left).unwrap();
        assert_eq!(flat, vec![source, left]);
        assert!(!flat.contains(&stray));
    }

    #[test]
    fn two_sines_of_equal_value_stay_distinct() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(220.0);
        let b = graph.add_sine(220.0);
        let sum = graph.add_sum(&[a, b]).unwrap();
        assert_eq!(graph.flatten(sum).unwrap().len(), 3);
    }

    #[test]
    fn properties_propagate() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(220.0);
        let sum = graph.add_sum(&[a]).unwrap();
        let empty = graph.add_sum(&[]).unwrap();
        assert_eq!(graph.properties(sum).unwrap(), NodeProperties::audio(1));
        assert_eq!(graph.properties(empty).unwrap(), NodeProperties::default());
    }

    #[test]
    fn connect_rejects_cycles() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sum(&[]).unwrap();
        let b = graph.add_sum(&[a]).unwrap();
        assert_eq!(graph.connect(b, a), Err(GraphError::CycleDetected));
        assert_eq!(graph.connect(a, a), Err(GraphError::CycleDetected));
        assert!(graph.inputs(a).unwrap().is_empty());
    }

    #[test]
    fn connect_rejects_longer_cycles() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sum(&[]).unwrap();
        let b = graph.add_sum(&[a]).unwrap();
        let c = graph.add_sum(&[b]).unwrap();
        assert_eq!(graph.connect(c, a), Err(GraphError::CycleDetected));
    }

    #[test]
    fn connect_rejects_duplicates_and_overflow() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(220.0);
        let b = graph.add_sine(440.0);
        let sum = graph.add_sum(&[a]).unwrap();
        assert_eq!(graph.connect(a, sum), Err(GraphError::DuplicateEdge(a, sum)));

        let f = graph.add_function(a, |s| s).unwrap();
        assert_eq!(graph.connect(b, f), Err(GraphError::TooManyInputs(f)));
        assert_eq!(graph.connect(a, b), Err(GraphError::TooManyInputs(b)));
    }

    #[test]
    fn failed_add_sum_leaves_graph_unchanged() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(220.0);
        let b = graph.add_sine(440.0);

        assert_eq!(
            graph.add_sum(&[a, b, a]),
            Err(GraphError::DuplicateEdge(a, NodeId(2)))
        );
        assert_eq!(graph.node_count(), 2);
        assert!(graph.inputs(a).unwrap().is_empty());

        let sum = graph.add_sum(&[a, b]).unwrap();
        assert_eq!(sum.index(), 2);
        assert_eq!(graph.inputs(sum).unwrap(), &[a, b]);
    }

    #[test]
    fn shared_upstream_is_not_a_cycle() {
        let (mut graph, [source, _, right, sum]) = diamond();
        let tail = graph.add_sum(&[sum]).unwrap();
        assert_eq!(graph.connect(source, tail), Ok(()));

        // `extra` feeds `sum`, which feeds `tail`: `tail` may not feed `extra`.
        let extra = graph.add_sum(&[right]).unwrap();
        assert_eq!(graph.connect(extra, sum), Ok(()));
        assert_eq!(graph.connect(tail, extra), Err(GraphError::CycleDetected));
        assert!(graph.validate(tail).is_ok());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(220.0);
        let ghost = NodeId(42);
        assert_eq!(graph.connect(ghost, a), Err(GraphError::NodeNotFound(ghost)));
        assert_eq!(graph.add_sum(&[ghost]), Err(GraphError::NodeNotFound(ghost)));
        assert_eq!(graph.node_count(), 1);
        assert!(graph.flatten(ghost).is_err());
    }

    #[test]
    fn validate_reports_missing_inputs() {
        let mut graph = AudioGraph::new();
        let f = graph.add_node(FunctionNode::new(|s: f32| s));
        assert_eq!(graph.validate(f), Err(GraphError::MissingInputs(f)));
    }

    #[test]
    fn validate_catches_cycles_built_behind_connect() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sum(&[]).unwrap();
        let b = graph.add_sum(&[a]).unwrap();
        graph.nodes[a.slot()].inputs.push(b);
        assert_eq!(graph.validate(b), Err(GraphError::CycleDetected));
    }

    #[test]
    fn validate_accepts_diamond() {
        let (graph, [.., sum]) = diamond();
        assert_eq!(graph.validate(sum), Ok(()));
    }
}
