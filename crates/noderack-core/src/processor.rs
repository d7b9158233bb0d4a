//! Readiness-driven block scheduler.
//!
//! [`Processor`] owns an [`AudioGraph`] and the root whose output the host
//! wants. It works on the *flattened* graph: every node reachable from the
//! root, each listed once no matter how many parents share it.
//!
//! # Scheduling
//!
//! There is no precomputed order. Each block:
//!
//! 1. Every scheduled node's processed flag is cleared.
//! 2. The flattened list is scanned; every node that hasn't processed yet and
//!    reports [`is_ready_to_process()`](crate::AudioNode::is_ready_to_process)
//!    is processed. That scan is one *pass*.
//! 3. Passes repeat until one processes nothing.
//! 4. The root's audio is copied into the host buffer.
//!
//! Every productive pass processes at least one node, so an acyclic graph of
//! N nodes finishes in at most N passes. If the loop ends with the root
//! unprocessed, some node never became ready and the block fails with
//! [`ProcessError::Stalled`] instead of spinning.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::buffer::{AudioBuffer, EventBuffer};
use crate::graph::{AudioGraph, GraphError};
use crate::node::{NodeId, NodeInputs, NodeState, process_node};
use crate::spec::{ProcessSpec, SpecError};

/// Errors reported while preparing or running a [`Processor`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessError {
    /// The sample rate or block size was rejected.
    InvalidSpec(SpecError),
    /// The graph changed shape in a way the processor cannot schedule.
    Graph(GraphError),
    /// [`Processor::process`] was called before [`Processor::prepare_to_play`].
    NotPrepared,
    /// The scheduling loop stopped making progress before the root processed.
    Stalled {
        /// Nodes processed before the loop stopped.
        processed: usize,
        /// Nodes scheduled for the block.
        scheduled: usize,
    },
}

#[cfg(feature = "std")]
impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSpec(e) => write!(f, "invalid process spec: {e}"),
            Self::Graph(e) => write!(f, "graph error: {e}"),
            Self::NotPrepared => write!(f, "process called before prepare_to_play"),
            Self::Stalled {
                processed,
                scheduled,
            } => write!(
                f,
                "scheduling stalled after {processed} of {scheduled} nodes; \
                 the graph has a node that can never become ready"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSpec(e) => Some(e),
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpecError> for ProcessError {
    fn from(e: SpecError) -> Self {
        Self::InvalidSpec(e)
    }
}

impl From<GraphError> for ProcessError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}

/// Bookkeeping from the most recent block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockStats {
    /// Passes over the flattened list that processed at least one node.
    pub passes: usize,
    /// Fill routines run during the block.
    pub nodes_processed: usize,
}

/// Drives a graph one block at a time.
///
/// # Usage
///
/// 1. Build an [`AudioGraph`] and pick a root
/// 2. [`Processor::new()`](Self::new) validates and flattens it
/// 3. [`prepare_to_play()`](Self::prepare_to_play) once
/// 4. [`process()`](Self::process) per block
///
/// ```rust
/// use noderack_core::{AudioBuffer, AudioGraph, EventBuffer, Processor};
///
/// let mut graph = AudioGraph::new();
/// let a = graph.add_sine(220.0);
/// let b = graph.add_sine(220.0);
/// let inverted = graph.add_function(b, |s| -s)?;
/// let root = graph.add_sum(&[a, inverted])?;
///
/// let mut processor = Processor::new(graph, root)?;
/// processor.prepare_to_play(44100.0, 512)?;
///
/// let mut audio = AudioBuffer::new(1, 512);
/// let mut events = EventBuffer::new();
/// processor.process(&mut audio, &mut events)?;
/// assert!(audio.channel(0).iter().all(|s| s.abs() < 1e-6));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Processor {
    graph: AudioGraph,
    root: NodeId,
    scheduled: Vec<NodeId>,
    states: Vec<NodeState>,
    spec: Option<ProcessSpec>,
    last_stats: BlockStats,
}

impl Processor {
    /// Takes ownership of `graph` and schedules everything feeding `root`.
    ///
    /// Fails if `root` doesn't exist, the subgraph has a cycle, or a node is
    /// missing required inputs.
    pub fn new(graph: AudioGraph, root: NodeId) -> Result<Self, GraphError> {
        graph.validate(root)?;
        let scheduled = graph.flatten(root)?;
        let states = (0..graph.node_count()).map(|_| NodeState::new()).collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "processor_new: {} of {} nodes scheduled, root {root}",
            scheduled.len(),
            graph.node_count()
        );

        Ok(Self {
            graph,
            root,
            scheduled,
            states,
            spec: None,
            last_stats: BlockStats::default(),
        })
    }

    /// Allocates every scheduled node's buffers and runs its
    /// [`prepare_to_play()`](crate::AudioNode::prepare_to_play).
    ///
    /// Call once before playback. Buffer shapes are fixed from here on.
    pub fn prepare_to_play(&mut self, sample_rate: f64, block_size: usize) -> Result<(), ProcessError> {
        let spec = ProcessSpec::new(sample_rate, block_size);
        spec.validate()?;

        let mut cache = vec![None; self.graph.node_count()];
        for &id in &self.scheduled {
            let props = self.graph.resolve_properties(id, &mut cache);
            self.states[id.slot()].initialise(props.num_channels, block_size);

            let (node, _) = self.graph.node_and_inputs_mut(id);
            node.prepare_to_play(sample_rate, block_size);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                "processor_prepare: {} node {id}, {} ch, audio={}, events={}",
                node.name(),
                props.num_channels,
                props.has_audio,
                props.has_events
            );
        }

        self.spec = Some(spec);
        Ok(())
    }

    /// Processes one block and copies the root's audio into `dest_audio`.
    ///
    /// Only the overlapping channels and samples are written; `dest_audio` is
    /// never resized. Event output is not forwarded yet, so `dest_events` is
    /// left untouched.
    pub fn process(
        &mut self,
        dest_audio: &mut AudioBuffer,
        _dest_events: &mut EventBuffer,
    ) -> Result<(), ProcessError> {
        if self.spec.is_none() {
            return Err(ProcessError::NotPrepared);
        }

        for &id in &self.scheduled {
            self.states[id.slot()].prepare_for_next_block();
        }

        let stats = self.run_passes();
        self.last_stats = stats;

        let root = &self.states[self.root.slot()];
        if !root.has_processed() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "processor_stalled: {} of {} nodes processed after {} passes",
                stats.nodes_processed,
                self.scheduled.len(),
                stats.passes
            );
            return Err(ProcessError::Stalled {
                processed: stats.nodes_processed,
                scheduled: self.scheduled.len(),
            });
        }

        dest_audio.copy_from(root.processed_audio_output());
        Ok(())
    }

    fn run_passes(&mut self) -> BlockStats {
        let mut stats = BlockStats::default();
        let max_passes = self.scheduled.len();

        while stats.passes < max_passes {
            let mut processed_any = false;

            for &id in &self.scheduled {
                let slot = id.slot();
                if self.states[slot].has_processed() {
                    continue;
                }
                let (node, inputs) = self.graph.node_and_inputs_mut(id);
                if !node.is_ready_to_process(&NodeInputs::new(inputs, &self.states)) {
                    continue;
                }
                process_node(&mut **node, inputs, &mut self.states, slot);
                stats.nodes_processed += 1;
                processed_any = true;
            }

            if !processed_any {
                break;
            }
            stats.passes += 1;
        }

        stats
    }

    /// Returns the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the graph being processed.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Returns the flattened, deduplicated list of scheduled nodes.
    pub fn scheduled_nodes(&self) -> &[NodeId] {
        &self.scheduled
    }

    /// Returns the number of scheduled nodes.
    pub fn node_count(&self) -> usize {
        self.scheduled.len()
    }

    /// Returns the spec passed to [`prepare_to_play()`](Self::prepare_to_play), if any.
    pub fn spec(&self) -> Option<ProcessSpec> {
        self.spec
    }

    /// Returns true once [`prepare_to_play()`](Self::prepare_to_play) succeeded.
    pub fn is_prepared(&self) -> bool {
        self.spec.is_some()
    }

    /// Returns the processing state of a node, e.g. to inspect an
    /// intermediate output after a block.
    pub fn node_state(&self, id: NodeId) -> Option<&NodeState> {
        self.states.get(id.slot())
    }

    /// Returns bookkeeping from the most recent [`process()`](Self::process) call.
    pub fn last_block_stats(&self) -> BlockStats {
        self.last_stats
    }
}

impl core::fmt::Debug for Processor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Processor")
            .field("root", &self.root)
            .field("scheduled", &self.scheduled)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Event;
    use crate::node::{Arity, AudioNode};
    use crate::properties::NodeProperties;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SR: f64 = 44100.0;
    const BLOCK: usize = 64;

    /// Writes a constant on every channel and counts fill calls.
    struct Constant {
        value: f32,
        channels: usize,
        calls: Arc<AtomicUsize>,
    }

    impl Constant {
        fn new(value: f32, channels: usize) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    value,
                    channels,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl AudioNode for Constant {
        fn arity(&self) -> Arity {
            Arity::NONE
        }
        fn properties(&self, _inputs: &[NodeProperties]) -> NodeProperties {
            NodeProperties::audio(self.channels)
        }
        fn prepare_to_play(&mut self, _sample_rate: f64, _block_size: usize) {}
        fn process(
            &mut self,
            _inputs: &NodeInputs<'_>,
            audio: &mut AudioBuffer,
            events: &mut EventBuffer,
        ) {
            self.calls.fetch_add(1, Ordering::Relaxed);
            for ch in 0..audio.num_channels() {
                audio.channel_mut(ch).fill(self.value);
            }
            events.push(Event::new(0, [0x90, 64, 127]));
        }
    }

    /// Never reports ready.
    struct Stuck;

    impl AudioNode for Stuck {
        fn arity(&self) -> Arity {
            Arity::ANY
        }
        fn properties(&self, _inputs: &[NodeProperties]) -> NodeProperties {
            NodeProperties::audio(1)
        }
        fn prepare_to_play(&mut self, _sample_rate: f64, _block_size: usize) {}
        fn is_ready_to_process(&self, _inputs: &NodeInputs<'_>) -> bool {
            false
        }
        fn process(&mut self, _: &NodeInputs<'_>, _: &mut AudioBuffer, _: &mut EventBuffer) {
            unreachable!("stuck node was processed");
        }
    }

    fn run_block(processor: &mut Processor, channels: usize) -> AudioBuffer {
        let mut audio = AudioBuffer::new(channels, BLOCK);
        let mut events = EventBuffer::new();
        processor.process(&mut audio, &mut events).unwrap();
        audio
    }

    #[test]
    fn process_before_prepare_fails() {
        let mut graph = AudioGraph::new();
        let root = graph.add_sine(220.0);
        let mut processor = Processor::new(graph, root).unwrap();
        let mut audio = AudioBuffer::new(1, BLOCK);
        assert_eq!(
            processor.process(&mut audio, &mut EventBuffer::new()),
            Err(ProcessError::NotPrepared)
        );
    }

    #[test]
    fn prepare_rejects_bad_spec() {
        let mut graph = AudioGraph::new();
        let root = graph.add_sine(220.0);
        let mut processor = Processor::new(graph, root).unwrap();
        assert_eq!(
            processor.prepare_to_play(SR, 0),
            Err(ProcessError::InvalidSpec(SpecError::InvalidBlockSize(0)))
        );
        assert!(!processor.is_prepared());
    }

    #[test]
    fn prepare_sizes_buffers_from_properties() {
        let mut graph = AudioGraph::new();
        let (mono, _) = Constant::new(1.0, 1);
        let (stereo, _) = Constant::new(1.0, 2);
        let a = graph.add_node(mono);
        let b = graph.add_node(stereo);
        let sum = graph.add_sum(&[a, b]).unwrap();
        let mut processor = Processor::new(graph, sum).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();

        assert_eq!(processor.node_state(a).unwrap().dimensions(), (1, BLOCK));
        assert_eq!(processor.node_state(sum).unwrap().dimensions(), (2, BLOCK));
        assert_eq!(processor.spec(), Some(ProcessSpec::new(SR, BLOCK)));
    }

    #[test]
    fn sum_adds_up_to_overlapping_channels() {
        let mut graph = AudioGraph::new();
        let (mono, _) = Constant::new(0.25, 1);
        let (stereo, _) = Constant::new(0.5, 2);
        let a = graph.add_node(mono);
        let b = graph.add_node(stereo);
        let sum = graph.add_sum(&[a, b]).unwrap();
        let mut processor = Processor::new(graph, sum).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();

        let out = run_block(&mut processor, 2);
        assert!(out.channel(0).iter().all(|&s| s == 0.75));
        assert!(out.channel(1).iter().all(|&s| s == 0.5));
    }

    #[test]
    fn output_copy_clamps_to_host_buffer() {
        let mut graph = AudioGraph::new();
        let (stereo, _) = Constant::new(0.5, 2);
        let root = graph.add_node(stereo);
        let mut processor = Processor::new(graph, root).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();

        let mono = run_block(&mut processor, 1);
        assert_eq!(mono.dimensions(), (1, BLOCK));
        assert!(mono.channel(0).iter().all(|&s| s == 0.5));

        let mut wide = AudioBuffer::new(3, BLOCK);
        wide.channel_mut(2).fill(7.0);
        processor.process(&mut wide, &mut EventBuffer::new()).unwrap();
        assert!(wide.channel(1).iter().all(|&s| s == 0.5));
        assert!(wide.channel(2).iter().all(|&s| s == 7.0));
    }

    #[test]
    fn diamond_node_processed_once_per_block() {
        let mut graph = AudioGraph::new();
        let (source, calls) = Constant::new(1.0, 1);
        let source = graph.add_node(source);
        let left = graph.add_function(source, |s| s * 2.0).unwrap();
        let right = graph.add_function(source, |s| s * 3.0).unwrap();
        let root = graph.add_sum(&[left, right]).unwrap();

        let mut processor = Processor::new(graph, root).unwrap();
        assert_eq!(processor.node_count(), 4);
        assert_eq!(
            processor
                .scheduled_nodes()
                .iter()
                .filter(|&&id| id == source)
                .count(),
            1
        );

        processor.prepare_to_play(SR, BLOCK).unwrap();
        for block in 1..=3 {
            let out = run_block(&mut processor, 1);
            assert!(out.channel(0).iter().all(|&s| s == 5.0));
            assert_eq!(calls.load(Ordering::Relaxed), block);
            assert_eq!(processor.last_block_stats().nodes_processed, 4);
        }
    }

    #[test]
    fn serial_chain_needs_one_pass_per_node_at_most() {
        let mut graph = AudioGraph::new();
        let mut id = graph.add_sine(220.0);
        for _ in 0..7 {
            id = graph.add_function(id, |s| s * 0.9).unwrap();
        }
        let mut processor = Processor::new(graph, id).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();
        run_block(&mut processor, 1);

        let stats = processor.last_block_stats();
        assert_eq!(stats.nodes_processed, 8);
        assert!(stats.passes <= 8);
    }

    #[test]
    fn stuck_node_stalls_instead_of_spinning() {
        let mut graph = AudioGraph::new();
        let a = graph.add_sine(220.0);
        let stuck = graph.add_node(Stuck);
        graph.connect(a, stuck).unwrap();
        let root = graph.add_function(stuck, |s| s).unwrap();

        let mut processor = Processor::new(graph, root).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();
        let mut audio = AudioBuffer::new(1, BLOCK);
        assert_eq!(
            processor.process(&mut audio, &mut EventBuffer::new()),
            Err(ProcessError::Stalled {
                processed: 1,
                scheduled: 3
            })
        );
    }

    #[test]
    fn readiness_resets_every_block() {
        let mut graph = AudioGraph::new();
        let source = graph.add_sine(220.0);
        let root = graph.add_function(source, |s| s).unwrap();
        let mut processor = Processor::new(graph, root).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();
        run_block(&mut processor, 1);

        assert!(processor.node_state(root).unwrap().has_processed());
        for &id in processor.scheduled_nodes() {
            processor.states[id.slot()].prepare_for_next_block();
        }

        let (sine, _) = processor.graph.node_and_inputs_mut(source);
        assert!(sine.is_ready_to_process(&NodeInputs::new(&[], &processor.states)));
        let inputs = [source];
        let transform = processor.graph.node(root).unwrap();
        assert!(!transform.is_ready_to_process(&NodeInputs::new(&inputs, &processor.states)));
    }

    #[test]
    fn host_events_are_left_untouched() {
        let mut graph = AudioGraph::new();
        let (node, _) = Constant::new(1.0, 1);
        let root = graph.add_node(node);
        let mut processor = Processor::new(graph, root).unwrap();
        processor.prepare_to_play(SR, BLOCK).unwrap();

        let mut audio = AudioBuffer::new(1, BLOCK);
        let mut events = EventBuffer::new();
        processor.process(&mut audio, &mut events).unwrap();
        assert!(events.is_empty());
        assert_eq!(processor.node_state(root).unwrap().processed_event_output().len(), 1);
    }

    #[test]
    fn new_rejects_unknown_root() {
        let graph = AudioGraph::new();
        assert!(matches!(
            Processor::new(graph, NodeId(0)),
            Err(GraphError::NodeNotFound(_))
        ));
    }
}
