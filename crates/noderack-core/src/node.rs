//! The node contract: per-variant behavior plus per-node processing state.
//!
//! A node is split in two halves:
//!
//! - [`AudioNode`] — the variant-specific part (sources, combinators,
//!   transforms). Implementors describe their output shape, say when they are
//!   ready, and fill a destination buffer.
//! - [`NodeState`] — the part every node shares: the owned output buffers and
//!   the processed flag. The [`Processor`](crate::Processor) drives it.
//!
//! Nodes never hold references to each other. Inputs are [`NodeId`] handles
//! into the owning [`AudioGraph`](crate::AudioGraph), and a node reads its
//! inputs' outputs through a [`NodeInputs`] view while it is being processed.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::buffer::{AudioBuffer, EventBuffer};
use crate::properties::NodeProperties;

/// Handle to a node stored in an [`AudioGraph`](crate::AudioGraph).
///
/// IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Number of inputs a node variant accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
    /// Minimum number of inputs required before the graph can be processed.
    pub min: usize,
    /// Maximum number of inputs, or `None` for unbounded.
    pub max: Option<usize>,
}

impl Arity {
    /// No inputs (sources).
    pub const NONE: Self = Self {
        min: 0,
        max: Some(0),
    };
    /// Exactly one input (transforms).
    pub const ONE: Self = Self {
        min: 1,
        max: Some(1),
    };
    /// Any number of inputs, including zero (combinators).
    pub const ANY: Self = Self { min: 0, max: None };

    /// Returns true if `count` inputs satisfy this arity.
    pub fn accepts(self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// Variant-specific behavior of a processing node.
///
/// # Contract
///
/// - [`properties()`](Self::properties) must be a pure function of the node's
///   configuration and its inputs' properties. The processor sizes the node's
///   output buffer from it once, at prepare time.
/// - [`process()`](Self::process) is called at most once per block, only after
///   [`is_ready_to_process()`](Self::is_ready_to_process) returned true. The
///   destination buffers arrive zeroed/cleared and must not be replaced with
///   buffers of a different shape.
///
/// # Example
///
/// ```rust
/// use noderack_core::{Arity, AudioBuffer, AudioNode, EventBuffer, NodeInputs, NodeProperties};
///
/// /// Writes a constant into every sample.
/// struct Dc(f32);
///
/// impl AudioNode for Dc {
///     fn arity(&self) -> Arity {
///         Arity::NONE
///     }
///
///     fn properties(&self, _inputs: &[NodeProperties]) -> NodeProperties {
///         NodeProperties::audio(1)
///     }
///
///     fn prepare_to_play(&mut self, _sample_rate: f64, _block_size: usize) {}
///
///     fn process(&mut self, _inputs: &NodeInputs<'_>, audio: &mut AudioBuffer, _events: &mut EventBuffer) {
///         audio.channel_mut(0).fill(self.0);
///     }
/// }
/// ```
pub trait AudioNode {
    /// Short name used in logs and diagnostics.
    fn name(&self) -> &str {
        "node"
    }

    /// How many inputs this node accepts.
    fn arity(&self) -> Arity;

    /// Returns the shape of this node's output given its inputs' shapes,
    /// in input order.
    fn properties(&self, input_properties: &[NodeProperties]) -> NodeProperties;

    /// Called once before playback begins.
    fn prepare_to_play(&mut self, sample_rate: f64, block_size: usize);

    /// Returns true when every input this node reads has been processed for
    /// the current block.
    fn is_ready_to_process(&self, inputs: &NodeInputs<'_>) -> bool {
        inputs.all_processed()
    }

    /// Fills the node's output for one block.
    fn process(
        &mut self,
        inputs: &NodeInputs<'_>,
        dest_audio: &mut AudioBuffer,
        dest_events: &mut EventBuffer,
    );
}

/// Output buffers and completion flag shared by every node.
///
/// The flag moves through reset → processing → processed once per block. It
/// is atomic so that readiness polling stays sound if it is ever split from
/// the thread doing the processing.
#[derive(Debug, Default)]
pub struct NodeState {
    processed: AtomicBool,
    initialised: bool,
    audio: AudioBuffer,
    events: EventBuffer,
}

impl NodeState {
    /// Creates an uninitialised state with no buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the output buffers: `num_channels` × `block_size` audio and
    /// an event list with room for one event per sample.
    ///
    /// Must run once before the node is processed.
    pub fn initialise(&mut self, num_channels: usize, block_size: usize) {
        self.audio = AudioBuffer::new(num_channels, block_size);
        self.events = EventBuffer::with_capacity(block_size);
        self.initialised = true;
        self.processed.store(false, Ordering::Release);
    }

    /// Returns true once [`initialise()`](Self::initialise) has run.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Clears the processed flag ahead of a new block.
    #[inline]
    pub fn prepare_for_next_block(&self) {
        self.processed.store(false, Ordering::Release);
    }

    /// Returns true if the node has produced its output for this block.
    #[inline]
    pub fn has_processed(&self) -> bool {
        self.processed.load(Ordering::Acquire)
    }

    /// Returns the processed audio output.
    ///
    /// # Panics
    ///
    /// Panics if the node has not processed this block.
    pub fn processed_audio_output(&self) -> &AudioBuffer {
        assert!(
            self.has_processed(),
            "audio output read before the node processed"
        );
        &self.audio
    }

    /// Returns the processed event output.
    ///
    /// # Panics
    ///
    /// Panics if the node has not processed this block.
    pub fn processed_event_output(&self) -> &EventBuffer {
        assert!(
            self.has_processed(),
            "event output read before the node processed"
        );
        &self.events
    }

    /// Returns the output dimensions fixed at initialisation.
    pub fn dimensions(&self) -> (usize, usize) {
        self.audio.dimensions()
    }
}

/// Read-only view of a node's inputs during processing.
///
/// Indices are positions in the node's input list, not [`NodeId`]s.
pub struct NodeInputs<'a> {
    ids: &'a [NodeId],
    states: &'a [NodeState],
}

impl<'a> NodeInputs<'a> {
    pub(crate) fn new(ids: &'a [NodeId], states: &'a [NodeState]) -> Self {
        Self { ids, states }
    }

    /// Returns the number of inputs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the node has no inputs.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the input handles in order.
    pub fn ids(&self) -> &'a [NodeId] {
        self.ids
    }

    /// Returns true if input `index` has processed this block.
    pub fn has_processed(&self, index: usize) -> bool {
        self.states[self.ids[index].slot()].has_processed()
    }

    /// Returns true if every input has processed this block.
    pub fn all_processed(&self) -> bool {
        self.ids
            .iter()
            .all(|id| self.states[id.slot()].has_processed())
    }

    /// Returns the processed audio of input `index`.
    ///
    /// # Panics
    ///
    /// Panics if that input has not processed this block.
    pub fn audio(&self, index: usize) -> &'a AudioBuffer {
        self.states[self.ids[index].slot()].processed_audio_output()
    }

    /// Returns the processed events of input `index`.
    ///
    /// # Panics
    ///
    /// Panics if that input has not processed this block.
    pub fn events(&self, index: usize) -> &'a EventBuffer {
        self.states[self.ids[index].slot()].processed_event_output()
    }

    /// Iterates over every input's processed audio in order.
    pub fn audio_outputs(&self) -> impl Iterator<Item = &'a AudioBuffer> + '_ {
        (0..self.len()).map(|i| self.audio(i))
    }
}

/// Runs one node's fill routine against its slot in `states`.
///
/// Zeroes the slot's buffers, fills them, checks the dimensions survived, and
/// marks the slot processed. The buffers are moved out of the slot for the
/// duration of the call, so the node can borrow every other slot through its
/// [`NodeInputs`].
pub(crate) fn process_node<N: AudioNode + ?Sized>(
    node: &mut N,
    inputs: &[NodeId],
    states: &mut [NodeState],
    slot: usize,
) {
    let state = &mut states[slot];
    debug_assert!(state.initialised, "node processed before initialise");
    debug_assert!(!state.has_processed(), "node processed twice in one block");

    let mut audio = core::mem::take(&mut state.audio);
    let mut events = core::mem::take(&mut state.events);
    audio.clear();
    events.clear();
    let dimensions = audio.dimensions();

    node.process(&NodeInputs::new(inputs, states), &mut audio, &mut events);

    debug_assert_eq!(
        dimensions,
        audio.dimensions(),
        "node '{}' changed its buffer dimensions",
        node.name()
    );

    let state = &mut states[slot];
    state.audio = audio;
    state.events = events;
    state.processed.store(true, Ordering::Release);
}
