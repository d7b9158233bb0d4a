//! Fan-in combinator that sums its inputs.

use crate::buffer::{AudioBuffer, EventBuffer};
use crate::node::{Arity, AudioNode, NodeInputs};
use crate::properties::NodeProperties;

/// Adds the audio of every input into one output.
///
/// Output shape is the aggregate of the inputs: OR of the audio/event flags
/// and the widest channel count. Each input is added channel-by-channel up to
/// the narrower of the two buffers, so a mono input feeds only channel 0 of a
/// stereo sum.
///
/// Events are not merged; the event output is always empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct SummingNode;

impl SummingNode {
    /// Creates a summing node. Inputs are attached through the graph.
    pub fn new() -> Self {
        Self
    }
}

impl AudioNode for SummingNode {
    fn name(&self) -> &str {
        "sum"
    }

    fn arity(&self) -> Arity {
        Arity::ANY
    }

    fn properties(&self, input_properties: &[NodeProperties]) -> NodeProperties {
        NodeProperties::aggregate(input_properties)
    }

    fn prepare_to_play(&mut self, _sample_rate: f64, _block_size: usize) {}

    fn process(
        &mut self,
        inputs: &NodeInputs<'_>,
        dest_audio: &mut AudioBuffer,
        _dest_events: &mut EventBuffer,
    ) {
        for input in inputs.audio_outputs() {
            debug_assert_eq!(input.num_samples(), dest_audio.num_samples());
            dest_audio.accumulate_from(input);
        }
    }
}
