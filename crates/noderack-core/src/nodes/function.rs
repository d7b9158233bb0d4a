//! Per-sample transform over a single input.

use core::fmt;

use crate::buffer::{AudioBuffer, EventBuffer};
use crate::node::{Arity, AudioNode, NodeInputs};
use crate::properties::NodeProperties;

/// Applies a pure `f32 -> f32` mapping to every sample of its one input.
///
/// The mapping must not keep state or have side effects: the scheduler is
/// free to assume the same input always produces the same output.
///
/// # Example
///
/// ```rust
/// use noderack_core::nodes::FunctionNode;
///
/// let invert = FunctionNode::new(|s| -s);
/// let half = FunctionNode::new(|s| s * 0.5);
/// # let _ = (invert, half);
/// ```
#[derive(Clone)]
pub struct FunctionNode<F> {
    function: F,
}

impl<F> FunctionNode<F>
where
    F: Fn(f32) -> f32,
{
    /// Wraps `function` as a transform node.
    pub fn new(function: F) -> Self {
        Self { function }
    }

    /// Applies the mapping to a single sample.
    #[inline]
    pub fn apply(&self, sample: f32) -> f32 {
        (self.function)(sample)
    }
}

impl<F> fmt::Debug for FunctionNode<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode").finish_non_exhaustive()
    }
}

impl<F> AudioNode for FunctionNode<F>
where
    F: Fn(f32) -> f32,
{
    fn name(&self) -> &str {
        "function"
    }

    fn arity(&self) -> Arity {
        Arity::ONE
    }

    fn properties(&self, input_properties: &[NodeProperties]) -> NodeProperties {
        input_properties.first().copied().unwrap_or_default()
    }

    fn prepare_to_play(&mut self, _sample_rate: f64, _block_size: usize) {}

    fn process(
        &mut self,
        inputs: &NodeInputs<'_>,
        dest_audio: &mut AudioBuffer,
        _dest_events: &mut EventBuffer,
    ) {
        let Some(input) = inputs.audio_outputs().next() else {
            return;
        };
        debug_assert_eq!(input.num_samples(), dest_audio.num_samples());

        let channels = input.num_channels().min(dest_audio.num_channels());
        for ch in 0..channels {
            for (out, &sample) in dest_audio.channel_mut(ch).iter_mut().zip(input.channel(ch)) {
                *out = self.apply(sample);
            }
        }
    }
}
