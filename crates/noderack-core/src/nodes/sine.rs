//! Fixed-frequency sine source.

use core::f32::consts::{PI, TAU};

use crate::buffer::{AudioBuffer, EventBuffer};
use crate::node::{Arity, AudioNode, NodeInputs};
use crate::properties::NodeProperties;

/// Single-channel sine oscillator with no inputs.
///
/// Phase is kept in radians as an `f32` accumulator wrapped into `[0, 2π)`.
/// Each tick outputs `sin(phase - π)` and then advances, so the first sample
/// of a freshly prepared node is `sin(-π)`. Two nodes at different
/// frequencies accumulate rounding independently; over long renders their
/// relative phase drifts slightly, which is visible in the peak of a summed
/// octave (≈ 0.885 after a 0.5 gain, rather than the ideal ≈ 0.880).
///
/// # Example
///
/// ```rust
/// use noderack_core::nodes::SineNode;
/// use noderack_core::AudioNode;
///
/// let mut sine = SineNode::new(440.0);
/// sine.prepare_to_play(48000.0, 256);
/// assert_eq!(sine.frequency(), 440.0);
/// ```
#[derive(Clone, Debug)]
pub struct SineNode {
    frequency: f32,
    phase: f32,
    increment: f32,
}

impl SineNode {
    /// Creates a sine source at `frequency` Hz. The increment is computed at
    /// prepare time, once the sample rate is known.
    ///
    /// Negative and non-finite frequencies are treated as 0 Hz.
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: if frequency.is_finite() {
                frequency.max(0.0)
            } else {
                0.0
            },
            phase: 0.0,
            increment: 0.0,
        }
    }

    /// Returns the frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Produces the next sample and advances the phase.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let out = libm::sinf(self.phase - PI);
        let mut next = self.phase + self.increment;
        if next >= TAU {
            next -= TAU;
            // Increments past 2π: subtraction alone may never converge.
            if next >= TAU {
                next = libm::fmodf(next, TAU);
            }
        }
        self.phase = next;
        out
    }
}

impl AudioNode for SineNode {
    fn name(&self) -> &str {
        "sine"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn properties(&self, _input_properties: &[NodeProperties]) -> NodeProperties {
        NodeProperties::audio(1)
    }

    fn prepare_to_play(&mut self, sample_rate: f64, _block_size: usize) {
        self.phase = 0.0;
        let increment = TAU * self.frequency / sample_rate as f32;
        self.increment = if increment.is_finite() { increment } else { 0.0 };
    }

    fn is_ready_to_process(&self, _inputs: &NodeInputs<'_>) -> bool {
        true
    }

    fn process(
        &mut self,
        _inputs: &NodeInputs<'_>,
        dest_audio: &mut AudioBuffer,
        _dest_events: &mut EventBuffer,
    ) {
        if dest_audio.num_channels() == 0 {
            return;
        }
        for sample in dest_audio.channel_mut(0) {
            *sample = self.next_sample();
        }
    }
}
