//! Sample and event buffers owned by graph nodes.
//!
//! Every node owns one [`AudioBuffer`] and one [`EventBuffer`]. Both are sized
//! once at prepare time and reused for every block: the audio grid is zeroed
//! and the event list cleared before the node's fill routine runs.
//!
//! Copies and accumulation between buffers of different shapes are lenient:
//! they operate on the overlapping channels and samples only.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// A planar multi-channel block of `f32` samples.
///
/// The channel count and block length are fixed at construction. There is no
/// resize method; a node that needs a different shape has a configuration
/// problem, not a runtime one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioBuffer {
    data: Vec<f32>,
    num_channels: usize,
    num_samples: usize,
}

impl AudioBuffer {
    /// Creates a zeroed buffer with `num_channels` channels of `num_samples` samples.
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            data: vec![0.0; num_channels * num_samples],
            num_channels,
            num_samples,
        }
    }

    /// Returns the number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Returns the number of samples per channel.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `(num_channels, num_samples)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.num_channels, self.num_samples)
    }

    /// Fills every channel with zeros.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Returns the samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels()`.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        assert!(channel < self.num_channels, "channel {channel} out of range");
        let start = channel * self.num_samples;
        &self.data[start..start + self.num_samples]
    }

    /// Returns the samples of one channel for writing.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels()`.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        assert!(channel < self.num_channels, "channel {channel} out of range");
        let start = channel * self.num_samples;
        &mut self.data[start..start + self.num_samples]
    }

    /// Iterates over all channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        // `max(1)` keeps `chunks_exact` happy for zero-length blocks.
        self.data
            .chunks_exact(self.num_samples.max(1))
            .take(self.num_channels)
    }

    /// Copies the overlapping region of `other` into this buffer.
    ///
    /// Channels and samples outside the overlap are left untouched.
    pub fn copy_from(&mut self, other: &AudioBuffer) {
        let channels = self.num_channels.min(other.num_channels);
        let samples = self.num_samples.min(other.num_samples);
        for ch in 0..channels {
            self.channel_mut(ch)[..samples].copy_from_slice(&other.channel(ch)[..samples]);
        }
    }

    /// Adds the overlapping region of `other` into this buffer sample-by-sample.
    pub fn accumulate_from(&mut self, other: &AudioBuffer) {
        let channels = self.num_channels.min(other.num_channels);
        for ch in 0..channels {
            for (dst, src) in self.channel_mut(ch).iter_mut().zip(other.channel(ch)) {
                *dst += *src;
            }
        }
    }
}

/// A discrete event positioned inside the current block.
///
/// The payload is an opaque three-byte message (MIDI-shaped). Sample-accurate
/// handling is left to the nodes that consume events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// Offset of the event from the start of the block, in samples.
    pub sample_offset: usize,
    /// Raw message bytes.
    pub data: [u8; 3],
}

impl Event {
    /// Creates an event at `sample_offset` carrying `data`.
    pub fn new(sample_offset: usize, data: [u8; 3]) -> Self {
        Self {
            sample_offset,
            data,
        }
    }
}

/// Ordered list of events produced by a node during one block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventBuffer {
    events: Vec<Event>,
}

impl EventBuffer {
    /// Creates an empty event buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty event buffer with room for `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Appends an event.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Removes all events, keeping the allocation.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Returns the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if no events were produced.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates over events in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Returns the events as a slice.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }
}
