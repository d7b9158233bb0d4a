//! Offline rendering of a processor into memory.

use noderack_core::{AudioBuffer, EventBuffer, Processor};

use crate::dynamics;
use crate::error::Result;
use crate::settings::RenderSettings;

/// Audio rendered from a processor, one `Vec` per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    sample_rate: f64,
    channels: Vec<Vec<f32>>,
}

impl RenderedAudio {
    /// Sample rate the audio was rendered at.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Rendered length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_samples() as f64 / self.sample_rate
    }

    /// Samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    pub fn channel(&self, ch: usize) -> &[f32] {
        &self.channels[ch]
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .map(|ch| dynamics::peak(ch))
            .fold(0.0, f32::max)
    }

    /// RMS of the first channel, or 0 if there are no channels.
    pub fn rms(&self) -> f32 {
        self.channels.first().map_or(0.0, |ch| dynamics::rms(ch))
    }

    /// Crest factor of the first channel, or 0 if it is silent.
    pub fn crest_factor(&self) -> f32 {
        self.channels.first().map_or(0.0, |ch| dynamics::crest_factor(ch))
    }
}

/// Prepares `processor` with `settings` and renders `duration_secs` of audio.
///
/// Whole blocks are processed; the last one is truncated so the result holds
/// exactly [`RenderSettings::total_samples()`] samples per channel.
pub fn render(processor: &mut Processor, settings: &RenderSettings) -> Result<RenderedAudio> {
    settings.validate()?;
    processor.prepare_to_play(settings.sample_rate, settings.block_size)?;

    let total = settings.total_samples();
    let mut channels = vec![Vec::with_capacity(total); settings.num_channels];
    let mut audio = AudioBuffer::new(settings.num_channels, settings.block_size);
    let mut events = EventBuffer::new();

    let mut rendered = 0;
    while rendered < total {
        processor.process(&mut audio, &mut events)?;
        let take = (total - rendered).min(settings.block_size);
        for (ch, out) in channels.iter_mut().enumerate() {
            out.extend_from_slice(&audio.channel(ch)[..take]);
        }
        rendered += take;
    }

    tracing::debug!(
        samples = total,
        blocks = settings.num_blocks(),
        nodes = processor.node_count(),
        "rendered graph"
    );

    Ok(RenderedAudio {
        sample_rate: settings.sample_rate,
        channels,
    })
}
