//! Output shape descriptors for graph nodes.

/// Describes the output a node produces each block.
///
/// Properties flow downstream: a node that combines several inputs reports
/// the OR of their capability flags and the largest of their channel counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeProperties {
    /// The node writes audio samples.
    pub has_audio: bool,
    /// The node writes events.
    pub has_events: bool,
    /// Number of audio channels in the node's output buffer.
    pub num_channels: usize,
}

impl NodeProperties {
    /// Properties of a node that produces `num_channels` channels of audio and no events.
    pub fn audio(num_channels: usize) -> Self {
        Self {
            has_audio: true,
            has_events: false,
            num_channels,
        }
    }

    /// Combines two property sets: OR of flags, MAX of channel counts.
    pub fn merge(self, other: Self) -> Self {
        Self {
            has_audio: self.has_audio | other.has_audio,
            has_events: self.has_events | other.has_events,
            num_channels: self.num_channels.max(other.num_channels),
        }
    }

    /// Folds a set of input properties into one. An empty set yields
    /// silence: no audio, no events, zero channels.
    pub fn aggregate<'a>(inputs: impl IntoIterator<Item = &'a NodeProperties>) -> Self {
        inputs
            .into_iter()
            .fold(Self::default(), |acc, props| acc.merge(*props))
    }
}
