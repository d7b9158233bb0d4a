//! Playback configuration supplied by the host before processing starts.

/// Sample rate and block size, fixed for the lifetime of a prepared processor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Number of samples per block.
    pub block_size: usize,
}

/// Rejected playback configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecError {
    /// Sample rate was zero, negative, or not finite.
    InvalidSampleRate(f64),
    /// Block size was zero.
    InvalidBlockSize(usize),
}

#[cfg(feature = "std")]
impl std::fmt::Display for SpecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => write!(f, "invalid sample rate: {sr} Hz"),
            Self::InvalidBlockSize(n) => write!(f, "invalid block size: {n} samples"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SpecError {}

impl ProcessSpec {
    /// Creates a spec without validating it.
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    /// Checks that the sample rate is positive and finite and the block size non-zero.
    pub fn validate(&self) -> Result<(), SpecError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SpecError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 {
            return Err(SpecError::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }
}
