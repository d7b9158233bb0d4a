//! Render settings, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! standard verification setup: 44.1 kHz, 512-sample blocks, mono, five
//! seconds, 0.001 tolerance.
//!
//! ```toml
//! sample_rate = 48000.0
//! block_size = 256
//! duration_secs = 2.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

/// How long, at what rate, and how strictly to render a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Samples per block handed to the processor.
    pub block_size: usize,
    /// Channels in the host buffer.
    pub num_channels: usize,
    /// Rendered length in seconds.
    pub duration_secs: f64,
    /// Allowed absolute error on measured levels.
    pub tolerance: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
            num_channels: 1,
            duration_secs: 5.0,
            tolerance: 0.001,
        }
    }
}

impl RenderSettings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| VerifyError::read_file(path, e))?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?settings, "loaded render settings");
        Ok(settings)
    }

    /// Parse settings from a TOML string and validate them.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let settings: Self = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every field is in range.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(VerifyError::InvalidSettings(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.block_size == 0 {
            return Err(VerifyError::InvalidSettings(
                "block_size must be non-zero".to_string(),
            ));
        }
        if self.num_channels == 0 {
            return Err(VerifyError::InvalidSettings(
                "num_channels must be non-zero".to_string(),
            ));
        }
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(VerifyError::InvalidSettings(format!(
                "duration_secs must be non-negative, got {}",
                self.duration_secs
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(VerifyError::InvalidSettings(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Total rendered length in samples, rounded to the nearest sample.
    pub fn total_samples(&self) -> usize {
        (self.duration_secs * self.sample_rate).round() as usize
    }

    /// Number of blocks needed to cover [`total_samples()`](Self::total_samples).
    pub fn num_blocks(&self) -> usize {
        self.total_samples().div_ceil(self.block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.sample_rate, 44100.0);
        assert_eq!(settings.block_size, 512);
        assert_eq!(settings.total_samples(), 220_500);
        assert_eq!(settings.num_blocks(), 431);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(
            RenderSettings::from_toml_str("").unwrap(),
            RenderSettings::default()
        );
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let settings = RenderSettings::from_toml_str(
            r#"
            sample_rate = 48000.0
            duration_secs = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(settings.sample_rate, 48000.0);
        assert_eq!(settings.block_size, 512);
        assert_eq!(settings.total_samples(), 24_000);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = RenderSettings::from_toml_str("block_size = 0").unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSettings(_)));

        let err = RenderSettings::from_toml_str("sample_rate = -1.0").unwrap_err();
        assert!(err.to_string().contains("sample_rate"), "got: {err}");
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = RenderSettings::from_toml_str("block_size = \"big\"").unwrap_err();
        assert!(matches!(err, VerifyError::TomlParse(_)));
    }

    #[test]
    fn zero_duration_renders_nothing() {
        let settings = RenderSettings {
            duration_secs: 0.0,
            ..RenderSettings::default()
        };
        assert_eq!(settings.total_samples(), 0);
        assert_eq!(settings.num_blocks(), 0);
    }
}
