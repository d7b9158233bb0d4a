//! Render-and-measure verification for noderack graphs.
//!
//! Renders a [`Processor`](noderack_core::Processor) offline for a fixed
//! duration and checks the peak and RMS of the result against expected
//! values. Cases live in an explicit [`VerificationRegistry`].
//!
//! # Example
//!
//! ```rust
//! use noderack_verify::{RenderSettings, VerificationRegistry, register_builtin_cases};
//!
//! let mut registry = VerificationRegistry::new();
//! register_builtin_cases(&mut registry)?;
//!
//! let settings = RenderSettings::default();
//! let report = registry.run("sine_cancelling", &settings)?;
//! assert!(report.passed(), "{report}");
//! # Ok::<(), noderack_verify::VerifyError>(())
//! ```

mod cases;
mod error;
mod render;

/// Peak, RMS and crest factor measurements.
pub mod dynamics;

/// Case registry and reports.
pub mod registry;

/// Render settings loaded from TOML.
pub mod settings;

pub use cases::register_builtin_cases;
pub use error::{Result, VerifyError};
pub use registry::{CaseDescriptor, CaseReport, Expectation, GraphFactory, VerificationRegistry};
pub use render::{RenderedAudio, render};
pub use settings::RenderSettings;
