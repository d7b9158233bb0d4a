//! Named verification cases and their reports.
//!
//! A case builds a graph, renders it with [`render()`](crate::render), and
//! compares the measured peak and RMS with expected values. Cases are added
//! to a [`VerificationRegistry`] by explicit calls to
//! [`register()`](VerificationRegistry::register); nothing registers itself.

use std::fmt;

use noderack_core::{AudioGraph, GraphError, NodeId, Processor};

use crate::error::{Result, VerifyError};
use crate::render::render;
use crate::settings::RenderSettings;

/// Builds a fresh graph and returns it with the root to render.
pub type GraphFactory = fn() -> std::result::Result<(AudioGraph, NodeId), GraphError>;

/// Expected levels of a rendered case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expectation {
    /// Largest absolute sample.
    pub peak: f32,
    /// RMS of the first channel.
    pub rms: f32,
}

/// Describes a case in the registry.
#[derive(Debug, Clone)]
pub struct CaseDescriptor {
    /// Unique identifier for the case (lowercase, no spaces).
    pub id: &'static str,
    /// Brief description of the graph under test.
    pub description: &'static str,
    /// Levels the render must reach.
    pub expected: Expectation,
}

/// Internal entry in the registry.
struct RegistryEntry {
    descriptor: CaseDescriptor,
    factory: GraphFactory,
}

/// Outcome of running one case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    /// Case identifier.
    pub id: &'static str,
    /// Levels the case expected.
    pub expected: Expectation,
    /// Measured peak.
    pub peak: f32,
    /// Measured RMS.
    pub rms: f32,
    /// Measured peak-to-RMS ratio. Reported, not checked.
    pub crest_factor: f32,
    /// Tolerance the measurements were checked against.
    pub tolerance: f32,
}

impl CaseReport {
    /// Returns true if peak and RMS are both within tolerance.
    pub fn passed(&self) -> bool {
        self.peak_error() <= self.tolerance && self.rms_error() <= self.tolerance
    }

    /// Absolute peak error.
    pub fn peak_error(&self) -> f32 {
        (self.peak - self.expected.peak).abs()
    }

    /// Absolute RMS error.
    pub fn rms_error(&self) -> f32 {
        (self.rms - self.expected.rms).abs()
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (peak {:.4}, expected {:.4}; rms {:.4}, expected {:.4}; crest {:.3}; tolerance {})",
            self.id,
            if self.passed() { "pass" } else { "FAIL" },
            self.peak,
            self.expected.peak,
            self.rms,
            self.expected.rms,
            self.crest_factor,
            self.tolerance
        )
    }
}

/// Registry of render-and-measure cases.
///
/// Starts empty; call [`register_builtin_cases()`](crate::register_builtin_cases)
/// or [`register()`](Self::register) to fill it.
#[derive(Default)]
pub struct VerificationRegistry {
    entries: Vec<RegistryEntry>,
}

impl VerificationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a case.
    ///
    /// Fails if a case with the same id is already registered.
    pub fn register(&mut self, descriptor: CaseDescriptor, factory: GraphFactory) -> Result<()> {
        if self.get(descriptor.id).is_some() {
            return Err(VerifyError::DuplicateCase(descriptor.id.to_string()));
        }
        tracing::debug!(case = descriptor.id, "registered verification case");
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
        Ok(())
    }

    /// Returns descriptors for all registered cases, in registration order.
    pub fn all_cases(&self) -> Vec<&CaseDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Get a descriptor by case ID.
    pub fn get(&self, id: &str) -> Option<&CaseDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Build, render, and measure one case.
    pub fn run(&self, id: &str, settings: &RenderSettings) -> Result<CaseReport> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .ok_or_else(|| VerifyError::UnknownCase(id.to_string()))?;
        Self::run_entry(entry, settings)
    }

    /// Run every registered case in registration order.
    ///
    /// Stops at the first case that fails to build or render. Cases whose
    /// levels are out of tolerance still produce a report.
    pub fn run_all(&self, settings: &RenderSettings) -> Result<Vec<CaseReport>> {
        self.entries
            .iter()
            .map(|entry| Self::run_entry(entry, settings))
            .collect()
    }

    fn run_entry(entry: &RegistryEntry, settings: &RenderSettings) -> Result<CaseReport> {
        let descriptor = &entry.descriptor;
        let (graph, root) = (entry.factory)()?;
        let mut processor = Processor::new(graph, root)?;
        let audio = render(&mut processor, settings)?;

        let report = CaseReport {
            id: descriptor.id,
            expected: descriptor.expected,
            peak: audio.peak(),
            rms: audio.rms(),
            crest_factor: audio.crest_factor(),
            tolerance: settings.tolerance,
        };
        if report.passed() {
            tracing::info!("{report}");
        } else {
            tracing::warn!("{report}");
        }
        Ok(report)
    }

    /// Returns the number of registered cases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no cases are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
