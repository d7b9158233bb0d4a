//! Built-in verification cases.
//!
//! | Case | Graph | Peak | RMS |
//! |------|-------|------|-----|
//! | `sine` | one 220 Hz sine | 1.0 | 0.707 |
//! | `sine_cancelling` | 220 Hz sine plus an inverted copy | 0.0 | 0.0 |
//! | `sine_octave` | 220 Hz + 440 Hz, scaled by 0.5 | 0.885 | 0.5 |
//!
//! The octave peak sits slightly above the ideal 0.880 because the two
//! oscillators accumulate phase rounding independently over the render.

use noderack_core::{AudioGraph, GraphError, NodeId};

use crate::error::Result;
use crate::registry::{CaseDescriptor, Expectation, VerificationRegistry};

/// Register every built-in case.
pub fn register_builtin_cases(registry: &mut VerificationRegistry) -> Result<()> {
    registry.register(
        CaseDescriptor {
            id: "sine",
            description: "Single 220 Hz sine source",
            expected: Expectation {
                peak: 1.0,
                rms: 0.707,
            },
        },
        sine,
    )?;

    registry.register(
        CaseDescriptor {
            id: "sine_cancelling",
            description: "Two 220 Hz sines, one inverted, summed",
            expected: Expectation {
                peak: 0.0,
                rms: 0.0,
            },
        },
        sine_cancelling,
    )?;

    registry.register(
        CaseDescriptor {
            id: "sine_octave",
            description: "220 Hz and 440 Hz sines summed and halved",
            expected: Expectation {
                peak: 0.885,
                rms: 0.5,
            },
        },
        sine_octave,
    )?;

    Ok(())
}

fn sine() -> std::result::Result<(AudioGraph, NodeId), GraphError> {
    let mut graph = AudioGraph::new();
    let root = graph.add_sine(220.0);
    Ok((graph, root))
}

fn sine_cancelling() -> std::result::Result<(AudioGraph, NodeId), GraphError> {
    let mut graph = AudioGraph::new();
    let a = graph.add_sine(220.0);
    let b = graph.add_sine(220.0);
    let inverted = graph.add_function(b, |s| -s)?;
    let root = graph.add_sum(&[a, inverted])?;
    Ok((graph, root))
}

fn sine_octave() -> std::result::Result<(AudioGraph, NodeId), GraphError> {
    let mut graph = AudioGraph::new();
    let low = graph.add_sine(220.0);
    let high = graph.add_sine(440.0);
    let sum = graph.add_sum(&[low, high])?;
    let root = graph.add_function(sum, |s| s * 0.5)?;
    Ok((graph, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GraphFactory;

    #[test]
    fn registers_three_cases() {
        let mut registry = VerificationRegistry::new();
        register_builtin_cases(&mut registry).unwrap();
        let ids: Vec<_> = registry.all_cases().iter().map(|c| c.id).collect();
        assert_eq!(ids, ["sine", "sine_cancelling", "sine_octave"]);
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = VerificationRegistry::new();
        register_builtin_cases(&mut registry).unwrap();
        assert!(register_builtin_cases(&mut registry).is_err());
    }

    #[test]
    fn graphs_build() {
        let factories: [GraphFactory; 3] = [sine, sine_cancelling, sine_octave];
        for factory in factories {
            let (graph, root) = factory().unwrap();
            assert!(graph.validate(root).is_ok());
        }
    }
}
