//! Noderack Core - block-based dataflow scheduling for audio/event node graphs
//!
//! A host describes its signal chain as a graph of nodes, hands the graph and a
//! root node to a [`Processor`], and asks for one block of output at a time.
//! Each node fills its own audio and event buffers once per block, pulling from
//! the buffers of the nodes that feed it.
//!
//! # Core Abstractions
//!
//! ## Nodes
//!
//! - [`AudioNode`] - Object-safe contract every node implements
//! - [`Arity`] - How many inputs a node accepts
//! - [`NodeProperties`] - Declared output shape (audio, events, channels)
//! - [`NodeState`] - Per-node output buffers and processed flag
//! - [`NodeInputs`] - Read-only view of a node's inputs during a block
//!
//! ## Built-in Variants
//!
//! - [`nodes::SineNode`] - Source: sine oscillator, no inputs
//! - [`nodes::SummingNode`] - Combinator: sums any number of inputs
//! - [`nodes::FunctionNode`] - Transform: per-sample mapping of one input
//!
//! ## Scheduling
//!
//! - [`AudioGraph`] - Arena of nodes addressed by [`NodeId`]
//! - [`Processor`] - Flattens the graph under a root and runs the
//!   readiness-driven loop each block
//! - [`ProcessSpec`] - Sample rate and block size
//!
//! ## Buffers
//!
//! - [`AudioBuffer`] - Channels x samples of `f32`
//! - [`EventBuffer`] - Timestamped three-byte events
//!
//! # no_std Support
//!
//! The crate builds without `std` (it still needs `alloc`). Disable the
//! default feature:
//!
//! ```toml
//! [dependencies]
//! noderack-core = { version = "0.1", default-features = false }
//! ```
//!
//! Enable the `tracing` feature to get `debug!` lines for graph edits and
//! preparation and a `warn!` when a block stalls.
//!
//! # Example
//!
//! ```rust
//! use noderack_core::{AudioBuffer, AudioGraph, EventBuffer, Processor};
//!
//! let mut graph = AudioGraph::new();
//! let low = graph.add_sine(220.0);
//! let high = graph.add_sine(440.0);
//! let sum = graph.add_sum(&[low, high])?;
//! let root = graph.add_function(sum, |s| s * 0.5)?;
//!
//! let mut processor = Processor::new(graph, root)?;
//! processor.prepare_to_play(44100.0, 512)?;
//!
//! let mut audio = AudioBuffer::new(1, 512);
//! let mut events = EventBuffer::new();
//! processor.process(&mut audio, &mut events)?;
//! assert!(audio.channel(0).iter().all(|s| s.abs() <= 1.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Design Principles
//!
//! - **No precomputed order**: nodes run when their inputs are ready
//! - **Identity, not equality**: a node shared by several parents runs once
//! - **Shapes fixed at prepare time**: no allocation in [`Processor::process`]
//! - **Cycles are errors**: rejected when edges are added, never spun on

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod processor;
pub mod properties;
pub mod spec;

pub use buffer::{AudioBuffer, Event, EventBuffer};
pub use graph::{AudioGraph, BoxedNode, GraphError};
pub use node::{Arity, AudioNode, NodeId, NodeInputs, NodeState};
pub use processor::{BlockStats, ProcessError, Processor};
pub use properties::NodeProperties;
pub use spec::{ProcessSpec, SpecError};
