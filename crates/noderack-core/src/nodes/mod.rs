//! Built-in node variants.
//!
//! | Variant | Node | Inputs | Output |
//! |---------|------|--------|--------|
//! | Source | [`SineNode`] | none | 1 channel, periodic |
//! | Combinator | [`SummingNode`] | any | sum of inputs |
//! | Transform | [`FunctionNode`] | one | per-sample mapping of the input |

mod function;
mod sine;
mod summing;

pub use function::FunctionNode;
pub use sine::SineNode;
pub use summing::SummingNode;
