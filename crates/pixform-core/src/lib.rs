//! Pixform Core: the per-pixel formula language.
//!
//! A formula such as `red(x,y)*sin(t)+avg(1,2,3)` is cleaned, parsed into a
//! tree of [`Node`]s against the built-in [`SymbolTable`], optionally
//! constant-folded, then evaluated once per pixel and channel against an
//! [`EvalContext`] carrying the current coordinates. No image or UI
//! dependencies live here; pixel access goes through [`ChannelSource`].

pub mod context;
pub mod error;
pub mod formula;
pub mod graph;
pub mod node;
pub mod optimize;
pub mod parser;
pub mod symbols;

// Re-exports for convenience.
pub use context::{Channel, ChannelSource, EvalContext, Slot};
pub use error::ParseError;
pub use formula::Formula;
pub use graph::Graph;
pub use node::Node;
pub use optimize::{Foldability, OptimizeStats};
pub use parser::{MAX_DEPTH, Parser, clean};
pub use symbols::{Arity, Symbol, SymbolTable};
