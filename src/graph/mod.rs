//! Build graph generation.
//!
//! - [`model`]: typed rules, pools and edges with a single-producer check
//! - [`inputs`]: the immutable snapshot emission reads, and the pure
//!   functions assembling it
//! - [`emit`]: per-mode emission
//! - [`writer`]: ninja serialization

pub mod emit;
pub mod inputs;
pub mod model;
pub mod writer;

pub use emit::emit_graph;
pub use inputs::{GraphInputs, ModeInputs, SubprojectInputs};
pub use model::{BuildGraph, Edge, GraphError, Rule};
pub use writer::write_graph;
