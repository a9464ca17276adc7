//! heroconf - a build-file generator for C++ projects
//!
//! This crate probes the local C++ toolchain, resolves optional system
//! packages and per-artifact source modules, and emits a ninja build file
//! covering every selected build mode.

pub mod core;
pub mod external;
pub mod graph;
pub mod ops;
pub mod packages;
pub mod resolver;
pub mod toolchain;
pub mod util;

/// Test utilities and mocks for heroconf unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides mock implementations of the trial compiler,
/// the package registry and the external steps.
#[cfg(test)]
pub mod test_support;

pub use core::{
    error::ConfigureError, manifest::Manifest, mode::BuildMode, options::ConfigureOptions,
};
pub use graph::BuildGraph;
pub use toolchain::Capabilities;
