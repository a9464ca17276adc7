//! Artifact dependency resolution.
//!
//! This module turns the manifest's artifact lists, module sets and test
//! overrides into the authoritative artifact → source module table consumed
//! by graph emission. The resolver is pure: every referential check runs
//! here, before any probe or process is started.

pub mod resolve;

pub use resolve::{
    compile_source_stem, resolve_dependencies, uncompiled_sources, DependencyTable, ResolvedArtifact,
};
