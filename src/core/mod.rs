//! Core data structures for heroconf.
//!
//! This module contains the foundational types used throughout heroconf:
//! - Artifacts and the artifact registry
//! - Build modes and optional packages
//! - The project manifest and typed configuration options
//! - The configuration error taxonomy

pub mod artifact;
pub mod error;
pub mod manifest;
pub mod mode;
pub mod options;
pub mod package;

pub use artifact::{Artifact, ArtifactCategory, ArtifactKind, ArtifactRegistry};
pub use error::{ConfigureError, ErrorCategory};
pub use manifest::{Manifest, MANIFEST_NAME};
pub use mode::BuildMode;
pub use options::{ConfigureOptions, ModeSelection, OutputKind, Tristate};
pub use package::OptionalPackage;
