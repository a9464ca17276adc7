//! High-level operations.
//!
//! This module contains the implementation of heroconf commands.

pub mod configure;
pub mod probe;

pub use configure::{configure, configure_with, select_modes, Collaborators, ConfigureOutcome};
pub use probe::{format_report, probe, probe_with, LibraryStatus, ProbeReport};
