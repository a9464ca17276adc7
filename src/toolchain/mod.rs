//! Toolchain capability probing.
//!
//! Everything heroconf knows about the compiler it learns empirically, by
//! compiling small synthetic programs:
//! 1. [`trial`] runs a single trial compilation
//! 2. [`flags`] filters candidate flags down to the accepted ones
//! 3. [`capabilities`] runs the higher-level feature checks and assembles the
//!    immutable [`Capabilities`] snapshot consumed by graph emission

use anyhow::Result;

pub mod capabilities;
pub mod flags;
pub mod trial;

pub use capabilities::{probe_toolchain, require_library, Capabilities, CapabilityDetector};
pub use flags::{flag_supported, probe_form, supported_flags};
pub use trial::ProcessTrialCompiler;

/// Something that can attempt to compile synthetic C++ sources.
///
/// `Ok(false)` means the compiler rejected the input, which is the expected
/// way of learning that a flag or feature is unsupported. `Err` is reserved
/// for failures of the probing machinery itself.
pub trait TrialCompiler {
    /// Compile and link `source` with the extra `flags`.
    fn try_compile_and_link(&self, source: &str, flags: &[String]) -> Result<bool>;

    /// Compile `source` to an object file only.
    fn try_compile(&self, source: &str, flags: &[String]) -> Result<bool> {
        let mut flags = flags.to_vec();
        flags.push("-c".to_string());
        self.try_compile_and_link(source, &flags)
    }
}
