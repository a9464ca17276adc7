//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod host;
pub mod process;

pub use config::ToolchainConfig;
pub use diagnostic::Diagnostic;
pub use process::ProcessBuilder;
