//! Command implementations

pub mod configure;
pub mod probe;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::ToolchainArgs;
use heroconf::core::options::ConfigureOptions;
use heroconf::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
    ToolchainSettings,
};

/// Options common to every command: command-line values first, then the
/// toolchain defaults files, then the built-in defaults.
pub fn base_options(args: &ToolchainArgs) -> Result<(ConfigureOptions, ToolchainSettings)> {
    let root = std::env::current_dir().context("failed to determine the current directory")?;
    let config = load_toolchain_config(
        global_toolchain_config_path().as_deref(),
        &project_toolchain_config_path(&root),
    );
    let settings = config.toolchain;
    let defaults_files = config.sources;

    let defaults = ConfigureOptions::default();
    let opts = ConfigureOptions {
        root,
        manifest_path: args.manifest.clone(),
        cxx: pick(args.cxx.clone(), settings.cxx.clone(), defaults.cxx.clone()),
        user_cflags: pick(args.cflags.clone(), settings.cflags.clone(), String::new()),
        debuginfo: args.debuginfo == 1,
        defaults_files,
        ..defaults
    };
    Ok((opts, settings))
}

/// First of command line, defaults file, built-in.
pub fn pick<T>(cli: Option<T>, file: Option<T>, builtin: T) -> T {
    cli.or(file).unwrap_or(builtin)
}

/// The program the regeneration rule should invoke.
pub fn self_command() -> PathBuf {
    std::env::current_exe().unwrap_or_else(|_| PathBuf::from("heroconf"))
}
