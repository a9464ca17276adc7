//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use heroconf::core::manifest::MANIFEST_NAME;

/// heroconf - probe a C++ toolchain and generate a ninja build file
#[derive(Parser)]
#[command(name = "heroconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the toolchain and write the build file
    Configure(ConfigureArgs),

    /// Report what the compiler supports without writing anything
    Probe(ProbeArgs),
}

/// Options shared by every command that runs trial compilations.
#[derive(Args)]
pub struct ToolchainArgs {
    /// Project manifest
    #[arg(long, default_value = MANIFEST_NAME)]
    pub manifest: PathBuf,

    /// C++ compiler
    #[arg(long = "compiler", env = "CXX")]
    pub cxx: Option<PathBuf>,

    /// Extra flags for the C++ compiler
    #[arg(long, allow_hyphen_values = true)]
    pub cflags: Option<String>,

    /// Compile with debug information (0 or 1)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub debuginfo: u8,
}

#[derive(Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub toolchain: ToolchainArgs,

    /// Link statically (sanitizers are disabled)
    #[arg(long = "static")]
    pub static_link: bool,

    /// Build position-independent executables
    #[arg(long)]
    pub pie: bool,

    /// Build shared objects instead of executables
    #[arg(long)]
    pub so: bool,

    /// Build mode to emit, or `all`
    #[arg(long, default_value = "all")]
    pub mode: String,

    /// Only build this artifact (repeatable)
    #[arg(long = "with", value_name = "ARTIFACT")]
    pub artifacts: Vec<String>,

    /// Extra flags for the linker
    #[arg(long, allow_hyphen_values = true)]
    pub ldflags: Option<String>,

    /// Target architecture passed as -march to the sub-project
    #[arg(long)]
    pub target: Option<String>,

    /// C compiler handed to the sub-project
    #[arg(long = "c-compiler", env = "CC")]
    pub cc: Option<PathBuf>,

    /// Build the sub-project with its bundled DPDK
    #[arg(long)]
    pub enable_dpdk: bool,

    /// Path to an external DPDK SDK target
    #[arg(long)]
    pub dpdk_target: Option<String>,

    /// Keep debug information in test binaries (0 or 1)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub tests_debuginfo: u8,

    /// Link libgcc and libstdc++ statically
    #[arg(long = "static-stdc++")]
    pub static_cxx: bool,

    /// Link boost statically
    #[arg(long)]
    pub static_boost: bool,

    /// Link yaml-cpp statically
    #[arg(long)]
    pub static_yaml_cpp: bool,

    /// Python interpreter for the sub-project's configure script
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Package registry program
    #[arg(long, env = "PKG_CONFIG")]
    pub pkg_config: Option<PathBuf>,

    /// Require hwloc
    #[arg(long, conflicts_with = "disable_hwloc")]
    pub enable_hwloc: bool,

    /// Never use hwloc
    #[arg(long)]
    pub disable_hwloc: bool,

    /// Require Xen support
    #[arg(long, conflicts_with = "disable_xen")]
    pub enable_xen: bool,

    /// Never use Xen support
    #[arg(long)]
    pub disable_xen: bool,

    /// Enable experimental GCC 6 concepts in the sub-project
    #[arg(long)]
    pub enable_gcc6_concepts: bool,

    /// Enable allocation failure injection in the sub-project
    #[arg(long)]
    pub enable_alloc_failure_injector: bool,
}

#[derive(Args)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub toolchain: ToolchainArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
