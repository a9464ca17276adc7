//! Typed configuration options.
//!
//! `ConfigureOptions` holds every value that steers a configuration run.
//! The CLI fills it from arguments and toolchain defaults files; library
//! users and tests build it directly from [`ConfigureOptions::default`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::core::manifest::MANIFEST_NAME;
use crate::util::host;

/// A feature switch with an automatic middle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate {
    /// Use the feature if its package is found
    #[default]
    Auto,
    /// Require the feature; a missing package is fatal
    Enabled,
    /// Never probe for the feature
    Disabled,
}

impl Tristate {
    /// Combine an `--enable-X` / `--disable-X` flag pair.
    pub fn from_flags(enable: bool, disable: bool) -> Self {
        match (enable, disable) {
            (true, false) => Tristate::Enabled,
            (false, true) => Tristate::Disabled,
            _ => Tristate::Auto,
        }
    }
}

/// Kind of binary the link rules produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// Ordinary executables
    #[default]
    Executable,
    /// Position-independent executables
    Pie,
    /// Shared objects instead of executables
    SharedObject,
}

impl OutputKind {
    /// Select from the `--pie` / `--so` switches; `--so` wins.
    pub fn from_flags(pie: bool, so: bool) -> Self {
        if so {
            OutputKind::SharedObject
        } else if pie {
            OutputKind::Pie
        } else {
            OutputKind::Executable
        }
    }

    /// Flag added to every compilation.
    pub fn compile_flag(&self) -> &'static str {
        match self {
            OutputKind::Executable => "",
            OutputKind::Pie => "-fpie",
            OutputKind::SharedObject => "-fpic",
        }
    }

    /// Flag added to every link.
    pub fn link_flag(&self) -> &'static str {
        match self {
            OutputKind::Executable => "",
            OutputKind::Pie => "-pie",
            OutputKind::SharedObject => "-shared",
        }
    }
}

/// Which build modes to emit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModeSelection {
    #[default]
    All,
    Only(String),
}

impl ModeSelection {
    /// Parse a `--mode` value.
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            ModeSelection::All
        } else {
            ModeSelection::Only(value.to_string())
        }
    }
}

/// Options for a configuration run.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// Project root; relative manifest paths resolve against it
    pub root: PathBuf,
    /// Project manifest (default `Configure.toml`)
    pub manifest_path: PathBuf,
    /// Link fully statically; also turns sanitizers off (default false)
    pub static_link: bool,
    /// Executable, PIE or shared object (default executable)
    pub output_kind: OutputKind,
    /// Modes to emit (default all)
    pub mode: ModeSelection,
    /// Artifacts to build; empty means all (default empty)
    pub artifacts: Vec<String>,
    /// Extra C++ compiler flags, also used by every trial compilation
    pub user_cflags: String,
    /// Extra linker flags
    pub user_ldflags: String,
    /// `-march` value for the sub-project (default `nehalem` on x86)
    pub target_arch: String,
    /// C++ compiler (default `g++`)
    pub cxx: PathBuf,
    /// C compiler handed to the sub-project (default `gcc`)
    pub cc: PathBuf,
    /// Build the sub-project's bundled DPDK (default false)
    pub dpdk: bool,
    /// Path to an external DPDK SDK target
    pub dpdk_target: Option<String>,
    /// Emit debug information (default true)
    pub debuginfo: bool,
    /// Keep debug information in test binaries (default false)
    pub tests_debuginfo: bool,
    /// Link libgcc and libstdc++ statically (default false)
    pub static_cxx: bool,
    /// Library groups to link statically, e.g. `boost`, `yaml-cpp`
    pub static_libs: BTreeSet<String>,
    /// Interpreter for the sub-project's configure script (default `python3`)
    pub python: PathBuf,
    /// Package registry program (default `pkg-config`)
    pub pkg_config: PathBuf,
    /// Tristate features, e.g. `hwloc`, `xen`; absent means auto
    pub features: BTreeMap<String, Tristate>,
    /// Enable experimental GCC 6 concepts in the sub-project
    pub gcc6_concepts: bool,
    /// Enable allocation failure injection in the sub-project
    pub alloc_failure_injector: bool,
    /// Arguments to replay when the build file regenerates itself
    pub configure_args: Vec<String>,
    /// Program the regeneration rule invokes
    pub self_command: PathBuf,
    /// Toolchain defaults files the options were read from; editing one
    /// regenerates the build file
    pub defaults_files: Vec<PathBuf>,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        ConfigureOptions {
            root: PathBuf::from("."),
            manifest_path: PathBuf::from(MANIFEST_NAME),
            static_link: false,
            output_kind: OutputKind::default(),
            mode: ModeSelection::All,
            artifacts: Vec::new(),
            user_cflags: String::new(),
            user_ldflags: String::new(),
            target_arch: host::default_target_arch(),
            cxx: PathBuf::from("g++"),
            cc: PathBuf::from("gcc"),
            dpdk: false,
            dpdk_target: None,
            debuginfo: true,
            tests_debuginfo: false,
            static_cxx: false,
            static_libs: BTreeSet::new(),
            python: PathBuf::from("python3"),
            pkg_config: PathBuf::from("pkg-config"),
            features: BTreeMap::new(),
            gcc6_concepts: false,
            alloc_failure_injector: false,
            configure_args: Vec::new(),
            self_command: PathBuf::from("heroconf"),
            defaults_files: Vec::new(),
        }
    }
}

impl ConfigureOptions {
    /// User compiler flags as separate tokens.
    pub fn user_cflag_list(&self) -> Vec<String> {
        self.user_cflags.split_whitespace().map(String::from).collect()
    }

    /// State of a tristate feature.
    pub fn feature(&self, name: &str) -> Tristate {
        self.features.get(name).copied().unwrap_or_default()
    }

    /// Whether a library group is linked statically.
    pub fn is_static(&self, group: &str) -> bool {
        self.static_libs.contains(group)
    }

    /// Whether sanitizer flags apply; a fully static link cannot use them.
    pub fn sanitize(&self) -> bool {
        !self.static_link
    }

    /// Wrap `libs` in a static-link group when `group` is linked statically.
    ///
    /// A fully static link needs no wrapping.
    pub fn maybe_static(&self, group: Option<&str>, libs: &str) -> String {
        match group {
            Some(g) if self.is_static(g) && !self.static_link => {
                format!("-Wl,-Bstatic {} -Wl,-Bdynamic", libs)
            }
            _ => libs.to_string(),
        }
    }

    /// Resolve a project-relative path.
    pub fn project_path(&self, relative: impl AsRef<std::path::Path>) -> PathBuf {
        self.root.join(relative)
    }
}
