//! The immutable snapshot graph emission reads.
//!
//! Every probed, resolved or delegated value is folded into a
//! [`GraphInputs`] before the first edge is emitted, so emission is a pure
//! function of this snapshot.

use indexmap::IndexMap;

use crate::core::artifact::Artifact;
use crate::core::manifest::{expand_mode, Manifest, SubprojectSpec};
use crate::core::mode::BuildMode;
use crate::core::options::ConfigureOptions;
use crate::external::SubprojectMetadata;
use crate::packages::PackageResolution;
use crate::resolver::DependencyTable;
use crate::toolchain::Capabilities;

/// Name of the mode that receives the probed optimization flags.
pub const RELEASE_MODE: &str = "release";

/// Flags of one build mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeInputs {
    pub name: String,
    /// Optimization, sanitizer and include flags
    pub cxxflags: String,
    /// Sanitizer runtime libraries, empty when sanitizers are off
    pub sanitize_libs: String,
    pub libs: String,
    /// Sub-project compile flags for this mode
    pub subproject_cflags: String,
    /// Sub-project link flags for this mode
    pub subproject_libs: String,
}

/// The delegated sub-project as seen by the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprojectInputs {
    /// Sub-project directory, relative to the project root
    pub dir: String,
    /// Ninja executable used to build it
    pub ninja: String,
    /// Library, relative to `dir`, with a `{mode}` placeholder
    pub library: String,
    /// Generated headers, relative to `dir`
    pub generated_headers: Vec<String>,
    /// Further outputs, relative to `dir`
    pub extra_outputs: Vec<String>,
    /// Configure script, relative to the project root
    pub configure_script: String,
}

impl SubprojectInputs {
    pub fn new(spec: &SubprojectSpec, ninja: impl Into<String>) -> Self {
        SubprojectInputs {
            dir: spec.dir.clone(),
            ninja: ninja.into(),
            library: spec.library.clone(),
            generated_headers: spec.generated_headers.clone(),
            extra_outputs: spec.extra_outputs.clone(),
            configure_script: format!("{}/{}", spec.dir, spec.configure),
        }
    }

    fn in_dir(&self, relative: &str, mode: &str) -> String {
        format!("{}/{}", self.dir, expand_mode(relative, mode))
    }

    /// The library linked into every executable of `mode`.
    pub fn library_path(&self, mode: &str) -> String {
        self.in_dir(&self.library, mode)
    }

    /// Generated headers compilations of `mode` wait for.
    pub fn header_paths(&self, mode: &str) -> Vec<String> {
        self.generated_headers
            .iter()
            .map(|h| self.in_dir(h, mode))
            .collect()
    }

    /// Everything the sub-project build produces for `mode`, relative to
    /// `dir`.
    pub fn targets(&self, mode: &str) -> Vec<String> {
        std::iter::once(&self.library)
            .chain(&self.generated_headers)
            .chain(&self.extra_outputs)
            .map(|p| expand_mode(p, mode))
            .collect()
    }
}

/// Everything graph emission needs.
#[derive(Debug, Clone)]
pub struct GraphInputs {
    /// Shell-quoted arguments replayed on regeneration
    pub configure_args: String,
    /// Shell-quoted program the regeneration rule invokes
    pub self_command: String,
    pub build_dir: String,
    pub buildfile: String,
    /// Manifest path, relative to the project root
    pub manifest_path: String,
    /// Further files the build file is regenerated from
    pub defaults_files: Vec<String>,
    pub cxx: String,
    pub cxxflags: String,
    pub ldflags: String,
    pub libs: String,
    /// Selected modes, in declaration order
    pub modes: Vec<ModeInputs>,
    /// Selected artifacts, in declaration order
    pub artifacts: Vec<Artifact>,
    pub table: DependencyTable,
    /// Libraries of tests linking the unit-test framework
    pub framework_libs: String,
    /// Extra compile flags per source module
    pub extra_cxxflags: IndexMap<String, String>,
    /// Link tests with debug info instead of stripping them
    pub tests_debuginfo: bool,
    pub link_pool_depth: u32,
    pub subproject: Option<SubprojectInputs>,
}

/// Join flag fragments, skipping empty ones.
pub fn join_flags<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter_map(|p| {
            let p = p.as_ref().trim();
            (!p.is_empty()).then(|| p.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append the accepted optimization flags to the release mode.
pub fn apply_optimization(mut modes: Vec<BuildMode>, caps: &Capabilities) -> Vec<BuildMode> {
    let extra = caps.optimization();
    if extra.is_empty() {
        return modes;
    }
    for mode in modes.iter_mut().filter(|m| m.name == RELEASE_MODE) {
        mode.opt = join_flags([mode.opt.as_str(), extra.as_str()]);
    }
    modes
}

/// Global compile flags.
pub fn global_cxxflags(
    opts: &ConfigureOptions,
    manifest: &Manifest,
    caps: &Capabilities,
    packages: &PackageResolution,
) -> String {
    let project_defines = manifest
        .project
        .defines
        .iter()
        .map(|d| format!("-D{}", d))
        .collect::<Vec<_>>()
        .join(" ");
    let library = manifest.mandatory_library();
    let library_cflags = match library.static_group {
        Some(ref group) if opts.is_static(group) => "",
        _ => library.dynamic_cflags.as_str(),
    };
    let package_cflags = packages.cflags.join(" ");

    join_flags([
        opts.user_cflags.as_str(),
        library_cflags,
        package_cflags.as_str(),
        caps.warning_flags().as_str(),
        project_defines.as_str(),
        packages.define_flags().as_str(),
        caps.debug_flag.as_deref().unwrap_or(""),
        opts.output_kind.compile_flag(),
    ])
}

/// Global link flags.
pub fn global_ldflags(opts: &ConfigureOptions, caps: &Capabilities) -> String {
    join_flags([
        caps.gold_linker_flag.as_deref().unwrap_or(""),
        opts.user_ldflags.as_str(),
        if opts.static_cxx { "-static-libgcc -static-libstdc++" } else { "" },
        opts.output_kind.link_flag(),
        if opts.static_link { "-static" } else { "" },
    ])
}

/// Libraries linked into every binary.
pub fn global_libs(opts: &ConfigureOptions, manifest: &Manifest, packages: &PackageResolution) -> String {
    let manifest_libs = manifest
        .libs
        .iter()
        .map(|lib| opts.maybe_static(lib.static_group.as_deref(), &lib.flags));
    join_flags(manifest_libs.chain(packages.libs.iter().cloned()))
}

/// Libraries of tests using the unit-test framework.
pub fn framework_libs(opts: &ConfigureOptions, manifest: &Manifest) -> String {
    join_flags(
        manifest
            .tests
            .framework_libs
            .iter()
            .map(|lib| opts.maybe_static(lib.static_group.as_deref(), &lib.flags)),
    )
}

/// Per-mode flags.
///
/// `include_dirs` may contain `{mode}` placeholders.
pub fn mode_inputs(
    mode: &BuildMode,
    opts: &ConfigureOptions,
    caps: &Capabilities,
    include_dirs: &[String],
    subproject: Option<&SubprojectMetadata>,
) -> ModeInputs {
    let sanitized = opts.sanitize() && mode.is_sanitized();
    let includes = include_dirs
        .iter()
        .map(|dir| format!("-I{}", expand_mode(dir, &mode.name)))
        .collect::<Vec<_>>()
        .join(" ");

    let cxxflags = if sanitized {
        join_flags([
            mode.opt.as_str(),
            mode.sanitize.as_str(),
            caps.sanitizer_extra(),
            includes.as_str(),
        ])
    } else {
        join_flags([mode.opt.as_str(), includes.as_str()])
    };

    let subproject = subproject.cloned().unwrap_or_default();

    ModeInputs {
        name: mode.name.clone(),
        cxxflags,
        sanitize_libs: if sanitized { mode.sanitize_libs.trim().to_string() } else { String::new() },
        libs: mode.libs.trim().to_string(),
        subproject_cflags: subproject.cflags,
        subproject_libs: subproject.libs,
    }
}
