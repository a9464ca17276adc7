//! `Configure.toml` manifest parsing and schema.
//!
//! The manifest is the declarative description of a project: which
//! artifacts exist, which source modules they are built from, which compiler
//! flags are worth probing for, which system packages are optional, and
//! which external collaborators (version generator, sub-project) take part
//! in configuration.

use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::artifact::{ArtifactCategory, ArtifactRegistry};
use crate::core::error::ConfigureError;
use crate::core::mode::{default_modes, BuildMode};
use crate::core::package::OptionalPackage;

/// Default manifest file name.
pub const MANIFEST_NAME: &str = "Configure.toml";

/// The project manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    /// Project-wide settings
    #[serde(default)]
    pub project: ProjectSettings,

    /// Artifact names per category
    #[serde(default)]
    pub artifacts: ArtifactLists,

    /// Named module sets, referenced from `[sources]` as `@name`
    #[serde(default)]
    pub modules: IndexMap<String, Vec<String>>,

    /// Source modules of non-test artifacts
    #[serde(default)]
    pub sources: IndexMap<String, Vec<String>>,

    /// Test framework settings
    #[serde(default)]
    pub tests: TestSettings,

    /// Candidate flags to probe
    #[serde(default)]
    pub probe: ProbeSettings,

    /// Build modes; empty means the built-in debug/release table
    #[serde(default)]
    pub modes: IndexMap<String, BuildMode>,

    /// Optional system packages
    #[serde(default)]
    pub optional_packages: Vec<OptionalPackage>,

    /// Libraries linked into every binary
    #[serde(default)]
    pub libs: Vec<LinkLibrary>,

    /// Extra compiler flags for individual source modules
    #[serde(default)]
    pub extra_cxxflags: IndexMap<String, String>,

    /// The library the project cannot be built without
    #[serde(default)]
    pub required_library: Option<RequiredLibrary>,

    /// Delegated sub-project built by its own configure step
    #[serde(default)]
    pub subproject: Option<SubprojectSpec>,

    /// Version-string generator
    #[serde(default)]
    pub version: Option<VersionSpec>,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectSettings {
    /// Project name
    #[serde(default)]
    pub name: String,

    /// Output directory, bound to `$builddir`
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Generated build file
    #[serde(default = "default_buildfile")]
    pub buildfile: String,

    /// Include directories for every compilation; `{mode}` is substituted
    #[serde(default = "default_include_dirs")]
    pub include_dirs: Vec<String>,

    /// Defines added to every compilation
    #[serde(default)]
    pub defines: Vec<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        ProjectSettings {
            name: String::new(),
            build_dir: default_build_dir(),
            buildfile: default_buildfile(),
            include_dirs: default_include_dirs(),
            defines: Vec::new(),
        }
    }
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_buildfile() -> String {
    "build.ninja".to_string()
}

fn default_include_dirs() -> Vec<String> {
    vec![".".to_string(), "$builddir/{mode}/gen".to_string()]
}

/// `[artifacts]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactLists {
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub tests: Vec<String>,
    #[serde(default)]
    pub perf_tests: Vec<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

/// `[tests]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestSettings {
    /// Tests that do not use the shared test framework
    #[serde(default)]
    pub bypass_framework: Vec<String>,

    /// Bypassing tests that still link the unit-test library
    #[serde(default)]
    pub pure_boost: Vec<String>,

    /// Libraries linked into tests that use the unit-test library
    #[serde(default)]
    pub framework_libs: Vec<LinkLibrary>,
}

/// `[probe]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProbeSettings {
    /// Warning flags kept only if the compiler accepts them
    #[serde(default = "default_warnings")]
    pub warnings: Vec<String>,

    /// Warning flags appended without probing
    #[serde(default = "default_always_warnings")]
    pub always_warnings: Vec<String>,

    /// Release-mode optimization flags kept only if accepted
    #[serde(default = "default_optimization")]
    pub optimization: Vec<String>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        ProbeSettings {
            warnings: default_warnings(),
            always_warnings: default_always_warnings(),
            optimization: default_optimization(),
        }
    }
}

fn default_warnings() -> Vec<String> {
    [
        "-Wno-mismatched-tags",
        "-Wno-maybe-uninitialized",
        "-Wno-tautological-compare",
        "-Wno-parentheses-equality",
        "-Wno-c++11-narrowing",
        "-Wno-c++1z-extensions",
        "-Wno-sometimes-uninitialized",
        "-Wno-return-stack-address",
        "-Wno-missing-braces",
        "-Wno-unused-lambda-capture",
        "-Wno-misleading-indentation",
        "-Wno-overflow",
        "-Wno-noexcept-type",
        "-Wno-nonnull-compare",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_always_warnings() -> Vec<String> {
    vec!["-Wno-error=deprecated-declarations".to_string()]
}

fn default_optimization() -> Vec<String> {
    vec!["--param inline-unit-growth=300".to_string()]
}

/// A library (or group of libraries) on the link line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkLibrary {
    /// Linker flags, e.g. `-lboost_filesystem`
    pub flags: String,

    /// Static-link group this library belongs to (e.g. `boost`)
    #[serde(default)]
    pub static_group: Option<String>,
}

/// `[required-library]` section: presence and minimum version are probed,
/// and failure aborts configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequiredLibrary {
    /// Display name
    pub name: String,
    /// Distribution package to install
    pub package: String,
    /// Header that must be includable
    pub header: String,
    /// Macro holding the numeric version
    pub version_macro: String,
    /// Minimum accepted value of `version_macro`
    pub min_version: u64,
    /// Static-link group of this library
    #[serde(default)]
    pub static_group: Option<String>,
    /// Compile flags added when the library is linked dynamically
    #[serde(default)]
    pub dynamic_cflags: String,
}

impl RequiredLibrary {
    /// Boost 1.55 or newer.
    pub fn boost() -> Self {
        RequiredLibrary {
            name: "boost".to_string(),
            package: "boost-devel".to_string(),
            header: "boost/version.hpp".to_string(),
            version_macro: "BOOST_VERSION".to_string(),
            min_version: 105500,
            static_group: Some("boost".to_string()),
            dynamic_cflags: "-DBOOST_TEST_DYN_LINK".to_string(),
        }
    }
}

/// `[subproject]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubprojectSpec {
    /// Sub-project name, used in messages
    pub name: String,
    /// Directory of the sub-project, relative to the project root
    pub dir: String,
    /// Configure script, relative to `dir`
    #[serde(default = "default_subproject_configure")]
    pub configure: String,
    /// Static library produced per mode, relative to `dir`
    pub library: String,
    /// Metadata file produced per mode, relative to `dir`
    pub metadata: String,
    /// Headers generated by the sub-project build, relative to `dir`
    #[serde(default)]
    pub generated_headers: Vec<String>,
    /// Further outputs of the sub-project build, relative to `dir`
    #[serde(default)]
    pub extra_outputs: Vec<String>,
    /// Include directories for the project's own compilations
    #[serde(default)]
    pub include_dirs: Vec<String>,
    /// C++ dialect requested from the sub-project
    #[serde(default = "default_cxx_dialect")]
    pub cxx_dialect: String,
}

fn default_subproject_configure() -> String {
    "configure.py".to_string()
}

fn default_cxx_dialect() -> String {
    "gnu++1z".to_string()
}

/// `[version]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VersionSpec {
    /// Program that writes the version and release files
    pub generator: String,
    /// File holding the version string
    pub version_file: String,
    /// File holding the release string
    pub release_file: String,
    /// Source module that receives the version defines
    pub source: String,
    /// Prefix of the `<PREFIX>_VERSION` / `<PREFIX>_RELEASE` defines
    pub define_prefix: String,
}

/// Substitute the `{mode}` placeholder.
pub fn expand_mode(template: &str, mode: &str) -> String {
    template.replace("{mode}", mode)
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&content, path)
    }

    /// Parse manifest content; `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        manifest
            .check_packages()
            .with_context(|| format!("invalid manifest: {}", path.display()))?;
        Ok(manifest)
    }

    fn check_packages(&self) -> Result<()> {
        for (i, pkg) in self.optional_packages.iter().enumerate() {
            if pkg.alternatives.iter().all(|name| name.trim().is_empty()) {
                bail!("[[optional-packages]] entry {} names no package", i + 1);
            }
        }
        Ok(())
    }

    /// Build the artifact registry from the `[artifacts]` lists.
    pub fn registry(&self) -> Result<ArtifactRegistry, ConfigureError> {
        let mut registry = ArtifactRegistry::new();
        registry.extend(&self.artifacts.apps, ArtifactCategory::App)?;
        registry.extend(&self.artifacts.tests, ArtifactCategory::Test)?;
        registry.extend(&self.artifacts.perf_tests, ArtifactCategory::PerfTest)?;
        registry.extend(&self.artifacts.other, ArtifactCategory::Other)?;
        Ok(registry)
    }

    /// The mode table, named after the `[modes]` keys.
    pub fn build_modes(&self) -> Vec<BuildMode> {
        if self.modes.is_empty() {
            return default_modes();
        }
        self.modes
            .iter()
            .map(|(name, mode)| BuildMode {
                name: name.clone(),
                ..mode.clone()
            })
            .collect()
    }

    /// The mandatory library; boost unless `[required-library]` says
    /// otherwise.
    pub fn mandatory_library(&self) -> RequiredLibrary {
        self.required_library.clone().unwrap_or_else(RequiredLibrary::boost)
    }

    /// Look up a named module set.
    pub fn module_set(&self, name: &str) -> Option<&[String]> {
        self.modules.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MANIFEST: &str = r#"
[project]
name = "hero"

[artifacts]
apps = ["hero"]
tests = ["tests/basic_test", "tests/raw_test"]
other = ["iotune"]

[modules]
core = ["core/server.cc"]

[sources]
hero = ["main.cc", "@core"]

[tests]
bypass-framework = ["tests/raw_test"]
framework-libs = [{ flags = "-lboost_unit_test_framework", static-group = "boost" }]

[[optional-packages]]
alternatives = ["libsystemd", "libsystemd-daemon"]

[[optional-packages]]
alternatives = ["hwloc"]
feature = "hwloc"

[[libs]]
flags = "-lyaml-cpp"
static-group = "yaml-cpp"

[[libs]]
flags = "-lz"

[extra-cxxflags]
"core/server.cc" = "-fno-strict-aliasing"

[subproject]
name = "seastar"
dir = "seastar"
library = "build/{mode}/libseastar.a"
metadata = "build/{mode}/seastar.pc"
generated-headers = ["build/{mode}/gen/http/request_parser.hh"]
"#;

    fn manifest() -> Manifest {
        Manifest::parse(MANIFEST, &PathBuf::from("Configure.toml")).unwrap()
    }

    #[test]
    fn test_parse_manifest() {
        let m = manifest();
        assert_eq!(m.project.name, "hero");
        assert_eq!(m.project.build_dir, "build");
        assert_eq!(m.project.buildfile, "build.ninja");
        assert_eq!(m.artifacts.tests.len(), 2);
        assert_eq!(m.module_set("core"), Some(&["core/server.cc".to_string()][..]));
        assert_eq!(m.tests.bypass_framework, ["tests/raw_test"]);
        assert_eq!(m.tests.framework_libs[0].static_group.as_deref(), Some("boost"));
        assert_eq!(m.optional_packages[1].feature.as_deref(), Some("hwloc"));
        assert_eq!(m.libs[1].static_group, None);
        assert_eq!(m.extra_cxxflags["core/server.cc"], "-fno-strict-aliasing");
        let sub = m.subproject.as_ref().unwrap();
        assert_eq!(sub.configure, "configure.py");
        assert_eq!(sub.cxx_dialect, "gnu++1z");
        assert!(m.required_library.is_none());
        assert_eq!(m.mandatory_library().min_version, 105500);
        assert!(m.version.is_none());
    }

    #[test]
    fn test_optional_package_without_alternatives_rejected() {
        let text = "[[optional-packages]]\nalternatives = [\"hwloc\"]\n\n\
                    [[optional-packages]]\nalternatives = []\nfeature = \"xen\"\n";
        let err = Manifest::parse(text, &PathBuf::from("Configure.toml")).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("invalid manifest: Configure.toml"));
        assert!(message.contains("entry 2 names no package"));
    }

    #[test]
    fn test_probe_defaults() {
        let m = manifest();
        assert_eq!(m.probe.warnings.len(), 14);
        assert_eq!(m.probe.warnings[0], "-Wno-mismatched-tags");
        assert_eq!(m.probe.always_warnings, ["-Wno-error=deprecated-declarations"]);
        assert_eq!(m.probe.optimization, ["--param inline-unit-growth=300"]);
    }

    #[test]
    fn test_default_modes_when_unset() {
        let names: Vec<_> = manifest()
            .build_modes()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["debug", "release"]);
    }

    #[test]
    fn test_custom_modes_keep_declaration_order() {
        let m = Manifest::parse(
            r#"
[modes.release]
opt = "-O2"

[modes.dev]
opt = "-O1"
sanitize = "-fsanitize=address"
"#,
            Path::new("Configure.toml"),
        )
        .unwrap();

        let modes = m.build_modes();
        assert_eq!(modes[0].name, "release");
        assert_eq!(modes[0].opt, "-O2");
        assert_eq!(modes[1].name, "dev");
        assert!(modes[1].is_sanitized());
    }

    #[test]
    fn test_registry_from_lists() {
        let registry = manifest().registry().unwrap();
        assert_eq!(registry.names(), ["hero", "tests/basic_test", "tests/raw_test", "iotune"]);
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut m = manifest();
        m.artifacts.other.push("hero".to_string());
        assert!(matches!(
            m.registry(),
            Err(ConfigureError::DuplicateArtifact(ref n)) if n == "hero"
        ));
    }

    #[test]
    fn test_parse_error_mentions_path() {
        let err = Manifest::parse("[project", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_expand_mode() {
        assert_eq!(expand_mode("build/{mode}/libseastar.a", "debug"), "build/debug/libseastar.a");
    }
}
