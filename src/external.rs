//! Delegated external steps.
//!
//! Two collaborators take part in configuration without being part of it:
//! the version generator, which writes version and release files, and the
//! sub-project, which is configured by its own script and then asked to
//! materialize a small `key: value` metadata file per mode. Both sit behind
//! [`ExternalSteps`] so the pipeline can be exercised without them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::core::error::ConfigureError;
use crate::core::manifest::{expand_mode, SubprojectSpec, VersionSpec};
use crate::core::options::ConfigureOptions;
use crate::util::fs::read_to_string;
use crate::util::process::{find_ninja, ProcessBuilder, NINJA_NAMES};

/// Version strings produced by the version generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: String,
    pub release: String,
}

impl VersionInfo {
    /// String-literal defines for the version source, e.g.
    /// `-DHERO_VERSION="\"1.2\"" -DHERO_RELEASE="\"0.1\""`.
    pub fn defines(&self, prefix: &str) -> String {
        format!(
            "-D{p}_VERSION=\"\\\"{v}\\\"\" -D{p}_RELEASE=\"\\\"{r}\\\"\"",
            p = prefix,
            v = self.version,
            r = self.release
        )
    }
}

/// Sub-project compile and link flags for one mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubprojectMetadata {
    pub cflags: String,
    pub libs: String,
}

/// The external steps of a configuration run.
pub trait ExternalSteps {
    /// Run the version generator and read back its files.
    fn generate_version(&self, spec: &VersionSpec) -> Result<VersionInfo>;

    /// Locate the build executor used for the sub-project.
    fn find_ninja(&self) -> Result<PathBuf>;

    /// Run the sub-project's own configure script.
    fn configure_subproject(&self, spec: &SubprojectSpec, flags: &[String]) -> Result<()>;

    /// Materialize and parse the sub-project metadata of every mode.
    fn subproject_metadata(
        &self,
        spec: &SubprojectSpec,
        ninja: &Path,
        modes: &[String],
        static_cxx: bool,
    ) -> Result<IndexMap<String, SubprojectMetadata>>;
}

/// Flags for the sub-project's configure script.
pub fn subproject_configure_flags(
    opts: &ConfigureOptions,
    spec: &SubprojectSpec,
    release_opt: &str,
) -> Vec<String> {
    let mut flags = Vec::new();
    if opts.dpdk {
        flags.push("--enable-dpdk".to_string());
    } else if let Some(ref target) = opts.dpdk_target {
        flags.push("--dpdk-target".to_string());
        flags.push(target.clone());
    }
    if opts.static_cxx {
        flags.push("--static-stdc++".to_string());
    }
    for group in &opts.static_libs {
        flags.push(format!("--static-{}", group));
    }
    if opts.gcc6_concepts {
        flags.push("--enable-gcc6-concepts".to_string());
    }
    if opts.alloc_failure_injector {
        flags.push("--enable-alloc-failure-injector".to_string());
    }

    let mut cflags = opts.user_cflags.clone();
    if !opts.target_arch.is_empty() {
        cflags.push_str(&format!(" -march={}", opts.target_arch));
    }

    flags.extend([
        "--compiler".to_string(),
        opts.cxx.display().to_string(),
        "--c-compiler".to_string(),
        opts.cc.display().to_string(),
        format!("--cflags={}", cflags),
        format!("--ldflags={}", opts.user_ldflags),
        format!("--c++-dialect={}", spec.cxx_dialect),
        format!("--optflags={}", release_opt),
    ]);
    flags
}

/// Parse a `key: value` metadata file into the `Cflags` and `Libs` entries.
///
/// With a statically linked C++ runtime the sub-project's `-lstdc++` is
/// dropped from `Libs`.
pub fn parse_metadata(content: &str, file: &str, static_cxx: bool) -> Result<SubprojectMetadata, ConfigureError> {
    let entries: IndexMap<&str, &str> = content
        .lines()
        .filter_map(|line| line.trim().split_once(": "))
        .collect();

    let get = |key: &str| {
        entries
            .get(key)
            .map(|v| v.to_string())
            .ok_or_else(|| ConfigureError::InvalidMetadata {
                file: file.to_string(),
                key: key.to_string(),
            })
    };

    let cflags = get("Cflags")?;
    let mut libs = get("Libs")?;
    if static_cxx {
        libs = libs.replace("-lstdc++ ", "");
    }
    Ok(SubprojectMetadata { cflags, libs })
}

/// Runs the external steps as real processes relative to the project root.
#[derive(Debug, Clone)]
pub struct ProcessSteps {
    root: PathBuf,
    python: PathBuf,
}

impl ProcessSteps {
    pub fn new(root: impl Into<PathBuf>, python: impl Into<PathBuf>) -> Self {
        ProcessSteps {
            root: root.into(),
            python: python.into(),
        }
    }

    fn run(&self, step: &str, cmd: ProcessBuilder) -> Result<()> {
        tracing::info!("running {}: {}", step, cmd.display_command());
        let status = cmd.status()?;
        if !status.success() {
            return Err(ConfigureError::DelegatedToolFailure {
                step: step.to_string(),
                command: cmd.display_command(),
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

impl ExternalSteps for ProcessSteps {
    fn generate_version(&self, spec: &VersionSpec) -> Result<VersionInfo> {
        let generator = self.root.join(&spec.generator);
        self.run(
            "version file generation",
            ProcessBuilder::new(generator).cwd(&self.root),
        )?;

        let read = |file: &str| -> Result<String> {
            let path = self.root.join(file);
            Ok(read_to_string(&path)
                .with_context(|| format!("version generator did not produce {}", path.display()))?
                .trim()
                .to_string())
        };
        Ok(VersionInfo {
            version: read(&spec.version_file)?,
            release: read(&spec.release_file)?,
        })
    }

    fn find_ninja(&self) -> Result<PathBuf> {
        find_ninja().ok_or_else(|| {
            ConfigureError::ToolNotFound {
                tool: "ninja".to_string(),
                candidates: NINJA_NAMES.iter().map(|s| s.to_string()).collect(),
            }
            .into()
        })
    }

    fn configure_subproject(&self, spec: &SubprojectSpec, flags: &[String]) -> Result<()> {
        let cmd = ProcessBuilder::new(&self.python)
            .arg(format!("./{}", spec.configure))
            .args(flags)
            .cwd(self.root.join(&spec.dir));
        self.run(&format!("{} configuration", spec.name), cmd)
    }

    fn subproject_metadata(
        &self,
        spec: &SubprojectSpec,
        ninja: &Path,
        modes: &[String],
        static_cxx: bool,
    ) -> Result<IndexMap<String, SubprojectMetadata>> {
        let dir = self.root.join(&spec.dir);
        let files: Vec<String> = modes.iter().map(|m| expand_mode(&spec.metadata, m)).collect();

        self.run(
            &format!("{} metadata generation", spec.name),
            ProcessBuilder::new(ninja).args(&files).cwd(&dir),
        )?;

        let mut metadata = IndexMap::new();
        for (mode, file) in modes.iter().zip(&files) {
            let content = read_to_string(&dir.join(file))?;
            let display = format!("{}/{}", spec.dir, file);
            metadata.insert(mode.clone(), parse_metadata(&content, &display, static_cxx)?);
        }
        Ok(metadata)
    }
}
