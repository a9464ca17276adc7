//! Test utilities and mocks for heroconf unit tests.
//!
//! The configuration pipeline talks to three collaborators: the trial
//! compiler, the package registry and the delegated external steps. This
//! module provides recording mock implementations of each, so stages can be
//! tested without a real toolchain.
//!
//! # Example
//!
//! ```rust,ignore
//! use heroconf::test_support::{fixtures, MockCompiler};
//!
//! #[test]
//! fn test_example() {
//!     let cc = MockCompiler::new().reject_flag("-fuse-ld=gold");
//!     let caps = probe_toolchain(&cc, &fixtures::manifest().probe, true).unwrap();
//!     assert!(caps.gold_linker_flag.is_none());
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use indexmap::IndexMap;

use crate::core::error::ConfigureError;
use crate::core::manifest::{expand_mode, SubprojectSpec, VersionSpec};
use crate::external::{ExternalSteps, SubprojectMetadata, VersionInfo};
use crate::packages::PackageRegistry;
use crate::toolchain::TrialCompiler;

/// One recorded trial compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialCall {
    pub source: String,
    pub flags: Vec<String>,
}

/// Trial compiler that accepts everything except what it is told to reject.
#[derive(Debug, Default)]
pub struct MockCompiler {
    rejected_flags: Vec<String>,
    rejected_sources: Vec<String>,
    calls: Mutex<Vec<TrialCall>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any attempt passing exactly this flag.
    pub fn reject_flag(mut self, flag: &str) -> Self {
        self.rejected_flags.push(flag.to_string());
        self
    }

    /// Reject any attempt whose source contains `fragment`.
    pub fn reject_source(mut self, fragment: &str) -> Self {
        self.rejected_sources.push(fragment.to_string());
        self
    }

    /// Every attempt so far, in order.
    pub fn calls(&self) -> Vec<TrialCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TrialCompiler for MockCompiler {
    fn try_compile_and_link(&self, source: &str, flags: &[String]) -> Result<bool> {
        self.calls.lock().unwrap().push(TrialCall {
            source: source.to_string(),
            flags: flags.to_vec(),
        });

        let flag_rejected = flags.iter().any(|f| self.rejected_flags.contains(f));
        let source_rejected = self.rejected_sources.iter().any(|s| source.contains(s.as_str()));
        Ok(!flag_rejected && !source_rejected)
    }
}

/// Package registry backed by an in-memory table.
#[derive(Debug, Default)]
pub struct MockRegistry {
    packages: IndexMap<String, (String, String)>,
    queried: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an installed package.
    pub fn with_package(mut self, name: &str, cflags: &str, libs: &str) -> Self {
        self.packages
            .insert(name.to_string(), (cflags.to_string(), libs.to_string()));
        self
    }

    /// Names passed to `exists`, in order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    fn lookup(&self, name: &str) -> Result<&(String, String)> {
        self.packages
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("package `{}` was not found", name))
    }
}

impl PackageRegistry for MockRegistry {
    fn name(&self) -> &str {
        "mock"
    }

    fn exists(&self, package: &str) -> bool {
        self.queried.lock().unwrap().push(package.to_string());
        self.packages.contains_key(package)
    }

    fn cflags(&self, package: &str) -> Result<String> {
        Ok(self.lookup(package)?.0.clone())
    }

    fn libs(&self, package: &str) -> Result<String> {
        Ok(self.lookup(package)?.1.clone())
    }
}

/// External steps that succeed without running anything.
///
/// Sub-project metadata is synthesized per mode: `Cflags` is
/// `-I<dir>/include-<mode>` and `Libs` is `-l<name>-<mode>`.
#[derive(Debug)]
pub struct MockSteps {
    ninja: Option<PathBuf>,
    version: VersionInfo,
    fail_configure: bool,
    configured: Mutex<Option<Vec<String>>>,
    metadata_modes: Mutex<Vec<String>>,
}

impl Default for MockSteps {
    fn default() -> Self {
        MockSteps {
            ninja: Some(PathBuf::from("/usr/bin/ninja")),
            version: VersionInfo {
                version: "1.0".to_string(),
                release: "0.1".to_string(),
            },
            fail_configure: false,
            configured: Mutex::new(None),
            metadata_modes: Mutex::new(Vec::new()),
        }
    }
}

impl MockSteps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the sub-project configure script fail.
    pub fn fail_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    /// Pretend ninja is not installed.
    pub fn without_ninja(mut self) -> Self {
        self.ninja = None;
        self
    }

    /// Flags the sub-project was configured with, if it was.
    pub fn configure_flags(&self) -> Option<Vec<String>> {
        self.configured.lock().unwrap().clone()
    }

    /// Modes metadata was requested for.
    pub fn metadata_modes(&self) -> Vec<String> {
        self.metadata_modes.lock().unwrap().clone()
    }
}

impl ExternalSteps for MockSteps {
    fn generate_version(&self, _spec: &VersionSpec) -> Result<VersionInfo> {
        Ok(self.version.clone())
    }

    fn find_ninja(&self) -> Result<PathBuf> {
        self.ninja.clone().ok_or_else(|| {
            ConfigureError::ToolNotFound {
                tool: "ninja".to_string(),
                candidates: vec!["ninja".to_string(), "ninja-build".to_string()],
            }
            .into()
        })
    }

    fn configure_subproject(&self, spec: &SubprojectSpec, flags: &[String]) -> Result<()> {
        if self.fail_configure {
            return Err(ConfigureError::DelegatedToolFailure {
                step: format!("{} configuration", spec.name),
                command: format!("python3 ./{}", spec.configure),
                code: Some(1),
            }
            .into());
        }
        *self.configured.lock().unwrap() = Some(flags.to_vec());
        Ok(())
    }

    fn subproject_metadata(
        &self,
        spec: &SubprojectSpec,
        _ninja: &Path,
        modes: &[String],
        _static_cxx: bool,
    ) -> Result<IndexMap<String, SubprojectMetadata>> {
        self.metadata_modes.lock().unwrap().extend(modes.iter().cloned());
        Ok(modes
            .iter()
            .map(|mode| {
                let meta = SubprojectMetadata {
                    cflags: format!("-I{}", expand_mode(&format!("{}/include-{{mode}}", spec.dir), mode)),
                    libs: format!("-l{}-{}", spec.name, mode),
                };
                (mode.clone(), meta)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_compiler_records_and_rejects() {
        let cc = MockCompiler::new().reject_flag("-Wbogus").reject_source("#error");

        assert!(cc.try_compile("int x;", &[]).unwrap());
        assert!(!cc.try_compile("int x;", &["-Wbogus".to_string()]).unwrap());
        assert!(!cc.try_compile_and_link("#error no\n", &[]).unwrap());

        let calls = cc.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].flags, ["-c"]);
        assert_eq!(calls[2].source, "#error no\n");
    }

    #[test]
    fn test_mock_registry() {
        let registry = MockRegistry::new().with_package("hwloc", "-I/hw", "-lhwloc");

        assert!(registry.exists("hwloc"));
        assert!(!registry.exists("xenstore"));
        assert_eq!(registry.cflags("hwloc").unwrap(), "-I/hw");
        assert!(registry.libs("xenstore").is_err());
        assert_eq!(registry.queried(), ["hwloc", "xenstore"]);
    }

    #[test]
    fn test_mock_steps_metadata() {
        let steps = MockSteps::new();
        let modes = vec!["debug".to_string()];
        let meta = steps
            .subproject_metadata(&fixtures::subproject(), Path::new("ninja"), &modes, false)
            .unwrap();

        assert_eq!(meta["debug"].cflags, "-Iseastar/include-debug");
        assert_eq!(meta["debug"].libs, "-lseastar-debug");
        assert_eq!(steps.metadata_modes(), ["debug"]);
        assert!(MockSteps::new().without_ninja().find_ninja().is_err());
    }
}
