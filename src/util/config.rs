//! Toolchain defaults files.
//!
//! A machine usually builds with the same compiler and flags every time, so
//! those can live in a TOML file instead of on every command line:
//!
//! - `~/.heroconf/toolchain.toml` applies to every project of the user
//! - `.heroconf/toolchain.toml` in the project root overrides it
//!
//! Command-line options always win over both files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = ".heroconf";
const CONFIG_FILE: &str = "toolchain.toml";

/// Contents of a defaults file. Everything lives under `[toolchain]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub toolchain: ToolchainSettings,
    /// Files present on disk when the settings were merged
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainSettings {
    pub cxx: Option<PathBuf>,
    /// C compiler handed to the sub-project
    pub cc: Option<PathBuf>,
    pub cflags: Option<String>,
    pub ldflags: Option<String>,
    /// `-march` value for the sub-project
    pub target: Option<String>,
    pub python: Option<PathBuf>,
    pub pkg_config: Option<PathBuf>,
}

impl ToolchainSettings {
    /// Values set in `upper` replace ours; unset ones fall through.
    pub fn overlay(self, upper: ToolchainSettings) -> ToolchainSettings {
        ToolchainSettings {
            cxx: upper.cxx.or(self.cxx),
            cc: upper.cc.or(self.cc),
            cflags: upper.cflags.or(self.cflags),
            ldflags: upper.ldflags.or(self.ldflags),
            target: upper.target.or(self.target),
            python: upper.python.or(self.python),
            pkg_config: upper.pkg_config.or(self.pkg_config),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ToolchainSettings::default()
    }
}

impl ToolchainConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// A missing file is empty. A broken one is reported and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring toolchain defaults: {:#}", e);
                Self::default()
            }
        }
    }
}

/// Merge the global and project defaults files, project winning.
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> ToolchainConfig {
    let global = global_path
        .map(|path| ToolchainConfig::load_or_default(path).toolchain)
        .unwrap_or_default();
    let project = ToolchainConfig::load_or_default(project_path).toolchain;

    let toolchain = global.overlay(project);
    if !toolchain.is_empty() {
        tracing::debug!("toolchain defaults: {:?}", toolchain);
    }
    let mut sources: Vec<PathBuf> = global_path
        .into_iter()
        .chain([project_path])
        .filter(|path| path.is_file())
        .map(Path::to_path_buf)
        .collect();
    // a project at the home directory reads one file twice
    sources.dedup();
    ToolchainConfig { toolchain, sources }
}

/// `~/.heroconf/toolchain.toml`, if a home directory is known.
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join(CONFIG_FILE)
}
