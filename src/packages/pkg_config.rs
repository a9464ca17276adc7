//! `pkg-config` backed package registry.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::util::process::ProcessBuilder;

use super::PackageRegistry;

/// Queries packages through `pkg-config` (or a compatible program such as
/// `pkgconf`).
#[derive(Debug, Clone)]
pub struct PkgConfig {
    program: PathBuf,
}

impl PkgConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        PkgConfig {
            program: program.into(),
        }
    }

    fn query(&self, flag: &str, package: &str) -> Result<String> {
        let out = ProcessBuilder::new(&self.program)
            .arg(flag)
            .arg(package)
            .exec_and_check()
            .with_context(|| format!("failed to query {} for `{}`", flag, package))?;
        Ok(out.trim().to_string())
    }
}

impl Default for PkgConfig {
    fn default() -> Self {
        PkgConfig::new("pkg-config")
    }
}

impl PackageRegistry for PkgConfig {
    fn name(&self) -> &str {
        "pkg-config"
    }

    fn exists(&self, package: &str) -> bool {
        let cmd = ProcessBuilder::new(&self.program).arg("--exists").arg(package);
        match cmd.status_quiet() {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!("`{}` could not run: {:#}", cmd.display_command(), e);
                false
            }
        }
    }

    fn cflags(&self, package: &str) -> Result<String> {
        self.query("--cflags", package)
    }

    fn libs(&self, package: &str) -> Result<String> {
        self.query("--libs", package)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// A registry that knows only `libfoo`.
    fn fake_pkg_config(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("fake-pkg-config");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             [ \"$2\" = \"libfoo\" ] || exit 1\n\
             case \"$1\" in\n\
               --exists) exit 0 ;;\n\
               --cflags) echo \"-I/opt/foo/include \" ;;\n\
               --libs) echo \"-L/opt/foo/lib -lfoo\" ;;\n\
             esac\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_queries() {
        let tmp = TempDir::new().unwrap();
        let registry = PkgConfig::new(fake_pkg_config(tmp.path()));

        assert!(registry.exists("libfoo"));
        assert!(!registry.exists("libbar"));
        assert_eq!(registry.cflags("libfoo").unwrap(), "-I/opt/foo/include");
        assert_eq!(registry.libs("libfoo").unwrap(), "-L/opt/foo/lib -lfoo");
        assert!(registry.libs("libbar").is_err());
    }

    #[test]
    fn test_missing_program_reports_absent() {
        let registry = PkgConfig::new("/nonexistent/pkg-config");
        assert!(!registry.exists("libfoo"));
    }
}
