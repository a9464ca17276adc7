//! Trial compilation through a real compiler process.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

use super::TrialCompiler;

/// Runs trial compilations with the configured C++ compiler.
///
/// Each attempt writes the snippet to a fresh temporary `.cc` file and
/// compiles it to a fresh temporary output path, both inside `tmp_dir`.
/// Both are removed when the attempt returns, whatever its outcome.
#[derive(Debug, Clone)]
pub struct ProcessTrialCompiler {
    compiler: PathBuf,
    user_flags: Vec<String>,
    tmp_dir: PathBuf,
}

impl ProcessTrialCompiler {
    /// Create a trial compiler. `user_flags` are passed to every attempt.
    pub fn new(compiler: impl Into<PathBuf>, user_flags: Vec<String>, tmp_dir: impl Into<PathBuf>) -> Self {
        ProcessTrialCompiler {
            compiler: compiler.into(),
            user_flags,
            tmp_dir: tmp_dir.into(),
        }
    }

    fn command(&self, input: &Path, output: &Path, flags: &[String]) -> ProcessBuilder {
        ProcessBuilder::new(&self.compiler)
            .args(["-x", "c++", "-o"])
            .arg(output)
            .arg(input)
            .args(&self.user_flags)
            .args(flags)
    }
}

impl TrialCompiler for ProcessTrialCompiler {
    fn try_compile_and_link(&self, source: &str, flags: &[String]) -> Result<bool> {
        ensure_dir(&self.tmp_dir)?;

        let mut input = tempfile::Builder::new()
            .prefix("probe")
            .suffix(".cc")
            .tempfile_in(&self.tmp_dir)
            .with_context(|| format!("failed to create probe source in {}", self.tmp_dir.display()))?;
        input
            .write_all(source.as_bytes())
            .and_then(|_| input.flush())
            .with_context(|| format!("failed to write {}", input.path().display()))?;

        // Not /dev/null: some flags derive auxiliary file names from the
        // output name.
        let output = tempfile::Builder::new()
            .prefix("probe")
            .suffix(".out")
            .tempfile_in(&self.tmp_dir)
            .with_context(|| format!("failed to create probe output in {}", self.tmp_dir.display()))?
            .into_temp_path();

        let cmd = self.command(input.path(), &output, flags);
        let status = cmd.status_quiet()?;
        tracing::debug!("probe `{}` -> {}", cmd.display_command(), status);

        Ok(status.success())
    }
}
