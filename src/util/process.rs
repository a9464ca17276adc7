//! Running the external programs configuration depends on.
//!
//! Every program heroconf talks to (the compiler under probe, the package
//! registry, the sub-project's scripts, ninja) is started through
//! [`ProcessBuilder`], so command lines look the same in logs and errors.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use anyhow::{bail, Context, Result};

/// Names ninja is installed under.
pub const NINJA_NAMES: [&str; 2] = ["ninja", "ninja-build"];

#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Run in `dir` instead of the current directory.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion and return stdout. A non-zero exit is an error
    /// carrying the program's stderr.
    pub fn exec_and_check(&self) -> Result<String> {
        let output = self
            .command()
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.display_command()))?;
        if !output.status.success() {
            bail!(
                "`{}` exited with {}\n{}",
                self.display_command(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run with stdout and stderr passed through to the user.
    pub fn status(&self) -> Result<ExitStatus> {
        self.command()
            .status()
            .with_context(|| format!("failed to execute `{}`", self.display_command()))
    }

    /// Run with all output discarded. Trial compilations and registry
    /// queries only care about the exit code.
    pub fn status_quiet(&self) -> Result<ExitStatus> {
        self.command()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("failed to execute `{}`", self.display_command()))
    }

    /// The command line, shell-quoted.
    pub fn display_command(&self) -> String {
        let program = self.program.to_string_lossy();
        let words = std::iter::once(program.as_ref()).chain(self.args.iter().map(String::as_str));
        match shlex::try_join(words) {
            Ok(line) => line,
            // an argument with a NUL byte cannot be quoted
            Err(_) => format!("{} {}", program, self.args.join(" ")),
        }
    }
}

/// Locate ninja on PATH under any of [`NINJA_NAMES`].
pub fn find_ninja() -> Option<PathBuf> {
    NINJA_NAMES.iter().find_map(|name| which::which(name).ok())
}
