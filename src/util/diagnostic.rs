//! Terminal rendering of fatal configuration errors.
//!
//! A failed run ends with exactly one diagnostic: the root cause, the
//! context that led to it, and what to do about it. The operator is
//! expected to fix the environment and re-run configuration by hand.
//! Non-fatal advisories never come through here; they are `tracing`
//! warnings.

use std::fmt;
use std::path::PathBuf;

/// Common remediation hints.
pub mod suggestions {
    pub const INSTALL_NINJA: &str = "Install ninja (packaged as `ninja` or `ninja-build`)";

    pub const CHECK_ARTIFACTS: &str =
        "Check the [artifacts] tables of the manifest for the current artifact names";

    pub const RERUN_VERBOSE: &str = "Run `heroconf configure --verbose` for more details";

    pub const SOURCE_EXTENSIONS: &str = "Source modules must end in .cc, .cpp or .cxx";
}

const RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

fn paint(text: &str, color: Option<&str>) -> String {
    match color {
        Some(code) => format!("{}{}{}", code, text, RESET),
        None => text.to_string(),
    }
}

/// A fatal error ready for display.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    /// Lines explaining how the error came about
    pub context: Vec<String>,
    /// Remediation hints, most relevant first
    pub suggestions: Vec<String>,
    /// File the error refers to
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for the terminal, with ANSI colors if `color` is set.
    pub fn format(&self, color: bool) -> String {
        let mut out = format!(
            "{}: {}\n",
            paint("error", color.then_some(RED)),
            self.message
        );
        if let Some(ref path) = self.location {
            out.push_str(&format!("  --> {}\n", path.display()));
        }
        for line in &self.context {
            out.push_str(&format!("  = {}\n", line));
        }
        let help = paint("help", color.then_some(GREEN));
        for suggestion in &self.suggestions {
            out.push_str(&format!("{}: {}\n", help, suggestion));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
