//! Configuration error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Broad class of a configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A required library or tool is absent or too old.
    MandatoryDependencyMissing,
    /// The declared artifacts, modules or overrides do not fit together.
    ConfigurationConsistency,
    /// A delegated external step returned failure.
    DelegatedToolFailure,
}

/// A fatal configuration error.
///
/// Optional capabilities that turn out to be unavailable are never errors;
/// they are reported as advisories and the feature is disabled.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigureError {
    #[error("{what}")]
    #[diagnostic(code(heroconf::probe::mandatory_dependency))]
    MandatoryDependencyMissing {
        what: String,
        #[help]
        hint: String,
    },

    #[error("required tool `{tool}` not found on PATH")]
    #[diagnostic(code(heroconf::probe::tool_not_found))]
    ToolNotFound { tool: String, candidates: Vec<String> },

    #[error("test `{name}` not found in the test artifact list")]
    #[diagnostic(
        code(heroconf::resolve::unknown_override),
        help("remove the stale override or restore the test")
    )]
    UnknownOverride { name: String, list: String },

    #[error("no rule for source `{source_module}`")]
    #[diagnostic(code(heroconf::emit::no_rule))]
    NoRuleForSource {
        source_module: String,
        artifact: String,
    },

    #[error("`{first}` and `{second}` both compile to `{object}`")]
    #[diagnostic(code(heroconf::resolve::object_collision))]
    ObjectCollision {
        object: String,
        first: String,
        second: String,
    },

    #[error("duplicate artifact name `{0}`")]
    #[diagnostic(code(heroconf::resolve::duplicate_artifact))]
    DuplicateArtifact(String),

    #[error("unknown artifact `{name}`")]
    #[diagnostic(code(heroconf::resolve::unknown_artifact))]
    UnknownArtifact { name: String, known: Vec<String> },

    #[error("unknown build mode `{name}`")]
    #[diagnostic(code(heroconf::resolve::unknown_mode))]
    UnknownMode { name: String, known: Vec<String> },

    #[error("unknown module set `@{set}` referenced by `{artifact}`")]
    #[diagnostic(code(heroconf::resolve::unknown_module_set))]
    UnknownModuleSet { set: String, artifact: String },

    #[error("artifact `{0}` has no source modules")]
    #[diagnostic(code(heroconf::resolve::missing_sources))]
    MissingSources(String),

    #[error("{step} failed")]
    #[diagnostic(code(heroconf::external::failed))]
    DelegatedToolFailure {
        step: String,
        command: String,
        code: Option<i32>,
    },

    #[error("{file} is missing the `{key}` entry")]
    #[diagnostic(code(heroconf::external::invalid_metadata))]
    InvalidMetadata { file: String, key: String },
}

impl ConfigureError {
    /// Map this error onto the configuration error taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigureError::MandatoryDependencyMissing { .. } | ConfigureError::ToolNotFound { .. } => {
                ErrorCategory::MandatoryDependencyMissing
            }
            ConfigureError::UnknownOverride { .. }
            | ConfigureError::NoRuleForSource { .. }
            | ConfigureError::ObjectCollision { .. }
            | ConfigureError::DuplicateArtifact(_)
            | ConfigureError::UnknownArtifact { .. }
            | ConfigureError::UnknownMode { .. }
            | ConfigureError::UnknownModuleSet { .. }
            | ConfigureError::MissingSources(_) => ErrorCategory::ConfigurationConsistency,
            ConfigureError::DelegatedToolFailure { .. } | ConfigureError::InvalidMetadata { .. } => {
                ErrorCategory::DelegatedToolFailure
            }
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            ConfigureError::MandatoryDependencyMissing { hint, .. } => diag.with_suggestion(hint),

            ConfigureError::ToolNotFound { candidates, .. } => diag
                .with_context(format!("looked for: {}", candidates.join(", ")))
                .with_suggestion(suggestions::INSTALL_NINJA),

            ConfigureError::UnknownOverride { name, list } => diag
                .with_context(format!("`{}` is listed in `{}`", name, list))
                .with_suggestion(format!(
                    "Remove `{}` from `{}` or add it back to the test artifacts",
                    name, list
                )),

            ConfigureError::NoRuleForSource { artifact, .. } => diag
                .with_context(format!("required by artifact `{}`", artifact))
                .with_suggestion(suggestions::SOURCE_EXTENSIONS),

            ConfigureError::ObjectCollision { second, .. } => diag.with_suggestion(format!(
                "Rename `{}` so its path without the extension is unique",
                second
            )),

            ConfigureError::DuplicateArtifact(_) | ConfigureError::MissingSources(_) => {
                diag.with_suggestion(suggestions::CHECK_ARTIFACTS)
            }

            ConfigureError::UnknownArtifact { known, .. } => diag
                .with_context(format!("known artifacts: {}", known.join(", ")))
                .with_suggestion(suggestions::CHECK_ARTIFACTS),

            ConfigureError::UnknownMode { known, .. } => {
                diag.with_context(format!("known modes: {}, all", known.join(", ")))
            }

            ConfigureError::UnknownModuleSet { set, .. } => diag.with_suggestion(format!(
                "Declare `{}` under [modules] in the manifest",
                set
            )),

            ConfigureError::DelegatedToolFailure { command, code, .. } => {
                let status = match code {
                    Some(c) => format!("exit code {}", c),
                    None => "terminated by signal".to_string(),
                };
                diag.with_context(format!("`{}` ({})", command, status))
                    .with_suggestion(suggestions::RERUN_VERBOSE)
            }

            ConfigureError::InvalidMetadata { .. } => {
                diag.with_suggestion(suggestions::RERUN_VERBOSE)
            }
        }
    }
}
