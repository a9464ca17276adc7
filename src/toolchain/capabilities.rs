//! Higher-level toolchain feature checks.
//!
//! Every check here is independent of the others and of package
//! resolution. Checks for optional features degrade with an advisory; only
//! [`require_library`] can fail the run.

use anyhow::Result;
use serde::Serialize;

use crate::core::error::ConfigureError;
use crate::core::manifest::{ProbeSettings, RequiredLibrary};

use super::flags::supported_flags;
use super::TrialCompiler;

const DEBUG_INFO_SOURCE: &str = "template <typename T> struct x { auto f() {} }; x<int> a;\n";
const DEBUG_INFO_FLAGS: [&str; 2] = ["-g", "-std=gnu++1y"];
const LINK_SOURCE: &str = "int main(int argc, char **argv) { return 0; }\n";
const GOLD_FLAG: &str = "-fuse-ld=gold";
const SANITIZER_SOURCE: &str = "int f() {}\n";
const USE_AFTER_SCOPE_FLAG: &str = "-fsanitize-address-use-after-scope";

/// What the compiler turned out to support, fixed for the rest of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Candidate warnings the compiler accepted, in candidate order
    pub warnings: Vec<String>,
    /// Warnings appended without probing
    pub always_warnings: Vec<String>,
    /// Accepted release-mode optimization flags
    pub optimization_flags: Vec<String>,
    /// Debug-info flag, if debug info is wanted and works
    pub debug_flag: Option<String>,
    /// Flag selecting the gold linker, if available
    pub gold_linker_flag: Option<String>,
    /// Whether `-fsanitize-address-use-after-scope` is understood
    pub sanitize_address_use_after_scope: bool,
}

impl Capabilities {
    /// The warning flags added to every compilation.
    pub fn warning_flags(&self) -> String {
        self.warnings
            .iter()
            .chain(&self.always_warnings)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flags appended to the optimization flags of the release mode.
    pub fn optimization(&self) -> String {
        self.optimization_flags.join(" ")
    }

    /// Extra flags for modes that build with sanitizers.
    ///
    /// Use-after-scope detection is turned off where the compiler knows it.
    pub fn sanitizer_extra(&self) -> &'static str {
        if self.sanitize_address_use_after_scope {
            "-fno-sanitize-address-use-after-scope"
        } else {
            ""
        }
    }
}

/// Runs individual capability checks against a trial compiler.
pub struct CapabilityDetector<'a> {
    compiler: &'a dyn TrialCompiler,
}

impl<'a> CapabilityDetector<'a> {
    pub fn new(compiler: &'a dyn TrialCompiler) -> Self {
        CapabilityDetector { compiler }
    }

    /// `-g` if the compiler can emit debug info for template-heavy code.
    pub fn debug_flag(&self) -> Result<Option<String>> {
        let flags: Vec<String> = DEBUG_INFO_FLAGS.iter().map(|s| s.to_string()).collect();
        if self.compiler.try_compile(DEBUG_INFO_SOURCE, &flags)? {
            Ok(Some("-g".to_string()))
        } else {
            tracing::warn!("debug information disabled; upgrade your compiler");
            Ok(None)
        }
    }

    /// `-fuse-ld=gold` if a trivial program links with it.
    pub fn gold_linker(&self) -> Result<Option<String>> {
        if self
            .compiler
            .try_compile_and_link(LINK_SOURCE, &[GOLD_FLAG.to_string()])?
        {
            Ok(Some(GOLD_FLAG.to_string()))
        } else {
            tracing::warn!("gold linker not found, using the default linker");
            Ok(None)
        }
    }

    /// Whether the use-after-scope sanitizer sub-flag is understood.
    pub fn sanitize_address_use_after_scope(&self) -> Result<bool> {
        let available = self
            .compiler
            .try_compile(SANITIZER_SOURCE, &[USE_AFTER_SCOPE_FLAG.to_string()])?;
        if !available {
            tracing::debug!("`{}` not supported", USE_AFTER_SCOPE_FLAG);
        }
        Ok(available)
    }
}

/// Check that a mandatory library is installed and recent enough.
///
/// Returns `Err` with a [`ConfigureError::MandatoryDependencyMissing`] when
/// it is not.
pub fn require_library(compiler: &dyn TrialCompiler, library: &RequiredLibrary) -> Result<()> {
    let include = format!("#include <{}>\n", library.header);
    if !compiler.try_compile(&include, &[])? {
        return Err(ConfigureError::MandatoryDependencyMissing {
            what: format!("{} not installed", library.name),
            hint: format!("Install {}", library.package),
        }
        .into());
    }

    let version_check = format!(
        "{include}#if {macro_} < {min}\n#error {name} version too old\n#endif\n",
        include = include,
        macro_ = library.version_macro,
        min = library.min_version,
        name = library.name,
    );
    if !compiler.try_compile(&version_check, &[])? {
        return Err(ConfigureError::MandatoryDependencyMissing {
            what: format!("installed {} version too old", library.name),
            hint: format!("Update {}", library.package),
        }
        .into());
    }

    tracing::debug!("{} found (>= {})", library.name, library.min_version);
    Ok(())
}

/// Run every optional capability check and assemble the snapshot.
pub fn probe_toolchain(
    compiler: &dyn TrialCompiler,
    settings: &ProbeSettings,
    debuginfo: bool,
) -> Result<Capabilities> {
    let detector = CapabilityDetector::new(compiler);

    let warnings = supported_flags(compiler, &settings.warnings)?;
    let optimization_flags = supported_flags(compiler, &settings.optimization)?;
    let debug_flag = if debuginfo { detector.debug_flag()? } else { None };
    let gold_linker_flag = detector.gold_linker()?;
    let sanitize_address_use_after_scope = detector.sanitize_address_use_after_scope()?;

    Ok(Capabilities {
        warnings,
        always_warnings: settings.always_warnings.clone(),
        optimization_flags,
        debug_flag,
        gold_linker_flag,
        sanitize_address_use_after_scope,
    })
}
