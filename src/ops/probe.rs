//! Implementation of `heroconf probe`.
//!
//! Runs only the capability stage and reports what was learned about the
//! compiler. Nothing is written to disk apart from the trial compilation
//! scratch files.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use crate::core::error::ConfigureError;
use crate::core::manifest::Manifest;
use crate::core::options::ConfigureOptions;
use crate::toolchain::{probe_toolchain, require_library, Capabilities, ProcessTrialCompiler, TrialCompiler};

/// Status of the mandatory library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryStatus {
    pub name: String,
    pub found: bool,
    /// Why the library was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Capability report of one compiler.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub compiler: String,
    pub library: LibraryStatus,
    pub capabilities: Capabilities,
}

/// Probe the compiler of `opts`.
///
/// The probe settings come from the project manifest when one exists, the
/// built-in candidates otherwise.
pub fn probe(opts: &ConfigureOptions) -> Result<ProbeReport> {
    let manifest_path = opts.project_path(&opts.manifest_path);
    let manifest = if manifest_path.exists() {
        Manifest::load(&manifest_path)?
    } else {
        tracing::debug!("{} not found, probing built-in candidates", manifest_path.display());
        Manifest::default()
    };

    let tmp_dir = opts.project_path(&manifest.project.build_dir).join("tmp");
    let compiler = ProcessTrialCompiler::new(&opts.cxx, opts.user_cflag_list(), tmp_dir);
    probe_with(opts, &manifest, &compiler)
}

/// Probe through an explicit trial compiler.
pub fn probe_with(opts: &ConfigureOptions, manifest: &Manifest, compiler: &dyn TrialCompiler) -> Result<ProbeReport> {
    let required = manifest.mandatory_library();
    let library = match require_library(compiler, &required) {
        Ok(()) => LibraryStatus {
            name: required.name.clone(),
            found: true,
            problem: None,
        },
        Err(e) => match e.downcast::<ConfigureError>() {
            Ok(ConfigureError::MandatoryDependencyMissing { what, .. }) => LibraryStatus {
                name: required.name.clone(),
                found: false,
                problem: Some(what),
            },
            Ok(other) => return Err(other.into()),
            Err(e) => return Err(e),
        },
    };

    let capabilities = probe_toolchain(compiler, &manifest.probe, opts.debuginfo)?;

    Ok(ProbeReport {
        compiler: opts.cxx.display().to_string(),
        library,
        capabilities,
    })
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn list(flags: &[String]) -> String {
    if flags.is_empty() {
        "(none)".to_string()
    } else {
        flags.join(" ")
    }
}

/// Format a report for the terminal.
pub fn format_report(report: &ProbeReport) -> String {
    let caps = &report.capabilities;
    let mut out = String::new();

    let _ = writeln!(out, "Compiler: {}", report.compiler);
    let _ = writeln!(out);

    let status = if report.library.found { "[OK]" } else { "[!!]" };
    let _ = writeln!(out, "  {} {}", status, report.library.name);
    if let Some(ref problem) = report.library.problem {
        let _ = writeln!(out, "      {}", problem);
    }
    let _ = writeln!(out, "  debug info flag:     {}", caps.debug_flag.as_deref().unwrap_or("(none)"));
    let _ = writeln!(out, "  gold linker:         {}", yes_no(caps.gold_linker_flag.is_some()));
    let _ = writeln!(
        out,
        "  use-after-scope off: {}",
        yes_no(caps.sanitize_address_use_after_scope)
    );
    let _ = writeln!(out, "  warnings:            {}", list(&caps.warnings));
    let _ = writeln!(out, "  optimization:        {}", list(&caps.optimization_flags));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, MockCompiler};

    #[test]
    fn test_probe_reports_capabilities() {
        let cc = MockCompiler::new().reject_flag("-fuse-ld=gold");
        let report = probe_with(&fixtures::options(), &fixtures::manifest(), &cc).unwrap();

        assert!(report.library.found);
        assert_eq!(report.capabilities.gold_linker_flag, None);
        assert_eq!(report.capabilities.debug_flag.as_deref(), Some("-g"));

        let text = format_report(&report);
        assert!(text.starts_with("Compiler: g++\n"));
        assert!(text.contains("[OK] boost"));
        assert!(text.contains("gold linker:         no"));
    }

    #[test]
    fn test_missing_library_is_reported_not_fatal() {
        let cc = MockCompiler::new().reject_source("boost/version.hpp");
        let report = probe_with(&fixtures::options(), &fixtures::manifest(), &cc).unwrap();

        assert!(!report.library.found);
        assert_eq!(report.library.problem.as_deref(), Some("boost not installed"));
        assert!(format_report(&report).contains("[!!] boost\n      boost not installed\n"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = probe_with(&fixtures::options(), &fixtures::manifest(), &MockCompiler::new()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["library"]["found"], true);
        assert!(json["library"].get("problem").is_none());
        assert_eq!(json["capabilities"]["sanitize_address_use_after_scope"], true);
        assert_eq!(json["capabilities"]["warnings"].as_array().unwrap().len(), 14);
    }

    #[test]
    fn test_no_debuginfo_skips_debug_probe() {
        let mut opts = fixtures::options();
        opts.debuginfo = false;
        let report = probe_with(&opts, &fixtures::manifest(), &MockCompiler::new()).unwrap();
        assert_eq!(report.capabilities.debug_flag, None);
    }
}
