//! Candidate flag filtering.
//!
//! A flag counts as supported only if the compiler accepts it with
//! `-Werror`, so flags that are merely ignored with a warning are rejected.

use anyhow::Result;

use super::TrialCompiler;

/// The form a candidate is probed in.
///
/// GCC silently accepts `-Wno-foo` for any `foo`, so a disable-warning flag
/// is probed through its enabling counterpart `-Wfoo` instead.
pub fn probe_form(flag: &str) -> String {
    match flag.strip_prefix("-Wno-") {
        Some(rest) => format!("-W{}", rest),
        None => flag.to_string(),
    }
}

/// Check one candidate. Multi-token candidates such as
/// `--param inline-unit-growth=300` are split on whitespace.
pub fn flag_supported(compiler: &dyn TrialCompiler, flag: &str) -> Result<bool> {
    let mut flags = vec!["-Werror".to_string()];
    flags.extend(probe_form(flag).split_whitespace().map(String::from));
    let supported = compiler.try_compile("", &flags)?;
    if !supported {
        tracing::debug!("flag `{}` not supported", flag);
    }
    Ok(supported)
}

/// Keep the candidates the compiler accepts, in their original order and
/// original spelling.
pub fn supported_flags(compiler: &dyn TrialCompiler, candidates: &[String]) -> Result<Vec<String>> {
    let mut accepted = Vec::with_capacity(candidates.len());
    for flag in candidates {
        if flag_supported(compiler, flag)? {
            accepted.push(flag.clone());
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockCompiler;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_probe_form() {
        assert_eq!(probe_form("-Wno-overflow"), "-Woverflow");
        assert_eq!(probe_form("-Wno-error=deprecated-declarations"), "-Werror=deprecated-declarations");
        assert_eq!(probe_form("-Wall"), "-Wall");
        assert_eq!(probe_form("--param inline-unit-growth=300"), "--param inline-unit-growth=300");
    }

    #[test]
    fn test_disable_flag_probed_through_enable_form() {
        let cc = MockCompiler::new().reject_flag("-Wmismatched-tags");

        assert!(!flag_supported(&cc, "-Wno-mismatched-tags").unwrap());
        let calls = cc.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].flags, strings(&["-Werror", "-Wmismatched-tags", "-c"]));
    }

    #[test]
    fn test_multi_token_flag_split() {
        let cc = MockCompiler::new();

        assert!(flag_supported(&cc, "--param inline-unit-growth=300").unwrap());
        assert_eq!(
            cc.calls()[0].flags,
            strings(&["-Werror", "--param", "inline-unit-growth=300", "-c"])
        );
    }

    #[test]
    fn test_rejected_flags_never_returned() {
        let cc = MockCompiler::new()
            .reject_flag("-Wtautological-compare")
            .reject_flag("-Wnoexcept-type");
        let candidates = strings(&[
            "-Wno-mismatched-tags",
            "-Wno-tautological-compare",
            "-Wno-overflow",
            "-Wno-noexcept-type",
        ]);

        let accepted = supported_flags(&cc, &candidates).unwrap();

        assert_eq!(accepted, strings(&["-Wno-mismatched-tags", "-Wno-overflow"]));
    }

    #[test]
    fn test_reprobe_is_idempotent() {
        let cc = MockCompiler::new().reject_flag("-Woverflow");
        let first = flag_supported(&cc, "-Wno-overflow").unwrap();
        let second = flag_supported(&cc, "-Wno-overflow").unwrap();
        assert_eq!(first, second);
        assert_eq!(cc.calls().len(), 2);
    }
}
