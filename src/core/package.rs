//! Optional system packages.

use serde::{Deserialize, Serialize};

/// An optional package with prioritized alternative names.
///
/// The first alternative is the canonical name: the preprocessor define is
/// always derived from it, whichever alternative is actually installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionalPackage {
    /// Package names to try, in order
    pub alternatives: Vec<String>,

    /// Tristate feature controlling this package (e.g. "hwloc")
    #[serde(default)]
    pub feature: Option<String>,
}

impl OptionalPackage {
    /// Create a package with no controlling feature.
    pub fn new<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OptionalPackage {
            alternatives: alternatives.into_iter().map(Into::into).collect(),
            feature: None,
        }
    }

    /// Attach a controlling feature.
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// The canonical (first) package name.
    pub fn canonical(&self) -> &str {
        self.alternatives.first().map(String::as_str).unwrap_or("")
    }

    /// The `HAVE_*` define registered when any alternative is found.
    pub fn define_name(&self) -> String {
        format!("HAVE_{}", self.canonical().to_uppercase().replace('-', "_"))
    }

    /// Human-readable description used in advisories.
    pub fn describe(&self) -> String {
        match self.alternatives.split_first() {
            Some((first, rest)) if !rest.is_empty() => {
                format!("{} (or alternatives {})", first, rest.join(":"))
            }
            _ => self.canonical().to_string(),
        }
    }
}
