//! Build artifacts and the artifact registry.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::core::error::ConfigureError;

/// Which artifact list an artifact was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactCategory {
    /// Applications
    App,
    /// Unit and integration tests
    Test,
    /// Performance tests
    PerfTest,
    /// Artifacts produced by rules outside the generated graph
    Other,
}

impl ArtifactCategory {
    /// Get the category name as written in the manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactCategory::App => "apps",
            ArtifactCategory::Test => "tests",
            ArtifactCategory::PerfTest => "perf-tests",
            ArtifactCategory::Other => "other",
        }
    }
}

impl fmt::Display for ArtifactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the emitter produces for an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// A linked executable
    Executable,
    /// A static archive (`.a`)
    StaticLibrary,
    /// A test executable, linked stripped plus an unstripped `_g` twin
    Test,
}

/// A declared build artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub name: String,
    pub category: ArtifactCategory,
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Create an artifact, deriving its kind from its name and category.
    pub fn new(name: impl Into<String>, category: ArtifactCategory) -> Self {
        let name = name.into();
        let kind = if name.ends_with(".a") {
            ArtifactKind::StaticLibrary
        } else if matches!(category, ArtifactCategory::Test | ArtifactCategory::PerfTest) {
            ArtifactKind::Test
        } else {
            ArtifactKind::Executable
        };
        Artifact {
            name,
            category,
            kind,
        }
    }

    /// Whether the emitter generates edges for this artifact.
    pub fn is_emitted(&self) -> bool {
        self.category != ArtifactCategory::Other
    }
}

/// The universe of buildable artifact names, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ArtifactRegistry {
    artifacts: Vec<Artifact>,
    index: HashMap<String, usize>,
}

impl ArtifactRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact. Names are unique across all categories.
    pub fn add(&mut self, name: &str, category: ArtifactCategory) -> Result<(), ConfigureError> {
        if self.index.contains_key(name) {
            return Err(ConfigureError::DuplicateArtifact(name.to_string()));
        }
        self.index.insert(name.to_string(), self.artifacts.len());
        self.artifacts.push(Artifact::new(name, category));
        Ok(())
    }

    /// Register every name of `names` under `category`.
    pub fn extend<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a String>,
        category: ArtifactCategory,
    ) -> Result<(), ConfigureError> {
        for name in names {
            self.add(name, category)?;
        }
        Ok(())
    }

    /// Look up an artifact by name.
    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.index.get(name).map(|&i| &self.artifacts[i])
    }

    /// Check whether `name` is in the registry.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Check whether `name` is registered under `category`.
    pub fn contains_in(&self, name: &str, category: ArtifactCategory) -> bool {
        self.get(name).is_some_and(|a| a.category == category)
    }

    /// Iterate over all artifacts in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    /// All artifact names in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Resolve a user selection. An empty selection means every artifact.
    pub fn select(&self, requested: &[String]) -> Result<Vec<Artifact>, ConfigureError> {
        if requested.is_empty() {
            return Ok(self.artifacts.clone());
        }
        let mut selected: Vec<Artifact> = Vec::with_capacity(requested.len());
        for name in requested {
            let artifact = self.get(name).ok_or_else(|| ConfigureError::UnknownArtifact {
                name: name.clone(),
                known: self.names(),
            })?;
            if !selected.iter().any(|a| a.name == artifact.name) {
                selected.push(artifact.clone());
            }
        }
        Ok(selected)
    }
}
