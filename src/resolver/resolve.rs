//! DependencyTable - the immutable artifact → source module table.
//!
//! Once created, a DependencyTable is read-only. Graph emission looks up
//! module lists here and never re-derives them.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

use crate::core::artifact::{Artifact, ArtifactCategory, ArtifactRegistry};
use crate::core::error::ConfigureError;
use crate::core::manifest::Manifest;

/// Source extensions that have a compilation rule.
pub const SOURCE_EXTENSIONS: [&str; 3] = ["cc", "cpp", "cxx"];

/// Module set names with a fixed role.
pub const CORE_SET: &str = "core";
pub const TEST_SUPPORT_SET: &str = "test-support";
pub const TEST_FRAMEWORK_SET: &str = "test-framework";
pub const PERF_FRAMEWORK_SET: &str = "perf-framework";

/// Manifest keys of the test overrides, used in error messages.
const BYPASS_LIST: &str = "tests.bypass-framework";
const PURE_BOOST_LIST: &str = "tests.pure-boost";

/// The path of `module` without its extension, if a compilation rule
/// applies to it.
pub fn compile_source_stem(module: &str) -> Option<&str> {
    let (stem, ext) = module.rsplit_once('.')?;
    if stem.is_empty() || stem.ends_with('/') || ext.contains('/') {
        return None;
    }
    SOURCE_EXTENSIONS.contains(&ext).then_some(stem)
}

/// An artifact with its resolved source modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub artifact: Artifact,
    /// Source modules in link order, without duplicates
    pub modules: Vec<String>,
    /// Whether the unit-test framework libraries are linked in
    pub framework_libs: bool,
}

/// Resolved module lists for every emitted artifact, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    entries: IndexMap<String, ResolvedArtifact>,
}

impl DependencyTable {
    /// Add or replace the entry of an artifact.
    pub fn insert(&mut self, resolved: ResolvedArtifact) {
        self.entries.insert(resolved.artifact.name.clone(), resolved);
    }

    /// Look up an artifact.
    pub fn get(&self, name: &str) -> Option<&ResolvedArtifact> {
        self.entries.get(name)
    }

    /// The module list of an artifact.
    pub fn modules(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(|r| r.modules.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the dependency table.
///
/// Fails on the first referential problem: a test override naming
/// something that is not a declared test, a `[sources]` entry for an
/// undeclared artifact, an unknown `@set`, an artifact without sources, or
/// a module no compilation rule applies to, or two modules that would
/// compile to the same object file.
pub fn resolve_dependencies(
    manifest: &Manifest,
    registry: &ArtifactRegistry,
) -> Result<DependencyTable, ConfigureError> {
    check_overrides(registry, &manifest.tests.bypass_framework, BYPASS_LIST)?;
    check_overrides(registry, &manifest.tests.pure_boost, PURE_BOOST_LIST)?;

    for name in manifest.sources.keys() {
        if !registry.contains(name) {
            return Err(ConfigureError::UnknownArtifact {
                name: name.clone(),
                known: registry.names(),
            });
        }
    }

    let pure_boost: BTreeSet<&str> = manifest.tests.pure_boost.iter().map(String::as_str).collect();
    let bypass: BTreeSet<&str> = manifest
        .tests
        .bypass_framework
        .iter()
        .map(String::as_str)
        .chain(pure_boost.iter().copied())
        .collect();

    let mut table = DependencyTable::default();
    for artifact in registry.iter().filter(|a| a.is_emitted()) {
        let name = artifact.name.as_str();
        let (modules, framework_libs) = match artifact.category {
            ArtifactCategory::Test if bypass.contains(name) => (
                test_modules(manifest, name, &[CORE_SET]),
                pure_boost.contains(name),
            ),
            ArtifactCategory::Test => (
                test_modules(manifest, name, &[CORE_SET, TEST_SUPPORT_SET, TEST_FRAMEWORK_SET]),
                true,
            ),
            ArtifactCategory::PerfTest => (
                test_modules(manifest, name, &[CORE_SET, TEST_SUPPORT_SET, PERF_FRAMEWORK_SET]),
                true,
            ),
            _ => (explicit_modules(manifest, name)?, false),
        };

        for module in &modules {
            if compile_source_stem(module).is_none() {
                return Err(ConfigureError::NoRuleForSource {
                    source_module: module.clone(),
                    artifact: name.to_string(),
                });
            }
        }

        tracing::debug!("{}: {} modules", name, modules.len());
        table.insert(ResolvedArtifact {
            artifact: artifact.clone(),
            modules,
            framework_libs,
        });
    }

    check_objects(&table)?;
    Ok(table)
}

/// Object paths drop the extension, so `x.cc` and `x.cpp` would share one.
fn check_objects(table: &DependencyTable) -> Result<(), ConfigureError> {
    // object stem -> first module compiled to it
    let mut objects: BTreeMap<&str, &str> = BTreeMap::new();
    for module in table.iter().flat_map(|r| r.modules.iter()) {
        let Some(stem) = compile_source_stem(module) else {
            continue;
        };
        let first = *objects.entry(stem).or_insert(module.as_str());
        if first != module.as_str() {
            return Err(ConfigureError::ObjectCollision {
                object: format!("{}.o", stem),
                first: first.to_string(),
                second: module.clone(),
            });
        }
    }
    Ok(())
}

/// Keys of per-source compiler flags that no resolved artifact compiles.
///
/// `sources` are the `[extra-cxxflags]` keys plus the version source.
pub fn uncompiled_sources<'a>(
    table: &DependencyTable,
    sources: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    let compiled: BTreeSet<&str> = table
        .iter()
        .flat_map(|r| r.modules.iter().map(String::as_str))
        .collect();
    sources
        .into_iter()
        .filter(|source| !compiled.contains(source))
        .collect()
}

fn check_overrides(
    registry: &ArtifactRegistry,
    names: &[String],
    list: &str,
) -> Result<(), ConfigureError> {
    for name in names {
        if !registry.contains_in(name, ArtifactCategory::Test) {
            return Err(ConfigureError::UnknownOverride {
                name: name.clone(),
                list: list.to_string(),
            });
        }
    }
    Ok(())
}

/// `<name>.cc` followed by the given module sets. Sets that are not
/// declared contribute nothing.
fn test_modules(manifest: &Manifest, name: &str, sets: &[&str]) -> Vec<String> {
    let mut modules = vec![format!("{}.cc", name)];
    for set in sets {
        modules.extend(manifest.module_set(set).unwrap_or_default().iter().cloned());
    }
    dedup(modules)
}

fn explicit_modules(manifest: &Manifest, name: &str) -> Result<Vec<String>, ConfigureError> {
    let listed = match manifest.sources.get(name) {
        Some(listed) if !listed.is_empty() => listed,
        _ => return Err(ConfigureError::MissingSources(name.to_string())),
    };

    let mut modules = Vec::with_capacity(listed.len());
    for entry in listed {
        match entry.strip_prefix('@') {
            Some(set) => {
                let members = manifest.module_set(set).ok_or_else(|| ConfigureError::UnknownModuleSet {
                    set: set.to_string(),
                    artifact: name.to_string(),
                })?;
                modules.extend(members.iter().cloned());
            }
            None => modules.push(entry.clone()),
        }
    }
    Ok(dedup(modules))
}

fn dedup(modules: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    modules
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}
