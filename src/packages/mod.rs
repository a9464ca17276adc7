//! Optional system package resolution.
//!
//! Each optional package is a prioritized list of alternative names. The
//! first installed alternative is selected, a `HAVE_<CANONICAL>=1` define is
//! registered, and the package's own compile and link flags are collected.

pub mod pkg_config;
pub mod registry;

pub use pkg_config::PkgConfig;
pub use registry::PackageRegistry;

use anyhow::Result;

use crate::core::error::ConfigureError;
use crate::core::options::{ConfigureOptions, Tristate};
use crate::core::package::OptionalPackage;

/// Outcome of package resolution, merged into the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageResolution {
    /// Selected package names, one per found optional package
    pub selected: Vec<String>,
    /// Defines without the `-D` prefix, e.g. `HAVE_LIBSYSTEMD=1`
    pub defines: Vec<String>,
    /// Compile flags of the selected packages
    pub cflags: Vec<String>,
    /// Link flags of the selected packages
    pub libs: Vec<String>,
}

impl PackageResolution {
    /// Defines as compiler flags.
    pub fn define_flags(&self) -> String {
        self.defines
            .iter()
            .map(|d| format!("-D{}", d))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Select the first installed alternative of `package`.
pub fn find_first(registry: &dyn PackageRegistry, package: &OptionalPackage) -> Option<String> {
    package
        .alternatives
        .iter()
        .find(|name| registry.exists(name))
        .cloned()
}

/// Resolve every optional package against `registry`.
///
/// A package whose controlling feature is disabled is never queried. A
/// missing package is an advisory, unless its feature was explicitly
/// enabled.
pub fn resolve_packages(
    registry: &dyn PackageRegistry,
    packages: &[OptionalPackage],
    opts: &ConfigureOptions,
) -> Result<PackageResolution> {
    let mut resolution = PackageResolution::default();

    for package in packages {
        let state = match package.feature {
            Some(ref feature) => opts.feature(feature),
            None => Tristate::Auto,
        };
        if state == Tristate::Disabled {
            tracing::debug!("skipping {}: disabled", package.canonical());
            continue;
        }

        let Some(found) = find_first(registry, package) else {
            if state == Tristate::Enabled {
                return Err(ConfigureError::MandatoryDependencyMissing {
                    what: format!(
                        "required package {} not found by {}",
                        package.describe(),
                        registry.name()
                    ),
                    hint: format!("Install {} or drop the enable switch", package.canonical()),
                }
                .into());
            }
            tracing::warn!("missing optional package {}", package.describe());
            continue;
        };

        tracing::debug!("using {} for {}", found, package.define_name());
        resolution.defines.push(format!("{}=1", package.define_name()));
        push_nonempty(&mut resolution.cflags, registry.cflags(&found)?);
        push_nonempty(&mut resolution.libs, registry.libs(&found)?);
        resolution.selected.push(found);
    }

    Ok(resolution)
}

fn push_nonempty(list: &mut Vec<String>, flags: String) {
    if !flags.is_empty() {
        list.push(flags);
    }
}
