//! PackageRegistry trait - common interface for system package registries.

use anyhow::Result;

/// A registry of installed system packages.
pub trait PackageRegistry {
    /// Get the registry name for display.
    fn name(&self) -> &str;

    /// Whether `package` is installed. A registry that cannot be queried
    /// reports every package as absent.
    fn exists(&self, package: &str) -> bool;

    /// Compile flags of an installed package.
    fn cflags(&self, package: &str) -> Result<String>;

    /// Link flags of an installed package.
    fn libs(&self, package: &str) -> Result<String>;
}
