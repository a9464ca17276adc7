//! Build modes.

use serde::{Deserialize, Serialize};

/// A named build configuration variant.
///
/// Each selected mode becomes an independent sub-graph of the build file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildMode {
    /// Mode name, also the output directory under the build dir
    #[serde(skip)]
    pub name: String,

    /// Sanitizer compile flags
    #[serde(default)]
    pub sanitize: String,

    /// Sanitizer runtime libraries
    #[serde(default)]
    pub sanitize_libs: String,

    /// Optimization and mode-specific defines
    #[serde(default)]
    pub opt: String,

    /// Extra libraries linked in this mode
    #[serde(default)]
    pub libs: String,
}

impl BuildMode {
    /// Whether this mode builds with sanitizers.
    pub fn is_sanitized(&self) -> bool {
        !self.sanitize.trim().is_empty()
    }
}

/// The built-in mode table: `debug` (sanitized, unoptimized) and `release`.
pub fn default_modes() -> Vec<BuildMode> {
    vec![
        BuildMode {
            name: "debug".to_string(),
            sanitize: "-fsanitize=address -fsanitize=leak -fsanitize=undefined".to_string(),
            sanitize_libs: "-lasan -lubsan".to_string(),
            opt: "-O0 -DDEBUG -DDEBUG_SHARED_PTR -DDEFAULT_ALLOCATOR -DDEBUG_LSA_SANITIZER"
                .to_string(),
            libs: String::new(),
        },
        BuildMode {
            name: "release".to_string(),
            sanitize: String::new(),
            sanitize_libs: String::new(),
            opt: "-O3".to_string(),
            libs: String::new(),
        },
    ]
}
