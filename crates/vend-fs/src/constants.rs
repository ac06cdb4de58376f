//! Well-known file and directory names of the module layout.

use std::path::Path;

/// Names used by module workspaces, the local module cache and GOPROXY-style
/// repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulePath {
    /// The manifest file inside a module workspace (`go.mod`)
    Manifest,
    /// The lock file inside a module workspace (`go.sum`)
    LockFile,
    /// The per-module version directory (`@v`)
    VersionDir,
}

impl ModulePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "go.mod",
            Self::LockFile => "go.sum",
            Self::VersionDir => "@v",
        }
    }
}

/// Extension of a cached or published manifest (`<version>.mod`).
pub const MANIFEST_EXT: &str = "mod";

/// Extension of a cached or published archive (`<version>.zip`).
pub const ARCHIVE_EXT: &str = "zip";

/// Extension of the version metadata file (`<version>.info`).
pub const INFO_EXT: &str = "info";

impl AsRef<Path> for ModulePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ModulePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
