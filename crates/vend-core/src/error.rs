//! Error types for vend-core

use std::path::PathBuf;

/// Result type for vend-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving and publishing modules
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A graph edge or module reference without exactly one separator
    #[error("Malformed module reference '{input}': expected exactly one '{separator}'")]
    MalformedEdge { input: String, separator: char },

    /// Module path that cannot be encoded or decoded
    #[error("Invalid module path '{path}': {reason}")]
    InvalidModulePath { path: String, reason: String },

    /// Version that is not a `v`-prefixed semantic version
    #[error("Invalid module version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Archive could not be read or extracted
    #[error("Failed to unpack archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// External build tool exited unsuccessfully
    #[error("Build tool command '{command}' failed (exit code {code:?}): {stderr}")]
    BuildTool {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Artifact repository operation failed
    #[error("Repository error for {module}: {message}")]
    Repository { module: String, message: String },

    /// A different manifest is already published under the same module ID
    #[error("Refusing to publish {module}: a different manifest is already published")]
    ManifestConflict { module: String },

    /// Module is available neither in the target repository nor upstream
    #[error("Module not found: {module}")]
    ModuleNotFound { module: String },

    /// Manifest pattern failed to compile
    #[error("Invalid manifest pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Filesystem error from vend-fs
    #[error(transparent)]
    Fs(#[from] vend_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn repository(module: impl ToString, message: impl Into<String>) -> Self {
        Self::Repository {
            module: module.to_string(),
            message: message.into(),
        }
    }
}
