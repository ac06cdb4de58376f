//! Run configuration
//!
//! [`VendorConfig`] is the file-level configuration (`vend.toml` or
//! `vend.json`); [`ResolverSettings`] is the subset every resolver node reads.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vend_fs::{ConfigStore, NormalizedPath};

use crate::Result;
use crate::local_cache::LocalModuleCache;

/// Edit marker written into manifests this tool generated or modified.
pub const DEFAULT_EDIT_MESSAGE: &str = "// Generated by vend";

/// Default target repository name.
pub const DEFAULT_TARGET_REPO: &str = "go-local";

/// Whether an empty manifest may be populated with tidy to compute the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TidyMode {
    /// Run tidy on manifests that are still empty after init.
    #[default]
    Tidy,
    /// Never run tidy; the graph is computed from the manifest as-is.
    Skip,
}

/// Settings shared by every resolver node of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub target_repo: String,
    pub edit_message: String,
    pub tidy: TidyMode,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            target_repo: DEFAULT_TARGET_REPO.to_string(),
            edit_message: DEFAULT_EDIT_MESSAGE.to_string(),
            tidy: TidyMode::default(),
        }
    }
}

/// File-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Name of the repository modules are published to.
    pub target_repo: String,
    /// Marker prepended to generated manifests.
    pub edit_message: String,
    pub tidy: TidyMode,
    /// `GOMODCACHE`-style module cache; defaults to the `go` command's.
    pub module_cache: Option<PathBuf>,
    /// Root directory holding the target repositories.
    pub repository_root: Option<PathBuf>,
    /// Upstream module mirror used when a module is missing from the target.
    pub upstream: Option<PathBuf>,
    /// Build tool binary.
    pub go_binary: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            target_repo: DEFAULT_TARGET_REPO.to_string(),
            edit_message: DEFAULT_EDIT_MESSAGE.to_string(),
            tidy: TidyMode::default(),
            module_cache: None,
            repository_root: None,
            upstream: None,
            go_binary: "go".to_string(),
        }
    }
}

impl VendorConfig {
    /// Load from a `.toml` or `.json` file; missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load(&NormalizedPath::new(path))?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(ConfigStore::new().save(&NormalizedPath::new(path), self)?)
    }

    /// The local download cache, or `None` when no default location can be
    /// determined.
    pub fn local_cache(&self) -> Option<LocalModuleCache> {
        match &self.module_cache {
            Some(dir) => Some(LocalModuleCache::in_module_cache(dir)),
            None => LocalModuleCache::default_root().map(LocalModuleCache::new),
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            target_repo: self.target_repo.clone(),
            edit_message: self.edit_message.clone(),
            tidy: self.tidy,
        }
    }
}
