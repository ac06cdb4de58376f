//! On-disk mirror of resolved modules
//!
//! Layout: `<root>/<escaped path>/@v/<version>.mod` and `.zip`, the same
//! layout the `go` command uses for its download cache, so manifests written
//! here are picked up by later builds without resolving again.

use std::path::{Path, PathBuf};

use tracing::debug;
use vend_fs::constants::{ARCHIVE_EXT, MANIFEST_EXT};
use vend_fs::{ModulePath, NormalizedPath, io};

use crate::Result;
use crate::backend::ModuleDownload;
use crate::key::ModuleKey;
use crate::package::Package;

/// Environment variable overriding the module cache location.
pub const MODULE_CACHE_ENV: &str = "GOMODCACHE";

#[derive(Debug, Clone)]
pub struct LocalModuleCache {
    root: NormalizedPath,
}

impl LocalModuleCache {
    pub fn new(root: impl Into<NormalizedPath>) -> Self {
        Self { root: root.into() }
    }

    /// The download cache inside a `GOMODCACHE`-style module cache directory.
    pub fn in_module_cache(module_cache: &Path) -> Self {
        Self::new(module_cache.join("cache").join("download"))
    }

    /// The default download cache: `$GOMODCACHE/cache/download`, else
    /// `~/go/pkg/mod/cache/download`.
    pub fn default_root() -> Option<PathBuf> {
        let module_cache = match std::env::var_os(MODULE_CACHE_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()?.join("go").join("pkg").join("mod"),
        };
        Some(module_cache.join("cache").join("download"))
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    fn version_file(&self, key: &ModuleKey, ext: &str) -> NormalizedPath {
        self.root
            .join(&key.escaped_path())
            .join(ModulePath::VersionDir.as_str())
            .join(&format!("{}.{}", key.escaped_version(), ext))
    }

    pub fn manifest_path(&self, key: &ModuleKey) -> NormalizedPath {
        self.version_file(key, MANIFEST_EXT)
    }

    pub fn archive_path(&self, key: &ModuleKey) -> NormalizedPath {
        self.version_file(key, ARCHIVE_EXT)
    }

    pub fn read_manifest(&self, key: &ModuleKey) -> Result<Vec<u8>> {
        Ok(io::read_bytes(&self.manifest_path(key))?)
    }

    pub fn write_manifest(&self, key: &ModuleKey, content: &[u8]) -> Result<()> {
        let path = self.manifest_path(key);
        debug!(module = %key, path = %path, "Writing manifest to local module cache");
        io::write_atomic(&path, content)?;
        Ok(())
    }

    /// Build a package from the cache.
    ///
    /// Returns `None` unless both the archive and the manifest are present.
    pub fn load(&self, key: &ModuleKey) -> Result<Option<Package>> {
        let archive = self.archive_path(key);
        if !archive.is_file() {
            return Ok(None);
        }
        let manifest = match io::read_bytes(&self.manifest_path(key)) {
            Ok(manifest) => manifest,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(Package::new(key.clone(), manifest, archive.to_native())))
    }

    /// Persist a download and return the package backed by it.
    pub fn store(&self, key: &ModuleKey, download: ModuleDownload) -> Result<Package> {
        let archive = self.archive_path(key);
        io::write_atomic(&archive, &download.archive)?;
        self.write_manifest(key, &download.manifest)?;
        Ok(Package::new(key.clone(), download.manifest, archive.to_native()))
    }
}
