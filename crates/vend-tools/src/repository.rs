//! Artifact repository over directories in GOPROXY layout
//!
//! Target repository `R` lives at `<root>/R/`. Each module version is stored
//! as `<escaped path>/@v/<version>.mod`, `.zip` and `.info`, which is the
//! layout a `GOPROXY=file://...` client reads.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vend_core::{ArtifactRepository, Error, ModuleDownload, ModuleKey, Package, Result};
use vend_fs::checksum::compute_checksum;
use vend_fs::constants::{ARCHIVE_EXT, INFO_EXT, MANIFEST_EXT};
use vend_fs::{ModulePath, NormalizedPath, io};

/// Contents of a `<version>.info` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    pub version: String,
    pub time: DateTime<Utc>,
}

/// Repository rooted at a directory, with an optional read-only upstream
/// tree in the same layout.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    root: PathBuf,
    upstream: Option<PathBuf>,
}

impl DirectoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            upstream: None,
        }
    }

    /// Fall back to `upstream` for modules the target repository lacks.
    pub fn with_upstream(mut self, upstream: impl Into<PathBuf>) -> Self {
        self.upstream = Some(upstream.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the target repository `target_repo`.
    pub fn repo_dir(&self, target_repo: &str) -> PathBuf {
        self.root.join(target_repo)
    }

    fn version_file(base: &Path, key: &ModuleKey, ext: &str) -> NormalizedPath {
        NormalizedPath::new(base)
            .join(&key.escaped_path())
            .join(ModulePath::VersionDir.as_str())
            .join(&format!("{}.{}", key.escaped_version(), ext))
    }

    fn contains(base: &Path, key: &ModuleKey) -> bool {
        Self::version_file(base, key, MANIFEST_EXT).is_file()
            && Self::version_file(base, key, ARCHIVE_EXT).is_file()
    }

    fn read_module(base: &Path, key: &ModuleKey) -> Result<ModuleDownload> {
        Ok(ModuleDownload {
            manifest: io::read_bytes(&Self::version_file(base, key, MANIFEST_EXT))?,
            archive: io::read_bytes(&Self::version_file(base, key, ARCHIVE_EXT))?,
        })
    }
}

impl ArtifactRepository for DirectoryRepository {
    fn publish(&self, package: &Package, target_repo: &str) -> Result<()> {
        let key = package.key();
        let base = self.repo_dir(target_repo);
        let manifest_path = Self::version_file(&base, key, MANIFEST_EXT);
        let archive_path = Self::version_file(&base, key, ARCHIVE_EXT);

        match io::read_bytes(&manifest_path) {
            Ok(existing) => {
                if compute_checksum(&existing) != compute_checksum(package.manifest()) {
                    return Err(Error::ManifestConflict {
                        module: key.to_string(),
                    });
                }
                if archive_path.is_file() {
                    debug!(module = %key, repo = target_repo, "Identical module already stored");
                    return Ok(());
                }
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let archive = io::read_bytes(&NormalizedPath::new(package.archive()))?;
        let version_info = VersionInfo {
            version: key.version().to_string(),
            time: Utc::now(),
        };

        io::write_atomic(&archive_path, &archive)?;
        io::write_atomic(
            &Self::version_file(&base, key, INFO_EXT),
            &serde_json::to_vec(&version_info)?,
        )?;
        // Written last: a manifest marks the version as complete.
        io::write_atomic(&manifest_path, package.manifest())?;

        info!(module = %key, repo = target_repo, path = %manifest_path, "Stored module");
        Ok(())
    }

    fn fetch_manifest(&self, key: &ModuleKey, target_repo: &str) -> Result<Vec<u8>> {
        let path = Self::version_file(&self.repo_dir(target_repo), key, MANIFEST_EXT);
        match io::read_bytes(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.is_not_found() => Err(Error::ModuleNotFound {
                module: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &ModuleKey, target_repo: &str) -> Result<bool> {
        Ok(Self::contains(&self.repo_dir(target_repo), key))
    }

    fn download(&self, key: &ModuleKey, target_repo: &str) -> Result<ModuleDownload> {
        let target = self.repo_dir(target_repo);
        if Self::contains(&target, key) {
            debug!(module = %key, repo = target_repo, "Downloading from target repository");
            return Self::read_module(&target, key);
        }
        if let Some(upstream) = &self.upstream
            && Self::contains(upstream, key)
        {
            debug!(module = %key, upstream = %upstream.display(), "Downloading from upstream");
            return Self::read_module(upstream, key);
        }
        Err(Error::ModuleNotFound {
            module: key.to_string(),
        })
    }
}
