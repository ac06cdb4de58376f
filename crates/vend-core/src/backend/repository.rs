use crate::Result;
use crate::key::ModuleKey;
use crate::package::Package;

/// Manifest and archive bytes of one module version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDownload {
    pub manifest: Vec<u8>,
    pub archive: Vec<u8>,
}

/// Remote artifact repository the modules are published to.
pub trait ArtifactRepository: Send + Sync {
    /// Publish the package archive with its current manifest under
    /// `target_repo`.
    fn publish(&self, package: &Package, target_repo: &str) -> Result<()>;

    /// Fetch the manifest stored for `key` in `target_repo`.
    fn fetch_manifest(&self, key: &ModuleKey, target_repo: &str) -> Result<Vec<u8>>;

    /// Whether `key` is already present in `target_repo`.
    fn exists(&self, key: &ModuleKey, target_repo: &str) -> Result<bool>;

    /// Download `key` through `target_repo`, falling back to its upstream
    /// source.
    fn download(&self, key: &ModuleKey, target_repo: &str) -> Result<ModuleDownload>;
}
