//! Module package: identity plus mutable manifest content

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::key::ModuleKey;

/// One module version as seen by the resolver.
///
/// Equality and hashing use only the [`ModuleKey`]: two packages with the
/// same key denote the same published artifact.
#[derive(Debug, Clone)]
pub struct Package {
    key: ModuleKey,
    manifest: Vec<u8>,
    archive: PathBuf,
}

impl Package {
    pub fn new(key: ModuleKey, manifest: impl Into<Vec<u8>>, archive: impl Into<PathBuf>) -> Self {
        Self {
            key,
            manifest: manifest.into(),
            archive: archive.into(),
        }
    }

    pub fn key(&self) -> &ModuleKey {
        &self.key
    }

    /// The `path:version` ID.
    pub fn id(&self) -> String {
        self.key.to_string()
    }

    pub fn manifest(&self) -> &[u8] {
        &self.manifest
    }

    /// Replace the manifest content.
    pub fn set_manifest(&mut self, manifest: impl Into<Vec<u8>>) {
        self.manifest = manifest.into();
    }

    /// Location of the archive holding the module source tree.
    pub fn archive(&self) -> &Path {
        &self.archive
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
