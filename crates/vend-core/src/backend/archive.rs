use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vend_fs::ModulePath;

use crate::Result;
use crate::key::ModuleKey;

/// Extracts a package archive into a private temporary workspace.
pub trait ArchiveStore: Send + Sync {
    /// Unpack `archive` for `key` and return the workspace holding it.
    fn unpack(&self, archive: &Path, key: &ModuleKey) -> Result<Workspace>;
}

/// Temporary directory holding one unpacked module.
///
/// The directory name is derived from `path@version`, and the module source
/// lives under `<root>/<path>@<version>/`, matching the layout of module
/// archives. Dropping the workspace removes it; [`Workspace::close`] does the
/// same but reports failures.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    module_dir: PathBuf,
}

impl Workspace {
    /// Create an empty workspace for `key` in the system temp directory.
    pub fn create(key: &ModuleKey) -> Result<Self> {
        Self::create_in(&std::env::temp_dir(), key)
    }

    /// Create an empty workspace for `key` below `base`.
    pub fn create_in(base: &Path, key: &ModuleKey) -> Result<Self> {
        let prefix = format!(
            "{}@{}-",
            key.escaped_path().replace(['/', '\\'], "_"),
            key.escaped_version()
        );
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(base)
            .map_err(|e| vend_fs::Error::io(base, e))?;
        let module_dir = dir.path().join(key.edge());
        Ok(Self { dir, module_dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory containing the module's own files.
    pub fn module_dir(&self) -> &Path {
        &self.module_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.module_dir.join(ModulePath::Manifest.as_str())
    }

    pub fn lock_path(&self) -> PathBuf {
        self.module_dir.join(ModulePath::LockFile.as_str())
    }

    /// Remove the workspace recursively.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
