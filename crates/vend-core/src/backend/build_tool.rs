use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use vend_fs::{ModulePath, NormalizedPath, io};

use crate::Result;

/// Lock file content set aside while the manifest is being worked on.
#[derive(Debug, Clone)]
pub struct LockFile {
    pub content: Vec<u8>,
    pub permissions: fs::Permissions,
}

/// External build tool operations, run inside a module directory.
pub trait BuildTool: Send + Sync {
    /// Create a fresh manifest for `module_name`, marked with `edit_message`.
    fn init(&self, module_dir: &Path, module_name: &str, edit_message: &str) -> Result<()>;

    /// Recompute the manifest from the module's imports.
    fn tidy(&self, module_dir: &Path) -> Result<()>;

    /// Compute the dependency graph as a set of `path@version` strings.
    fn graph(&self, module_dir: &Path) -> Result<BTreeSet<String>>;

    /// Move the lock file out of `module_dir`, returning it if one existed.
    fn extract_lock_file(&self, module_dir: &Path) -> Result<Option<LockFile>> {
        let path = NormalizedPath::new(module_dir.join(ModulePath::LockFile.as_str()));
        let content = match io::read_bytes(&path) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let permissions = io::permissions(&path)?;
        io::remove_if_exists(&path)?;
        Ok(Some(LockFile {
            content,
            permissions,
        }))
    }

    /// Put a previously extracted lock file back into `module_dir`.
    fn restore_lock_file(&self, module_dir: &Path, lock: LockFile) -> Result<()> {
        let path = NormalizedPath::new(module_dir.join(ModulePath::LockFile.as_str()));
        io::write_atomic(&path, &lock.content)?;
        io::set_permissions(&path, lock.permissions)?;
        Ok(())
    }
}
