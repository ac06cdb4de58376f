//! Module zip extraction

use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use vend_core::{ArchiveStore, Error, ModuleKey, Result, Workspace};
use zip::ZipArchive;

/// Extracts module zips into temporary workspaces.
///
/// Module zips hold every file under a `path@version/` prefix, so extracting
/// into the workspace root puts the sources in
/// [`Workspace::module_dir`].
#[derive(Debug, Clone, Default)]
pub struct ZipArchiveStore {
    temp_root: Option<PathBuf>,
}

impl ZipArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create workspaces below `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: Some(dir.into()),
        }
    }
}

impl ArchiveStore for ZipArchiveStore {
    fn unpack(&self, archive: &Path, key: &ModuleKey) -> Result<Workspace> {
        let workspace = match &self.temp_root {
            Some(dir) => Workspace::create_in(dir, key)?,
            None => Workspace::create(key)?,
        };
        let failed = |message: String| Error::Archive {
            path: archive.to_path_buf(),
            message,
        };

        let file = File::open(archive).map_err(|e| failed(format!("failed to open: {}", e)))?;
        let mut zip =
            ZipArchive::new(file).map_err(|e| failed(format!("failed to read zip: {}", e)))?;

        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|e| failed(format!("failed to read entry {}: {}", i, e)))?;
            let name = entry.name().to_owned();
            let out_path = safe_output_path(workspace.root(), &name)
                .ok_or_else(|| failed(format!("entry escapes the workspace: {}", name)))?;

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out)?;
        }

        // An archive without entries still yields a module directory.
        fs::create_dir_all(workspace.module_dir())?;
        debug!(module = %key, dir = %workspace.root().display(), entries = zip.len(), "Unpacked module");
        Ok(workspace)
    }
}

/// Resolve `entry_name` below `output_dir`, rejecting paths that escape it.
fn safe_output_path(output_dir: &Path, entry_name: &str) -> Option<PathBuf> {
    let candidate = output_dir.join(entry_name);
    let mut components = Vec::new();
    for component in candidate.components() {
        match component {
            Component::ParentDir => {
                components.pop()?;
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    let resolved: PathBuf = components.iter().collect();
    resolved.starts_with(output_dir).then_some(resolved)
}
