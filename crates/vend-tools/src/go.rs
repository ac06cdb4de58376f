//! `go` command wrapper

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;
use vend_core::{BuildTool, Error, Result};
use vend_fs::{ModulePath, NormalizedPath, io};

/// Runs `go mod` subcommands inside a module directory.
///
/// `GOFLAGS=-mod=mod` is set by default so the graph can be computed from a
/// manifest that is not yet consistent with the sources.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    binary: PathBuf,
    env: Vec<(OsString, OsString)>,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoToolchain {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            env: vec![("GOFLAGS".into(), "-mod=mod".into())],
        }
    }

    /// Set an environment variable for every invocation, replacing an earlier
    /// value for the same key.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let key = key.into();
        self.env.retain(|(k, _)| *k != key);
        self.env.push((key, value.into()));
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, module_dir: &Path, args: &[&str]) -> Result<String> {
        let command = format!("{} {}", self.binary.display(), args.join(" "));
        debug!(command = %command, dir = %module_dir.display(), "Running build tool");

        let output = Command::new(&self.binary)
            .current_dir(module_dir)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .args(args)
            .output()
            .map_err(|e| Error::BuildTool {
                command: command.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::BuildTool {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl BuildTool for GoToolchain {
    fn init(&self, module_dir: &Path, module_name: &str, edit_message: &str) -> Result<()> {
        self.run(module_dir, &["mod", "init", module_name])?;

        if edit_message.is_empty() {
            return Ok(());
        }
        let manifest = NormalizedPath::new(module_dir.join(ModulePath::Manifest.as_str()));
        let content = io::read_bytes(&manifest)?;
        let mut marked = Vec::with_capacity(edit_message.len() + 2 + content.len());
        marked.extend_from_slice(edit_message.as_bytes());
        marked.extend_from_slice(b"\n\n");
        marked.extend_from_slice(&content);
        io::write_atomic(&manifest, &marked)?;
        Ok(())
    }

    fn tidy(&self, module_dir: &Path) -> Result<()> {
        self.run(module_dir, &["mod", "tidy"])?;
        Ok(())
    }

    fn graph(&self, module_dir: &Path) -> Result<BTreeSet<String>> {
        let stdout = self.run(module_dir, &["mod", "graph"])?;
        Ok(parse_graph(&stdout))
    }
}

/// Collect the right-hand side of every `from to` line.
fn parse_graph(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _from = fields.next()?;
            fields.next().map(String::from)
        })
        .collect()
}
