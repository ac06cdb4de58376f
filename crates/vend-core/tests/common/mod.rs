//! In-memory collaborators for resolver tests.
//!
//! Archives are JSON objects mapping file names to contents, so tests can
//! build modules without zip tooling. The fake build tool reads the module's
//! graph from a `graph.txt` file inside the archive.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use vend_core::{
    ArchiveStore, ArtifactRepository, BuildTool, Error, LocalModuleCache, ModuleDownload, ModuleKey,
    Package, ResolverSettings, Result, Vendor, Workspace,
};

pub const MARKER: &str = "// Generated by vend";
pub const GRAPH_FILE: &str = "graph.txt";
pub const TIDY_REQUIREMENT: &str = "require example.com/tidied v1.0.0";

pub fn key(edge: &str) -> ModuleKey {
    ModuleKey::parse_edge(edge).unwrap()
}

/// Unpacks JSON archives into a workspace.
pub struct JsonArchiveStore;

impl ArchiveStore for JsonArchiveStore {
    fn unpack(&self, archive: &Path, key: &ModuleKey) -> Result<Workspace> {
        let bytes = fs::read(archive).map_err(|e| Error::Archive {
            path: archive.to_path_buf(),
            message: e.to_string(),
        })?;
        let files: BTreeMap<String, String> = serde_json::from_slice(&bytes)?;
        let workspace = Workspace::create(key)?;
        fs::create_dir_all(workspace.module_dir())?;
        for (name, content) in files {
            fs::write(workspace.module_dir().join(name), content)?;
        }
        Ok(workspace)
    }
}

pub fn json_archive(manifest: &str, graph: &[&str], extra: &[(&str, &str)]) -> Vec<u8> {
    let mut files = BTreeMap::new();
    files.insert("go.mod".to_string(), manifest.to_string());
    files.insert("main.go".to_string(), "package main\n".to_string());
    files.insert(GRAPH_FILE.to_string(), graph.join("\n"));
    for (name, content) in extra {
        files.insert(name.to_string(), content.to_string());
    }
    serde_json::to_vec(&files).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init { module_name: String },
    Tidy { module_dir: PathBuf },
    Graph { module_dir: PathBuf, lock_present: bool },
}

#[derive(Debug, Default)]
struct ToolState {
    calls: Vec<Call>,
    fail_init: bool,
    fail_graph: bool,
}

/// Scripted build tool that records every call.
#[derive(Debug, Clone, Default)]
pub struct FakeBuildTool {
    state: Arc<Mutex<ToolState>>,
}

impl FakeBuildTool {
    pub fn fail_init(&self) {
        self.state.lock().unwrap().fail_init = true;
    }

    pub fn fail_graph(&self) {
        self.state.lock().unwrap().fail_graph = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn init_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Init { .. }))
            .count()
    }

    pub fn tidy_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Tidy { .. }))
            .count()
    }

    pub fn module_dirs(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Graph { module_dir, .. } => Some(module_dir),
                _ => None,
            })
            .collect()
    }

    pub fn lock_present_at_graph(&self, module: &ModuleKey) -> Option<bool> {
        self.calls().into_iter().find_map(|c| match c {
            Call::Graph {
                module_dir,
                lock_present,
            } if module_dir.ends_with(module.edge()) => Some(lock_present),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl BuildTool for FakeBuildTool {
    fn init(&self, module_dir: &Path, module_name: &str, edit_message: &str) -> Result<()> {
        self.record(Call::Init {
            module_name: module_name.to_string(),
        });
        if self.state.lock().unwrap().fail_init {
            return Err(Error::BuildTool {
                command: "go mod init".into(),
                code: Some(1),
                stderr: "go: cannot determine module path".into(),
            });
        }
        fs::write(
            module_dir.join("go.mod"),
            format!("{}\n\nmodule {}\n", edit_message, module_name),
        )?;
        Ok(())
    }

    fn tidy(&self, module_dir: &Path) -> Result<()> {
        self.record(Call::Tidy {
            module_dir: module_dir.to_path_buf(),
        });
        let path = module_dir.join("go.mod");
        let mut content = fs::read_to_string(&path).unwrap_or_default();
        content.push_str(&format!("\n{}\n", TIDY_REQUIREMENT));
        fs::write(&path, content)?;
        Ok(())
    }

    fn graph(&self, module_dir: &Path) -> Result<BTreeSet<String>> {
        self.record(Call::Graph {
            module_dir: module_dir.to_path_buf(),
            lock_present: module_dir.join("go.sum").exists(),
        });
        if self.state.lock().unwrap().fail_graph {
            return Err(Error::BuildTool {
                command: "go mod graph".into(),
                code: Some(1),
                stderr: "boom".into(),
            });
        }
        let content = fs::read_to_string(module_dir.join(GRAPH_FILE)).unwrap_or_default();
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

#[derive(Debug, Default)]
struct RepoState {
    published: HashMap<ModuleKey, Vec<u8>>,
    publish_calls: Vec<(ModuleKey, Vec<u8>)>,
    existing: HashSet<ModuleKey>,
    upstream: HashMap<ModuleKey, ModuleDownload>,
    fail_publish: HashSet<ModuleKey>,
    fail_download_once: HashSet<ModuleKey>,
}

/// Artifact repository held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Arc<Mutex<RepoState>>,
}

impl MemoryRepository {
    pub fn add_upstream(&self, key: ModuleKey, download: ModuleDownload) {
        self.state.lock().unwrap().upstream.insert(key, download);
    }

    /// Pretend `key` was published by an earlier run.
    pub fn seed_published(&self, key: ModuleKey, manifest: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.existing.insert(key.clone());
        state.published.insert(key, manifest.to_vec());
    }

    pub fn fail_publish(&self, key: ModuleKey) {
        self.state.lock().unwrap().fail_publish.insert(key);
    }

    /// Make the next download of `key` fail with a transient error.
    pub fn fail_download_once(&self, key: ModuleKey) {
        self.state.lock().unwrap().fail_download_once.insert(key);
    }

    pub fn publish_calls(&self) -> Vec<(ModuleKey, Vec<u8>)> {
        self.state.lock().unwrap().publish_calls.clone()
    }

    pub fn publish_count(&self, key: &ModuleKey) -> usize {
        self.publish_calls().iter().filter(|(k, _)| k == key).count()
    }

    pub fn published_manifest(&self, key: &ModuleKey) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .published
            .get(key)
            .map(|m| String::from_utf8_lossy(m).into_owned())
    }
}

impl ArtifactRepository for MemoryRepository {
    fn publish(&self, package: &Package, _target_repo: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let key = package.key().clone();
        state
            .publish_calls
            .push((key.clone(), package.manifest().to_vec()));
        if state.fail_publish.contains(&key) {
            return Err(Error::repository(&key, "409 Conflict"));
        }
        state.published.insert(key.clone(), package.manifest().to_vec());
        state.existing.insert(key);
        Ok(())
    }

    fn fetch_manifest(&self, key: &ModuleKey, _target_repo: &str) -> Result<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .published
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound {
                module: key.to_string(),
            })
    }

    fn exists(&self, key: &ModuleKey, _target_repo: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().existing.contains(key))
    }

    fn download(&self, key: &ModuleKey, _target_repo: &str) -> Result<ModuleDownload> {
        let mut state = self.state.lock().unwrap();
        if state.fail_download_once.remove(key) {
            return Err(Error::repository(key, "503 Service Unavailable"));
        }
        state
            .upstream
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound {
                module: key.to_string(),
            })
    }
}

/// Temporary directories plus handles on the fakes.
pub struct TestEnv {
    pub temp: TempDir,
    pub build_tool: FakeBuildTool,
    pub repository: MemoryRepository,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            build_tool: FakeBuildTool::default(),
            repository: MemoryRepository::default(),
        }
    }

    pub fn module_cache(&self) -> LocalModuleCache {
        LocalModuleCache::new(self.temp.path().join("modcache"))
    }

    /// Write an archive for `edge` and return the root package backed by it.
    pub fn package(&self, edge: &str, manifest: &str, graph: &[&str]) -> Package {
        self.package_with(edge, manifest, graph, &[])
    }

    pub fn package_with(
        &self,
        edge: &str,
        manifest: &str,
        graph: &[&str],
        extra: &[(&str, &str)],
    ) -> Package {
        let key = key(edge);
        let dir = self.temp.path().join("archives");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}@{}.json", key.escaped_path().replace('/', "_"), key.version()));
        fs::write(&path, json_archive(manifest, graph, extra)).unwrap();
        Package::new(key, manifest.as_bytes().to_vec(), path)
    }

    /// Make `edge` downloadable from upstream.
    pub fn upstream(&self, edge: &str, manifest: &str, graph: &[&str]) {
        self.repository.add_upstream(
            key(edge),
            ModuleDownload {
                manifest: manifest.as_bytes().to_vec(),
                archive: json_archive(manifest, graph, &[]),
            },
        );
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor_with(ResolverSettings::default())
    }

    pub fn vendor_with(&self, settings: ResolverSettings) -> Vendor {
        Vendor::new(
            settings,
            self.module_cache(),
            Box::new(JsonArchiveStore),
            Box::new(self.build_tool.clone()),
            Box::new(self.repository.clone()),
        )
        .unwrap()
    }
}
