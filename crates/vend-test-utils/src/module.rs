//! Module archive and proxy tree fixtures.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use vend_core::ModuleKey;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Parse a `path@version` edge, panicking on invalid input.
pub fn key(edge: &str) -> ModuleKey {
    ModuleKey::parse_edge(edge).unwrap_or_else(|e| panic!("key: invalid edge {edge}: {e}"))
}

/// Build a module zip whose entries live under `path@version/`.
///
/// # Panics
/// Panics if the archive cannot be written.
pub fn module_zip(key: &ModuleKey, files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in files {
        zip.start_file(format!("{}/{}", key.edge(), name), options)
            .unwrap_or_else(|e| panic!("module_zip: failed to start {name}: {e}"));
        zip.write_all(content.as_bytes())
            .unwrap_or_else(|e| panic!("module_zip: failed to write {name}: {e}"));
    }
    zip.finish()
        .unwrap_or_else(|e| panic!("module_zip: failed to finish archive: {e}"))
        .into_inner()
}

/// Build a zip from raw entry names, for malformed-archive tests.
pub fn raw_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A module as it appears in a proxy: manifest plus source files.
pub struct ModuleFixture {
    pub key: ModuleKey,
    pub manifest: String,
    /// `go mod graph` output replayed by the fake `go` command.
    pub graph: Vec<String>,
    pub files: Vec<(String, String)>,
}

impl ModuleFixture {
    pub fn new(edge: &str, manifest: &str) -> Self {
        Self {
            key: key(edge),
            manifest: manifest.to_string(),
            graph: Vec::new(),
            files: vec![("main.go".into(), "package main\n".into())],
        }
    }

    /// Add a dependency edge from this module to `edge`.
    pub fn depends_on(mut self, edge: &str) -> Self {
        self.graph.push(format!("{} {}", self.key.path(), edge));
        self
    }

    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push((name.into(), content.into()));
        self
    }

    /// The module zip, including `go.mod` and the graph script file.
    pub fn zip(&self) -> Vec<u8> {
        let graph = self.graph.join("\n");
        let mut files: Vec<(&str, &str)> = vec![
            ("go.mod", self.manifest.as_str()),
            (crate::go::GRAPH_FILE, graph.as_str()),
        ];
        files.extend(self.files.iter().map(|(n, c)| (n.as_str(), c.as_str())));
        module_zip(&self.key, &files)
    }
}

/// Directory tree in GOPROXY layout: `<escaped path>/@v/<version>.{mod,zip}`.
pub struct ProxyTree {
    root: PathBuf,
}

impl ProxyTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_file(&self, key: &ModuleKey, ext: &str) -> PathBuf {
        self.root
            .join(key.escaped_path())
            .join("@v")
            .join(format!("{}.{}", key.escaped_version(), ext))
    }

    /// Write `module` into the tree.
    pub fn add(&self, module: &ModuleFixture) -> &Self {
        let mod_path = self.version_file(&module.key, "mod");
        fs::create_dir_all(mod_path.parent().unwrap()).unwrap();
        fs::write(&mod_path, &module.manifest).unwrap();
        fs::write(self.version_file(&module.key, "zip"), module.zip()).unwrap();
        self
    }

    pub fn manifest(&self, key: &ModuleKey) -> Option<String> {
        fs::read_to_string(self.version_file(key, "mod")).ok()
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.version_file(key, "mod").is_file() && self.version_file(key, "zip").is_file()
    }
}
