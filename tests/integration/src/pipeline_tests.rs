//! End-to-end tests of the resolution pipeline
//!
//! Wires the real collaborators together: module zips are unpacked by
//! `ZipArchiveStore`, a scripted `go` command stands in for the toolchain,
//! and modules are published into a `DirectoryRepository`.

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vend_core::{Lookup, LocalModuleCache, ModuleKey, ResolverSettings, Vendor};
use vend_test_utils::go::{TIDY_FILE, fake_go, logged_calls};
use vend_test_utils::module::{ModuleFixture, ProxyTree, key};
use vend_tools::{DirectoryRepository, GoToolchain, ZipArchiveStore};

const REPO: &str = "go-local";

struct Pipeline {
    temp: TempDir,
    go: PathBuf,
}

impl Pipeline {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let go = fake_go(&temp.path().join("bin"));
        Self { temp, go }
    }

    fn upstream(&self) -> ProxyTree {
        ProxyTree::new(self.temp.path().join("upstream"))
    }

    fn target(&self) -> ProxyTree {
        ProxyTree::new(self.temp.path().join("repos").join(REPO))
    }

    fn go_log(&self) -> PathBuf {
        self.temp.path().join("go.log")
    }

    fn vendor(&self) -> Vendor {
        let repository = DirectoryRepository::new(self.temp.path().join("repos"))
            .with_upstream(self.temp.path().join("upstream"));
        let go = GoToolchain::new(&self.go).env("FAKE_GO_LOG", self.go_log());
        Vendor::new(
            ResolverSettings::default(),
            LocalModuleCache::new(self.temp.path().join("modcache")),
            Box::new(ZipArchiveStore::in_dir(self.work_dir())),
            Box::new(go),
            Box::new(repository),
        )
        .unwrap()
    }

    fn work_dir(&self) -> PathBuf {
        let dir = self.temp.path().join("work");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn init_calls(&self) -> Vec<String> {
        logged_calls(&self.go_log())
            .into_iter()
            .filter(|line| line.starts_with("mod init"))
            .collect()
    }
}

fn populated(module: &ModuleKey, requires: &[&str]) -> String {
    let mut manifest = format!("module {}\n", module.path());
    for edge in requires {
        let dep = key(edge);
        manifest.push_str(&format!("\nrequire {} {}\n", dep.path(), dep.version()));
    }
    manifest
}

#[test]
fn publishes_transitive_closure() {
    let pipeline = Pipeline::new();
    let (a, b, c) = (
        "example.com/a@v1.0.0",
        "example.com/b@v1.1.0",
        "example.com/c@v0.2.0",
    );
    pipeline
        .upstream()
        .add(&ModuleFixture::new(a, &populated(&key(a), &[b, c])).depends_on(b).depends_on(c))
        .add(&ModuleFixture::new(b, &populated(&key(b), &[c])).depends_on(c))
        .add(&ModuleFixture::new(c, &populated(&key(c), &["example.com/leaf@v1.0.0"])));

    let vendor = pipeline.vendor();
    vendor.resolve_root(&key(a)).unwrap();

    let report = vendor.report();
    assert_eq!(report.failed, 0);
    assert_eq!(report.total, 3);
    for edge in [a, b, c] {
        assert!(pipeline.target().contains(&key(edge)), "{edge} not published");
        assert_eq!(
            pipeline.target().manifest(&key(edge)),
            pipeline.upstream().manifest(&key(edge))
        );
    }
    assert!(pipeline.init_calls().is_empty());
    assert!(fs::read_dir(pipeline.work_dir()).unwrap().next().is_none());
}

#[test]
fn bootstraps_empty_manifest_and_publishes_original() {
    let pipeline = Pipeline::new();
    let root = "example.com/legacy@v0.0.1";
    let dep = "example.com/dep@v1.0.0";
    pipeline
        .upstream()
        .add(
            &ModuleFixture::new(root, "")
                .file(TIDY_FILE, "require example.com/dep v1.0.0\n")
                .depends_on(dep),
        )
        .add(&ModuleFixture::new(dep, &populated(&key(dep), &["example.com/x@v1.0.0"])));

    let vendor = pipeline.vendor();
    vendor.resolve_root(&key(root)).unwrap();

    assert_eq!(pipeline.init_calls(), vec!["mod init example.com/legacy GOFLAGS=-mod=mod"]);
    assert_eq!(
        pipeline.target().manifest(&key(root)).unwrap(),
        "// Generated by vend\n\n"
    );
    assert!(pipeline.target().contains(&key(dep)));
    assert_eq!(
        LocalModuleCache::new(pipeline.temp.path().join("modcache"))
            .read_manifest(&key(root))
            .unwrap(),
        b"// Generated by vend\n\n"
    );
}

#[test]
fn uppercase_paths_use_escaped_layout() {
    let pipeline = Pipeline::new();
    let edge = "github.com/Azure/go-autorest@v14.2.0+incompatible";
    pipeline
        .upstream()
        .add(&ModuleFixture::new(edge, &populated(&key(edge), &["example.com/x@v1.0.0"])));

    let vendor = pipeline.vendor();
    vendor.resolve_root(&key(edge)).unwrap();

    assert!(
        pipeline
            .temp
            .path()
            .join("repos/go-local/github.com/!azure/go-autorest/@v/v14.2.0+incompatible.zip")
            .is_file()
    );
    assert_eq!(vendor.cache().lookup(&key(edge)), Lookup::Published);
}

#[test]
fn conflicting_manifest_in_target_is_a_failure() {
    let pipeline = Pipeline::new();
    let edge = "example.com/foo@v1.0.0";
    pipeline
        .upstream()
        .add(&ModuleFixture::new(edge, &populated(&key(edge), &["example.com/x@v1.0.0"])));
    // A manifest without its zip: present, but not a complete module.
    let stale = pipeline.target().version_file(&key(edge), "mod");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "module example.com/foo\n\nrequire example.com/old v0.1.0\n").unwrap();

    let vendor = pipeline.vendor();
    vendor.resolve_root(&key(edge)).unwrap();

    let report = vendor.report();
    assert_eq!(report.failed, 1);
    assert!(report.published.is_empty());
    assert_eq!(
        pipeline.target().manifest(&key(edge)).unwrap(),
        "module example.com/foo\n\nrequire example.com/old v0.1.0\n"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn parallel_roots_publish_shared_dependency_once() {
    let pipeline = Pipeline::new();
    let shared = "example.com/shared@v1.0.0";
    let roots = ["example.com/r1@v1.0.0", "example.com/r2@v1.0.0", "example.com/r3@v1.0.0"];
    let upstream = pipeline.upstream();
    upstream.add(&ModuleFixture::new(shared, &populated(&key(shared), &["example.com/x@v1.0.0"])));
    for root in roots {
        upstream.add(&ModuleFixture::new(root, &populated(&key(root), &[shared])).depends_on(shared));
    }

    let vendor = Arc::new(pipeline.vendor());
    let handles: Vec<_> = roots
        .into_iter()
        .map(|root| {
            let vendor = Arc::clone(&vendor);
            tokio::task::spawn_blocking(move || vendor.resolve_root(&key(root)))
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let report = vendor.report();
    assert_eq!(report.failed, 0);
    assert_eq!(report.published.len(), 4);
    assert!(pipeline.target().contains(&key(shared)));
}

#[test]
fn rerun_is_idempotent() {
    let pipeline = Pipeline::new();
    let a = "example.com/a@v1.0.0";
    let b = "example.com/b@v1.0.0";
    pipeline
        .upstream()
        .add(&ModuleFixture::new(a, &populated(&key(a), &[b])).depends_on(b))
        .add(&ModuleFixture::new(b, &populated(&key(b), &["example.com/x@v1.0.0"])));

    pipeline.vendor().resolve_root(&key(a)).unwrap();
    let before = pipeline.target().manifest(&key(a)).unwrap();

    let second = pipeline.vendor();
    second.resolve_root(&key(a)).unwrap();

    let report = second.report();
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, report.total);
    assert_eq!(pipeline.target().manifest(&key(a)).unwrap(), before);
}
