//! CLI end-to-end tests that invoke the compiled `vend` binary against a
//! scripted `go` command and temporary repositories.

#![cfg(unix)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vend_test_utils::go::{TIDY_FILE, fake_go};
use vend_test_utils::module::{ModuleFixture, ProxyTree, key};

const FOO: &str = "example.com/foo@v1.0.0";
const BAR: &str = "example.com/bar@v2.0.0";

struct Sandbox {
    temp: TempDir,
    go: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let go = fake_go(&temp.path().join("bin"));
        Self { temp, go }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    fn upstream(&self) -> ProxyTree {
        ProxyTree::new(self.path("upstream"))
    }

    fn target(&self, repo: &str) -> ProxyTree {
        ProxyTree::new(self.path("repos").join(repo))
    }

    /// `vend` with every location pointed into the sandbox.
    fn vend(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vend"));
        cmd.current_dir(self.temp.path())
            .env_remove("VEND_TARGET_REPO")
            .env_remove("VEND_REPOSITORY_ROOT")
            .env_remove("VEND_UPSTREAM")
            .env("GOMODCACHE", self.path("gomod"))
            .env("RUST_LOG", "warn");
        cmd
    }

    fn publish(&self, modules: &[&str]) -> Command {
        let mut cmd = self.vend();
        cmd.arg("publish")
            .args(modules)
            .arg("--repository-root")
            .arg(self.path("repos"))
            .arg("--upstream")
            .arg(self.path("upstream"))
            .arg("--go")
            .arg(&self.go)
            .arg("--json");
        cmd
    }
}

fn summary(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn help_lists_publish() {
    Command::new(assert_cmd::cargo::cargo_bin!("vend"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("publish"));
}

#[test]
fn publishes_root_and_dependency() {
    let sandbox = Sandbox::new();
    sandbox
        .upstream()
        .add(
            &ModuleFixture::new(FOO, "module example.com/foo\n\nrequire example.com/bar v2.0.0\n")
                .depends_on(BAR),
        )
        .add(&ModuleFixture::new(BAR, "module example.com/bar\n\nrequire example.com/baz v0.3.0\n"));

    let output = sandbox.publish(&[FOO]).assert().success().get_output().stdout.clone();

    let summary = summary(&output);
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["failed"], 0);
    assert_eq!(
        summary["published"],
        serde_json::json!(["example.com/bar:v2.0.0", "example.com/foo:v1.0.0"])
    );

    let target = sandbox.target("go-local");
    assert!(target.contains(&key(FOO)));
    assert!(target.contains(&key(BAR)));
    assert!(
        sandbox
            .path("gomod/cache/download/example.com/foo/@v/v1.0.0.mod")
            .is_file()
    );
}

#[test]
fn empty_manifest_is_published_with_marker_only() {
    let sandbox = Sandbox::new();
    sandbox.upstream().add(
        &ModuleFixture::new(FOO, "")
            .file(TIDY_FILE, "require example.com/bar v2.0.0\n")
            .depends_on(BAR),
    );
    sandbox
        .upstream()
        .add(&ModuleFixture::new(BAR, "module example.com/bar\n\nrequire example.com/baz v0.3.0\n"));

    sandbox.publish(&[FOO]).assert().success();

    let manifest = sandbox.target("go-local").manifest(&key(FOO)).unwrap();
    assert_eq!(manifest, "// Generated by vend\n\n");
}

#[test]
fn second_run_only_skips() {
    let sandbox = Sandbox::new();
    sandbox
        .upstream()
        .add(&ModuleFixture::new(FOO, "module example.com/foo\n\nrequire example.com/bar v2.0.0\n"));

    sandbox.publish(&[FOO]).assert().success();
    let output = sandbox.publish(&[FOO]).assert().success().get_output().stdout.clone();

    let summary = summary(&output);
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["skipped"], 1);
}

#[test]
fn missing_root_fails_with_summary() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .publish(&["example.com/missing@v1.0.0"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();

    let summary = summary(&output);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["root_failures"][0]["module"], "example.com/missing:v1.0.0");
}

#[test]
fn invalid_module_argument_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox
        .publish(&["example.com/foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid module"));
}

#[test]
fn missing_repository_root_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox
        .vend()
        .args(["publish", FOO])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--repository-root"));
}

#[test]
fn config_file_supplies_defaults() {
    let sandbox = Sandbox::new();
    sandbox
        .upstream()
        .add(&ModuleFixture::new(FOO, "module example.com/foo\n\nrequire example.com/bar v2.0.0\n"));
    let config = sandbox.path("vend.toml");
    fs::write(
        &config,
        format!(
            "target_repo = \"go-virtual\"\nrepository_root = {:?}\nupstream = {:?}\ngo_binary = {:?}\n",
            sandbox.path("repos"),
            sandbox.path("upstream"),
            sandbox.go,
        ),
    )
    .unwrap();

    sandbox
        .vend()
        .arg("--config")
        .arg(&config)
        .args(["publish", FOO])
        .assert()
        .success()
        .stdout(predicate::str::contains("go-virtual"));

    assert!(sandbox.target("go-virtual").contains(&key(FOO)));
    assert!(!sandbox.target("go-local").contains(&key(FOO)));
}
