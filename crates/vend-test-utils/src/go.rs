//! Scripted stand-in for the `go` command.
//!
//! The script understands `mod init`, `mod tidy` and `mod graph`:
//!
//! - `mod init <name>` writes `module <name>`, or fails when `FAKE_GO_FAIL_INIT` is set
//! - `mod tidy` appends the module's `.vend-tidy` file to `go.mod`
//! - `mod graph` prints the module's `.vend-graph` file
//!
//! Every invocation is appended to the file named by `FAKE_GO_LOG`, if set.

use std::fs;
use std::path::{Path, PathBuf};

/// File replayed as `go mod graph` output.
pub const GRAPH_FILE: &str = ".vend-graph";

/// File appended to `go.mod` by `go mod tidy`.
pub const TIDY_FILE: &str = ".vend-tidy";

const SCRIPT: &str = r#"#!/bin/sh
if [ -n "$FAKE_GO_LOG" ]; then
    echo "$* GOFLAGS=$GOFLAGS" >> "$FAKE_GO_LOG"
fi
case "$1 $2" in
    "mod init")
        if [ -n "$FAKE_GO_FAIL_INIT" ]; then
            echo "go: cannot determine module path" >&2
            exit 1
        fi
        if [ -f go.mod ]; then
            echo "go: go.mod already exists" >&2
            exit 1
        fi
        printf 'module %s\n' "$3" > go.mod
        ;;
    "mod tidy")
        if [ -f .vend-tidy ]; then
            printf '\n' >> go.mod
            cat .vend-tidy >> go.mod
        fi
        ;;
    "mod graph")
        if [ -f .vend-graph ]; then
            cat .vend-graph
            echo
        fi
        ;;
    *)
        echo "go: unknown command $*" >&2
        exit 2
        ;;
esac
"#;

/// Write the fake `go` executable into `dir` and return its path.
///
/// # Panics
/// Panics if the script cannot be written or made executable.
#[cfg(unix)]
pub fn fake_go(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap_or_else(|e| panic!("fake_go: failed to create dir: {e}"));
    let path = dir.join("go");
    fs::write(&path, SCRIPT).unwrap_or_else(|e| panic!("fake_go: failed to write script: {e}"));
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .unwrap_or_else(|e| panic!("fake_go: failed to chmod script: {e}"));
    path
}

/// Lines logged by the fake `go` command.
pub fn logged_calls(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .map(|s| s.lines().map(String::from).collect())
        .unwrap_or_default()
}
