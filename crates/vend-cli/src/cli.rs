//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// vend - Publish Go modules and their dependencies to an artifact repository
#[derive(Parser, Debug)]
#[command(name = "vend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve modules and publish them with all transitive dependencies
    ///
    /// Examples:
    ///   vend publish github.com/BurntSushi/toml@v0.3.1 --repository-root /srv/goproxy
    ///   vend publish example.com/a@v1.0.0 example.com/b@v2.1.0 --repo go-virtual --json
    Publish(PublishArgs),
}

/// Arguments of `vend publish`; unset options fall back to the config file.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishArgs {
    /// Root modules to publish
    #[arg(required = true, value_name = "MODULE@VERSION")]
    pub modules: Vec<String>,

    /// Target repository name
    #[arg(long = "repo", value_name = "NAME", env = "VEND_TARGET_REPO")]
    pub target_repo: Option<String>,

    /// Directory holding the target repositories
    #[arg(long, value_name = "DIR", env = "VEND_REPOSITORY_ROOT")]
    pub repository_root: Option<PathBuf>,

    /// Upstream module mirror in GOPROXY layout
    #[arg(long, value_name = "DIR", env = "VEND_UPSTREAM")]
    pub upstream: Option<PathBuf>,

    /// Module cache directory
    #[arg(long, value_name = "DIR", env = "GOMODCACHE")]
    pub module_cache: Option<PathBuf>,

    /// Go binary
    #[arg(long = "go", value_name = "BIN")]
    pub go_binary: Option<String>,

    /// Marker written into generated manifests
    #[arg(long, value_name = "TEXT")]
    pub edit_message: Option<String>,

    /// Never run `go mod tidy` on empty manifests
    #[arg(long)]
    pub no_tidy: bool,

    /// Output the summary as JSON
    #[arg(long)]
    pub json: bool,
}
