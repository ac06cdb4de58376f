//! Publish command implementation

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use tracing::{error, info};
use vend_core::{ModuleKey, RunReport, TidyMode, Vendor, VendorConfig};
use vend_tools::{DirectoryRepository, GoToolchain, ZipArchiveStore};

use crate::cli::PublishArgs;
use crate::error::{CliError, Result};

/// A root module that could not be materialized at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootFailure {
    pub module: String,
    pub error: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    root_failures: &'a [RootFailure],
}

/// Run the publish command and return the run report.
pub fn run_publish(config_path: Option<&Path>, args: PublishArgs) -> Result<RunReport> {
    let roots = parse_roots(&args.modules)?;

    let config = match config_path {
        Some(path) => VendorConfig::load(path)?,
        None => VendorConfig::default(),
    };
    let config = merge_args(config, &args);

    let vendor = Arc::new(build_vendor(&config)?);
    let failures = resolve_all(&vendor, roots)?;
    let report = vendor.report();

    if args.json {
        let summary = Summary {
            report: &report,
            root_failures: &failures,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&config.target_repo, &report, &failures);
    }

    Ok(report)
}

fn parse_roots(modules: &[String]) -> Result<Vec<ModuleKey>> {
    modules
        .iter()
        .map(|module| {
            ModuleKey::parse_edge(module)
                .map_err(|e| CliError::user(format!("Invalid module '{}': {}", module, e)))
        })
        .collect()
}

/// Flags win over the config file.
fn merge_args(mut config: VendorConfig, args: &PublishArgs) -> VendorConfig {
    if let Some(repo) = &args.target_repo {
        config.target_repo = repo.clone();
    }
    if let Some(root) = &args.repository_root {
        config.repository_root = Some(root.clone());
    }
    if let Some(upstream) = &args.upstream {
        config.upstream = Some(upstream.clone());
    }
    if let Some(cache) = &args.module_cache {
        config.module_cache = Some(cache.clone());
    }
    if let Some(go) = &args.go_binary {
        config.go_binary = go.clone();
    }
    if let Some(message) = &args.edit_message {
        config.edit_message = message.clone();
    }
    if args.no_tidy {
        config.tidy = TidyMode::Skip;
    }
    config
}

fn build_vendor(config: &VendorConfig) -> Result<Vendor> {
    let repository_root = config.repository_root.as_ref().ok_or_else(|| {
        CliError::user("No repository root configured; pass --repository-root or set VEND_REPOSITORY_ROOT")
    })?;
    let local_cache = config.local_cache().ok_or_else(|| {
        CliError::user("Cannot locate the module cache; pass --module-cache or set GOMODCACHE")
    })?;

    let mut repository = DirectoryRepository::new(repository_root);
    if let Some(upstream) = &config.upstream {
        repository = repository.with_upstream(upstream);
    }

    Ok(Vendor::new(
        config.resolver_settings(),
        local_cache,
        Box::new(ZipArchiveStore::new()),
        Box::new(GoToolchain::new(&config.go_binary)),
        Box::new(repository),
    )?)
}

/// Resolve every root on the blocking pool, all sharing one vendor.
fn resolve_all(vendor: &Arc<Vendor>, roots: Vec<ModuleKey>) -> Result<Vec<RootFailure>> {
    let runtime = tokio::runtime::Builder::new_multi_thread().build()?;

    runtime.block_on(async {
        let handles: Vec<_> = roots
            .into_iter()
            .map(|key| {
                let vendor = Arc::clone(vendor);
                tokio::task::spawn_blocking(move || {
                    vendor.resolve_root(&key).map_err(|e| RootFailure {
                        module: key.to_string(),
                        error: e.to_string(),
                    })
                })
            })
            .collect();

        let mut failures = Vec::new();
        for handle in handles {
            if let Err(failure) = handle.await? {
                error!(module = %failure.module, error = %failure.error, "Failed to resolve root module");
                failures.push(failure);
            }
        }
        Ok::<_, CliError>(failures)
    })
}

fn print_summary(target_repo: &str, report: &RunReport, failures: &[RootFailure]) {
    info!(
        total = report.total,
        succeeded = report.succeeded,
        failed = report.failed,
        "Run finished"
    );

    println!("{} {}", "Target repository:".bold(), target_repo.cyan());
    println!(
        "{} {} total, {} succeeded ({} already published), {} failed",
        "Modules:".bold(),
        report.total,
        report.succeeded.to_string().green(),
        report.skipped,
        if report.failed == 0 {
            report.failed.to_string().green()
        } else {
            report.failed.to_string().red()
        }
    );

    if !report.published.is_empty() {
        println!();
        println!("{}", "Published:".bold());
        for id in &report.published {
            println!("  {} {}", "+".green(), id);
        }
    }

    if !failures.is_empty() {
        println!();
        println!("{}", "Failed roots:".bold());
        for failure in failures {
            println!("  {} {}: {}", "x".red(), failure.module.cyan(), failure.error);
        }
    }
}
