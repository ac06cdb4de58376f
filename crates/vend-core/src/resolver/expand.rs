//! Transitive expansion of a dependency graph into child modules

use std::collections::BTreeSet;

use tracing::{debug, error, warn};

use super::ResolveContext;
use crate::Result;
use crate::key::ModuleKey;
use crate::package::Package;

/// Turn graph edges into child keys of `parent`.
///
/// Each new module is claimed in the cache before it is materialized, so a
/// sibling branch (or a parallel run) never resolves it a second time. The
/// claim is then updated with the repository existence probe. Malformed edges
/// are logged and skipped. A module that cannot be materialized is counted as
/// a failure and released, so a later edge to it tries again.
pub(crate) fn expand_graph(
    ctx: &ResolveContext<'_>,
    parent: &ModuleKey,
    graph: &BTreeSet<String>,
) -> Vec<ModuleKey> {
    let mut children = Vec::new();

    for edge in graph {
        let key = match ModuleKey::parse_edge(edge) {
            Ok(key) => key,
            Err(e) => {
                warn!(parent = %parent, edge = %edge, error = %e, "Skipping unusable graph edge");
                continue;
            }
        };

        if !ctx.cache.claim(&key, false) {
            debug!(module = %key, "Module has been previously added");
            continue;
        }

        match materialize(ctx, &key) {
            Ok((package, exists)) => {
                debug!(parent = %parent, module = %key, exists, "Found transitive dependency");
                // TODO: record the probe result in a separate field once the
                // cache distinguishes "present upstream" from "published by
                // this run"; a failed later publish is currently invisible to
                // revisits.
                ctx.cache.mark_seen(&key, exists);
                ctx.registry.insert(package);
                children.push(key);
            }
            Err(e) => {
                error!(parent = %parent, module = %key, error = %e, "Failed to resolve transitive dependency");
                ctx.cache.release(&key);
                ctx.cache.increment_total(1);
                ctx.cache.increment_failure();
            }
        }
    }

    children
}

/// Obtain a package for `key` and probe the target repository for it.
///
/// The package comes from the local module cache when present, otherwise it
/// is downloaded through the repository and stored in the local cache.
/// Returns the package and whether the module already exists in the target
/// repository.
pub fn materialize(ctx: &ResolveContext<'_>, key: &ModuleKey) -> Result<(Package, bool)> {
    let cached = ctx.local_cache.load(key)?;
    let exists = ctx.repository.exists(key, &ctx.settings.target_repo)?;

    let package = match cached {
        Some(package) => package,
        None => {
            debug!(module = %key, "Module missing from local cache, downloading");
            let download = ctx.repository.download(key, &ctx.settings.target_repo)?;
            ctx.local_cache.store(key, download)?
        }
    };

    Ok((package, exists))
}
