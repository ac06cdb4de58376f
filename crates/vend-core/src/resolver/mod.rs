//! Per-module populate-and-publish state machine
//!
//! A [`Resolver`] takes one [`Package`] through these steps:
//!
//! 1. refresh the manifest from the repository if the module is already published
//! 2. unpack the archive into a private workspace
//! 3. classify the manifest as empty or not
//! 4. non-empty: use it as-is and drop the inherited lock file
//! 5. empty and unpublished: bootstrap with init, then tidy if still empty
//! 6. empty and published: use the stored manifest verbatim
//! 7. compute the dependency graph
//! 8. expand the graph into child modules, with the lock file set aside
//! 9. persist the manifest into the local module cache
//! 10. resolve the children depth-first
//! 11. revert a tidy-generated manifest to the pre-tidy content plus marker
//! 12. publish
//! 13. remove the workspace
//!
//! Failures are logged and absorbed; the outcome of a node is recorded in the
//! shared [`DependencyCache`] counters rather than returned.

mod expand;

pub use expand::materialize;

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, error, info, warn};
use vend_fs::{NormalizedPath, io};

use crate::backend::{ArchiveStore, ArtifactRepository, BuildTool, Workspace};
use crate::cache::DependencyCache;
use crate::config::{ResolverSettings, TidyMode};
use crate::key::ModuleKey;
use crate::local_cache::LocalModuleCache;
use crate::manifest::{ManifestMatcher, ManifestState};
use crate::package::Package;
use crate::registry::PackageRegistry;

/// Everything a resolver node shares with the rest of the traversal.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub cache: &'a DependencyCache,
    pub registry: &'a PackageRegistry,
    pub matcher: &'a ManifestMatcher,
    pub local_cache: &'a LocalModuleCache,
    pub archives: &'a dyn ArchiveStore,
    pub build_tool: &'a dyn BuildTool,
    pub repository: &'a dyn ArtifactRepository,
    pub settings: &'a ResolverSettings,
}

impl ResolveContext<'_> {
    fn target_repo(&self) -> &str {
        &self.settings.target_repo
    }
}

/// Resolver node for one module.
#[derive(Debug)]
pub struct Resolver {
    package: Package,
    state: ManifestState,
    children: Vec<ModuleKey>,
}

impl Resolver {
    pub fn new(package: Package) -> Self {
        Self {
            package,
            state: ManifestState::Draft,
            children: Vec::new(),
        }
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn state(&self) -> &ManifestState {
        &self.state
    }

    /// Transitive dependencies discovered by the last run, by key.
    pub fn children(&self) -> &[ModuleKey] {
        &self.children
    }

    pub fn into_package(self) -> Package {
        self.package
    }

    /// Populate the manifest and publish this module and its transitive
    /// dependencies.
    pub fn populate_and_publish(&mut self, ctx: &ResolveContext<'_>) {
        let key = self.package.key().clone();
        debug!(module = %key, "Starting to work on module");

        // Usually the caller already holds the claim. Claiming here covers a
        // bare resolver and closes cycles that lead back to this module.
        let _ = ctx.cache.claim(&key, false);

        let published = ctx.cache.lookup(&key).is_published();
        if published {
            self.refresh_from_repository(ctx);
            self.state = ManifestState::Published;
        }

        let workspace = match ctx.archives.unpack(self.package.archive(), &key) {
            Ok(workspace) => workspace,
            Err(e) => {
                error!(module = %key, error = %e, "Failed to unpack module, abandoning it");
                ctx.cache.increment_failure();
                return;
            }
        };

        self.prepare_manifest(ctx, &workspace, published);

        let graph = match ctx.build_tool.graph(workspace.module_dir()) {
            Ok(graph) => graph,
            Err(e) => {
                error!(module = %key, error = %e, "Failed to compute dependency graph");
                BTreeSet::new()
            }
        };

        if !graph.is_empty() {
            self.expand_transitive(ctx, workspace.module_dir(), &graph);
        }

        let published = ctx.cache.lookup(&key).is_published();
        if !published
            && (!ctx.matcher.is_empty(self.package.manifest())
                || ctx.matcher.has_marker(self.package.manifest()))
        {
            self.persist_to_local_cache(ctx);
        }

        self.resolve_children(ctx);

        if !published {
            if self.state.needs_revert()
                && let ManifestState::TidyGenerated { snapshot } = std::mem::take(&mut self.state)
            {
                self.revert_manifest(ctx, &workspace, snapshot);
            }
            self.publish(ctx);
        } else {
            debug!(module = %key, "Module already published, nothing to publish");
            ctx.cache.increment_skipped();
        }

        let root = workspace.root().to_path_buf();
        if let Err(e) = workspace.close() {
            error!(module = %key, path = %root.display(), error = %e, "Failed to remove workspace");
        }
    }

    fn refresh_from_repository(&mut self, ctx: &ResolveContext<'_>) {
        let key = self.package.key();
        debug!(module = %key, "Overwriting the cached manifest with the published one");
        match ctx.repository.fetch_manifest(key, ctx.target_repo()) {
            Ok(content) => {
                if let Err(e) = ctx.local_cache.write_manifest(key, &content) {
                    error!(module = %key, error = %e, "Failed to update local module cache");
                }
                self.package.set_manifest(content);
            }
            Err(e) => {
                error!(module = %key, error = %e, "Failed to fetch published manifest, keeping stored one");
            }
        }
    }

    fn prepare_manifest(&mut self, ctx: &ResolveContext<'_>, workspace: &Workspace, published: bool) {
        let key = self.package.key().clone();
        let manifest_path = NormalizedPath::new(workspace.manifest_path());
        let empty = ctx.matcher.is_empty(self.package.manifest());
        debug!(module = %key, empty, "Classified stored manifest");

        if !empty {
            debug!(module = %key, "Using the stored manifest since it is not empty");
            write_logged(&key, &manifest_path, self.package.manifest());
            // The inherited lock file may be stale against this manifest.
            if let Err(e) = io::remove_if_exists(&NormalizedPath::new(workspace.lock_path())) {
                error!(module = %key, error = %e, "Failed to remove inherited lock file");
            }
            if !published {
                self.state = ManifestState::Populated;
            }
            return;
        }

        if published {
            write_logged(&key, &manifest_path, self.package.manifest());
            return;
        }

        let snapshot = self.bootstrap_manifest(ctx, workspace);
        if !ctx.matcher.is_empty(self.package.manifest()) {
            debug!(module = %key, "Manifest is not empty after init");
            self.state = ManifestState::Populated;
            return;
        }

        match ctx.settings.tidy {
            TidyMode::Tidy => {
                debug!(module = %key, "Manifest still empty after init, populating it with tidy");
                if let Err(e) = ctx.build_tool.tidy(workspace.module_dir()) {
                    error!(module = %key, error = %e, "Tidy failed");
                }
                self.state = ManifestState::TidyGenerated { snapshot };
            }
            TidyMode::Skip => {
                debug!(module = %key, "Manifest still empty after init, tidy disabled");
                self.state = ManifestState::Populated;
            }
        }
    }

    /// Run init on a fresh manifest and adopt its result.
    ///
    /// Returns the manifest content from before the bootstrap.
    fn bootstrap_manifest(&mut self, ctx: &ResolveContext<'_>, workspace: &Workspace) -> Vec<u8> {
        let key = self.package.key().clone();
        let manifest_path = NormalizedPath::new(workspace.manifest_path());
        if let Err(e) = io::remove_if_exists(&manifest_path) {
            error!(module = %key, error = %e, "Failed to remove inherited manifest");
        }

        debug!(module = %key, "Bootstrapping manifest with init");
        if let Err(e) = ctx.build_tool.init(
            workspace.module_dir(),
            key.path(),
            ctx.matcher.edit_message(),
        ) {
            error!(module = %key, error = %e, "Init failed");
            if !manifest_path.exists() {
                write_logged(&key, &manifest_path, self.package.manifest());
            }
        }

        let content = match io::read_bytes(&manifest_path) {
            Ok(content) => content,
            Err(e) => {
                error!(module = %key, error = %e, "Failed to read bootstrapped manifest");
                self.package.manifest().to_vec()
            }
        };
        let original = self.package.manifest().to_vec();
        self.package.set_manifest(content);
        original
    }

    fn expand_transitive(&mut self, ctx: &ResolveContext<'_>, module_dir: &Path, graph: &BTreeSet<String>) {
        let key = self.package.key().clone();
        let lock = match ctx.build_tool.extract_lock_file(module_dir) {
            Ok(lock) => lock,
            Err(e) => {
                error!(module = %key, error = %e, "Failed to set lock file aside");
                None
            }
        };

        self.children = expand::expand_graph(ctx, &key, graph);

        if let Some(lock) = lock
            && let Err(e) = ctx.build_tool.restore_lock_file(module_dir, lock)
        {
            error!(module = %key, error = %e, "Failed to restore lock file");
        }
    }

    fn persist_to_local_cache(&self, ctx: &ResolveContext<'_>) {
        let key = self.package.key();
        if let Err(e) = ctx.local_cache.write_manifest(key, self.package.manifest()) {
            error!(module = %key, error = %e, "Failed to write manifest to local module cache");
        }
    }

    fn resolve_children(&self, ctx: &ResolveContext<'_>) {
        if self.children.is_empty() {
            return;
        }
        ctx.cache.increment_total(self.children.len());
        for child_key in &self.children {
            if ctx.cache.lookup(child_key).is_published() {
                debug!(module = %child_key, "Module was already handled");
                ctx.cache.increment_skipped();
                continue;
            }
            let Some(package) = ctx.registry.take(child_key) else {
                warn!(module = %child_key, "Transitive module missing from registry");
                ctx.cache.increment_failure();
                continue;
            };
            debug!(parent = %self.package.key(), module = %child_key, "Starting to work on transitive module");
            let mut child = Resolver::new(package);
            child.populate_and_publish(ctx);
            ctx.registry.insert(child.into_package());
        }
    }

    fn revert_manifest(&mut self, ctx: &ResolveContext<'_>, workspace: &Workspace, snapshot: Vec<u8>) {
        let key = self.package.key().clone();
        debug!(module = %key, "Reverting to the original manifest");
        let content = ctx.matcher.with_marker(&snapshot);
        write_logged(&key, &NormalizedPath::new(workspace.manifest_path()), &content);
        self.package.set_manifest(content);
        self.persist_to_local_cache(ctx);
        self.state = ManifestState::Populated;
    }

    fn publish(&mut self, ctx: &ResolveContext<'_>) {
        let key = self.package.key().clone();
        match ctx.repository.publish(&self.package, ctx.target_repo()) {
            Ok(()) => {
                ctx.cache.mark_published(&key);
                ctx.cache.increment_success();
                self.state = ManifestState::Published;
                info!(module = %key, repo = ctx.target_repo(), "Published module");
            }
            Err(e) => {
                ctx.cache.increment_failure();
                error!(module = %key, repo = ctx.target_repo(), error = %e, "Failed to publish module");
            }
        }
    }
}

fn write_logged(key: &ModuleKey, path: &NormalizedPath, content: &[u8]) {
    if let Err(e) = io::write_atomic(path, content) {
        error!(module = %key, path = %path, error = %e, "Failed to write workspace manifest");
    }
}
