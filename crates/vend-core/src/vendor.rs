//! Top-level driver for a vendoring run

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::backend::{ArchiveStore, ArtifactRepository, BuildTool};
use crate::cache::DependencyCache;
use crate::config::ResolverSettings;
use crate::key::ModuleKey;
use crate::local_cache::LocalModuleCache;
use crate::manifest::ManifestMatcher;
use crate::package::Package;
use crate::registry::PackageRegistry;
use crate::resolver::{ResolveContext, Resolver, materialize};

/// Outcome of a run, built from the shared cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Modules that needed no work because they were already published.
    pub skipped: usize,
    /// Modules present in the target repository at the end of the run.
    pub published: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Owns the collaborators and shared state of one vendoring run.
///
/// Several roots may be resolved concurrently through an `Arc<Vendor>`;
/// they share the dependency cache, so each module is published at most once.
pub struct Vendor {
    archives: Box<dyn ArchiveStore>,
    build_tool: Box<dyn BuildTool>,
    repository: Box<dyn ArtifactRepository>,
    local_cache: LocalModuleCache,
    matcher: ManifestMatcher,
    settings: ResolverSettings,
    cache: Arc<DependencyCache>,
    registry: PackageRegistry,
}

impl Vendor {
    pub fn new(
        settings: ResolverSettings,
        local_cache: LocalModuleCache,
        archives: Box<dyn ArchiveStore>,
        build_tool: Box<dyn BuildTool>,
        repository: Box<dyn ArtifactRepository>,
    ) -> Result<Self> {
        let matcher = ManifestMatcher::new(settings.edit_message.clone())?;
        Ok(Self {
            archives,
            build_tool,
            repository,
            local_cache,
            matcher,
            settings,
            cache: Arc::new(DependencyCache::new()),
            registry: PackageRegistry::new(),
        })
    }

    /// Share an existing cache, e.g. one pre-seeded with known modules.
    pub fn with_cache(mut self, cache: Arc<DependencyCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &DependencyCache {
        &self.cache
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn context(&self) -> ResolveContext<'_> {
        ResolveContext {
            cache: &self.cache,
            registry: &self.registry,
            matcher: &self.matcher,
            local_cache: &self.local_cache,
            archives: self.archives.as_ref(),
            build_tool: self.build_tool.as_ref(),
            repository: self.repository.as_ref(),
            settings: &self.settings,
        }
    }

    /// Resolve and publish `key` and everything it depends on.
    ///
    /// Only a failure to materialize the root itself is returned; everything
    /// below it is reported through the cache counters. A root already
    /// claimed by another branch of this run is not resolved again.
    pub fn resolve_root(&self, key: &ModuleKey) -> Result<()> {
        info!(module = %key, repo = %self.settings.target_repo, "Resolving module");
        if !self.cache.claim(key, false) {
            self.skip_claimed(key);
            return Ok(());
        }
        self.cache.increment_total(1);

        let ctx = self.context();
        let (package, exists) = match materialize(&ctx, key) {
            Ok(found) => found,
            Err(e) => {
                self.cache.release(key);
                self.cache.increment_failure();
                return Err(e);
            }
        };
        self.cache.mark_seen(key, exists);

        self.run(package);
        Ok(())
    }

    /// Resolve and publish a caller-supplied root package.
    ///
    /// A package already flagged as published still runs, so its manifest is
    /// refreshed from the repository. One that another branch is resolving,
    /// or that failed earlier in this run, is left alone.
    pub fn resolve_package(&self, package: Package) {
        let key = package.key().clone();
        info!(module = %key, repo = %self.settings.target_repo, "Resolving module");
        if !self.cache.claim(&key, false) && !self.cache.lookup(&key).is_published() {
            self.skip_claimed(&key);
            return;
        }
        self.cache.increment_total(1);
        self.run(package);
    }

    /// Account for a root whose claim belongs to someone else.
    ///
    /// Only a published module counts as a skip. An unpublished one is either
    /// in progress elsewhere or already counted as a failure, so the counters
    /// are left untouched.
    fn skip_claimed(&self, key: &ModuleKey) {
        if self.cache.lookup(key).is_published() {
            debug!(module = %key, "Module already published in this run");
            self.cache.increment_total(1);
            self.cache.increment_skipped();
        } else {
            warn!(module = %key, "Module is in progress or failed earlier in this run, not resolving it again");
        }
    }

    fn run(&self, package: Package) {
        let ctx = self.context();
        let mut resolver = Resolver::new(package);
        resolver.populate_and_publish(&ctx);
        self.registry.insert(resolver.into_package());
    }

    pub fn report(&self) -> RunReport {
        let stats = self.cache.stats();
        RunReport {
            total: stats.total,
            succeeded: stats.successes,
            failed: stats.failures,
            skipped: stats.skipped,
            published: self
                .cache
                .published()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
