//! Shared ledger of resolved and published modules
//!
//! One [`DependencyCache`] is created per vendoring run and shared by
//! reference across the whole recursive traversal, including parallel
//! top-level resolutions. Every method holds the internal lock for exactly one
//! logical operation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::key::ModuleKey;

/// What the cache knows about one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Never encountered during this run.
    Absent,
    /// Encountered and claimed, not (yet) published.
    Seen,
    /// Published to the target repository.
    Published,
}

impl Lookup {
    pub fn exists(self) -> bool {
        !matches!(self, Self::Absent)
    }

    pub fn is_published(self) -> bool {
        matches!(self, Self::Published)
    }
}

/// Aggregate progress counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    /// Successes that were skips of already-published modules.
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct CacheState {
    status: HashMap<ModuleKey, bool>,
    stats: CacheStats,
}

/// Concurrency-safe map of module key to published flag, plus counters.
///
/// A flag is never reset once it is `true`, and a published entry is never
/// removed.
#[derive(Debug, Default)]
pub struct DependencyCache {
    state: Mutex<CacheState>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the maps consistent (every update
    // is a single insert or increment), so a poisoned lock is still usable.
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lookup(&self, key: &ModuleKey) -> Lookup {
        match self.state().status.get(key) {
            None => Lookup::Absent,
            Some(false) => Lookup::Seen,
            Some(true) => Lookup::Published,
        }
    }

    /// Record `key` with the given flag. A published entry stays published.
    pub fn mark_seen(&self, key: &ModuleKey, published: bool) {
        let mut state = self.state();
        let flag = state.status.entry(key.clone()).or_insert(false);
        *flag |= published;
    }

    /// Atomically record `key` if it is absent.
    ///
    /// Returns `true` only to the caller that created the entry; everyone
    /// else must treat the module as owned by another branch.
    pub fn claim(&self, key: &ModuleKey, published: bool) -> bool {
        let mut state = self.state();
        if state.status.contains_key(key) {
            return false;
        }
        state.status.insert(key.clone(), published);
        true
    }

    /// Drop an unpublished entry so a later edge can claim `key` again.
    ///
    /// Returns whether an entry was removed.
    pub fn release(&self, key: &ModuleKey) -> bool {
        let mut state = self.state();
        match state.status.get(key) {
            Some(false) => {
                state.status.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn mark_published(&self, key: &ModuleKey) {
        self.state().status.insert(key.clone(), true);
    }

    pub fn increment_total(&self, n: usize) {
        self.state().stats.total += n;
    }

    pub fn increment_success(&self) {
        self.state().stats.successes += 1;
    }

    pub fn increment_failure(&self) {
        self.state().stats.failures += 1;
    }

    /// Count a module skipped because it was already published.
    ///
    /// A skip is also a success.
    pub fn increment_skipped(&self) {
        let mut state = self.state();
        state.stats.successes += 1;
        state.stats.skipped += 1;
    }

    pub fn stats(&self) -> CacheStats {
        self.state().stats
    }

    /// Keys currently flagged as published, sorted.
    pub fn published(&self) -> Vec<ModuleKey> {
        let mut keys: Vec<_> = self
            .state()
            .status
            .iter()
            .filter(|(_, published)| **published)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
