//! Lookup-by-ID store of materialized packages
//!
//! The resolver tree refers to transitive dependencies by [`ModuleKey`] only.
//! The packages themselves live here, so a module reachable from several
//! branches is materialized once and moved, never copied, into the resolver
//! that processes it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::key::ModuleKey;
use crate::package::Package;

#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: Mutex<HashMap<ModuleKey, Package>>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn packages(&self) -> MutexGuard<'_, HashMap<ModuleKey, Package>> {
        self.packages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a package, replacing any previous entry with the same key.
    pub fn insert(&self, package: Package) {
        self.packages().insert(package.key().clone(), package);
    }

    /// Move a package out of the registry for processing.
    pub fn take(&self, key: &ModuleKey) -> Option<Package> {
        self.packages().remove(key)
    }

    /// Current manifest content of a stored package.
    pub fn manifest(&self, key: &ModuleKey) -> Option<Vec<u8>> {
        self.packages().get(key).map(|p| p.manifest().to_vec())
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.packages().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.packages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
