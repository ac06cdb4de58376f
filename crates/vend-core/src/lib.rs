//! Dependency resolution and publication engine
//!
//! Given a root module, this crate walks its transitive dependency graph and
//! publishes every module, with a correctly populated manifest, to an
//! artifact repository:
//!
//! - **ModuleKey**: parsed `path@version` identity and the uppercase escape convention
//! - **DependencyCache**: shared ledger of claimed and published modules plus counters
//! - **PackageRegistry**: lookup-by-ID store of materialized packages
//! - **Resolver**: the per-module populate-and-publish state machine
//! - **Vendor**: top-level driver owning the collaborators of one run
//!
//! # Architecture
//!
//! ```text
//!                  vend-cli
//!                     |
//!                 vend-core ---- backend traits
//!                 /        \           |
//!            vend-fs     vend-tools (zip, go, directory repository)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vend_core::{ModuleKey, Vendor};
//!
//! fn publish(vendor: &Vendor) -> vend_core::Result<()> {
//!     let key: ModuleKey = "example.com/foo@v1.0.0".parse()?;
//!     vendor.resolve_root(&key)?;
//!     println!("{:?}", vendor.report());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod local_cache;
pub mod manifest;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod vendor;

pub use backend::{ArchiveStore, ArtifactRepository, BuildTool, LockFile, ModuleDownload, Workspace};
pub use cache::{CacheStats, DependencyCache, Lookup};
pub use config::{ResolverSettings, TidyMode, VendorConfig};
pub use error::{Error, Result};
pub use key::{ModuleKey, escape_path, unescape_path};
pub use local_cache::LocalModuleCache;
pub use manifest::{ManifestMatcher, ManifestState};
pub use package::Package;
pub use registry::PackageRegistry;
pub use resolver::{ResolveContext, Resolver};
pub use vendor::{RunReport, Vendor};
