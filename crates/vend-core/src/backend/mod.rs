//! Collaborator abstractions consumed by the resolver
//!
//! The resolver never extracts archives, runs the build tool or talks to a
//! repository itself. It drives these traits, which `vend-tools` implements
//! for module zips, the `go` command and GOPROXY-layout directories.
//! Every trait is `Send + Sync` so one set of collaborators can serve
//! parallel top-level runs.

mod archive;
mod build_tool;
mod repository;

pub use archive::{ArchiveStore, Workspace};
pub use build_tool::{BuildTool, LockFile};
pub use repository::{ArtifactRepository, ModuleDownload};
