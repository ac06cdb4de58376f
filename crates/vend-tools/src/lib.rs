//! Concrete collaborators for the vend engine.
//!
//! `vend-core` drives three traits; this crate implements them for the
//! real world:
//!
//! - [`GoToolchain`]: [`BuildTool`](vend_core::BuildTool) over the `go` command
//! - [`ZipArchiveStore`]: [`ArchiveStore`](vend_core::ArchiveStore) over module zips
//! - [`DirectoryRepository`]: [`ArtifactRepository`](vend_core::ArtifactRepository)
//!   over directories in GOPROXY layout, with an optional upstream mirror
//!
//! Errors are reported with [`vend_core::Error`] so they flow through the
//! resolver unchanged.

pub mod archive;
pub mod go;
pub mod logging;
pub mod repository;

pub use archive::ZipArchiveStore;
pub use go::GoToolchain;
pub use repository::DirectoryRepository;
