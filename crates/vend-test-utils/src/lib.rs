//! Shared test utilities for the vend workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`module`]: module zips and GOPROXY-layout trees
//! - [`go`]: scripted stand-in for the `go` command

pub mod go;
pub mod module;
