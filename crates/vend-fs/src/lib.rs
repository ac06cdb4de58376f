//! Filesystem primitives for the module vendoring workspace
//!
//! Provides normalized path handling, locked atomic writes, checksums and
//! format-agnostic configuration loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::ModulePath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
