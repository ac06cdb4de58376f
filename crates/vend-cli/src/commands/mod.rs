//! Command implementations for vend-cli

pub mod publish;

pub use publish::run_publish;
