//! Configuration crate for the batch encoder
//!
//! Handles loading configuration from TOML files and environment variable overrides,
//! and defines the immutable per-run policy flags.

pub mod config;
pub mod flags;

pub use config::*;
pub use flags::BatchFlags;
