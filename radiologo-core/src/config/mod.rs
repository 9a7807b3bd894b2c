//! Configuration types
//!
//! Per-upload tunables, defaulted from the model registry and optionally
//! persisted by the host as TOML.

pub mod types;

pub use types::*;
