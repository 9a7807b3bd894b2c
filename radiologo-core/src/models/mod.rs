//! Radio model registry

pub mod registry;

pub use registry::{find_model, models, ModelConfig};
