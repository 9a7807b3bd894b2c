//! Write-safety gate
//!
//! Decides whether an upload may touch the radio at all.

pub mod gate;

pub use gate::{
    require_write_permission, Permission, SafetyContext, SafetyError, CONFIRMATION_TOKEN,
};
