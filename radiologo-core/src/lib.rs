//! Board-agnostic boot-logo upload engine
//!
//! This crate contains everything between "here is a converted image" and
//! "bytes on the wire", independent of the concrete serial backend:
//!
//! - Upload session state machine and uploader
//! - Prewrite retry policy and timing profiles
//! - Write-safety gate
//! - Model registry and upload settings
//! - Observer hooks for progress, log lines and cancellation

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod models;
pub mod observer;
pub mod safety;
pub mod session;

pub use config::UploadSettings;
pub use error::{PlanError, ProtocolError, RawBytes, UploadError};
pub use models::{find_model, models, ModelConfig};
pub use observer::{NoopObserver, UploadObserver};
pub use safety::{require_write_permission, Permission, SafetyContext, SafetyError};
pub use session::{RetryPolicy, SessionState, TimingProfile, UploadReport, Uploader};
