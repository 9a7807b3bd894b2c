//! Radiologo Hardware Abstraction Layer
//!
//! This crate defines the traits the upload engine needs from the outside
//! world. A serial backend (host `serialport`, a USB bridge, a scripted test
//! double) implements them once and the same session logic runs on top.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  radiologo-core (session, uploader)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  radiologo-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ radiologo-hal-│       │ scripted test │
//! │   serialport  │       │   transport   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`transport::Transport`] - Serial link with push-back and modem signals
//! - [`timer::Timer`] - Monotonic milliseconds and blocking delays

#![no_std]
#![deny(unsafe_code)]

pub mod timer;
pub mod transport;

pub use timer::Timer;
pub use transport::{ControlSignals, DataBits, Parity, SerialConfig, StopBits, Transport};
