//! Serial-port backend for radiologo
//!
//! Implements the HAL traits on top of the `serialport` crate so the
//! upload engine can drive a USB programming cable from a desktop host.
//!
//! # Modules
//!
//! - `port` - [`SerialPortTransport`] with a push-back buffer
//! - `timer` - [`StdTimer`] backed by `std::time`
//! - `error` - [`SerialError`]

pub mod error;
pub mod port;
pub mod timer;

pub use error::SerialError;
pub use port::{list_ports, SerialPortTransport};
pub use timer::StdTimer;
