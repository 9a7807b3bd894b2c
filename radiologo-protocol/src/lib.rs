//! A5 Logo Upload Protocol
//!
//! This crate defines the serial protocol spoken by UV-5RM / UV-17Pro class
//! radios while their boot logo is being replaced. It covers everything that
//! is a pure function of bytes: checksums, framing, receive-side resync,
//! pixel packing and chunk addressing.
//!
//! # Protocol Overview
//!
//! Every command after the handshake uses the same binary frame:
//! ```text
//! ┌──────┬─────┬─────────┬─────────┬─────────────┬──────────┐
//! │ 0xA5 │ CMD │ ADDR    │ LENGTH  │ PAYLOAD     │ CRC16    │
//! │ 1B   │ 1B  │ 2B (BE) │ 2B (BE) │ 0–1024B     │ 2B (BE)  │
//! └──────┴─────┴─────────┴─────────┴─────────────┴──────────┘
//! ```
//!
//! The CRC is CRC16-XMODEM over CMD..PAYLOAD. Radios are known to send ACK
//! frames whose CRC does not match, so the receive side never rejects a
//! frame on CRC alone.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod chunk;
pub mod commands;
pub mod crc;
pub mod frame;
pub mod pixel;
pub mod scan;

pub use chunk::{calc_address, chunk, AddressMode, Chunk, Chunks};
pub use commands::{AckShape, Command};
pub use crc::crc16_xmodem;
pub use frame::{
    build_frame, parse_response, Frame, FrameError, FRAME_START, HEADER_SIZE, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE,
};
pub use pixel::{convert_buffer, rgb_to_565, PixelError, PixelOrder, SourceLayout};
pub use scan::{scan_frame, Scan};
