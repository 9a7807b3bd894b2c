//! Opcodes and fixed protocol constants
//!
//! Values here were captured from working vendor-tool traffic. The config
//! address and the config/setup payloads are opaque: nothing upstream
//! documents what the bytes mean.

use crate::frame::Frame;

/// Line speed used by the logo bootloader
pub const BAUD_RATE: u32 = 115_200;

/// Sent raw to enter the upload-accepting state
pub const HANDSHAKE_MAGIC: &[u8; 16] = b"PROGRAMBFNORMALU";

/// Single byte the radio answers the handshake with
pub const HANDSHAKE_ACK: u8 = 0x06;

/// Sent raw after the handshake to select logo mode ('D')
pub const MODE_SWITCH: u8 = 0x44;

/// Positive acknowledgement byte in ACK frame payloads ('Y')
pub const ACK_MARKER: u8 = 0x59;

/// Init frame payload
pub const INIT_PAYLOAD: &[u8] = b"PROGRAM";

/// Config frame address
pub const CONFIG_ADDRESS: u16 = 0x4504;

/// Config frame payload
pub const CONFIG_PAYLOAD: &[u8] = &[0x00, 0x00, 0x0C, 0x00, 0x00, 0x01];

/// Setup frame payload
pub const SETUP_PAYLOAD: &[u8] = &[0x00, 0x00, 0x0C, 0x00];

/// Completion frame payload
pub const COMPLETE_PAYLOAD: &[u8] = b"Over";

/// Expected post-commit byte (absence is also fine)
pub const COMPLETE_OK: u8 = 0x00;

/// Logo width in pixels
pub const LOGO_WIDTH: usize = 160;

/// Logo height in pixels
pub const LOGO_HEIGHT: usize = 128;

/// Logo payload size in bytes (two bytes per pixel)
pub const LOGO_PAYLOAD_SIZE: usize = LOGO_WIDTH * LOGO_HEIGHT * 2;

/// Payload bytes per data-write frame
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// A5 frame opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Init = 0x02,
    Setup = 0x03,
    Config = 0x04,
    Complete = 0x06,
    Write = 0x57,
    DataAck = 0xEE,
}

impl Command {
    /// Convert from the wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(Command::Init),
            0x03 => Some(Command::Setup),
            0x04 => Some(Command::Config),
            0x06 => Some(Command::Complete),
            0x57 => Some(Command::Write),
            0xEE => Some(Command::DataAck),
            _ => None,
        }
    }

    /// Wire byte
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Shape of a received ACK frame, keyed on `{cmd, first payload byte}`
///
/// Firmware variants answer the same request differently, so acceptance is
/// decided by matching on the shape rather than on exact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckShape {
    /// Dedicated data-ack opcode, any payload
    DataAck,
    /// Opcode with an empty payload
    Bare(u8),
    /// Opcode with the 'Y' marker as first payload byte
    Marked(u8),
    /// Opcode with some other first payload byte
    Other { cmd: u8, first: u8 },
}

impl AckShape {
    /// Classify a parsed frame
    pub fn classify(frame: &Frame) -> Self {
        match (frame.cmd, frame.first_payload_byte()) {
            (cmd, _) if cmd == Command::DataAck.as_byte() => AckShape::DataAck,
            (cmd, None) => AckShape::Bare(cmd),
            (cmd, Some(ACK_MARKER)) => AckShape::Marked(cmd),
            (cmd, Some(first)) => AckShape::Other { cmd, first },
        }
    }

    /// Whether this shape acknowledges a control frame (init/config/setup)
    pub fn acks_control(self, sent: Command) -> bool {
        match self {
            AckShape::Bare(cmd) | AckShape::Marked(cmd) => cmd == sent.as_byte(),
            AckShape::DataAck | AckShape::Other { .. } => false,
        }
    }

    /// Whether this shape acknowledges a data-write frame
    ///
    /// Accepts the dedicated data-ack, or the write opcode echoed with 'Y'.
    pub fn acks_data(self) -> bool {
        match self {
            AckShape::DataAck => true,
            AckShape::Marked(cmd) => cmd == Command::Write.as_byte(),
            AckShape::Bare(_) | AckShape::Other { .. } => false,
        }
    }
}
