//! Frame encoding and decoding for the A5 protocol.
//!
//! Frame format:
//! - START (1 byte): 0xA5 synchronization byte
//! - CMD (1 byte): command opcode
//! - ADDR (2 bytes, big-endian): target address or chunk index
//! - LENGTH (2 bytes, big-endian): payload length
//! - PAYLOAD (LENGTH bytes)
//! - CRC (2 bytes, big-endian): CRC16-XMODEM of CMD through PAYLOAD

use heapless::Vec;

use crate::crc::crc16_xmodem;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xA5;

/// START + CMD + ADDR + LENGTH
pub const HEADER_SIZE: usize = 6;

/// Trailing checksum size
pub const CRC_SIZE: usize = 2;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Missing start byte or shorter than a header
    MalformedFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::PayloadTooLarge => {
                write!(f, "payload exceeds {} bytes", MAX_PAYLOAD_SIZE)
            }
            FrameError::MalformedFrame => f.write_str("malformed frame"),
            FrameError::BufferTooSmall => f.write_str("buffer too small for frame"),
        }
    }
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode
    pub cmd: u8,
    /// Address field
    pub addr: u16,
    /// Length as declared in the header
    pub length: u16,
    /// Payload bytes actually present
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given command, address and payload
    pub fn new(cmd: u8, addr: u16, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            cmd,
            addr,
            length: payload.len() as u16,
            payload: payload_vec,
        })
    }

    /// First payload byte, if any
    pub fn first_payload_byte(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Size of this frame on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CRC_SIZE
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        encode_into(self.cmd, self.addr, &self.payload, buffer)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        build_frame(self.cmd, self.addr, &self.payload)
    }

    /// Check the trailing CRC of a raw received frame
    ///
    /// Informational only. Some firmware sends ACKs with a wrong CRC, so
    /// callers must not reject frames based on this.
    pub fn crc_matches(raw: &[u8]) -> bool {
        if raw.len() < HEADER_SIZE + CRC_SIZE || raw[0] != FRAME_START {
            return false;
        }
        let length = usize::from(u16::from_be_bytes([raw[4], raw[5]]));
        let body_end = HEADER_SIZE + length;
        if raw.len() < body_end + CRC_SIZE {
            return false;
        }
        let expected = crc16_xmodem(&raw[1..body_end]);
        expected == u16::from_be_bytes([raw[body_end], raw[body_end + 1]])
    }
}

fn encode_into(cmd: u8, addr: u16, payload: &[u8], buffer: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    let frame_len = HEADER_SIZE + payload.len() + CRC_SIZE;
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    let [addr_hi, addr_lo] = addr.to_be_bytes();
    let [len_hi, len_lo] = (payload.len() as u16).to_be_bytes();

    buffer[0] = FRAME_START;
    buffer[1] = cmd;
    buffer[2] = addr_hi;
    buffer[3] = addr_lo;
    buffer[4] = len_hi;
    buffer[5] = len_lo;
    buffer[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);

    let body_end = HEADER_SIZE + payload.len();
    let crc = crc16_xmodem(&buffer[1..body_end]);
    buffer[body_end..frame_len].copy_from_slice(&crc.to_be_bytes());

    Ok(frame_len)
}

/// Build a complete wire frame
pub fn build_frame(cmd: u8, addr: u16, payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
    let mut buffer = [0u8; MAX_FRAME_SIZE];
    let len = encode_into(cmd, addr, payload, &mut buffer)?;
    let mut vec = Vec::new();
    vec.extend_from_slice(&buffer[..len])
        .map_err(|_| FrameError::BufferTooSmall)?;
    Ok(vec)
}

/// Parse a received frame
///
/// Requires the start byte and a full header. The CRC is not checked and
/// the payload is whatever follows the header, up to the declared length.
pub fn parse_response(data: &[u8]) -> Result<Frame, FrameError> {
    if data.len() < HEADER_SIZE || data[0] != FRAME_START {
        return Err(FrameError::MalformedFrame);
    }

    let cmd = data[1];
    let addr = u16::from_be_bytes([data[2], data[3]]);
    let length = u16::from_be_bytes([data[4], data[5]]);

    let available = data.len() - HEADER_SIZE;
    let take = usize::from(length).min(available).min(MAX_PAYLOAD_SIZE);

    let mut payload = Vec::new();
    // Cannot fail: take is bounded by MAX_PAYLOAD_SIZE
    let _ = payload.extend_from_slice(&data[HEADER_SIZE..HEADER_SIZE + take]);

    Ok(Frame {
        cmd,
        addr,
        length,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_init_frame_bytes() {
        let frame = build_frame(0x02, 0x0000, b"PROGRAM").unwrap();
        assert_eq!(
            frame.as_slice(),
            &[
                0xA5, 0x02, 0x00, 0x00, 0x00, 0x07, b'P', b'R', b'O', b'G', b'R', b'A', b'M',
                0x0C, 0xAB
            ]
        );
    }

    #[test]
    fn test_config_frame_header() {
        let frame = build_frame(0x04, 0x4504, &[0x00, 0x00, 0x0C, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(&frame[..6], &[0xA5, 0x04, 0x45, 0x04, 0x00, 0x06]);
        assert_eq!(frame.len(), 6 + 6 + 2);
    }

    #[test]
    fn test_empty_payload() {
        let frame = build_frame(0x06, 0x0000, &[]).unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + CRC_SIZE);
        assert_eq!(&frame[4..6], &[0x00, 0x00]);
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(
            build_frame(0x57, 0, &large_payload),
            Err(FrameError::PayloadTooLarge)
        );
        assert_eq!(
            Frame::new(0x57, 0, &large_payload),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::new(0x02, 0, b"PROGRAM").unwrap();
        let mut buffer = [0u8; 8];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_parse_rejects_missing_start() {
        assert_eq!(
            parse_response(&[0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x59]),
            Err(FrameError::MalformedFrame)
        );
    }

    #[test]
    fn test_parse_rejects_short_header() {
        assert_eq!(
            parse_response(&[0xA5, 0x02, 0x00, 0x00, 0x00]),
            Err(FrameError::MalformedFrame)
        );
        assert_eq!(parse_response(&[]), Err(FrameError::MalformedFrame));
    }

    #[test]
    fn test_parse_ignores_bad_crc() {
        let frame = parse_response(&[0xA5, 0x02, 0x00, 0x00, 0x00, 0x01, 0x59, 0xDE, 0xAD]).unwrap();
        assert_eq!(frame.cmd, 0x02);
        assert_eq!(frame.first_payload_byte(), Some(0x59));
        assert!(!Frame::crc_matches(&[0xA5, 0x02, 0x00, 0x00, 0x00, 0x01, 0x59, 0xDE, 0xAD]));
    }

    #[test]
    fn test_parse_truncated_payload() {
        let frame = parse_response(&[0xA5, 0xEE, 0x00, 0x00, 0x00, 0x04, 0x01]).unwrap();
        assert_eq!(frame.length, 4);
        assert_eq!(frame.payload.as_slice(), &[0x01]);
    }

    #[test]
    fn test_crc_matches_built_frame() {
        let frame = build_frame(0x57, 0x0027, &[1, 2, 3]).unwrap();
        assert!(Frame::crc_matches(&frame));
    }

    fn any_cmd() -> impl Strategy<Value = u8> {
        prop::sample::select(&[0x02u8, 0x03, 0x04, 0x06, 0x57, 0xEE][..])
    }

    proptest! {
        #[test]
        fn prop_frame_roundtrip(
            cmd in any_cmd(),
            addr in any::<u16>(),
            payload in prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
        ) {
            let encoded = build_frame(cmd, addr, &payload).unwrap();
            prop_assert_eq!(encoded.len(), HEADER_SIZE + payload.len() + CRC_SIZE);

            let parsed = parse_response(&encoded).unwrap();
            prop_assert_eq!(parsed.cmd, cmd);
            prop_assert_eq!(parsed.addr, addr);
            prop_assert_eq!(usize::from(parsed.length), payload.len());
            prop_assert_eq!(parsed.payload.as_slice(), payload.as_slice());
            prop_assert!(Frame::crc_matches(&encoded));
        }
    }
}
