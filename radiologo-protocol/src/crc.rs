//! CRC16-XMODEM
//!
//! Poly 0x1021, init 0x0000, no reflection, no final XOR.

const POLY: u16 = 0x1021;

/// Checksum used by A5 frames
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}
