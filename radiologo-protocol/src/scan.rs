//! Receive-side resync
//!
//! The radio emits boot chatter and occasionally garbled bytes around its
//! ACK frames. [`scan_frame`] finds the first plausible frame in a window
//! without consuming anything; the caller decides what to drop and what to
//! push back.

use crate::frame::{CRC_SIZE, FRAME_START, HEADER_SIZE};

/// Result of scanning a receive window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scan {
    /// No start byte anywhere; every byte is noise
    Junk,
    /// Plausible frame begins at `skip` but is not complete yet
    Partial { skip: usize },
    /// Complete frame (header, payload and CRC) at `skip..end`
    Complete { skip: usize, end: usize },
}

impl Scan {
    /// Bytes before the candidate frame that can be discarded
    pub fn junk_len(&self, window_len: usize) -> usize {
        match *self {
            Scan::Junk => window_len,
            Scan::Partial { skip } | Scan::Complete { skip, .. } => skip,
        }
    }
}

/// Locate the first plausible frame in `window`
///
/// A header declaring more than `length_ceiling` payload bytes is treated
/// as a false start byte inside noise: scanning resumes one byte later.
pub fn scan_frame(window: &[u8], length_ceiling: usize) -> Scan {
    let mut from = 0;

    while let Some(pos) = find_start(window, from) {
        let rest = &window[pos..];
        if rest.len() < HEADER_SIZE {
            return Scan::Partial { skip: pos };
        }

        let length = usize::from(u16::from_be_bytes([rest[4], rest[5]]));
        if length > length_ceiling {
            from = pos + 1;
            continue;
        }

        let total = HEADER_SIZE + length + CRC_SIZE;
        if rest.len() < total {
            return Scan::Partial { skip: pos };
        }
        return Scan::Complete {
            skip: pos,
            end: pos + total,
        };
    }

    Scan::Junk
}

fn find_start(window: &[u8], from: usize) -> Option<usize> {
    window
        .get(from..)?
        .iter()
        .position(|&b| b == FRAME_START)
        .map(|i| from + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{build_frame, parse_response};
    use proptest::prelude::*;

    const CEILING: usize = 64;

    #[test]
    fn test_no_marker_is_junk() {
        assert_eq!(scan_frame(&[0x00, 0x11, 0x22], CEILING), Scan::Junk);
        assert_eq!(scan_frame(&[], CEILING), Scan::Junk);
        assert_eq!(Scan::Junk.junk_len(3), 3);
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let window = [0x00, 0xFF, 0xA5, 0x02, 0x00, 0x00, 0x00, 0x01, 0x59, 0x12, 0x34];
        assert_eq!(
            scan_frame(&window, CEILING),
            Scan::Complete { skip: 2, end: 11 }
        );
    }

    #[test]
    fn test_partial_header() {
        let window = [0x13, 0xA5, 0x02, 0x00];
        assert_eq!(scan_frame(&window, CEILING), Scan::Partial { skip: 1 });
    }

    #[test]
    fn test_partial_body() {
        let window = [0xA5, 0x02, 0x00, 0x00, 0x00, 0x01, 0x59];
        assert_eq!(scan_frame(&window, CEILING), Scan::Partial { skip: 0 });
    }

    #[test]
    fn test_false_marker_is_dropped() {
        // 0xA5 inside noise declaring a 0x7F00-byte payload
        let mut window = [0u8; 16];
        window[..3].copy_from_slice(&[0xA5, 0x10, 0x7F]);
        window[3..6].copy_from_slice(&[0x00, 0x7F, 0x00]);
        let ack = [0xA5, 0x03, 0x00, 0x00, 0x00, 0x01, 0x59, 0xAA, 0xBB];
        window[6..15].copy_from_slice(&ack);

        assert_eq!(
            scan_frame(&window, CEILING),
            Scan::Complete { skip: 6, end: 15 }
        );
    }

    #[test]
    fn test_trailing_bytes_left_after_end() {
        let frame = build_frame(0xEE, 0, &[0x04]).unwrap();
        let mut window = [0u8; 12];
        window[..9].copy_from_slice(&frame);
        window[9..].copy_from_slice(&[0xA5, 0xEE, 0x00]);

        match scan_frame(&window, CEILING) {
            Scan::Complete { skip, end } => {
                assert_eq!((skip, end), (0, 9));
                assert_eq!(&window[end..], &[0xA5, 0xEE, 0x00]);
            }
            other => panic!("unexpected scan {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_frame_found_after_noise(
            noise in prop::collection::vec(0u8..0xA5, 0..32),
            payload in prop::collection::vec(any::<u8>(), 0..CEILING),
        ) {
            let frame = build_frame(0x57, 7, &payload).unwrap();
            let mut window = noise.clone();
            window.extend_from_slice(&frame);

            let scan = scan_frame(&window, CEILING);
            prop_assert_eq!(scan, Scan::Complete { skip: noise.len(), end: window.len() });

            let parsed = parse_response(&window[noise.len()..]).unwrap();
            prop_assert_eq!(parsed.payload.as_slice(), payload.as_slice());
        }
    }
}
