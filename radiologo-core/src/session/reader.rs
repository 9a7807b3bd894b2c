//! ACK frame reader
//!
//! Accumulates bytes into a window until the scanner finds a complete
//! frame, then pushes anything after it back into the transport.

use heapless::Vec;
use radiologo_hal::{Timer, Transport};
use radiologo_protocol::{parse_response, scan_frame, Frame, Scan, HEADER_SIZE};

use crate::error::{capture, raw, RawBytes};

/// Largest payload length an ACK frame may declare
///
/// Radios only ever answer with a few bytes; a bigger length means the
/// start byte was noise.
pub const ACK_LENGTH_CEILING: usize = 256;

const WINDOW_SIZE: usize = 512;
const READ_SIZE: usize = 64;

/// Outcome of waiting for an ACK frame
#[derive(Debug)]
pub(crate) enum AckRead {
    /// A frame arrived; `raw` holds its bytes
    Frame { frame: Frame, raw: RawBytes },
    /// Nothing well-formed before the deadline; `raw` is what did arrive
    Silent { raw: RawBytes },
}

/// Wait up to `timeout_ms` for the next ACK frame
pub(crate) fn read_ack_frame<T, C>(
    transport: &mut T,
    timer: &C,
    timeout_ms: u32,
) -> Result<AckRead, T::Error>
where
    T: Transport,
    C: Timer,
{
    let deadline = timer.now_ms() + u64::from(timeout_ms);
    let mut window: Vec<u8, WINDOW_SIZE> = Vec::new();
    let mut seen = RawBytes::new();

    loop {
        match scan_frame(&window, ACK_LENGTH_CEILING) {
            Scan::Complete { skip, end } => {
                if skip > 0 {
                    trace!("resync dropped {} bytes before ACK frame", skip);
                }
                let frame_bytes = &window[skip..end];
                if !Frame::crc_matches(frame_bytes) {
                    trace!("ACK frame CRC mismatch ignored: {:?}", frame_bytes);
                }
                if end < window.len() {
                    transport.unread(&window[end..]);
                }
                // Cannot fail: the scanner saw a start byte and a full header
                if let Ok(frame) = parse_response(frame_bytes) {
                    return Ok(AckRead::Frame {
                        frame,
                        raw: raw(frame_bytes),
                    });
                }
                window.clear();
            }
            Scan::Partial { skip } => drop_front(&mut window, skip),
            Scan::Junk => window.clear(),
        }

        let remaining = timer.remaining_ms(deadline);
        if remaining == 0 {
            break;
        }

        let mut buf = [0u8; READ_SIZE];
        let want = missing_bytes(&window).map_or(READ_SIZE, |missing| missing.min(READ_SIZE));
        let n = transport.read_at_most(&mut buf[..want], remaining)?;
        capture(&mut seen, &buf[..n]);
        if window.extend_from_slice(&buf[..n]).is_err() {
            // Only reachable with a stuck partial frame; start over
            window.clear();
        }
    }

    if let Some(frame) = lenient_frame(&window) {
        debug!("accepting ACK frame without CRC bytes");
        return Ok(AckRead::Frame {
            frame,
            raw: raw(&window),
        });
    }

    Ok(AckRead::Silent { raw: seen })
}

/// Remaining bytes of a frame whose header is already in the window
fn missing_bytes(window: &[u8]) -> Option<usize> {
    if window.len() < HEADER_SIZE {
        return None;
    }
    let length = usize::from(u16::from_be_bytes([window[4], window[5]]));
    let total = HEADER_SIZE + length + 2;
    total.checked_sub(window.len()).filter(|&n| n > 0)
}

/// A frame with header and payload but a missing CRC
fn lenient_frame(window: &[u8]) -> Option<Frame> {
    if window.len() < HEADER_SIZE {
        return None;
    }
    let length = usize::from(u16::from_be_bytes([window[4], window[5]]));
    if window.len() < HEADER_SIZE + length {
        return None;
    }
    parse_response(window).ok()
}

fn drop_front<const N: usize>(window: &mut Vec<u8, N>, n: usize) {
    if n == 0 {
        return;
    }
    let len = window.len();
    window.copy_within(n..len, 0);
    window.truncate(len - n);
}
