//! Upload error taxonomy
//!
//! Every failure carries the context needed to report it: the attempt
//! number, the session state or chunk offset, and up to [`RAW_CAPTURE`]
//! bytes of what the radio actually sent.

use core::fmt;

use heapless::Vec;
use radiologo_protocol::FrameError;

use crate::safety::SafetyError;
use crate::session::SessionState;

/// Received bytes kept for diagnostics
pub const RAW_CAPTURE: usize = 32;

/// Bounded copy of received bytes
pub type RawBytes = Vec<u8, RAW_CAPTURE>;

/// Append as much of `src` as fits
pub(crate) fn capture(dst: &mut RawBytes, src: &[u8]) {
    let room = dst.capacity() - dst.len();
    let _ = dst.extend_from_slice(&src[..src.len().min(room)]);
}

/// Build a capture from a slice, truncating
pub(crate) fn raw(src: &[u8]) -> RawBytes {
    let mut out = RawBytes::new();
    capture(&mut out, src);
    out
}

/// Protocol violations before any data is written
///
/// These are the only failures the prewrite retry policy acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// No handshake ACK byte after both the direct wait and the pulse phase
    HandshakeFailed { received: RawBytes },
    /// A well-formed frame arrived with the wrong command or marker
    UnexpectedAck {
        state: SessionState,
        received: RawBytes,
    },
    /// No well-formed frame arrived before the timeout
    MalformedFrame {
        state: SessionState,
        received: RawBytes,
    },
}

impl ProtocolError {
    /// Raw bytes seen while waiting
    pub fn received(&self) -> &[u8] {
        match self {
            ProtocolError::HandshakeFailed { received }
            | ProtocolError::UnexpectedAck { received, .. }
            | ProtocolError::MalformedFrame { received, .. } => received,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::HandshakeFailed { received } => {
                write!(f, "handshake failed, received {:02X?}", received.as_slice())
            }
            ProtocolError::UnexpectedAck { state, received } => write!(
                f,
                "unexpected ACK during {}: {:02X?}",
                state,
                received.as_slice()
            ),
            ProtocolError::MalformedFrame { state, received } => write!(
                f,
                "no valid ACK frame during {}, received {:02X?}",
                state,
                received.as_slice()
            ),
        }
    }
}

impl core::error::Error for ProtocolError {}

/// Upload plan rejected before touching the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// Chunk size is zero or exceeds the frame payload limit
    ChunkSizeInvalid { size: usize },
    /// Image payload does not match the configured size
    ImageSizeMismatch { expected: usize, actual: usize },
    /// Wire address of a chunk does not fit in 16 bits
    AddressOverflow { offset: usize, address: usize },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::ChunkSizeInvalid { size } => {
                write!(f, "chunk size {} is outside 1..=1024", size)
            }
            PlanError::ImageSizeMismatch { expected, actual } => write!(
                f,
                "image payload is {} bytes, expected {}",
                actual, expected
            ),
            PlanError::AddressOverflow { offset, address } => write!(
                f,
                "chunk at offset {} maps to address {:#X}, beyond 16 bits",
                offset, address
            ),
        }
    }
}

impl core::error::Error for PlanError {}

/// Upload failure
///
/// `E` is the transport's own error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError<E> {
    /// Settings or image rejected up front
    Plan(PlanError),
    /// Write not permitted
    Safety(SafetyError),
    /// Frame could not be encoded
    Frame(FrameError),
    /// I/O failure, never retried
    Transport {
        error: E,
        state: SessionState,
        attempt: u8,
    },
    /// Prewrite protocol violation, retried within the policy budget
    Protocol { error: ProtocolError, attempt: u8 },
    /// A data chunk was not acknowledged, never retried
    ChunkWriteFailed {
        offset: usize,
        address: u16,
        attempt: u8,
        received: RawBytes,
    },
    /// Caller requested cancellation
    Cancelled { state: SessionState },
}

impl<E> UploadError<E> {
    /// Whether another prewrite attempt may fix this
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::Protocol { .. })
    }

    /// Whether the radio's logo flash may hold a partial image
    ///
    /// True for any abort after the first data frame was written.
    pub fn flash_may_be_incomplete(&self) -> bool {
        match self {
            UploadError::ChunkWriteFailed { .. } => true,
            UploadError::Transport { state, .. } | UploadError::Cancelled { state } => {
                state.writes_flash()
            }
            _ => false,
        }
    }

    /// Attempt number the failure happened on, if a session was running
    pub fn attempt(&self) -> Option<u8> {
        match self {
            UploadError::Transport { attempt, .. }
            | UploadError::Protocol { attempt, .. }
            | UploadError::ChunkWriteFailed { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for UploadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Plan(e) => write!(f, "invalid upload plan: {}", e),
            UploadError::Safety(e) => write!(f, "write refused: {}", e),
            UploadError::Frame(e) => write!(f, "frame encoding failed: {}", e),
            UploadError::Transport {
                error,
                state,
                attempt,
            } => write!(
                f,
                "transport error during {} (attempt {}): {:?}",
                state, attempt, error
            ),
            UploadError::Protocol { error, attempt } => {
                write!(f, "{} (attempt {})", error, attempt)
            }
            UploadError::ChunkWriteFailed {
                offset,
                address,
                received,
                ..
            } => write!(
                f,
                "chunk at offset {} (address {:#06X}) not acknowledged, received {:02X?}",
                offset,
                address,
                received.as_slice()
            ),
            UploadError::Cancelled { state } => write!(f, "cancelled during {}", state),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for UploadError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_truncates() {
        let bytes = [0xAAu8; 64];
        let captured = raw(&bytes);
        assert_eq!(captured.len(), RAW_CAPTURE);

        let mut partial = raw(&[1, 2, 3]);
        capture(&mut partial, &[4]);
        assert_eq!(partial.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_only_protocol_errors_retryable() {
        let protocol: UploadError<()> = UploadError::Protocol {
            error: ProtocolError::MalformedFrame {
                state: SessionState::Config,
                received: RawBytes::new(),
            },
            attempt: 1,
        };
        assert!(protocol.is_retryable());
        assert!(!UploadError::<()>::Cancelled {
            state: SessionState::Init
        }
        .is_retryable());
        assert!(!UploadError::<()>::Plan(PlanError::ChunkSizeInvalid { size: 0 }).is_retryable());
    }

    #[test]
    fn test_flash_may_be_incomplete() {
        let chunk: UploadError<()> = UploadError::ChunkWriteFailed {
            offset: 0,
            address: 0,
            attempt: 1,
            received: RawBytes::new(),
        };
        assert!(chunk.flash_may_be_incomplete());

        let cancelled_mid_write: UploadError<()> = UploadError::Cancelled {
            state: SessionState::DataTransfer,
        };
        assert!(cancelled_mid_write.flash_may_be_incomplete());

        let io_during_setup = UploadError::Transport {
            error: (),
            state: SessionState::Setup,
            attempt: 2,
        };
        assert!(!io_during_setup.flash_may_be_incomplete());
        assert_eq!(io_during_setup.attempt(), Some(2));
    }

    #[test]
    fn test_display_mentions_offset() {
        let error: UploadError<()> = UploadError::ChunkWriteFailed {
            offset: 4096,
            address: 4,
            attempt: 1,
            received: raw(&[0xA5, 0x57]),
        };
        let text = format!("{}", error);
        assert!(text.contains("4096"));
        assert!(text.contains("0x0004"));
    }
}
