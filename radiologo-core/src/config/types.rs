//! Upload settings

use core::num::NonZeroUsize;

use radiologo_protocol::commands::{
    BAUD_RATE, DEFAULT_CHUNK_SIZE, HANDSHAKE_MAGIC, LOGO_PAYLOAD_SIZE,
};
use radiologo_protocol::{calc_address, AddressMode, PixelOrder, MAX_PAYLOAD_SIZE};

use crate::error::PlanError;
use crate::session::retry::{RetryPolicy, PREWRITE_RETRIES, RETRY_BACKOFF_MS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest wire address a data frame can carry
pub const MAX_WIRE_ADDRESS: usize = u16::MAX as usize;

/// Tunables for one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UploadSettings {
    /// Serial baud rate
    pub baud_rate: u32,
    /// Bytes that wake the radio's upload mode
    #[cfg_attr(feature = "serde", serde(skip))]
    pub handshake_magic: &'static [u8],
    /// Bytes per data frame
    pub chunk_size: usize,
    /// How data frame addresses are derived
    pub address_mode: AddressMode,
    /// 16-bit pixel layout the radio expects
    pub pixel_order: PixelOrder,
    /// Zero-pad the final chunk to `chunk_size`
    pub pad_last_chunk: bool,
    /// Expected image payload in bytes
    pub image_size: usize,
    /// Extra attempts allowed before data transfer starts
    pub prewrite_retries: u8,
    /// Pause between prewrite attempts
    pub retry_backoff_ms: u32,
    /// Switch to conservative timings on retries
    pub escalate_timing: bool,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            handshake_magic: HANDSHAKE_MAGIC,
            chunk_size: DEFAULT_CHUNK_SIZE,
            address_mode: AddressMode::ChunkIndex,
            pixel_order: PixelOrder::Rgb565,
            pad_last_chunk: false,
            image_size: LOGO_PAYLOAD_SIZE,
            prewrite_retries: PREWRITE_RETRIES,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            escalate_timing: true,
        }
    }
}

impl UploadSettings {
    /// Chunk size as a checked non-zero value
    pub fn chunk_size(&self) -> Result<NonZeroUsize, PlanError> {
        NonZeroUsize::new(self.chunk_size)
            .filter(|size| size.get() <= MAX_PAYLOAD_SIZE)
            .ok_or(PlanError::ChunkSizeInvalid {
                size: self.chunk_size,
            })
    }

    /// Check an image against these settings
    ///
    /// Verifies the payload length and that the last chunk's wire address
    /// fits in the 16-bit address field.
    pub fn validate(&self, image_len: usize) -> Result<NonZeroUsize, PlanError> {
        let chunk_size = self.chunk_size()?;

        if image_len != self.image_size {
            return Err(PlanError::ImageSizeMismatch {
                expected: self.image_size,
                actual: image_len,
            });
        }

        if image_len > 0 {
            let last_offset = (image_len - 1) / chunk_size.get() * chunk_size.get();
            let address = calc_address(last_offset, chunk_size, self.address_mode);
            if address > MAX_WIRE_ADDRESS {
                return Err(PlanError::AddressOverflow {
                    offset: last_offset,
                    address,
                });
            }
        }

        Ok(chunk_size)
    }

    /// Retry policy described by these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.prewrite_retries,
            backoff_ms: self.retry_backoff_ms,
            escalate: self.escalate_timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fit_logo() {
        let settings = UploadSettings::default();
        assert_eq!(settings.validate(40960).unwrap().get(), 1024);
        assert_eq!(settings.retry_policy().max_attempts(), 3);
    }

    #[test]
    fn test_image_size_mismatch() {
        assert_eq!(
            UploadSettings::default().validate(40959),
            Err(PlanError::ImageSizeMismatch {
                expected: 40960,
                actual: 40959
            })
        );
    }

    #[test]
    fn test_chunk_size_bounds() {
        for size in [0, MAX_PAYLOAD_SIZE + 1] {
            let settings = UploadSettings {
                chunk_size: size,
                ..UploadSettings::default()
            };
            assert_eq!(
                settings.validate(40960),
                Err(PlanError::ChunkSizeInvalid { size })
            );
        }
    }

    #[test]
    fn test_byte_offset_overflow() {
        // 40960 bytes addressed by byte offset: the last chunk sits at 39936
        let ok = UploadSettings {
            address_mode: AddressMode::ByteOffset,
            ..UploadSettings::default()
        };
        assert!(ok.validate(40960).is_ok());

        let big = UploadSettings {
            address_mode: AddressMode::ByteOffset,
            image_size: 70_000,
            ..UploadSettings::default()
        };
        assert_eq!(
            big.validate(70_000),
            Err(PlanError::AddressOverflow {
                offset: 69_632,
                address: 69_632
            })
        );
    }
}
