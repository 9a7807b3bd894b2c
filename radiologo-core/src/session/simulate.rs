//! Dry-run frame stream
//!
//! Produces the exact bytes a real upload would write, in order, without
//! touching a transport.

use radiologo_protocol::commands::{
    COMPLETE_PAYLOAD, CONFIG_ADDRESS, CONFIG_PAYLOAD, INIT_PAYLOAD, MODE_SWITCH,
    SETUP_PAYLOAD,
};
use radiologo_protocol::{calc_address, chunk, Command};

use super::uploader::encode;

use crate::config::UploadSettings;
use crate::error::{PlanError, UploadError};

/// Emit every write of an upload through `emit`
///
/// Returns the number of data frames. The image is validated against
/// `settings` first, exactly as a real upload would.
pub fn frame_stream<E, F>(
    settings: &UploadSettings,
    image: &[u8],
    mut emit: F,
) -> Result<usize, UploadError<E>>
where
    F: FnMut(&[u8]),
{
    let chunk_size = settings.validate(image.len()).map_err(UploadError::Plan)?;

    emit(settings.handshake_magic);
    emit(&[MODE_SWITCH][..]);
    emit(encode(Command::Init, 0, INIT_PAYLOAD)?.as_slice());
    emit(encode(Command::Config, CONFIG_ADDRESS, CONFIG_PAYLOAD)?.as_slice());
    emit(encode(Command::Setup, 0, SETUP_PAYLOAD)?.as_slice());

    let mut frames = 0;
    for c in chunk(image, chunk_size, settings.pad_last_chunk).map_err(UploadError::Frame)? {
        let address = calc_address(c.offset, chunk_size, settings.address_mode);
        let address = u16::try_from(address).map_err(|_| {
            UploadError::Plan(PlanError::AddressOverflow {
                offset: c.offset,
                address,
            })
        })?;
        emit(encode(Command::Write, address, c.data())?.as_slice());
        frames += 1;
    }

    emit(encode(Command::Complete, 0, COMPLETE_PAYLOAD)?.as_slice());
    Ok(frames)
}
