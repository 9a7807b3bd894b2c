//! Raw logo loading
//!
//! The input is an already resized, uncompressed pixel buffer at the
//! model's logo resolution, either RGBA8888 or RGB888, row-major.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use radiologo_protocol::{convert_buffer, PixelError, PixelOrder, SourceLayout};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image is {actual} bytes, a {width}x{height} buffer needs {expected}")]
    WrongSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("pixel conversion failed: {0}")]
    Convert(PixelError),
}

/// Convert a raw source buffer into the radio's 16-bit payload
pub fn convert_logo(
    raw: &[u8],
    layout: SourceLayout,
    (width, height): (usize, usize),
    order: PixelOrder,
) -> Result<Vec<u8>, ImageError> {
    let pixels = width * height;
    let expected = pixels * layout.bytes_per_pixel();
    if raw.len() != expected {
        return Err(ImageError::WrongSize {
            width,
            height,
            expected,
            actual: raw.len(),
        });
    }

    let mut payload = vec![0u8; pixels * 2];
    convert_buffer(raw, layout, order, &mut payload).map_err(ImageError::Convert)?;
    Ok(payload)
}

pub fn load_logo(
    path: &Path,
    layout: SourceLayout,
    size: (usize, usize),
    order: PixelOrder,
) -> Result<Vec<u8>, ImageError> {
    let raw = fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    convert_logo(&raw, layout, size, order)
}
