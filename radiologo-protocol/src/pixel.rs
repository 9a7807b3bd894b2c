//! RGB888 to 16-bit pixel packing
//!
//! The logo is sent row-major, top row first (no vertical flip), two
//! little-endian bytes per pixel. Resizing to the panel resolution happens
//! before this point.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bit layout of a 16-bit pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PixelOrder {
    /// RRRRRGGGGGGBBBBB
    #[default]
    Rgb565,
    /// BBBBBGGGGGGRRRRR
    Bgr565,
}

/// Layout of the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceLayout {
    /// 3 bytes per pixel
    Rgb888,
    /// 4 bytes per pixel, alpha ignored
    Rgba8888,
}

impl SourceLayout {
    /// Bytes per source pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            SourceLayout::Rgb888 => 3,
            SourceLayout::Rgba8888 => 4,
        }
    }
}

/// Pixel conversion errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelError {
    /// Source length is not a whole number of pixels
    SourceNotAligned { len: usize },
    /// Source and output describe different pixel counts
    SizeMismatch {
        source_pixels: usize,
        output_pixels: usize,
    },
}

impl core::fmt::Display for PixelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PixelError::SourceNotAligned { len } => {
                write!(f, "source length {} is not a whole number of pixels", len)
            }
            PixelError::SizeMismatch {
                source_pixels,
                output_pixels,
            } => write!(
                f,
                "source has {} pixels but output holds {}",
                source_pixels, output_pixels
            ),
        }
    }
}

/// Pack one RGB888 pixel
pub fn rgb_to_565(r: u8, g: u8, b: u8, order: PixelOrder) -> u16 {
    let r5 = u16::from(r >> 3);
    let g6 = u16::from(g >> 2);
    let b5 = u16::from(b >> 3);
    match order {
        PixelOrder::Rgb565 => (r5 << 11) | (g6 << 5) | b5,
        PixelOrder::Bgr565 => (b5 << 11) | (g6 << 5) | r5,
    }
}

/// Convert a whole source buffer into `out`
///
/// `out` must hold exactly two bytes per source pixel. Returns the number
/// of bytes written.
pub fn convert_buffer(
    src: &[u8],
    layout: SourceLayout,
    order: PixelOrder,
    out: &mut [u8],
) -> Result<usize, PixelError> {
    let bpp = layout.bytes_per_pixel();
    if src.len() % bpp != 0 {
        return Err(PixelError::SourceNotAligned { len: src.len() });
    }

    let source_pixels = src.len() / bpp;
    if out.len() % 2 != 0 || out.len() / 2 != source_pixels {
        return Err(PixelError::SizeMismatch {
            source_pixels,
            output_pixels: out.len() / 2,
        });
    }

    for (px, dst) in src.chunks_exact(bpp).zip(out.chunks_exact_mut(2)) {
        let value = rgb_to_565(px[0], px[1], px[2], order);
        dst.copy_from_slice(&value.to_le_bytes());
    }

    Ok(source_pixels * 2)
}
