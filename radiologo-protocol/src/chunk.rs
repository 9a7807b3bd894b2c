//! Payload chunking and write addressing

use core::num::NonZeroUsize;

use heapless::Vec;

use crate::frame::{FrameError, MAX_PAYLOAD_SIZE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the data-write address field is derived from a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AddressMode {
    /// Address is the byte offset into the payload
    ByteOffset,
    /// Address is the chunk sequence number
    #[default]
    ChunkIndex,
}

/// Wire address for the chunk starting at `offset`
pub fn calc_address(offset: usize, chunk_size: NonZeroUsize, mode: AddressMode) -> usize {
    match mode {
        AddressMode::ByteOffset => offset,
        AddressMode::ChunkIndex => offset / chunk_size.get(),
    }
}

/// One slice of the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Byte offset of this chunk in the payload
    pub offset: usize,
    data: ChunkData<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkData<'a> {
    Borrowed(&'a [u8]),
    Padded(Vec<u8, MAX_PAYLOAD_SIZE>),
}

impl<'a> Chunk<'a> {
    /// Bytes to send
    pub fn data(&self) -> &[u8] {
        match &self.data {
            ChunkData::Borrowed(slice) => *slice,
            ChunkData::Padded(vec) => vec.as_slice(),
        }
    }

    /// Number of payload bytes that came from the source (excludes padding)
    pub fn source_len(&self, payload_len: usize) -> usize {
        self.data().len().min(payload_len.saturating_sub(self.offset))
    }
}

/// Iterator over payload chunks in ascending offset order
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    payload: &'a [u8],
    chunk_size: usize,
    offset: usize,
    pad_last: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.payload.len() {
            return None;
        }

        let offset = self.offset;
        let end = (offset + self.chunk_size).min(self.payload.len());
        let slice = &self.payload[offset..end];
        self.offset = end;

        let data = if self.pad_last && slice.len() < self.chunk_size {
            let mut padded = Vec::new();
            // Cannot fail: chunk_size <= MAX_PAYLOAD_SIZE was checked in chunk()
            let _ = padded.extend_from_slice(slice);
            let _ = padded.resize(self.chunk_size, 0);
            ChunkData::Padded(padded)
        } else {
            ChunkData::Borrowed(slice)
        };

        Some(Chunk { offset, data })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.payload.len().saturating_sub(self.offset);
        let n = left.div_ceil(self.chunk_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Split `payload` into consecutive `chunk_size` slices
///
/// The last chunk may be short unless `pad_last` is set, in which case it
/// is zero-padded to `chunk_size`.
pub fn chunk(payload: &[u8], chunk_size: NonZeroUsize, pad_last: bool) -> Result<Chunks<'_>, FrameError> {
    if chunk_size.get() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }
    Ok(Chunks {
        payload,
        chunk_size: chunk_size.get(),
        offset: 0,
        pad_last,
    })
}
