//! Growable big-endian writer with back-patching.

use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::io;

/// Default size of each chunk in a [`ByteSink`]
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Append-only output buffer for serializing a class file.
///
/// Bytes are stored in fixed-size chunks; every chunk but the last is full.
/// Previously written bytes can be overwritten with the `write_*_at`
/// methods, which is how an attribute's `u4` length is filled in after its
/// payload has been written.
#[derive(Debug, Clone)]
pub struct ByteSink {
    chunk_size: usize,
    chunks: Vec<BytesMut>,
}

impl Default for ByteSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSink {
    /// Creates an empty sink with the default chunk size
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty sink with a custom chunk size
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunks: vec![BytesMut::with_capacity(chunk_size)],
        }
    }

    /// Total number of bytes written so far
    pub fn size(&self) -> usize {
        let last = self.chunks.last().map_or(0, BytesMut::len);
        self.chunk_size * (self.chunks.len() - 1) + last
    }

    fn last_with_room(&mut self) -> &mut BytesMut {
        let full = self
            .chunks
            .last()
            .map_or(true, |chunk| chunk.len() == self.chunk_size);
        if full {
            self.chunks.push(BytesMut::with_capacity(self.chunk_size));
        }
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    /// Appends a `u1`
    pub fn append_u1(&mut self, value: u8) {
        self.last_with_room().put_u8(value);
    }

    /// Appends a big-endian `u2`
    pub fn append_u2(&mut self, value: u16) {
        self.append_bytes(&value.to_be_bytes());
    }

    /// Appends a big-endian `u4`
    pub fn append_u4(&mut self, value: u32) {
        self.append_bytes(&value.to_be_bytes());
    }

    /// Appends a collection length as a `u2` count
    pub fn append_count(&mut self, field: &'static str, len: usize) -> Result<()> {
        let count = u16::try_from(len).map_err(|_| Error::FieldOverflow { field, value: len })?;
        self.append_u2(count);
        Ok(())
    }

    /// Appends raw bytes
    pub fn append_bytes(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let chunk_size = self.chunk_size;
            let last = self.last_with_room();
            let take = (chunk_size - last.len()).min(bytes.len());
            last.put_slice(&bytes[..take]);
            bytes = &bytes[take..];
        }
    }

    /// Overwrites the byte at `offset`.
    ///
    /// Writing at `offset == size()` appends.
    pub fn write_u1_at(&mut self, offset: usize, value: u8) -> Result<()> {
        let size = self.size();
        if offset > size {
            return Err(Error::SinkOffset { offset, size });
        }
        if offset == size {
            self.append_u1(value);
        } else {
            let (chunk, within) = (offset / self.chunk_size, offset % self.chunk_size);
            self.chunks[chunk][within] = value;
        }
        Ok(())
    }

    /// Overwrites a big-endian `u2` at `offset`
    pub fn write_u2_at(&mut self, offset: usize, value: u16) -> Result<()> {
        self.write_bytes_at(offset, &value.to_be_bytes())
    }

    /// Overwrites a big-endian `u4` at `offset`
    pub fn write_u4_at(&mut self, offset: usize, value: u32) -> Result<()> {
        self.write_bytes_at(offset, &value.to_be_bytes())
    }

    fn write_bytes_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let size = self.size();
        if offset > size {
            return Err(Error::SinkOffset { offset, size });
        }
        for (i, &b) in bytes.iter().enumerate() {
            self.write_u1_at(offset + i, b)?;
        }
        Ok(())
    }

    /// Copies the contents into a single vector
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Consumes the sink, returning its contents as one contiguous buffer
    pub fn freeze(mut self) -> Bytes {
        if self.chunks.len() == 1 {
            return self.chunks.pop().map(BytesMut::freeze).unwrap_or_default();
        }
        Bytes::from(self.to_vec())
    }

    /// Writes the contents to an [`io::Write`]
    pub fn write_to(&self, writer: &mut impl io::Write) -> io::Result<()> {
        for chunk in &self.chunks {
            writer.write_all(chunk)?;
        }
        Ok(())
    }
}
