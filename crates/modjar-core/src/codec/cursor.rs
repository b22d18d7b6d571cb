//! Sequential big-endian reader.

use crate::error::{Error, Result};
use bytes::{Buf, Bytes};

/// Reads unsigned big-endian integers from an immutable byte buffer.
///
/// Every read is bounds-checked; running off the end yields
/// [`Error::UnexpectedEof`] carrying the offset where the read started.
#[derive(Debug, Clone)]
pub struct ByteCursor {
    data: Bytes,
    len: usize,
}

impl ByteCursor {
    /// Creates a cursor positioned at the first byte
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let len = data.len();
        Self { data, len }
    }

    /// Offset of the next byte to be read
    pub fn offset(&self) -> usize {
        self.len - self.data.remaining()
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    /// Returns true once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        !self.data.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.data.remaining() < needed {
            return Err(Error::unexpected_eof(self.offset(), needed));
        }
        Ok(())
    }

    /// Reads a `u1`
    pub fn read_u1(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data.get_u8())
    }

    /// Reads a big-endian `u2`
    pub fn read_u2(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.data.get_u16())
    }

    /// Reads a big-endian `u4`
    pub fn read_u4(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.data.get_u32())
    }

    /// Takes the next `len` bytes without copying
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        Ok(self.data.split_to(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let mut cursor = ByteCursor::new(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        assert_eq!(cursor.read_u1().unwrap(), 0x01);
        assert_eq!(cursor.read_u2().unwrap(), 0x0203);
        assert_eq!(cursor.read_u4().unwrap(), 0x04050607);
        assert!(cursor.is_empty());
        assert_eq!(cursor.offset(), 7);
    }

    #[test]
    fn test_read_bytes_advances() {
        let mut cursor = ByteCursor::new(&b"abcdef"[..]);
        assert_eq!(cursor.read_bytes(2).unwrap().as_ref(), b"ab");
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.remaining(), 4);
        assert_eq!(cursor.read_bytes(4).unwrap().as_ref(), b"cdef");
    }

    #[test]
    fn test_eof_reports_offset() {
        let mut cursor = ByteCursor::new(vec![0xCA, 0xFE, 0xBA]);
        cursor.read_u1().unwrap();
        match cursor.read_u4() {
            Err(Error::UnexpectedEof { offset, needed }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
            }
            other => panic!("expected eof, got {:?}", other),
        }
        // A failed read consumes nothing.
        assert_eq!(cursor.read_u2().unwrap(), 0xFEBA);
    }
}
