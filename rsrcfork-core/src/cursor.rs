//! Bounds-checked big-endian cursor over a byte slice

use crate::error::ForkError;

/// Sequential big-endian reader that reports short reads instead of panicking
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute position (may equal the length)
    pub fn seek(&mut self, pos: usize) -> Result<(), ForkError> {
        if pos > self.data.len() {
            return Err(ForkError::ShortRead {
                expected: pos,
                actual: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True once every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Take the next `n` bytes
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], ForkError> {
        if n > self.remaining() {
            return Err(ForkError::ShortRead {
                expected: n,
                actual: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<(), ForkError> {
        self.bytes(n).map(|_| ())
    }

    /// Everything after the cursor
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ForkError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    /// Read a four-byte code
    pub fn four_cc(&mut self) -> Result<[u8; 4], ForkError> {
        self.array()
    }

    /// Read a `u8`
    pub fn u8(&mut self) -> Result<u8, ForkError> {
        Ok(self.array::<1>()?[0])
    }

    /// Read an `i8`
    pub fn i8(&mut self) -> Result<i8, ForkError> {
        Ok(i8::from_be_bytes(self.array()?))
    }

    /// Read a big-endian `u16`
    pub fn u16(&mut self) -> Result<u16, ForkError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Read a big-endian `i16`
    pub fn i16(&mut self) -> Result<i16, ForkError> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    /// Read a big-endian 24-bit unsigned integer
    pub fn u24(&mut self) -> Result<u32, ForkError> {
        let [a, b, c] = self.array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    /// Read a big-endian `u32`
    pub fn u32(&mut self) -> Result<u32, ForkError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Read a big-endian `i32`
    pub fn i32(&mut self) -> Result<i32, ForkError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    /// Read a big-endian `u64`
    pub fn u64(&mut self) -> Result<u64, ForkError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    /// Read a big-endian `i64`
    pub fn i64(&mut self) -> Result<i64, ForkError> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Read a big-endian IEEE `f32`
    pub fn f32(&mut self) -> Result<f32, ForkError> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    /// Read a big-endian IEEE `f64`
    pub fn f64(&mut self) -> Result<f64, ForkError> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    /// Read a Pascal string: one length byte, then that many bytes
    pub fn pstr(&mut self) -> Result<&'a [u8], ForkError> {
        let len = self.u8()?;
        self.bytes(usize::from(len))
    }
}
