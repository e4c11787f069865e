//! Primitive reader
//!
//! Big-endian integers and length-prefixed byte strings over any
//! [`std::io::Read`]. Knows nothing about AMF0 markers; every read either
//! returns exactly the requested bytes or fails with [`Amf0Error::Io`].

use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use crate::error::{Amf0Error, Result};

/// Cap on up-front allocation for length-prefixed payloads
const MAX_PREALLOC: usize = 64 * 1024;

/// Sequential big-endian reader
#[derive(Debug)]
pub struct Amf0Reader<R> {
    inner: R,
}

impl<R: Read> Amf0Reader<R> {
    /// Wrap a byte source
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwrap the byte source
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.inner.read_u16::<BigEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.inner.read_u32::<BigEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(self.inner.read_u64::<BigEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.inner.read_i16::<BigEndian>()?)
    }

    /// Read an IEEE 754 double from its big-endian bit pattern
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read a byte string with a 16-bit length prefix
    pub fn read_string_short(&mut self) -> Result<Bytes> {
        let len = self.read_u16()? as usize;
        self.read_exact_bytes(len)
    }

    /// Read a byte string with a 32-bit length prefix
    pub fn read_string_long(&mut self) -> Result<Bytes> {
        let len = self.read_u32()? as usize;
        self.read_exact_bytes(len)
    }

    /// Read a marker byte, or `None` if the source is exhausted right here
    ///
    /// Only a clean end between values counts as exhaustion; an end in the
    /// middle of a value is still reported by the read that hits it.
    pub fn try_read_marker(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// View of at most `len` further bytes of this source
    pub fn bounded(&mut self, len: u64) -> Amf0Reader<io::Take<&mut R>> {
        Amf0Reader::new(self.inner.by_ref().take(len))
    }

    fn read_exact_bytes(&mut self, len: usize) -> Result<Bytes> {
        // Don't trust the prefix for allocation; grow as bytes actually arrive
        let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
        let read = self.inner.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if read < len {
            return Err(Amf0Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("string needs {} bytes, source had {}", len, read),
            )));
        }
        Ok(Bytes::from(buf))
    }
}

impl<R: Read> Amf0Reader<io::Take<R>> {
    /// Bytes left in a bounded view
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }

    /// Skip whatever is left of a bounded view
    ///
    /// Fails with `UnexpectedEof` if the underlying source ends before the
    /// bound is reached.
    pub fn drain(&mut self) -> Result<u64> {
        let skipped = io::copy(&mut self.inner, &mut io::sink())?;
        if self.inner.limit() > 0 {
            return Err(Amf0Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("bounded view short by {} bytes", self.inner.limit()),
            )));
        }
        Ok(skipped)
    }
}
