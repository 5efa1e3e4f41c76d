//! Sequential byte cursor over a reader: fixed-width integers, tags, bounded skip, alignment.
//!
//! The cursor never seeks. It counts every byte it pulls from the reader, including
//! the bytes of a read that ended early, so `position()` is exact even after an
//! end-of-stream error.

use crate::dialect::Endianness;
use crate::error::ParseError;
use crate::id::ChunkId;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{self, ErrorKind, Read};

/// Payload buffers grow in steps of this size rather than trusting a declared size.
const PAYLOAD_BLOCK: usize = 64 * 1024;

pub struct ByteCursor<R> {
    inner: R,
    endianness: Endianness,
    pos: u64,
}

impl<R: Read> ByteCursor<R> {
    pub fn new(inner: R, endianness: Endianness) -> Self {
        Self::with_base_offset(inner, endianness, 0)
    }

    /// Cursor over a sub-region that starts `base` bytes into a larger stream.
    pub fn with_base_offset(inner: R, endianness: Endianness, base: u64) -> Self {
        ByteCursor { inner, endianness, pos: base }
    }

    /// Absolute position: base offset plus bytes consumed.
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely or fail with `UnexpectedEof`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(ParseError::UnexpectedEof { offset: self.pos }),
                Ok(n) => {
                    filled += n;
                    self.pos += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(self.io_error(e)),
            }
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ParseError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let b = self.read_array::<2>()?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u16(&b),
            Endianness::Little => LittleEndian::read_u16(&b),
        })
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let b = self.read_array::<4>()?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u32(&b),
            Endianness::Little => LittleEndian::read_u32(&b),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, ParseError> {
        let b = self.read_array::<8>()?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u64(&b),
            Endianness::Little => LittleEndian::read_u64(&b),
        })
    }

    pub fn read_i64(&mut self) -> Result<i64, ParseError> {
        Ok(self.read_u64()? as i64)
    }

    /// Tags are byte strings; byte order does not apply.
    pub fn read_id(&mut self) -> Result<ChunkId, ParseError> {
        Ok(ChunkId(self.read_array::<4>()?))
    }

    /// Read exactly `len` bytes into a fresh buffer. The buffer grows block by
    /// block, so a huge declared size on a short stream fails with
    /// `UnexpectedEof` before allocating the declared amount.
    pub fn read_payload(&mut self, len: u64) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::with_capacity(len.min(PAYLOAD_BLOCK as u64) as usize);
        let mut remaining = len;
        while remaining > 0 {
            let step = remaining.min(PAYLOAD_BLOCK as u64) as usize;
            let start = out.len();
            out.resize(start + step, 0);
            self.read_exact(&mut out[start..])?;
            remaining -= step as u64;
        }
        Ok(out)
    }

    /// Discard `n` bytes without materializing them.
    pub fn skip(&mut self, n: u64) -> Result<(), ParseError> {
        let result = io::copy(&mut (&mut self.inner).take(n), &mut io::sink());
        let copied = match result {
            Ok(c) => c,
            Err(e) => return Err(self.io_error(e)),
        };
        self.pos += copied;
        if copied < n {
            return Err(ParseError::UnexpectedEof { offset: self.pos });
        }
        Ok(())
    }

    /// Consume one pad byte if the absolute position is odd.
    pub fn align(&mut self) -> Result<(), ParseError> {
        if self.pos % 2 == 1 {
            let pad = self.read_u8()?;
            if pad != 0 {
                tracing::trace!(offset = self.pos - 1, pad, "non-zero pad byte");
            }
        }
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> ParseError {
        if source.kind() == ErrorKind::UnexpectedEof {
            ParseError::UnexpectedEof { offset: self.pos }
        } else {
            ParseError::Io { offset: self.pos, source }
        }
    }
}
