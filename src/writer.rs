//! Emit chunk streams: nested groups with back-patched sizes, local chunks with pad bytes.

use crate::dialect::{Dialect, Endianness};
use crate::id::ChunkId;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::{self, Write};

struct OpenGroup {
    keyword: ChunkId,
    content_type: ChunkId,
    body: Vec<u8>,
}

/// Streaming writer in a dialect's byte order. Group bodies are buffered until
/// [`end_group`](ChunkWriter::end_group) so their size can be written first.
pub struct ChunkWriter<W: Write> {
    out: W,
    endianness: Endianness,
    extended_sizes: bool,
    stack: Vec<OpenGroup>,
}

impl<W: Write> ChunkWriter<W> {
    pub fn new(out: W, dialect: &Dialect) -> Self {
        ChunkWriter {
            out,
            endianness: dialect.endianness,
            extended_sizes: dialect.extended_sizes,
            stack: Vec::new(),
        }
    }

    /// Current nesting depth (0 = top level).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn begin_group(&mut self, keyword: ChunkId, content_type: ChunkId) -> io::Result<&mut Self> {
        self.stack.push(OpenGroup {
            keyword,
            content_type,
            body: Vec::new(),
        });
        Ok(self)
    }

    pub fn end_group(&mut self) -> io::Result<&mut Self> {
        let group = self
            .stack
            .pop()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "end_group without begin_group"))?;
        let size = group.body.len() as u64 + 4;
        let mut encoded = Vec::with_capacity(group.body.len() + 16);
        encoded.write_all(group.keyword.as_bytes())?;
        self.put_group_size(&mut encoded, size)?;
        encoded.write_all(group.content_type.as_bytes())?;
        encoded.write_all(&group.body)?;
        if size % 2 == 1 {
            encoded.write_u8(0)?;
        }
        self.sink().write_all(&encoded)?;
        Ok(self)
    }

    /// Local chunk with its pad byte.
    pub fn chunk(&mut self, id: ChunkId, data: &[u8]) -> io::Result<&mut Self> {
        let size = u32::try_from(data.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("chunk {} larger than 4 GiB", id)))?;
        let endianness = self.endianness;
        let sink = self.sink();
        sink.write_all(id.as_bytes())?;
        write_u32(&mut *sink, endianness, size)?;
        sink.write_all(data)?;
        if size % 2 == 1 {
            sink.write_u8(0)?;
        }
        Ok(self)
    }

    /// Bytes written verbatim at the current position (no header, no padding).
    pub fn raw(&mut self, bytes: &[u8]) -> io::Result<&mut Self> {
        self.sink().write_all(bytes)?;
        Ok(self)
    }

    /// Close every open group and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        while !self.stack.is_empty() {
            self.end_group()?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn put_group_size(&self, buf: &mut Vec<u8>, size: u64) -> io::Result<()> {
        match u32::try_from(size) {
            Ok(s) if s != 0 || !self.extended_sizes => write_u32(buf, self.endianness, s),
            _ if self.extended_sizes => {
                write_u32(buf, self.endianness, 0)?;
                match self.endianness {
                    Endianness::Big => buf.write_u64::<BigEndian>(size),
                    Endianness::Little => buf.write_u64::<LittleEndian>(size),
                }
            }
            _ => Err(io::Error::new(io::ErrorKind::InvalidInput, "group larger than 4 GiB")),
        }
    }

    fn sink(&mut self) -> &mut dyn Write {
        match self.stack.last_mut() {
            Some(group) => &mut group.body as &mut dyn Write,
            None => &mut self.out,
        }
    }
}

fn write_u32<W: Write + ?Sized>(w: &mut W, endianness: Endianness, v: u32) -> io::Result<()> {
    match endianness {
        Endianness::Big => w.write_u32::<BigEndian>(v),
        Endianness::Little => w.write_u32::<LittleEndian>(v),
    }
}
