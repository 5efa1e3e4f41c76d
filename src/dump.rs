//! Render a traversal as indented text (tree view), one line per group or chunk.

use crate::chunk::ChunkNode;
use crate::engine::{ChunkParser, ParseReport};
use crate::error::ParseError;
use crate::visitor::{Abort, ChunkVisitor};
use std::fmt::Write as _;
use std::io::{Read, Write};

/// Hex preview of at most `max` bytes, e.g. `01 02 03 ..`.
pub fn format_hex(bytes: &[u8], max: usize) -> String {
    let mut s = String::with_capacity(max.min(bytes.len()) * 3 + 2);
    for (i, b) in bytes.iter().take(max).enumerate() {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{:02x}", b);
    }
    if bytes.len() > max {
        s.push_str(" ..");
    }
    s
}

fn describe_group(node: &ChunkNode) -> String {
    format!("{} {} (size {} @ {})", node.id, node.kind(), node.size, node.offset)
}

fn describe_chunk(node: &ChunkNode, preview: usize) -> String {
    let mut s = format!("{} ({} bytes @ {})", node.id, node.size, node.offset);
    if let (Some(data), true) = (node.payload(), preview > 0) {
        if !data.is_empty() {
            let _ = write!(s, "  {}", format_hex(data, preview));
        }
    }
    s
}

/// Visitor writing the tree as text. Properties and collections of a group are
/// listed when the group is left, once all of them are known.
pub struct DumpVisitor<W: Write> {
    out: W,
    depth: usize,
    preview: usize,
}

impl<W: Write> DumpVisitor<W> {
    pub fn new(out: W) -> Self {
        DumpVisitor { out, depth: 0, preview: 0 }
    }

    /// Show up to `bytes` payload bytes in hex after each chunk.
    pub fn with_preview(mut self, bytes: usize) -> Self {
        self.preview = bytes;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, depth: usize, text: &str) -> Result<(), Abort> {
        writeln!(self.out, "{:indent$}{}", "", text, indent = depth * 2)
            .map_err(|e| Abort::new(format!("dump output: {}", e)))
    }

    fn notes(&mut self, depth: usize, node: &ChunkNode) -> Result<(), Abort> {
        for note in &node.diagnostics {
            self.line(depth, &format!("! {}", note))?;
        }
        Ok(())
    }
}

impl<W: Write> ChunkVisitor for DumpVisitor<W> {
    fn enter_group(&mut self, group: &ChunkNode) -> Result<(), Abort> {
        self.line(self.depth, &describe_group(group))?;
        if let Some(block) = group.inherited() {
            self.line(self.depth + 1, &format!("inherits {} {} @ {}", block.id, block.kind(), block.offset))?;
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_group(&mut self, group: &ChunkNode) -> Result<(), Abort> {
        let preview = self.preview;
        for p in group.properties() {
            self.line(self.depth, &format!("prop {}", describe_chunk(p, preview)))?;
        }
        for c in group.collections() {
            self.line(self.depth, &format!("coll {}", describe_chunk(c, preview)))?;
        }
        self.notes(self.depth, group)?;
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn visit_chunk(&mut self, _parent: &ChunkNode, chunk: &ChunkNode) -> Result<(), Abort> {
        self.line(self.depth, &describe_chunk(chunk, self.preview))?;
        self.notes(self.depth + 1, chunk)
    }
}

/// Parse `reader` and return the text tree together with the report.
pub fn dump_to_string<R: Read>(parser: ChunkParser, reader: R, preview: usize) -> Result<(String, ParseReport), ParseError> {
    let mut visitor = DumpVisitor::new(Vec::new()).with_preview(preview);
    let report = parser.parse(reader, &mut visitor)?;
    let text = String::from_utf8_lossy(&visitor.into_inner()).into_owned();
    Ok((text, report))
}
