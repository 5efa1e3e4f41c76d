//! Recursive-descent grammar engine for tagged chunk containers.
//!
//! One [`ChunkParser`] runs one traversal. The grammar, in the IFF spelling:
//!
//! ```text
//! File      ::= Form | List | Cat                    (dialect top-level keywords)
//! Form      ::= "FORM" size type Child* pad?
//! List      ::= "LIST" size type (Prop | Child)* pad?  (fresh property scope)
//! Cat       ::= "CAT " size type-or-filler Child* pad?
//! Prop      ::= "PROP" size type LocalChunk* pad?     (all chunks are properties)
//! Child     ::= Form | List | Cat | Prop | Filler | LocalChunk
//! LocalChunk::= tag size bytes pad?
//! ```
//!
//! ## Recovery
//!
//! - An end of stream inside a group body ends that group early with a
//!   `"truncated after N of S bytes"` diagnostic; its ancestors carry on and
//!   every entered group still gets `leave_group`. N counts body bytes after
//!   the content type. A missing pad byte at the very end of a body is not a
//!   truncation.
//! - With `resilient` set, an illegal tag, an illegal nested content type or a
//!   chunk overrunning its group becomes a diagnostic on the enclosing group
//!   (or on the chunk) instead of a fatal error.
//! - Payloads over `max_payload_size` are skipped, not loaded, and flagged.

use crate::chunk::{ChunkNode, PropertyScope};
use crate::cursor::ByteCursor;
use crate::dialect::{Dialect, GroupKind};
use crate::error::ParseError;
use crate::id::ChunkId;
use crate::registry::{ChunkRegistry, ChunkRole};
use crate::visitor::ChunkVisitor;
use std::io::Read;

/// Default ceiling for a single materialized payload (256 MiB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: u64 = 256 * 1024 * 1024;

/// Traversal policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Load payload bytes of Data/Property/Collection chunks.
    pub read_data: bool,
    /// Turn structural errors inside groups into diagnostics and keep going.
    pub resilient: bool,
    /// Payloads larger than this are skipped instead of loaded.
    pub max_payload_size: u64,
    /// Absolute offset of the first byte handed to `parse`.
    pub base_offset: u64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            read_data: true,
            resilient: false,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            base_offset: 0,
        }
    }
}

/// Summary of a completed traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Absolute cursor position when parsing stopped.
    pub end_offset: u64,
    /// Groups entered (enter_group calls).
    pub groups: usize,
    /// Data chunks handed to the visitor.
    pub chunks: usize,
    /// Diagnostics recorded anywhere in the tree.
    pub diagnostics: usize,
}

/// Grammar engine configured with a dialect, declarations and a policy.
#[derive(Debug, Clone)]
pub struct ChunkParser {
    dialect: Dialect,
    registry: ChunkRegistry,
    config: ParserConfig,
}

enum GroupOutcome {
    Parsed,
    /// Rejected in resilient mode; the note belongs to the enclosing group.
    Skipped(String),
}

impl ChunkParser {
    pub fn new(dialect: Dialect, registry: ChunkRegistry) -> Self {
        ChunkParser {
            dialect,
            registry,
            config: ParserConfig::default(),
        }
    }

    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn read_data(mut self, on: bool) -> Self {
        self.config.read_data = on;
        self
    }

    pub fn resilient(mut self, on: bool) -> Self {
        self.config.resilient = on;
        self
    }

    pub fn max_payload_size(mut self, limit: u64) -> Self {
        self.config.max_payload_size = limit;
        self
    }

    pub fn base_offset(mut self, base: u64) -> Self {
        self.config.base_offset = base;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn registry(&self) -> &ChunkRegistry {
        &self.registry
    }

    pub fn parser_config(&self) -> &ParserConfig {
        &self.config
    }

    /// Run one full traversal of `reader`, driving `visitor`.
    pub fn parse<R: Read, V: ChunkVisitor + ?Sized>(
        self,
        reader: R,
        visitor: &mut V,
    ) -> Result<ParseReport, ParseError> {
        tracing::info!(
            dialect = %self.dialect.name,
            resilient = self.config.resilient,
            read_data = self.config.read_data,
            "parsing chunk stream"
        );
        let cursor = ByteCursor::with_base_offset(reader, self.dialect.endianness, self.config.base_offset);
        let mut session = Session {
            dialect: &self.dialect,
            registry: &self.registry,
            config: &self.config,
            cursor,
            visitor,
            report: ParseReport::default(),
        };
        session.parse_file()?;
        session.report.end_offset = session.cursor.position();
        tracing::info!(
            end_offset = session.report.end_offset,
            groups = session.report.groups,
            chunks = session.report.chunks,
            diagnostics = session.report.diagnostics,
            "chunk stream parsed"
        );
        Ok(session.report)
    }
}

struct Session<'a, R, V: ?Sized> {
    dialect: &'a Dialect,
    registry: &'a ChunkRegistry,
    config: &'a ParserConfig,
    cursor: ByteCursor<R>,
    visitor: &'a mut V,
    report: ParseReport,
}

impl<'a, R: Read, V: ChunkVisitor + ?Sized> Session<'a, R, V> {
    fn parse_file(&mut self) -> Result<(), ParseError> {
        let offset = self.cursor.position();
        let id = self.cursor.read_id()?;
        let kind = match self.dialect.group_kind(id) {
            Some(kind) if self.dialect.is_top_level(id) => kind,
            _ => return Err(ParseError::InvalidMagic { offset, id }),
        };
        let scope = PropertyScope::new();
        self.parse_group(id, kind, ChunkId::NULL, &scope, None)?;

        if !self.dialect.repeated_top_level {
            return Ok(());
        }
        loop {
            match self.cursor.align() {
                Err(e) if e.is_eof() => return Ok(()),
                other => other?,
            }
            let offset = self.cursor.position();
            let id = match self.cursor.read_id() {
                Ok(id) => id,
                Err(e) if e.is_eof() && self.cursor.position() == offset => return Ok(()),
                Err(e) if e.is_eof() => {
                    self.note_trailing(offset);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            match self.dialect.group_kind(id) {
                Some(kind) if self.dialect.is_top_level(id) => {
                    self.parse_group(id, kind, ChunkId::NULL, &scope, None)?;
                }
                _ => {
                    self.note_trailing(offset);
                    return Ok(());
                }
            }
        }
    }

    fn note_trailing(&mut self, offset: u64) {
        tracing::warn!(offset, "ignoring trailing bytes after last top-level group");
        self.report.diagnostics += 1;
    }

    /// Group size: 32 bits, or 64 bits after a zero sentinel when the dialect has extended sizes.
    fn read_group_size(&mut self) -> Result<u64, ParseError> {
        let size = self.cursor.read_u32()? as u64;
        if size == 0 && self.dialect.extended_sizes {
            return self.cursor.read_u64();
        }
        Ok(size)
    }

    /// Body length to consume for a chunk starting at `offset`: the declared size,
    /// or in resilient mode the part that fits in the enclosing group.
    fn body_len(
        &self,
        id: ChunkId,
        header_offset: u64,
        offset: u64,
        size: u64,
        parent_end: Option<u64>,
    ) -> Result<(u64, Option<String>), ParseError> {
        let end = match parent_end {
            Some(end) => end,
            None => return Ok((size, None)),
        };
        let available = end.saturating_sub(offset);
        if size <= available {
            return Ok((size, None));
        }
        let overrun = size - available;
        if !self.config.resilient {
            return Err(ParseError::ChunkOverrun { offset: header_offset, id, size, overrun });
        }
        Ok((
            available,
            Some(format!(
                "declared size {} overruns its group by {} bytes; clamped to {}",
                size, overrun, available
            )),
        ))
    }

    /// Ends a child loop on end of stream, recording how many bytes past the
    /// content type the body got.
    fn recover_eof(&mut self, node: &mut ChunkNode, body_len: u64, result: Result<(), ParseError>) -> Result<(), ParseError> {
        match result {
            Err(e) if e.is_eof() => {
                let got = self.cursor.position().saturating_sub(node.offset).saturating_sub(4);
                node.add_diagnostic(format!("truncated after {} of {} bytes", got, body_len));
                Ok(())
            }
            other => other,
        }
    }

    fn parse_group(
        &mut self,
        keyword: ChunkId,
        kind: GroupKind,
        group_type: ChunkId,
        scope: &PropertyScope,
        parent_end: Option<u64>,
    ) -> Result<GroupOutcome, ParseError> {
        let header_offset = self.cursor.position() - 4;
        let size = self.read_group_size()?;
        let offset = self.cursor.position();
        let (body_len, overrun_note) = self.body_len(keyword, header_offset, offset, size, parent_end)?;

        let content_type = self.cursor.read_id()?;
        let legal = match kind {
            GroupKind::Cat => self.dialect.is_legal_cat_type(content_type),
            _ => self.dialect.is_legal_content_type(content_type),
        };
        if !legal {
            let err = ParseError::IllegalContentType { offset, group: keyword, id: content_type };
            if self.config.resilient && parent_end.is_some() {
                self.cursor.skip(body_len.saturating_sub(4))?;
                return Ok(GroupOutcome::Skipped(format!("skipped group: {}", err)));
            }
            return Err(err);
        }

        let mut node = ChunkNode::new_group(group_type, keyword, content_type, size, offset);
        node.set_inherited(scope.get(content_type));
        if let Some(note) = overrun_note {
            node.add_diagnostic(note);
        }
        tracing::debug!(keyword = %keyword, content_type = %content_type, size, offset, "group");

        let visit = self.registry.visits_group(content_type, keyword);
        if visit {
            if !self.visitor.entering_group(&node)? {
                tracing::debug!(keyword = %keyword, content_type = %content_type, offset, "group skipped by visitor");
                let skipped = self.cursor.skip(body_len.saturating_sub(4));
                self.recover_eof(&mut node, body_len, skipped)?;
                self.report.diagnostics += node.diagnostics.len();
                return Ok(GroupOutcome::Parsed);
            }
            self.visitor.enter_group(&node)?;
            self.report.groups += 1;
        }

        // PROP blocks met in this body stay visible to its later children only.
        let mut child_scope = if kind == GroupKind::List { PropertyScope::new() } else { scope.clone() };
        let finish = offset.saturating_add(body_len);
        let result = self.parse_children(&mut node, finish, &mut child_scope);
        self.recover_eof(&mut node, body_len, result)?;

        self.report.diagnostics += node.diagnostics.len();
        if visit {
            self.visitor.leave_group(&node)?;
        }
        Ok(GroupOutcome::Parsed)
    }

    fn parse_children(&mut self, node: &mut ChunkNode, finish: u64, scope: &mut PropertyScope) -> Result<(), ParseError> {
        let group_type = node.kind();
        while self.cursor.position() < finish {
            let child_offset = self.cursor.position();
            let id = self.cursor.read_id()?;
            match self.dialect.group_kind(id) {
                Some(GroupKind::Prop) => {
                    if let Some(block) = self.parse_property_group(id, node, finish)? {
                        scope.insert(block);
                    }
                }
                Some(kind) => {
                    if let GroupOutcome::Skipped(note) = self.parse_group(id, kind, group_type, scope, Some(finish))? {
                        node.add_diagnostic(note);
                    }
                }
                None if self.dialect.is_filler(id) => self.skip_filler(finish)?,
                None if self.dialect.is_legal_local_chunk_id(id) => self.parse_local_chunk(id, node, finish)?,
                None => self.reject_chunk(id, child_offset, node, finish)?,
            }
            self.align_child(finish)?;
        }
        Ok(())
    }

    /// Pad byte after a child. Its absence is tolerated when the child ends the body.
    fn align_child(&mut self, finish: u64) -> Result<(), ParseError> {
        match self.cursor.align() {
            Err(e) if e.is_eof() && self.cursor.position() == finish => Ok(()),
            other => other,
        }
    }

    fn skip_filler(&mut self, finish: u64) -> Result<(), ParseError> {
        let size = self.cursor.read_u32()? as u64;
        let remaining = finish.saturating_sub(self.cursor.position());
        self.cursor.skip(size.min(remaining))
    }

    /// Illegal tag inside a group: fatal, or skipped by its declared size when resilient.
    fn reject_chunk(&mut self, id: ChunkId, offset: u64, node: &mut ChunkNode, finish: u64) -> Result<(), ParseError> {
        let err = ParseError::IllegalChunkId { offset, id };
        if !self.config.resilient {
            return Err(err);
        }
        node.add_diagnostic(format!("skipped chunk: {}", err));
        let size = self.cursor.read_u32()? as u64;
        let remaining = finish.saturating_sub(self.cursor.position());
        self.cursor.skip(size.min(remaining))
    }

    /// Payload of a chunk that is kept: loaded, skipped by policy, or skipped for size.
    fn read_body(&mut self, chunk: &mut ChunkNode, body_len: u64) -> Result<(), ParseError> {
        if !self.config.read_data {
            return self.cursor.skip(body_len);
        }
        if body_len > self.config.max_payload_size {
            chunk.add_diagnostic(format!(
                "payload of {} bytes exceeds the {} byte limit; not loaded",
                body_len, self.config.max_payload_size
            ));
            return self.cursor.skip(body_len);
        }
        chunk.payload = Some(self.cursor.read_payload(body_len)?);
        Ok(())
    }

    fn parse_local_chunk(&mut self, id: ChunkId, parent: &mut ChunkNode, parent_end: u64) -> Result<(), ParseError> {
        let header_offset = self.cursor.position() - 4;
        let size = self.cursor.read_u32()? as u64;
        let offset = self.cursor.position();
        let (body_len, overrun_note) = self.body_len(id, header_offset, offset, size, Some(parent_end))?;
        let mut chunk = ChunkNode::new_local(parent.kind(), id, size, offset);
        if let Some(note) = overrun_note {
            chunk.add_diagnostic(note);
        }

        let role = self.registry.classify(parent.kind(), id);
        tracing::trace!(id = %id, size, offset, role = ?role, "chunk");
        match role {
            Some(role @ (ChunkRole::Data | ChunkRole::Property | ChunkRole::Collection)) => {
                self.read_body(&mut chunk, body_len)?;
                self.report.diagnostics += chunk.diagnostics.len();
                match role {
                    ChunkRole::Data => {
                        self.visitor.visit_chunk(parent, &chunk)?;
                        self.report.chunks += 1;
                    }
                    ChunkRole::Property => parent.put_property(chunk),
                    _ => parent.add_collection(chunk),
                }
            }
            _ => {
                self.report.diagnostics += chunk.diagnostics.len();
                self.cursor.skip(body_len)?;
            }
        }
        Ok(())
    }

    /// Shared property block. Returns `None` when it was rejected in resilient mode.
    fn parse_property_group(
        &mut self,
        keyword: ChunkId,
        parent: &mut ChunkNode,
        parent_end: u64,
    ) -> Result<Option<ChunkNode>, ParseError> {
        let header_offset = self.cursor.position() - 4;
        let size = self.read_group_size()?;
        let offset = self.cursor.position();
        let (body_len, overrun_note) = self.body_len(keyword, header_offset, offset, size, Some(parent_end))?;

        let content_type = self.cursor.read_id()?;
        if !self.dialect.is_legal_content_type(content_type) {
            let err = ParseError::IllegalContentType { offset, group: keyword, id: content_type };
            if !self.config.resilient {
                return Err(err);
            }
            parent.add_diagnostic(format!("skipped property block: {}", err));
            self.cursor.skip(body_len.saturating_sub(4))?;
            return Ok(None);
        }

        let mut block = ChunkNode::new_group(parent.kind(), keyword, content_type, size, offset);
        if let Some(note) = overrun_note {
            block.add_diagnostic(note);
        }
        tracing::debug!(content_type = %content_type, size, offset, "property block");
        let finish = offset.saturating_add(body_len);
        let result = self.parse_property_children(&mut block, finish);
        self.recover_eof(&mut block, body_len, result)?;
        self.report.diagnostics += block.diagnostics.len();
        Ok(Some(block))
    }

    fn parse_property_children(&mut self, block: &mut ChunkNode, finish: u64) -> Result<(), ParseError> {
        while self.cursor.position() < finish {
            let child_offset = self.cursor.position();
            let id = self.cursor.read_id()?;
            if self.dialect.is_filler(id) {
                self.skip_filler(finish)?;
            } else if self.dialect.is_legal_local_chunk_id(id) {
                let header_offset = child_offset;
                let size = self.cursor.read_u32()? as u64;
                let offset = self.cursor.position();
                let (body_len, overrun_note) = self.body_len(id, header_offset, offset, size, Some(finish))?;
                let mut chunk = ChunkNode::new_local(block.kind(), id, size, offset);
                if let Some(note) = overrun_note {
                    chunk.add_diagnostic(note);
                }
                self.read_body(&mut chunk, body_len)?;
                self.report.diagnostics += chunk.diagnostics.len();
                block.put_property(chunk);
            } else {
                self.reject_chunk(id, child_offset, block, finish)?;
            }
            self.align_child(finish)?;
        }
        Ok(())
    }
}
