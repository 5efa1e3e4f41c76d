//! Fatal parse errors. Recoverable conditions are diagnostics on [`ChunkNode`](crate::ChunkNode).

use crate::id::ChunkId;
use crate::visitor::Abort;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid file magic {id} at offset {offset}")]
    InvalidMagic { offset: u64, id: ChunkId },
    #[error("illegal content type {id} for {group} at offset {offset}")]
    IllegalContentType { offset: u64, group: ChunkId, id: ChunkId },
    #[error("illegal chunk id {id} at offset {offset}")]
    IllegalChunkId { offset: u64, id: ChunkId },
    #[error("chunk {id} at offset {offset} declares {size} bytes, {overrun} past the end of its group")]
    ChunkOverrun { offset: u64, id: ChunkId, size: u64, overrun: u64 },
    #[error("unexpected end of stream at offset {offset}")]
    UnexpectedEof { offset: u64 },
    #[error("aborted by visitor: {0}")]
    Aborted(#[from] Abort),
    #[error("I/O at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// Absolute byte offset where the problem was detected (`None` for aborts).
    pub fn offset(&self) -> Option<u64> {
        match self {
            ParseError::InvalidMagic { offset, .. }
            | ParseError::IllegalContentType { offset, .. }
            | ParseError::IllegalChunkId { offset, .. }
            | ParseError::ChunkOverrun { offset, .. }
            | ParseError::UnexpectedEof { offset }
            | ParseError::Io { offset, .. } => Some(*offset),
            ParseError::Aborted(_) => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, ParseError::UnexpectedEof { .. })
    }
}
