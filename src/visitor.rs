//! Visitor protocol driven by the engine at group boundaries and data chunks.

use crate::chunk::ChunkNode;

/// Cooperative cancellation signalled from a visitor callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Abort {
    pub reason: String,
}

impl Abort {
    pub fn new(reason: impl Into<String>) -> Self {
        Abort { reason: reason.into() }
    }
}

/// Callbacks for one traversal. Only [`visit_chunk`](ChunkVisitor::visit_chunk)
/// is required. Returning `Err(Abort)` from any method stops the parse at once
/// and the abort comes out of [`ChunkParser::parse`](crate::ChunkParser::parse)
/// unchanged.
pub trait ChunkVisitor {
    /// Asked before `enter_group`; `Ok(false)` skips the whole group body and
    /// neither `enter_group` nor `leave_group` fires for it.
    fn entering_group(&mut self, _group: &ChunkNode) -> Result<bool, Abort> {
        Ok(true)
    }

    fn enter_group(&mut self, _group: &ChunkNode) -> Result<(), Abort> {
        Ok(())
    }

    /// Fires for every group that was entered, truncated ones included.
    fn leave_group(&mut self, _group: &ChunkNode) -> Result<(), Abort> {
        Ok(())
    }

    /// A Data chunk; `parent` carries the properties and collections seen so far.
    fn visit_chunk(&mut self, parent: &ChunkNode, chunk: &ChunkNode) -> Result<(), Abort>;
}

impl<V: ChunkVisitor + ?Sized> ChunkVisitor for &mut V {
    fn entering_group(&mut self, group: &ChunkNode) -> Result<bool, Abort> {
        (**self).entering_group(group)
    }

    fn enter_group(&mut self, group: &ChunkNode) -> Result<(), Abort> {
        (**self).enter_group(group)
    }

    fn leave_group(&mut self, group: &ChunkNode) -> Result<(), Abort> {
        (**self).leave_group(group)
    }

    fn visit_chunk(&mut self, parent: &ChunkNode, chunk: &ChunkNode) -> Result<(), Abort> {
        (**self).visit_chunk(parent, chunk)
    }
}
