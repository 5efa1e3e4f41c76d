//! Runtime chunk records and the property scope threaded through scoping groups.

use crate::id::ChunkId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// One parsed chunk, group or local.
///
/// Created as soon as its header is read, filled in by the engine while its body
/// is parsed, handed to the visitor, and dropped once the engine has moved past
/// its end (unless it was kept as a property or collection entry).
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkNode {
    /// Content type of the enclosing group; [`ChunkId::NULL`] at the root.
    pub group_type: ChunkId,
    /// The chunk's own tag. For groups, the keyword (`FORM`, `LIST`, ...).
    pub id: ChunkId,
    /// Groups only: the type read after the size field.
    pub content_type: Option<ChunkId>,
    /// Declared body size, without the pad byte.
    pub size: u64,
    /// Absolute position where the body begins.
    pub offset: u64,
    pub payload: Option<Vec<u8>>,
    /// Notes left by recovery logic, in the order they happened.
    pub diagnostics: Vec<String>,
    properties: BTreeMap<ChunkId, ChunkNode>,
    collections: Vec<ChunkNode>,
    inherited: Option<Arc<ChunkNode>>,
}

impl ChunkNode {
    pub fn new_group(group_type: ChunkId, keyword: ChunkId, content_type: ChunkId, size: u64, offset: u64) -> Self {
        ChunkNode {
            content_type: Some(content_type),
            ..ChunkNode::new_local(group_type, keyword, size, offset)
        }
    }

    pub fn new_local(group_type: ChunkId, id: ChunkId, size: u64, offset: u64) -> Self {
        ChunkNode {
            group_type,
            id,
            content_type: None,
            size,
            offset,
            payload: None,
            diagnostics: Vec::new(),
            properties: BTreeMap::new(),
            collections: Vec::new(),
            inherited: None,
        }
    }

    pub fn is_group(&self) -> bool {
        self.content_type.is_some()
    }

    /// Content type for groups; the tag for local chunks.
    pub fn kind(&self) -> ChunkId {
        self.content_type.unwrap_or(self.id)
    }

    /// First byte past the body, not counting the pad byte.
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    /// Body size including the pad byte for odd sizes.
    pub fn padded_size(&self) -> u64 {
        self.size.saturating_add(self.size & 1)
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Property chunk `id`: this group's own first, then the inherited shared block.
    pub fn property(&self, id: ChunkId) -> Option<&ChunkNode> {
        self.properties
            .get(&id)
            .or_else(|| self.inherited.as_ref().and_then(|b| b.properties.get(&id)))
    }

    /// Visible properties: own ones, then inherited ones not shadowed by an own one.
    pub fn properties(&self) -> impl Iterator<Item = &ChunkNode> + '_ {
        let inherited = self
            .inherited
            .iter()
            .flat_map(|b| b.properties.values())
            .filter(move |p| !self.properties.contains_key(&p.id));
        self.properties.values().chain(inherited)
    }

    pub fn collections(&self) -> &[ChunkNode] {
        &self.collections
    }

    /// Collection entries tagged `id`, in encounter order.
    pub fn collection(&self, id: ChunkId) -> impl Iterator<Item = &ChunkNode> + '_ {
        self.collections.iter().filter(move |c| c.id == id)
    }

    /// The shared property block this group inherited from its scope.
    pub fn inherited(&self) -> Option<&ChunkNode> {
        self.inherited.as_deref()
    }

    pub(crate) fn put_property(&mut self, chunk: ChunkNode) {
        self.properties.insert(chunk.id, chunk);
    }

    pub(crate) fn add_collection(&mut self, chunk: ChunkNode) {
        self.collections.push(chunk);
    }

    pub(crate) fn set_inherited(&mut self, block: Option<Arc<ChunkNode>>) {
        self.inherited = block;
    }

    pub(crate) fn add_diagnostic(&mut self, note: String) {
        tracing::warn!(id = %self.id, offset = self.offset, "{}", note);
        self.diagnostics.push(note);
    }
}

/// Shared property blocks visible to the siblings of one scoping group, keyed by
/// the content type they apply to. A later block for the same type replaces the
/// earlier one for the siblings that follow it.
#[derive(Debug, Clone, Default)]
pub struct PropertyScope {
    blocks: HashMap<ChunkId, Arc<ChunkNode>>,
}

impl PropertyScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, content_type: ChunkId) -> Option<Arc<ChunkNode>> {
        self.blocks.get(&content_type).cloned()
    }

    pub fn insert(&mut self, block: ChunkNode) {
        self.blocks.insert(block.kind(), Arc::new(block));
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
