//! Chunk declaration registry: which (group type, tag) pairs mean what.
//!
//! A local chunk's role cannot be recovered from the bytes, so the caller declares it
//! before parsing. Local declarations and group declarations follow independent
//! open/closed-world rules:
//!
//! | Declared | Local chunk classification | Group visitation |
//! |----------|----------------------------|------------------|
//! | nothing | every chunk is `Data` | every group |
//! | some Data/Property/Collection | only declared pairs, others discarded | unaffected |
//! | some Group | unaffected | only declared (type, keyword) pairs |

use crate::id::ChunkId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkRole {
    /// Handed to the visitor.
    Data,
    /// Stored in the parent's property map, visible to later siblings.
    Property,
    /// Appended to the parent's collection list, one entry per occurrence.
    Collection,
    /// Groups: fire enter/leave callbacks. Local chunks: discarded.
    Group,
}

/// Caller-owned declarations for one parse.
#[derive(Debug, Clone, Default)]
pub struct ChunkRegistry {
    local: HashMap<(ChunkId, ChunkId), ChunkRole>,
    groups: HashSet<(ChunkId, ChunkId)>,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `id` under `group_type`. For groups, `group_type` is the content
    /// type and `id` the keyword (`declare(Group, ILBM, FORM)`).
    /// A later declaration of the same pair replaces the earlier role.
    pub fn declare(&mut self, role: ChunkRole, group_type: ChunkId, id: ChunkId) -> &mut Self {
        let key = (group_type, id);
        match role {
            ChunkRole::Group => {
                self.local.remove(&key);
                self.groups.insert(key);
            }
            _ => {
                self.groups.remove(&key);
                self.local.insert(key, role);
            }
        }
        self
    }

    pub fn declare_data(&mut self, group_type: ChunkId, id: ChunkId) -> &mut Self {
        self.declare(ChunkRole::Data, group_type, id)
    }

    pub fn declare_property(&mut self, group_type: ChunkId, id: ChunkId) -> &mut Self {
        self.declare(ChunkRole::Property, group_type, id)
    }

    pub fn declare_collection(&mut self, group_type: ChunkId, id: ChunkId) -> &mut Self {
        self.declare(ChunkRole::Collection, group_type, id)
    }

    pub fn declare_group(&mut self, content_type: ChunkId, keyword: ChunkId) -> &mut Self {
        self.declare(ChunkRole::Group, content_type, keyword)
    }

    /// Role of a local chunk, or `None` when it is uninteresting.
    pub fn classify(&self, group_type: ChunkId, id: ChunkId) -> Option<ChunkRole> {
        let key = (group_type, id);
        if let Some(role) = self.local.get(&key) {
            return Some(*role);
        }
        if self.groups.contains(&key) {
            return Some(ChunkRole::Group);
        }
        if self.local.is_empty() {
            Some(ChunkRole::Data)
        } else {
            None
        }
    }

    /// Whether a group should fire enter/leave callbacks.
    pub fn visits_group(&self, content_type: ChunkId, keyword: ChunkId) -> bool {
        self.groups.is_empty() || self.groups.contains(&(content_type, keyword))
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.groups.is_empty()
    }

    /// All declarations, locals first, in no particular order.
    pub fn declarations(&self) -> impl Iterator<Item = (ChunkRole, ChunkId, ChunkId)> + '_ {
        self.local
            .iter()
            .map(|(&(t, id), &role)| (role, t, id))
            .chain(self.groups.iter().map(|&(t, id)| (ChunkRole::Group, t, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &[u8; 4]) -> ChunkId {
        ChunkId::new(*s)
    }

    #[test]
    fn empty_registry_is_open_world() {
        let r = ChunkRegistry::new();
        assert_eq!(r.classify(id(b"ILBM"), id(b"BODY")), Some(ChunkRole::Data));
        assert_eq!(r.classify(ChunkId::NULL, id(b"XXXX")), Some(ChunkRole::Data));
        assert!(r.visits_group(id(b"ILBM"), ChunkId::FORM));
    }

    #[test]
    fn one_declaration_closes_the_world() {
        let mut r = ChunkRegistry::new();
        r.declare_data(id(b"TEST"), id(b"CHNK"));
        assert_eq!(r.classify(id(b"TEST"), id(b"CHNK")), Some(ChunkRole::Data));
        assert_eq!(r.classify(id(b"TEST"), id(b"OTHR")), None);
        assert_eq!(r.classify(id(b"ELSE"), id(b"CHNK")), None);
    }

    #[test]
    fn group_declarations_do_not_close_local_world() {
        let mut r = ChunkRegistry::new();
        r.declare_group(id(b"ILBM"), ChunkId::FORM);
        assert_eq!(r.classify(id(b"ILBM"), id(b"BODY")), Some(ChunkRole::Data));
        assert!(r.visits_group(id(b"ILBM"), ChunkId::FORM));
        assert!(!r.visits_group(id(b"8SVX"), ChunkId::FORM));
        assert!(!r.visits_group(id(b"ILBM"), ChunkId::LIST));
    }

    #[test]
    fn local_tag_declared_as_group_is_classified_group() {
        let mut r = ChunkRegistry::new();
        r.declare_data(id(b"ILBM"), id(b"BODY"));
        r.declare_group(id(b"ILBM"), id(b"WRAP"));
        assert_eq!(r.classify(id(b"ILBM"), id(b"WRAP")), Some(ChunkRole::Group));
    }

    #[test]
    fn redeclaration_replaces_role() {
        let mut r = ChunkRegistry::new();
        r.declare_data(id(b"ILBM"), id(b"CMAP"))
            .declare_property(id(b"ILBM"), id(b"CMAP"));
        assert_eq!(r.classify(id(b"ILBM"), id(b"CMAP")), Some(ChunkRole::Property));
        assert_eq!(r.declarations().count(), 1);
    }
}
