//! Format dialects: which tags open groups, which are reserved, byte order of size fields.
//!
//! The EA IFF 85 family and the RIFF family share one grammar; a [`Dialect`] only
//! supplies the keyword table and a few switches. All identifier rules the engine
//! evaluates at token boundaries live here.

use crate::id::ChunkId;

/// Byte order of size fields and other multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

/// Grammar production a group keyword introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Self-contained typed object (`FORM`, `RIFF`, RIFF `LIST`).
    Form,
    /// Scoping list (`LIST` in IFF): its children share a fresh property scope.
    List,
    /// Untyped collection of objects (`CAT `); its type may be the filler.
    Cat,
    /// Shared property block (`PROP`); contains only property chunks.
    Prop,
}

/// Keyword table and switches for one member of the chunk-container family.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub name: String,
    pub endianness: Endianness,
    /// Group keywords and the production each one opens.
    pub groups: Vec<(ChunkId, GroupKind)>,
    /// Keywords allowed as the first tag of a stream.
    pub top_level: Vec<ChunkId>,
    /// Additional reserved tags (numbered keyword variants and the like).
    pub reserved: Vec<ChunkId>,
    /// Padding chunk skipped without classification.
    pub filler: Option<ChunkId>,
    /// A 32-bit group size of 0 is followed by a 64-bit size.
    pub extended_sizes: bool,
    /// Content types may contain lower-case letters.
    pub lowercase_types: bool,
    /// Further top-level groups may follow the first one.
    pub repeated_top_level: bool,
}

impl Dialect {
    /// EA IFF 85: `FORM`, `LIST`, `CAT `, `PROP`, big-endian sizes.
    pub fn iff() -> Self {
        let mut reserved = Vec::with_capacity(27);
        for prefix in [b"FOR", b"LIS", b"CAT"] {
            for n in b'1'..=b'9' {
                reserved.push(ChunkId([prefix[0], prefix[1], prefix[2], n]));
            }
        }
        Dialect {
            name: "iff".to_string(),
            endianness: Endianness::Big,
            groups: vec![
                (ChunkId::FORM, GroupKind::Form),
                (ChunkId::LIST, GroupKind::List),
                (ChunkId::CAT, GroupKind::Cat),
                (ChunkId::PROP, GroupKind::Prop),
            ],
            top_level: vec![ChunkId::FORM, ChunkId::LIST, ChunkId::CAT],
            reserved,
            filler: Some(ChunkId::FILLER),
            extended_sizes: false,
            lowercase_types: false,
            repeated_top_level: false,
        }
    }

    /// Microsoft RIFF: `RIFF` and `LIST`, little-endian sizes, `JUNK` padding.
    pub fn riff() -> Self {
        Dialect {
            name: "riff".to_string(),
            endianness: Endianness::Little,
            groups: vec![(ChunkId::RIFF, GroupKind::Form), (ChunkId::LIST, GroupKind::Form)],
            top_level: vec![ChunkId::RIFF],
            reserved: vec![ChunkId::RIFX],
            filler: Some(ChunkId::JUNK),
            extended_sizes: false,
            lowercase_types: true,
            repeated_top_level: true,
        }
    }

    /// Big-endian RIFF variant introduced by a `RIFX` magic.
    pub fn rifx() -> Self {
        Dialect {
            name: "rifx".to_string(),
            endianness: Endianness::Big,
            groups: vec![(ChunkId::RIFX, GroupKind::Form), (ChunkId::LIST, GroupKind::Form)],
            top_level: vec![ChunkId::RIFX],
            reserved: vec![ChunkId::RIFF],
            ..Dialect::riff()
        }
    }

    /// Empty dialect to be filled with the `with_*` builders.
    pub fn custom(name: &str, endianness: Endianness) -> Self {
        Dialect {
            name: name.to_string(),
            endianness,
            groups: Vec::new(),
            top_level: Vec::new(),
            reserved: Vec::new(),
            filler: None,
            extended_sizes: false,
            lowercase_types: false,
            repeated_top_level: false,
        }
    }

    /// Look up a built-in dialect by name (`iff`, `riff`, `rifx`).
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "iff" => Some(Dialect::iff()),
            "riff" => Some(Dialect::riff()),
            "rifx" => Some(Dialect::rifx()),
            _ => None,
        }
    }

    /// Guess the dialect from the first tag of a stream.
    pub fn sniff(magic: ChunkId) -> Option<Self> {
        [Dialect::iff(), Dialect::riff(), Dialect::rifx()]
            .into_iter()
            .find(|d| d.is_top_level(magic))
    }

    pub fn with_group(mut self, id: ChunkId, kind: GroupKind) -> Self {
        self.groups.retain(|(g, _)| *g != id);
        self.groups.push((id, kind));
        self
    }

    pub fn with_top_level(mut self, id: ChunkId) -> Self {
        if !self.top_level.contains(&id) {
            self.top_level.push(id);
        }
        self
    }

    pub fn with_reserved(mut self, id: ChunkId) -> Self {
        if !self.reserved.contains(&id) {
            self.reserved.push(id);
        }
        self
    }

    pub fn with_filler(mut self, id: ChunkId) -> Self {
        self.filler = Some(id);
        self
    }

    pub fn with_extended_sizes(mut self, on: bool) -> Self {
        self.extended_sizes = on;
        self
    }

    pub fn with_lowercase_types(mut self, on: bool) -> Self {
        self.lowercase_types = on;
        self
    }

    pub fn with_repeated_top_level(mut self, on: bool) -> Self {
        self.repeated_top_level = on;
        self
    }

    pub fn group_kind(&self, id: ChunkId) -> Option<GroupKind> {
        self.groups.iter().find(|(g, _)| *g == id).map(|(_, k)| *k)
    }

    pub fn is_group_kind(&self, id: ChunkId) -> bool {
        self.group_kind(id).is_some()
    }

    pub fn is_top_level(&self, id: ChunkId) -> bool {
        self.top_level.contains(&id) && self.is_group_kind(id)
    }

    pub fn is_filler(&self, id: ChunkId) -> bool {
        self.filler == Some(id)
    }

    /// Group keywords, the filler and the extra reserved set.
    pub fn is_reserved(&self, id: ChunkId) -> bool {
        self.is_group_kind(id) || self.is_filler(id) || self.reserved.contains(&id)
    }

    /// Legal FORM/LIST type: well-formed, not reserved, upper-case letters,
    /// digits and spaces only (lower-case too when the dialect allows it).
    pub fn is_legal_content_type(&self, id: ChunkId) -> bool {
        if !id.is_well_formed() || self.is_reserved(id) || id.0[0] == b' ' {
            return false;
        }
        id.0.iter().all(|&b| {
            b.is_ascii_uppercase()
                || b.is_ascii_digit()
                || b == b' '
                || (self.lowercase_types && b.is_ascii_lowercase())
        })
    }

    /// CAT type: a legal content type or the filler (untyped catalog).
    pub fn is_legal_cat_type(&self, id: ChunkId) -> bool {
        self.is_filler(id) || self.is_legal_content_type(id)
    }

    /// Legal local chunk tag: well-formed, not the filler, not a keyword, not reserved.
    pub fn is_legal_local_chunk_id(&self, id: ChunkId) -> bool {
        id.is_well_formed() && !self.is_reserved(id)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::iff()
    }
}
