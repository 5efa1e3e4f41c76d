//! Abstract syntax tree for declaration files, and its translation into a parser setup.

use crate::dialect::{Dialect, Endianness, GroupKind};
use crate::engine::{ChunkParser, ParserConfig};
use crate::id::ChunkId;
use crate::registry::{ChunkRegistry, ChunkRole};

/// Root of a declaration file.
#[derive(Debug, Clone, Default)]
pub struct DeclarationFile {
    pub dialect: Option<DialectSpec>,
    pub keywords: Vec<KeywordDecl>,
    pub reserved: Vec<ChunkId>,
    pub filler: Option<ChunkId>,
    pub options: Vec<OptionSetting>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialectSpec {
    /// Built-in dialect (`iff`, `riff`, `rifx`).
    Named(String),
    /// `dialect custom big;`: starts empty, filled by `keyword` statements.
    Custom(String, Endianness),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordDecl {
    pub id: ChunkId,
    pub kind: GroupKind,
    pub top_level: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionSetting {
    pub name: String,
    pub value: OptionValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(u64),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            OptionValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub role: ChunkRole,
    pub group_type: ChunkId,
    pub id: ChunkId,
}

/// Options that change the dialect rather than the traversal policy.
pub const DIALECT_OPTIONS: &[&str] = &["extended_sizes", "lowercase_types", "repeated_top_level"];
/// Options that map onto [`ParserConfig`].
pub const PARSER_OPTIONS: &[&str] = &["read_data", "resilient", "max_payload", "base_offset"];

impl DeclarationFile {
    fn option(&self, name: &str) -> Option<OptionValue> {
        self.options.iter().rev().find(|o| o.name == name).map(|o| o.value)
    }

    fn bool_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(|v| v.as_bool())
    }

    /// Whether the file picks a dialect itself (otherwise the caller may sniff one).
    pub fn has_dialect(&self) -> bool {
        self.dialect.is_some() || !self.keywords.is_empty()
    }

    /// Dialect named by the file (IFF when none), extended by its keyword,
    /// reserved, filler and dialect option statements.
    pub fn dialect(&self) -> Result<Dialect, String> {
        self.dialect_or(Dialect::iff())
    }

    /// Like [`dialect`](Self::dialect) with `fallback` used when no `dialect` statement exists.
    pub fn dialect_or(&self, fallback: Dialect) -> Result<Dialect, String> {
        let mut dialect = match &self.dialect {
            Some(DialectSpec::Named(name)) => {
                Dialect::by_name(name).ok_or_else(|| format!("Unknown dialect: {}", name))?
            }
            Some(DialectSpec::Custom(name, endianness)) => Dialect::custom(name, *endianness),
            None => fallback,
        };
        for k in &self.keywords {
            dialect = dialect.with_group(k.id, k.kind);
            if k.top_level {
                dialect = dialect.with_top_level(k.id);
            }
        }
        for r in &self.reserved {
            dialect = dialect.with_reserved(*r);
        }
        if let Some(f) = self.filler {
            dialect = dialect.with_filler(f);
        }
        if let Some(on) = self.bool_option("extended_sizes") {
            dialect = dialect.with_extended_sizes(on);
        }
        if let Some(on) = self.bool_option("lowercase_types") {
            dialect = dialect.with_lowercase_types(on);
        }
        if let Some(on) = self.bool_option("repeated_top_level") {
            dialect = dialect.with_repeated_top_level(on);
        }
        if dialect.top_level.is_empty() {
            return Err(format!("Dialect {} has no top-level keyword", dialect.name));
        }
        Ok(dialect)
    }

    /// Registry with every role statement applied in file order.
    pub fn registry(&self) -> ChunkRegistry {
        let mut registry = ChunkRegistry::new();
        for d in &self.declarations {
            registry.declare(d.role, d.group_type, d.id);
        }
        registry
    }

    /// Parser policy: defaults overridden by `option` statements (last one wins).
    pub fn config(&self) -> ParserConfig {
        let mut config = ParserConfig::default();
        if let Some(on) = self.bool_option("read_data") {
            config.read_data = on;
        }
        if let Some(on) = self.bool_option("resilient") {
            config.resilient = on;
        }
        if let Some(n) = self.option("max_payload").and_then(|v| v.as_u64()) {
            config.max_payload_size = n;
        }
        if let Some(n) = self.option("base_offset").and_then(|v| v.as_u64()) {
            config.base_offset = n;
        }
        config
    }

    pub fn into_parser(self) -> Result<ChunkParser, String> {
        let dialect = self.dialect()?;
        Ok(ChunkParser::new(dialect, self.registry()).config(self.config()))
    }
}
