//! # tagchunk: declarative grammar engine for tagged chunk containers
//!
//! Decodes hierarchical, size-prefixed, four-byte-tagged chunk streams of the
//! EA IFF 85 family (`FORM`, `LIST`, `CAT `, `PROP`) and the RIFF family
//! (`RIFF`, `LIST`) with one generalized recursive-descent engine.
//!
//! A local chunk's role cannot be recovered from the bytes, so the caller
//! declares, per (group type, tag) pair, whether it is:
//!
//! - **Data**: handed to the visitor,
//! - **Property**: kept on the parent and visible to later siblings,
//! - **Collection**: appended to the parent, one entry per occurrence,
//! - **Group**: an interesting group (fires enter/leave callbacks).
//!
//! With no declarations every chunk is Data and every group is visited, which
//! makes an unconfigured tree dump possible.
//!
//! ## Wire format
//!
//! ```text
//! tag:4  size:4  [extended size:8 if size == 0 and the dialect allows it]  body:size  [pad:1 if size is odd]
//! ```
//!
//! A group body starts with a 4-byte content type followed by child chunks.
//!
//! ## Declaration files
//!
//! ```text
//! dialect iff;
//! option resilient = true;
//! property ILBM.BMHD;
//! property ILBM.CMAP;
//! collection ILBM.CRNG;
//! data ILBM.BODY;
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use tagchunk::{ChunkId, ChunkParser, ChunkRegistry, Dialect};
//!
//! let mut registry = ChunkRegistry::new();
//! registry.declare_property(ChunkId::new(*b"ILBM"), ChunkId::new(*b"BMHD"));
//! registry.declare_data(ChunkId::new(*b"ILBM"), ChunkId::new(*b"BODY"));
//! let report = ChunkParser::new(Dialect::iff(), registry)
//!     .resilient(true)
//!     .parse(std::fs::File::open("picture.iff")?, &mut my_visitor)?;
//! ```
//!
//! See `tests/integration.rs` for full examples.

pub mod ast;
pub mod chunk;
pub mod cursor;
pub mod dialect;
pub mod dump;
pub mod engine;
pub mod error;
pub mod id;
pub mod parser;
pub mod registry;
pub mod visitor;
pub mod writer;

pub use ast::DeclarationFile;
pub use chunk::{ChunkNode, PropertyScope};
pub use cursor::ByteCursor;
pub use dialect::{Dialect, Endianness, GroupKind};
pub use dump::{dump_to_string, DumpVisitor};
pub use engine::{ChunkParser, ParseReport, ParserConfig, DEFAULT_MAX_PAYLOAD_SIZE};
pub use error::ParseError;
pub use id::ChunkId;
pub use parser::parse;
pub use registry::{ChunkRegistry, ChunkRole};
pub use visitor::{Abort, ChunkVisitor};
pub use writer::ChunkWriter;
