//! Four-byte chunk identifiers and the dialect-independent well-formedness rule.

use std::fmt;
use std::str::FromStr;

/// An opaque 4-byte chunk tag (`FORM`, `BMHD`, `RIFF`, ...).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// Group type of the root group (nothing encloses it).
    pub const NULL: ChunkId = ChunkId([0, 0, 0, 0]);
    pub const FORM: ChunkId = ChunkId(*b"FORM");
    pub const LIST: ChunkId = ChunkId(*b"LIST");
    pub const CAT: ChunkId = ChunkId(*b"CAT ");
    pub const PROP: ChunkId = ChunkId(*b"PROP");
    /// The all-space IFF filler chunk.
    pub const FILLER: ChunkId = ChunkId(*b"    ");
    pub const RIFF: ChunkId = ChunkId(*b"RIFF");
    pub const RIFX: ChunkId = ChunkId(*b"RIFX");
    pub const JUNK: ChunkId = ChunkId(*b"JUNK");

    pub const fn new(bytes: [u8; 4]) -> Self {
        ChunkId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Big-endian numeric value, as the tag appears in a hex dump.
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn from_u32(v: u32) -> Self {
        ChunkId(v.to_be_bytes())
    }

    /// Every byte is printable ASCII (0x20..=0x7E) and the tag does not start
    /// with a space, unless it is the all-space filler.
    pub fn is_well_formed(&self) -> bool {
        if !self.0.iter().all(|&b| (0x20..=0x7e).contains(&b)) {
            return false;
        }
        self.0[0] != b' ' || *self == ChunkId::FILLER
    }
}

impl From<[u8; 4]> for ChunkId {
    fn from(bytes: [u8; 4]) -> Self {
        ChunkId(bytes)
    }
}

impl From<&[u8; 4]> for ChunkId {
    fn from(bytes: &[u8; 4]) -> Self {
        ChunkId(*bytes)
    }
}

impl FromStr for ChunkId {
    type Err = String;

    /// Exactly four bytes; shorter ASCII tags are not padded implicitly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return Err(format!("chunk id {:?} must be exactly 4 bytes, got {}", s, bytes.len()));
        }
        Ok(ChunkId([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if (0x20..=0x7e).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{}\")", self)
    }
}
