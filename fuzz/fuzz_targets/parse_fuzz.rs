//! Engine fuzz target: feed arbitrary bytes to every built-in dialect, strict
//! and resilient. The engine must not panic or allocate past the payload limit;
//! it should return Ok(ParseReport) or Err(ParseError).
//! Build with: cargo fuzz run parse_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
struct Sink;

#[cfg(fuzzing)]
impl tagchunk::ChunkVisitor for Sink {
    fn visit_chunk(&mut self, _parent: &tagchunk::ChunkNode, _chunk: &tagchunk::ChunkNode) -> Result<(), tagchunk::Abort> {
        Ok(())
    }
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    for dialect in [tagchunk::Dialect::iff(), tagchunk::Dialect::riff(), tagchunk::Dialect::rifx()] {
        for resilient in [false, true] {
            let _ = tagchunk::ChunkParser::new(dialect.clone(), tagchunk::ChunkRegistry::new())
                .resilient(resilient)
                .max_payload_size(1 << 20)
                .parse(data, &mut Sink);
        }
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = tagchunk::parse(s);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parse_fuzz");
}
