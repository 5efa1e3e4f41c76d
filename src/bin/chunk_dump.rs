//! chunk_dump: print the chunk tree of an IFF, RIFF or RIFX file.
//!
//! # Usage
//!
//! ```bash
//! chunk_dump picture.iff
//! chunk_dump --declarations ilbm.decl --preview 16 picture.iff
//! chunk_dump --dialect riff --resilient broken.avi
//! ```
//!
//! Without `--dialect` the dialect is picked from the declaration file, or else
//! from the first tag of the input.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use tagchunk::{ChunkId, ChunkParser, ChunkRegistry, DeclarationFile, Dialect, DumpVisitor};

#[derive(Parser)]
#[command(name = "chunk_dump", about = "Dump the chunk tree of an IFF, RIFF or RIFX file", version)]
struct Cli {
    /// Input file.
    file: PathBuf,

    /// Dialect to use (iff, riff, rifx) instead of guessing it.
    #[arg(short, long)]
    dialect: Option<String>,

    /// Declaration file with chunk roles and parser options.
    #[arg(long)]
    declarations: Option<PathBuf>,

    /// Keep going past illegal tags and overrunning chunks.
    #[arg(long)]
    resilient: bool,

    /// Do not load payloads.
    #[arg(long)]
    no_data: bool,

    /// Largest payload to load, in bytes.
    #[arg(long)]
    max_payload: Option<u64>,

    /// Hex preview length for payloads.
    #[arg(long, default_value_t = 0)]
    preview: usize,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data = std::fs::read(&cli.file).with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let declarations = match &cli.declarations {
        Some(path) => {
            let src = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read declarations {}", path.display()))?;
            tagchunk::parse(&src).map_err(|e| anyhow!("{}: {}", path.display(), e))?
        }
        None => DeclarationFile::default(),
    };

    let parser = build_parser(&cli, &declarations, &data)?;
    let parser = if cli.resilient { parser.resilient(true) } else { parser };
    let parser = if cli.no_data { parser.read_data(false) } else { parser };
    let parser = match cli.max_payload {
        Some(limit) => parser.max_payload_size(limit),
        None => parser,
    };

    let stdout = std::io::stdout();
    let mut visitor = DumpVisitor::new(stdout.lock()).with_preview(cli.preview);
    let report = parser
        .parse(data.as_slice(), &mut visitor)
        .with_context(|| format!("Failed to parse {}", cli.file.display()))?;

    let mut out = visitor.into_inner();
    writeln!(
        out,
        "-- {} groups, {} chunks, {} diagnostics, {} bytes",
        report.groups, report.chunks, report.diagnostics, report.end_offset
    )?;
    Ok(())
}

fn build_parser(cli: &Cli, declarations: &DeclarationFile, data: &[u8]) -> Result<ChunkParser> {
    let fallback = match &cli.dialect {
        Some(name) => Dialect::by_name(name).ok_or_else(|| anyhow!("Unknown dialect: {}", name))?,
        None if declarations.has_dialect() => Dialect::iff(),
        None => sniff(data)?,
    };
    let dialect = if cli.dialect.is_some() && declarations.dialect.is_some() {
        bail!("--dialect conflicts with the dialect statement of the declaration file");
    } else {
        declarations.dialect_or(fallback).map_err(|e| anyhow!(e))?
    };
    let registry: ChunkRegistry = declarations.registry();
    Ok(ChunkParser::new(dialect, registry).config(declarations.config()))
}

fn sniff(data: &[u8]) -> Result<Dialect> {
    let magic: [u8; 4] = data
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| anyhow!("File is too short to hold a chunk header"))?;
    let magic = ChunkId(magic);
    Dialect::sniff(magic).ok_or_else(|| anyhow!("Unrecognized magic {}; pass --dialect", magic))
}
