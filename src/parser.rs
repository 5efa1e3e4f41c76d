//! Parse declaration file source into AST using PEST.

use crate::ast::*;
use crate::dialect::{Endianness, GroupKind};
use crate::id::ChunkId;
use crate::registry::ChunkRole;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct DeclarationParser;

type Pair<'i> = pest::iterators::Pair<'i, Rule>;

/// Parse declaration source into AST.
pub fn parse(source: &str) -> Result<DeclarationFile, String> {
    let pairs = DeclarationParser::parse(Rule::declarations, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    build_file(pair)
}

fn build_file(pair: Pair) -> Result<DeclarationFile, String> {
    let mut file = DeclarationFile::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::dialect_stmt => {
                if file.dialect.is_some() {
                    return Err(format!("{}: dialect declared twice", line_of(&inner)));
                }
                file.dialect = Some(build_dialect(inner)?);
            }
            Rule::keyword_stmt => file.keywords.push(build_keyword(inner)?),
            Rule::reserved_stmt => file.reserved.push(build_single_tag(inner)?),
            Rule::filler_stmt => file.filler = Some(build_single_tag(inner)?),
            Rule::option_stmt => file.options.push(build_option(inner)?),
            Rule::role_stmt => file.declarations.push(build_declaration(inner)?),
            _ => {}
        }
    }
    Ok(file)
}

fn line_of(pair: &Pair) -> String {
    format!("line {}", pair.as_span().start_pos().line_col().0)
}

fn build_dialect(pair: Pair) -> Result<DialectSpec, String> {
    let line = line_of(&pair);
    let mut name = None;
    let mut order = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::byte_order => {
                order = Some(match inner.as_str() {
                    "little" => Endianness::Little,
                    _ => Endianness::Big,
                })
            }
            _ => {}
        }
    }
    let name = name.ok_or("dialect: missing name")?.to_ascii_lowercase();
    match (name.as_str(), order) {
        ("iff" | "riff" | "rifx", None) => Ok(DialectSpec::Named(name)),
        ("iff" | "riff" | "rifx", Some(_)) => Err(format!(
            "{}: byte order cannot be overridden for built-in dialect {}",
            line, name
        )),
        (_, Some(order)) => Ok(DialectSpec::Custom(name, order)),
        (_, None) => Err(format!(
            "{}: unknown dialect {} (custom dialects need a byte order: big or little)",
            line, name
        )),
    }
}

fn build_keyword(pair: Pair) -> Result<KeywordDecl, String> {
    let mut id = None;
    let mut kind = None;
    let mut top_level = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::tag_bare | Rule::tag_quoted => id = Some(parse_tag(&inner)?),
            Rule::group_kind => {
                kind = Some(match inner.as_str() {
                    "form" => GroupKind::Form,
                    "list" => GroupKind::List,
                    "cat" => GroupKind::Cat,
                    _ => GroupKind::Prop,
                })
            }
            Rule::top_flag => top_level = true,
            _ => {}
        }
    }
    let kind = kind.ok_or("keyword: missing group kind")?;
    if top_level && kind == GroupKind::Prop {
        return Err("keyword: a prop keyword cannot open a file".to_string());
    }
    Ok(KeywordDecl {
        id: id.ok_or("keyword: missing tag")?,
        kind,
        top_level,
    })
}

fn build_single_tag(pair: Pair) -> Result<ChunkId, String> {
    let inner = pair.into_inner().next().ok_or("missing tag")?;
    parse_tag(&inner)
}

fn build_option(pair: Pair) -> Result<OptionSetting, String> {
    let line = line_of(&pair);
    let mut it = pair.into_inner();
    let name = it.next().ok_or("option: missing name")?.as_str().to_string();
    let value_pair = it.next().ok_or("option: missing value")?;
    let value = match value_pair.as_rule() {
        Rule::boolean => OptionValue::Bool(value_pair.as_str() == "true"),
        Rule::number => OptionValue::Int(parse_number(value_pair.as_str())?),
        r => return Err(format!("option: unexpected value {:?}", r)),
    };
    let expects_bool = match name.as_str() {
        "max_payload" | "base_offset" => false,
        n if DIALECT_OPTIONS.contains(&n) || PARSER_OPTIONS.contains(&n) => true,
        _ => return Err(format!("{}: unknown option {}", line, name)),
    };
    if expects_bool != matches!(value, OptionValue::Bool(_)) {
        let expected = if expects_bool { "true or false" } else { "a number" };
        return Err(format!("{}: option {} expects {}", line, name, expected));
    }
    Ok(OptionSetting { name, value })
}

fn build_declaration(pair: Pair) -> Result<Declaration, String> {
    let mut role = None;
    let mut tags = Vec::with_capacity(2);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::role => {
                role = Some(match inner.as_str() {
                    "data" => ChunkRole::Data,
                    "property" => ChunkRole::Property,
                    "collection" => ChunkRole::Collection,
                    _ => ChunkRole::Group,
                })
            }
            Rule::tag_bare | Rule::tag_quoted => tags.push(parse_tag(&inner)?),
            _ => {}
        }
    }
    if tags.len() != 2 {
        return Err("declaration: expected TYPE.TAG".to_string());
    }
    Ok(Declaration {
        role: role.ok_or("declaration: missing role")?,
        group_type: tags[0],
        id: tags[1],
    })
}

fn parse_tag(pair: &Pair) -> Result<ChunkId, String> {
    let s = pair.as_str();
    let text = if pair.as_rule() == Rule::tag_quoted {
        unescape(&s[1..s.len() - 1])?
    } else {
        s.as_bytes().to_vec()
    };
    let bytes: [u8; 4] = text
        .as_slice()
        .try_into()
        .map_err(|_| format!("{}: tag {} must be exactly 4 bytes", line_of(pair), s))?;
    Ok(ChunkId(bytes))
}

/// Quoted tags accept `\xNN` and `\\` escapes for non-printable bytes.
fn unescape(s: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(4);
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'\\') => {
                out.push(b'\\');
                i += 2;
            }
            Some(b'x') => {
                let hex = s.get(i + 2..i + 4).ok_or("Invalid \\x escape")?;
                out.push(u8::from_str_radix(hex, 16).map_err(|_| "Invalid hex")?);
                i += 4;
            }
            _ => return Err(format!("Invalid escape in tag \"{}\"", s)),
        }
    }
    Ok(out)
}

fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid number {}: {}", s, e));
    }
    s.parse::<u64>().map_err(|e| format!("Invalid number {}: {}", s, e))
}
