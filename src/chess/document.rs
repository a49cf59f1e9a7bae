//! JSON block documents in, JSON opening catalogues out.
//!
//! Input shape: `[{"kind": "h2", "text": "A00 Irregular openings"}, ...]`.
//! `kind` is either an HTML tag name (`h1`..`h6`, `p`, `ul`, `ol`, `dl`,
//! `div`) or an abstract name (`heading` with optional `level`, `paragraph`,
//! `list`, `block`/`generic`).

use super::error::DocumentError;
use super::log;
use super::segment::{Block, BlockKind, extract_openings};
use super::types::OpeningEntry;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

const DEFAULT_HEADING_LEVEL: u8 = 2;

fn block_kind(kind: &str, level: Option<u64>) -> Option<BlockKind> {
    let kind = kind.trim().to_ascii_lowercase();
    match kind.as_str() {
        "heading" => Some(BlockKind::Heading(
            level
                .and_then(|l| u8::try_from(l).ok())
                .unwrap_or(DEFAULT_HEADING_LEVEL),
        )),
        "paragraph" | "p" => Some(BlockKind::Paragraph),
        "list" | "ul" | "ol" | "dl" => Some(BlockKind::List),
        "generic" | "block" | "div" => Some(BlockKind::Generic),
        tag => match tag.as_bytes() {
            [b'h', d @ b'1'..=b'6'] => Some(BlockKind::Heading(d - b'0')),
            _ => None,
        },
    }
}

fn decode_block(index: usize, value: &Value) -> Result<Option<Block>, DocumentError> {
    let malformed = |reason: &str| DocumentError::MalformedBlock {
        index,
        reason: reason.to_string(),
    };

    let obj = value
        .as_object()
        .ok_or_else(|| malformed("expected an object"))?;
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing string field 'kind'"))?;
    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing string field 'text'"))?;
    let level = obj.get("level").and_then(Value::as_u64);

    match block_kind(kind, level) {
        Some(kind) => Ok(Some(Block::new(kind, text))),
        None => {
            log::warn(format!("Ignoring block {index} of kind '{kind}'"));
            Ok(None)
        }
    }
}

/// Decodes a JSON block list. Blocks of unknown kind are skipped; anything
/// else that does not fit the shape aborts the whole document.
pub fn parse_blocks_json(text: &str) -> Result<Vec<Block>, DocumentError> {
    let value: Value = serde_json::from_str(text)?;
    let items = value.as_array().ok_or(DocumentError::NotABlockList)?;

    let mut blocks = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if let Some(block) = decode_block(index, item)? {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

pub fn extract_openings_json(text: &str) -> Result<Vec<OpeningEntry>, DocumentError> {
    let blocks = parse_blocks_json(text)?;
    let entries = extract_openings(&blocks);
    log::info(format!(
        "Found {} openings in {} blocks",
        entries.len(),
        blocks.len()
    ));
    Ok(entries)
}

pub fn read_openings_file(path: &Path) -> Result<Vec<OpeningEntry>, DocumentError> {
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_openings_json(&text)
}

pub fn opening_to_json(entry: &OpeningEntry) -> Value {
    json!({
        "name": entry.name,
        "eco": entry.classification.map(|c| c.to_string()),
        "moves": entry.moves,
    })
}

pub fn openings_to_json(entries: &[OpeningEntry]) -> String {
    Value::Array(entries.iter().map(opening_to_json).collect()).to_string()
}

pub(crate) fn variants_to_json(pairs: &[(Option<String>, String)]) -> String {
    let values: Vec<Value> = pairs
        .iter()
        .map(|(name, moves)| json!({ "name": name, "moves": moves }))
        .collect();
    Value::Array(values).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::eco::ClassificationCode;

    #[test]
    fn test_parse_blocks_html_and_abstract_kinds() {
        let json = r#"[
            {"kind": "h3", "text": "A00"},
            {"kind": "heading", "level": 4, "text": "B00"},
            {"kind": "heading", "text": "C00"},
            {"kind": "p", "text": "one"},
            {"kind": "OL", "text": "two"},
            {"kind": "generic", "text": "three"}
        ]"#;

        let blocks = parse_blocks_json(json).unwrap();
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading(3),
                BlockKind::Heading(4),
                BlockKind::Heading(2),
                BlockKind::Paragraph,
                BlockKind::List,
                BlockKind::Generic,
            ]
        );
    }

    #[test]
    fn test_parse_blocks_skips_unknown_kinds() {
        let json = r#"[{"kind": "table", "text": "x"}, {"kind": "p", "text": "y"}]"#;
        let blocks = parse_blocks_json(json).unwrap();
        assert_eq!(blocks, vec![Block::new(BlockKind::Paragraph, "y")]);
    }

    #[test]
    fn test_parse_blocks_rejects_non_array() {
        let err = parse_blocks_json(r#"{"kind": "p"}"#).unwrap_err();
        assert!(matches!(err, DocumentError::NotABlockList));
    }

    #[test]
    fn test_parse_blocks_rejects_invalid_json() {
        let err = parse_blocks_json("[{").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn test_parse_blocks_rejects_missing_text() {
        let err = parse_blocks_json(r#"[{"kind": "p"}, {"kind": "p", "text": 5}]"#).unwrap_err();
        match err {
            DocumentError::MalformedBlock { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.contains("'text'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_openings_file_missing_path_is_io_error() {
        let err = read_openings_file(Path::new("/nonexistent/openings.json")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/openings.json"));
    }

    #[test]
    fn test_extract_openings_json_end_to_end() {
        let json = r#"[
            {"kind": "h2", "text": "C20–C99 Open games"},
            {"kind": "ul", "text": "1. Vienna Game: 1.e4 e5 2.Nc3\n[3]"}
        ]"#;

        let entries = extract_openings_json(json).unwrap();
        assert_eq!(
            entries,
            vec![OpeningEntry {
                name: Some("Vienna Game".to_string()),
                classification: ClassificationCode::parse("C20"),
                moves: "1.e4 e5 2.Nc3".to_string(),
            }]
        );
    }

    #[test]
    fn test_openings_to_json_uses_null_for_absent_fields() {
        let entries = vec![OpeningEntry {
            name: None,
            classification: None,
            moves: "1.e4".to_string(),
        }];
        let parsed: Value = serde_json::from_str(&openings_to_json(&entries)).unwrap();
        assert_eq!(
            parsed,
            json!([{"name": null, "eco": null, "moves": "1.e4"}])
        );
    }

    #[test]
    fn test_variants_to_json() {
        let pairs = vec![(Some("Grob".to_string()), "1.g4".to_string())];
        let parsed: Value = serde_json::from_str(&variants_to_json(&pairs)).unwrap();
        assert_eq!(parsed, json!([{"name": "Grob", "moves": "1.g4"}]));
    }
}
