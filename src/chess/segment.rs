//! Linear scan over document blocks producing classified opening entries.
//!
//! Headings that start with a classification code (`A00`, `B20–B99`, ...)
//! set the code attached to every entry until the next matching heading.
//! Text blocks are split into lines and handed to the line parser.

use super::eco::ClassificationCode;
use super::types::OpeningEntry;
use super::variant::{parse_line, split_at_first_move};
use regex::Regex;
use std::sync::LazyLock;

static HEADING_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-E]\d{2})(?:[\-\u{2013}\u{2014}]\w+)?").expect("valid heading code regex")
});

static LINE_NUMBERING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*(.*)$").expect("valid line numbering regex"));

static REFERENCE_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[\]0-9]+$").expect("valid reference regex"));

static EMBEDDED_MOVES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1\.").expect("valid embedded moves regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    List,
    Generic,
}

/// One top-level content block with its rendered text. Multi-line text keeps
/// its line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Traversal state for one document. Never shared between documents.
#[derive(Debug, Default)]
struct Segmenter {
    current: Option<ClassificationCode>,
    entries: Vec<OpeningEntry>,
}

impl Segmenter {
    fn visit(&mut self, block: &Block) {
        match block.kind {
            BlockKind::Heading(_) => self.visit_heading(&block.text),
            BlockKind::Paragraph | BlockKind::List | BlockKind::Generic => {
                self.visit_text(&block.text)
            }
        }
    }

    fn visit_heading(&mut self, text: &str) {
        if let Some(code) = heading_code(text) {
            self.current = Some(code);
        }
    }

    fn visit_text(&mut self, text: &str) {
        for line in text.lines() {
            let Some(content) = content_of_line(line) else {
                continue;
            };

            for (name, moves) in parse_line(content) {
                if let Some(entry) = self.commit(name, moves) {
                    self.entries.push(entry);
                }
            }
        }
    }

    fn commit(&self, name: Option<String>, moves: String) -> Option<OpeningEntry> {
        let (name, moves) = match name {
            Some(n) if moves.is_empty() && EMBEDDED_MOVES_RE.is_match(&n) => {
                split_at_first_move(&n).unwrap_or((Some(n), moves))
            }
            other => (other, moves),
        };

        if moves.is_empty() {
            return None;
        }

        Some(OpeningEntry {
            name,
            classification: self.current,
            moves,
        })
    }
}

/// Classification code at the start of a heading, if any.
pub fn heading_code(text: &str) -> Option<ClassificationCode> {
    let caps = HEADING_CODE_RE.captures(text.trim())?;
    ClassificationCode::parse(caps.get(1)?.as_str())
}

/// Trims a raw line, strips one `N.` numbering prefix and rejects lines that
/// carry nothing but reference markers.
fn content_of_line(line: &str) -> Option<&str> {
    let line = line.trim();
    let content = match LINE_NUMBERING_RE.captures(line) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => line,
    }
    .trim();

    if content.is_empty() || REFERENCE_ONLY_RE.is_match(content) {
        None
    } else {
        Some(content)
    }
}

/// Extracts every opening entry from `blocks`, in document order.
pub fn extract_openings(blocks: &[Block]) -> Vec<OpeningEntry> {
    let mut segmenter = Segmenter::default();
    for block in blocks {
        segmenter.visit(block);
    }
    segmenter.entries
}
