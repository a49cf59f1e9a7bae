//! Heuristic splitting of one encyclopedia line into `(name, moves)` pairs.
//!
//! A line may hold several variants separated by arrow glyphs. Each fragment
//! is matched against a fixed, ordered list of strategies; the first one that
//! applies produces the pair.

use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{2192}\u{00BB}]").expect("valid separator regex"));

static COLON_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^:]+?)\s*:\s*(?P<moves>.+)$").expect("valid colon split regex")
});

static LEADING_MARKERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\u{2192}\u{00BB}\->\s]+").expect("valid leading marker regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Marks where a move sequence starts inside free text.
const FIRST_MOVE_TOKEN: &str = "1.";

const FRAGMENT_DASHES: [char; 4] = [' ', '-', '\u{2013}', '\u{2014}'];
const NAME_TRAILERS: [char; 3] = [':', ',', ' '];

/// Fragment splitting strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStrategy {
    /// `name: moves`
    ColonSplit,
    /// `name 1.e4 ...` split at the first `1.`
    NumberedMoveSplit,
    /// Whole fragment is a name; moves are empty.
    NameOnly,
}

impl LineStrategy {
    pub const ORDER: [Self; 3] = [Self::ColonSplit, Self::NumberedMoveSplit, Self::NameOnly];

    fn apply(self, fragment: &str) -> Option<(Option<String>, String)> {
        match self {
            Self::ColonSplit => {
                let caps = COLON_SPLIT_RE.captures(fragment)?;
                Some((
                    non_empty(clean_text(&caps["name"])),
                    clean_text(&caps["moves"]),
                ))
            }
            Self::NumberedMoveSplit => split_at_first_move(fragment),
            Self::NameOnly => Some((non_empty(clean_text(fragment)), String::new())),
        }
    }
}

/// Normalizes whitespace (including NBSP) to single spaces and strips leading
/// arrows and bullet markers.
pub fn clean_text(s: &str) -> String {
    let s = s.replace('\u{00A0}', " ");
    let s = LEADING_MARKERS_RE.replace(s.trim(), "");
    WHITESPACE_RE.replace_all(&s, " ").trim().to_string()
}

/// Splits `fragment` at the first `1.`: the prefix (minus trailing `:`/`,`)
/// becomes the name, the rest the moves.
pub(crate) fn split_at_first_move(fragment: &str) -> Option<(Option<String>, String)> {
    let idx = fragment.find(FIRST_MOVE_TOKEN)?;
    let name = clean_text(fragment[..idx].trim_end_matches(NAME_TRAILERS));
    let moves = clean_text(&fragment[idx..]);
    Some((non_empty(name), moves))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Splits a cleaned line into `(name, moves)` pairs, one per arrow-separated
/// fragment. `moves` may be empty; callers decide whether to keep such pairs.
pub fn parse_line(line: &str) -> Vec<(Option<String>, String)> {
    SEPARATOR_RE
        .split(line)
        .map(|part| part.trim().trim_matches(FRAGMENT_DASHES))
        .filter(|fragment| !fragment.is_empty())
        .filter_map(|fragment| {
            LineStrategy::ORDER
                .iter()
                .find_map(|strategy| strategy.apply(fragment))
        })
        .collect()
}
