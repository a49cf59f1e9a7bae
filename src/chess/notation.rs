//! Human-readable (SAN) to coordinate (UCI) move conversion.
//!
//! Every call replays from the standard initial position on a board it owns.
//! Tokens that do not parse, or that are not legal in the current position,
//! are skipped without advancing the board and reported back to the caller.

use super::log;
use regex::Regex;
use shakmaty::{CastlingMode, Chess, Move, Position, san::SanPlus};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid comment regex"));

static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("valid variation regex"));

static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.+|…)").expect("valid move number regex"));

static NAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$\d+$").expect("valid NAG regex"));

const RESULT_MARKERS: [&str; 5] = ["1-0", "0-1", "1/2-1/2", "½-½", "*"];

/// Why one SAN token was not converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not SAN at all.
    Syntax(String),
    /// Well-formed SAN with no matching legal move in the current position.
    Illegal(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(reason) => write!(f, "syntax error: {reason}"),
            Self::Illegal(reason) => write!(f, "illegal in position: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Coordinate moves plus the input tokens that were dropped, both in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub coordinates: Vec<String>,
    pub skipped: Vec<String>,
}

impl Normalized {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Rewrites castling written with zeros (`0-0`, `0-0-0+`) to the SAN letter form.
fn letter_castling(token: &str) -> Cow<'_, str> {
    let body = token.trim_end_matches(['+', '#']);
    if body == "0-0" || body == "0-0-0" {
        Cow::Owned(token.replace('0', "O"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Resolves one SAN token against `pos` without touching it.
pub fn parse_token(pos: &Chess, token: &str) -> Result<Move, TokenError> {
    let san: SanPlus = letter_castling(token)
        .parse()
        .map_err(|e| TokenError::Syntax(format!("{e}")))?;
    san.san
        .to_move(pos)
        .map_err(|e| TokenError::Illegal(format!("{e}")))
}

/// Converts SAN tokens to UCI, skipping (and reporting) tokens that fail.
pub fn normalize_moves<I, S>(tokens: I) -> Normalized
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pos = Chess::default();
    let mut out = Normalized::default();

    for token in tokens {
        let token = token.as_ref();
        match parse_token(&pos, token) {
            Ok(m) => {
                out.coordinates
                    .push(m.to_uci(CastlingMode::Standard).to_string());
                pos.play_unchecked(m);
            }
            Err(e) => {
                log::warn(format!("Skipping invalid move: {token} ({e})"));
                out.skipped.push(token.to_string());
            }
        }
    }

    out
}

/// Splits free movetext into bare SAN tokens.
///
/// Drops comments, parenthesised variations, move numbers, result markers and
/// numeric NAGs; strips trailing `!`/`?` annotations. Anything else is kept
/// verbatim so the normalizer can report it.
pub fn tokenize_movetext(text: &str) -> Vec<String> {
    let mut cleaned = COMMENT_RE.replace_all(text, " ").into_owned();
    // Innermost first so nested variations unwind.
    while VARIATION_RE.is_match(&cleaned) {
        cleaned = VARIATION_RE.replace_all(&cleaned, " ").into_owned();
    }

    cleaned
        .split_whitespace()
        .filter_map(|raw| {
            let token = MOVE_NUMBER_RE.replace(raw, "");
            let token = token.trim_end_matches(['!', '?']);
            if token.is_empty() || RESULT_MARKERS.contains(&token) || NAG_RE.is_match(token) {
                None
            } else {
                Some(token.to_string())
            }
        })
        .collect()
}
