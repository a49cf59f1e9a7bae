use super::eco::ClassificationCode;

/// One catalogued opening line extracted from a document.
///
/// `moves` is never empty for an emitted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningEntry {
    pub name: Option<String>,
    pub classification: Option<ClassificationCode>,
    pub moves: String,
}

/// Outcome of replaying a coordinate move list from the initial position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    pub moves: Vec<String>,
    pub legal: bool,
    pub illegal_moves: Vec<String>,
}

/// A PGN game after normalization and validation.
#[derive(Debug, Clone, Default)]
pub struct PgnGame {
    pub event: Option<String>,
    pub site: Option<String>,
    pub date: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub white_elo: Option<u32>,
    pub black_elo: Option<u32>,
    pub eco: Option<String>,
    pub opening: Option<String>,
    pub result: Option<String>,

    pub record: GameRecord,
    /// Mainline SAN tokens that could not be played.
    pub skipped: Vec<String>,

    /// NULL for clean games, otherwise `"; "`-joined diagnostics.
    pub parse_error: Option<String>,
}
