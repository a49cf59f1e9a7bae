use super::types::GameRecord;
use shakmaty::{Chess, Position, uci::UciMove};

/// What to do after the first illegal coordinate move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Keep testing the remaining moves against the unchanged position and
    /// report every one that fails. Later moves usually fail too once the
    /// game has diverged.
    #[default]
    ReportAll,
    /// Stop at the first illegal move and report only that one.
    FirstIllegal,
}

impl ValidationMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("report_all") {
            Ok(Self::ReportAll)
        } else if normalized.eq_ignore_ascii_case("first_illegal") {
            Ok(Self::FirstIllegal)
        } else {
            Err(format!(
                "Invalid validation value '{}'. Supported values: 'report_all', 'first_illegal' or NULL/omitted.",
                normalized
            ))
        }
    }
}

/// Replays `moves` from the initial position, reporting every illegal token.
pub fn validate_game<I, S>(moves: I) -> GameRecord
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    validate_game_with(moves, ValidationMode::default())
}

pub fn validate_game_with<I, S>(moves: I, mode: ValidationMode) -> GameRecord
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pos = Chess::default();
    let mut record = GameRecord {
        moves: moves.into_iter().map(|t| t.as_ref().to_string()).collect(),
        ..GameRecord::default()
    };

    for token in &record.moves {
        let legal_move = token
            .parse::<UciMove>()
            .ok()
            .and_then(|uci| uci.to_move(&pos).ok());

        match legal_move {
            Some(m) => pos.play_unchecked(m),
            None => {
                record.illegal_moves.push(token.clone());
                if mode == ValidationMode::FirstIllegal {
                    break;
                }
            }
        }
    }

    record.legal = record.illegal_moves.is_empty();
    record
}
