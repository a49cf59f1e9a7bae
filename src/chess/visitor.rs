use super::error::ErrorAccumulator;
use super::notation::normalize_moves;
use super::types::PgnGame;
use super::validate::{ValidationMode, validate_game_with};

use pgn_reader::{Nag, Outcome, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use smallvec::SmallVec;
use std::io::{self, Read};
use std::mem;
use std::ops::ControlFlow;

/// Mainline SAN tokens of one game.
pub type SanList = SmallVec<[String; 128]>;

#[macro_export]
macro_rules! pgn_visitor_skip_variations {
    () => {
        fn nag(&mut self, _: &mut Self::Movetext, _: Nag) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn comment(
            &mut self,
            _: &mut Self::Movetext,
            _: RawComment<'_>,
        ) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn partial_comment(
            &mut self,
            _: &mut Self::Movetext,
            _: RawComment<'_>,
        ) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
            ControlFlow::Continue(Skip(true))
        }
    };
}

/// Streaming PGN visitor (pgn-reader).
///
/// Collects the catalogue headers and the mainline SAN moves. At the end of
/// each game the moves are converted to UCI and replayed, and the finished
/// [`PgnGame`] is left in `current_game`.
pub struct GameVisitor {
    headers: HeaderFields,
    mode: ValidationMode,
    result_marker: Option<String>,
    parse_error: ErrorAccumulator,
    pending_sans: SanList,
    pub current_game: Option<PgnGame>,
}

#[derive(Default)]
struct HeaderFields {
    event: String,
    site: String,
    date: String,
    utc_date: String,
    white: String,
    black: String,
    white_elo: String,
    black_elo: String,
    eco: String,
    opening: String,
    result: String,
}

impl HeaderFields {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn opt_take(field: &mut String) -> Option<String> {
        if field.is_empty() {
            None
        } else {
            Some(mem::take(field))
        }
    }

    fn set_known_tag(&mut self, key: &[u8], value: RawTag<'_>) {
        let slot: &mut String = match key {
            b"Event" => &mut self.event,
            b"Site" => &mut self.site,
            b"Date" => &mut self.date,
            b"UTCDate" => &mut self.utc_date,
            b"White" => &mut self.white,
            b"Black" => &mut self.black,
            b"WhiteElo" => &mut self.white_elo,
            b"BlackElo" => &mut self.black_elo,
            b"ECO" => &mut self.eco,
            b"Opening" => &mut self.opening,
            b"Result" => &mut self.result,
            _ => return,
        };

        if !slot.is_empty() {
            return;
        }

        let bytes = value.as_bytes();
        if bytes.is_empty() {
            return;
        }

        *slot = String::from_utf8_lossy(bytes).into_owned();
    }
}

impl GameVisitor {
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            headers: HeaderFields::default(),
            mode,
            result_marker: None,
            parse_error: ErrorAccumulator::default(),
            pending_sans: SanList::new(),
            current_game: None,
        }
    }

    fn parse_uinteger_field(
        raw: &mut String,
        label: &str,
        parse_error: &mut ErrorAccumulator,
    ) -> Option<u32> {
        let s = HeaderFields::opt_take(raw)?;
        let s = s.trim();
        if s.is_empty() || s == "?" || s == "-" {
            return None;
        }
        match s.parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                parse_error.push(&format!("Conversion error: {label}='{s}'"));
                None
            }
        }
    }

    fn build_game_record(&mut self) {
        let sans = mem::take(&mut self.pending_sans);
        let normalized = normalize_moves(&sans);
        for token in &normalized.skipped {
            self.parse_error
                .push(&format!("Skipped unplayable move '{token}'"));
        }
        let record = validate_game_with(&normalized.coordinates, self.mode);

        let white_elo =
            Self::parse_uinteger_field(&mut self.headers.white_elo, "WhiteElo", &mut self.parse_error);
        let black_elo =
            Self::parse_uinteger_field(&mut self.headers.black_elo, "BlackElo", &mut self.parse_error);

        self.current_game = Some(PgnGame {
            event: HeaderFields::opt_take(&mut self.headers.event),
            site: HeaderFields::opt_take(&mut self.headers.site),
            date: HeaderFields::opt_take(&mut self.headers.date)
                .or_else(|| HeaderFields::opt_take(&mut self.headers.utc_date)),
            white: HeaderFields::opt_take(&mut self.headers.white),
            black: HeaderFields::opt_take(&mut self.headers.black),
            white_elo,
            black_elo,
            eco: HeaderFields::opt_take(&mut self.headers.eco),
            opening: HeaderFields::opt_take(&mut self.headers.opening),
            result: HeaderFields::opt_take(&mut self.headers.result)
                .or_else(|| self.result_marker.take()),
            record,
            skipped: normalized.skipped,
            parse_error: self.parse_error.take(),
        });
    }

    pub fn finalize_game_with_error(&mut self, error_msg: String) {
        self.parse_error.push(&error_msg);
        self.build_game_record();
    }
}

impl Visitor for GameVisitor {
    type Tags = ();
    type Movetext = SanList;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.headers.clear();
        self.result_marker = None;
        self.parse_error = ErrorAccumulator::default();
        self.pending_sans.clear();
        self.current_game = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        self.headers.set_known_tag(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(SanList::new())
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        movetext.push(san.to_string());
        ControlFlow::Continue(())
    }

    pgn_visitor_skip_variations!();

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.result_marker = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        self.pending_sans = movetext;
        self.build_game_record();
    }
}

/// Reads every game from `input`. A reader error ends the scan of `input`
/// without failing the call; the game being read at that point is kept with
/// the error in `parse_error`. `read_pgn` stops a file the same way.
pub fn read_pgn_games<R: Read>(input: R, mode: ValidationMode) -> Vec<PgnGame> {
    let mut reader = Reader::new(input);
    let mut visitor = GameVisitor::new(mode);
    let mut games = Vec::new();

    loop {
        match reader.read_game(&mut visitor) {
            Ok(Some(())) => games.extend(visitor.current_game.take()),
            Ok(None) => break,
            Err(e) => {
                visitor.finalize_game_with_error(reader_error_message(games.len() + 1, &e));
                games.extend(visitor.current_game.take());
                break;
            }
        }
    }

    games
}

pub(crate) fn reader_error_message(game_index: usize, error: &io::Error) -> String {
    format!("Parser-stage error: stage=read_game; game_index={game_index}; error={error}")
}
