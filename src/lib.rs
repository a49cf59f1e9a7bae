extern crate duckdb;
extern crate libduckdb_sys;

pub mod chess;

pub use chess::{
    Block, BlockKind, ClassificationCode, DocumentError, GameRecord, Normalized, OpeningEntry,
    PgnGame, TokenError, ValidationMode, extract_openings, extract_openings_json,
    normalize_moves, parse_blocks_json, parse_line, read_pgn_games, tokenize_movetext,
    validate_game, validate_game_with,
};
