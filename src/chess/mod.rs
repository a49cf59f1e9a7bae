mod document;
mod eco;
mod error;
mod ffi;
mod log;
mod moves;
mod notation;
mod openings;
mod reader;
mod segment;
mod types;
mod validate;
mod variant;
mod visitor;

pub use document::{
    extract_openings_json, openings_to_json, parse_blocks_json, read_openings_file,
};
pub use eco::ClassificationCode;
pub use error::{DocumentError, ErrorAccumulator};
pub use notation::{Normalized, TokenError, normalize_moves, parse_token, tokenize_movetext};
pub use segment::{Block, BlockKind, extract_openings, heading_code};
pub use types::{GameRecord, OpeningEntry, PgnGame};
pub use validate::{ValidationMode, validate_game, validate_game_with};
pub use variant::{LineStrategy, clean_text, parse_line};
pub use visitor::{GameVisitor, read_pgn_games};

use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use moves::{
    ChessMovesIllegalScalar, ChessMovesLegalScalar, ChessMovesUciScalar,
    ChessOpeningVariantsScalar, ChessOpeningsJsonScalar,
};
use openings::ReadOpeningsVTab;
use reader::ReadPgnVTab;
use std::error::Error;

#[duckdb_extension(name = "chess_catalog", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadPgnVTab>("read_pgn")?;
    con.register_table_function::<ReadOpeningsVTab>("read_openings")?;

    // Scalar functions
    con.register_scalar_function::<ChessMovesUciScalar>("chess_moves_uci")?;
    con.register_scalar_function::<ChessMovesLegalScalar>("chess_moves_legal")?;
    con.register_scalar_function::<ChessMovesIllegalScalar>("chess_moves_illegal")?;
    con.register_scalar_function::<ChessOpeningVariantsScalar>("chess_opening_variants")?;
    con.register_scalar_function::<ChessOpeningsJsonScalar>("chess_openings_json")?;

    Ok(())
}
