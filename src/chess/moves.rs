use duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};
use serde_json::Value;
use std::error::Error;

use crate::chess::document::{extract_openings_json, openings_to_json, variants_to_json};
use crate::chess::ffi::scalar::{invoke_unary_varchar_to_bool, invoke_unary_varchar_to_varchar};
use crate::chess::notation::{normalize_moves, tokenize_movetext};
use crate::chess::validate::validate_game;
use crate::chess::variant::parse_line;

fn varchar_to_varchar() -> Vec<ScalarFunctionSignature> {
    vec![ScalarFunctionSignature::exact(
        vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
        LogicalTypeHandle::from(LogicalTypeId::Varchar),
    )]
}

pub struct ChessMovesUciScalar;

impl VScalar for ChessMovesUciScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |movetext| {
            Ok(Some(movetext_to_uci(movetext)))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar()
    }
}

pub struct ChessMovesLegalScalar;

impl VScalar for ChessMovesLegalScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_bool(input, output, |uci| {
            validate_game(uci.split_whitespace()).legal
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        vec![ScalarFunctionSignature::exact(
            vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
            LogicalTypeHandle::from(LogicalTypeId::Boolean),
        )]
    }
}

pub struct ChessMovesIllegalScalar;

impl VScalar for ChessMovesIllegalScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |uci| Ok(Some(illegal_moves_json(uci))))
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar()
    }
}

pub struct ChessOpeningVariantsScalar;

impl VScalar for ChessOpeningVariantsScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |line| {
            Ok(Some(variants_to_json(&parse_line(line))))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar()
    }
}

pub struct ChessOpeningsJsonScalar;

impl VScalar for ChessOpeningsJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |document| {
            let entries = extract_openings_json(document)?;
            Ok(Some(openings_to_json(&entries)))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar()
    }
}

/// Free movetext to space-separated coordinate moves. Unplayable tokens are
/// dropped.
fn movetext_to_uci(movetext: &str) -> String {
    normalize_moves(tokenize_movetext(movetext))
        .coordinates
        .join(" ")
}

fn illegal_moves_json(uci: &str) -> String {
    let record = validate_game(uci.split_whitespace());
    Value::from(record.illegal_moves).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movetext_to_uci_plain_game() {
        assert_eq!(
            movetext_to_uci("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6"),
            "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6"
        );
    }

    #[test]
    fn test_movetext_to_uci_ignores_annotations() {
        assert_eq!(
            movetext_to_uci("1. e4! {best by test} e5? (1... c5 2. Nf3) 2. Nf3 $1 1-0"),
            "e2e4 e7e5 g1f3"
        );
    }

    #[test]
    fn test_movetext_to_uci_compact_move_numbers() {
        assert_eq!(movetext_to_uci("1.d4 Nf6 2.c4 g6"), "d2d4 g8f6 c2c4 g7g6");
    }

    #[test]
    fn test_movetext_to_uci_skips_unplayable() {
        // Black's knight cannot move to f6 as White's first move.
        assert_eq!(movetext_to_uci("Nf6 e4"), "e2e4");
    }

    #[test]
    fn test_movetext_to_uci_empty() {
        assert_eq!(movetext_to_uci(""), "");
        assert_eq!(movetext_to_uci("   *"), "");
    }

    #[test]
    fn test_movetext_to_uci_castling_as_king_move() {
        assert_eq!(
            movetext_to_uci("1.e4 e5 2.Nf3 Nc6 3.Bc4 Bc5 4.O-O"),
            "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5 e1g1"
        );
    }

    #[test]
    fn test_illegal_moves_json_legal_game() {
        assert_eq!(illegal_moves_json("e2e4 e7e5"), "[]");
    }

    #[test]
    fn test_illegal_moves_json_reports_every_failure() {
        // Once e2e5 fails, e7e5 is tested with White still to move.
        assert_eq!(
            illegal_moves_json("e2e5 e7e5"),
            r#"["e2e5","e7e5"]"#
        );
    }

    #[test]
    fn test_illegal_moves_json_garbage_tokens() {
        assert_eq!(illegal_moves_json("zz99"), r#"["zz99"]"#);
    }
}
