use chess_catalog::{
    Block, BlockKind, ValidationMode, extract_openings, extract_openings_json, normalize_moves,
    parse_line, read_pgn_games, tokenize_movetext, validate_game, validate_game_with,
};

const CATALOGUE: &str = r#"[
    {"kind": "h2", "text": "A00 Irregular openings"},
    {"kind": "ul", "text": "Anderssen's Opening: 1.a3\nPolish Opening: 1.b4 → Outflank Variation: 1.b4 c6"},
    {"kind": "h2", "text": "C20–C99 Open games"},
    {"kind": "p", "text": "King's Gambit 1.e4 e5 2.f4\n[4]"},
    {"kind": "table", "text": "ignored"},
    {"kind": "p", "text": "Ruy Lopez: 1.e4 e5 2.Nf3 Nc6 3.Bb5 » Berlin Defence: 1.e4 e5 2.Nf3 Nc6 3.Bb5 Nf6"}
]"#;

#[test]
fn test_normalized_entries_replay_as_legal() {
    let entries = extract_openings_json(CATALOGUE).unwrap();
    assert_eq!(entries.len(), 6);

    for entry in &entries {
        let normalized = normalize_moves(tokenize_movetext(&entry.moves));
        assert!(normalized.is_clean(), "{entry:?} skipped {:?}", normalized.skipped);

        let record = validate_game(&normalized.coordinates);
        assert!(record.legal, "{entry:?}");
        assert!(record.illegal_moves.is_empty());
        assert_eq!(record.moves, normalized.coordinates);
    }
}

#[test]
fn test_entries_keep_document_order_and_classification() {
    let entries = extract_openings_json(CATALOGUE).unwrap();
    let summary: Vec<(Option<&str>, Option<String>)> = entries
        .iter()
        .map(|e| (e.name.as_deref(), e.classification.map(|c| c.to_string())))
        .collect();

    assert_eq!(
        summary,
        vec![
            (Some("Anderssen's Opening"), Some("A00".to_string())),
            (Some("Polish Opening"), Some("A00".to_string())),
            (Some("Outflank Variation"), Some("A00".to_string())),
            (Some("King's Gambit"), Some("C20".to_string())),
            (Some("Ruy Lopez"), Some("C20".to_string())),
            (Some("Berlin Defence"), Some("C20".to_string())),
        ]
    );
    assert!(entries.iter().all(|e| !e.moves.is_empty()));
}

#[test]
fn test_extraction_is_idempotent() {
    let blocks = vec![
        Block::new(BlockKind::Heading(3), "D00 Queen's Pawn Game"),
        Block::new(BlockKind::Paragraph, "London System: 1.d4 d5 2.Bf4"),
    ];
    assert_eq!(extract_openings(&blocks), extract_openings(&blocks));
}

#[test]
fn test_zero_castling_line_replays_as_legal() {
    let pairs = parse_line("Two Knights, Modern: 1.e4 e5 2.Nf3 Nc6 3.Bc4 Nf6 4.0-0 Bc5");
    assert_eq!(pairs.len(), 1);

    let normalized = normalize_moves(tokenize_movetext(&pairs[0].1));
    assert!(normalized.is_clean(), "skipped {:?}", normalized.skipped);
    assert_eq!(normalized.coordinates[6], "e1g1");
    assert!(validate_game(&normalized.coordinates).legal);
}

#[test]
fn test_normalizer_preserves_order_and_skips() {
    let normalized = normalize_moves(["e4", "Qh4", "e5", "Nf3"]);
    assert_eq!(normalized.coordinates, vec!["e2e4", "e7e5", "g1f3"]);
    assert_eq!(normalized.skipped, vec!["Qh4"]);
}

#[test]
fn test_validator_reports_promotion_and_castling_forms() {
    let castle = validate_game([
        "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "e1g1",
    ]);
    assert!(castle.legal);

    let promotion = validate_game([
        "e2e4", "d7d5", "e4d5", "c7c6", "d5c6", "g8f6", "c6b7", "b8d7", "b7a8q",
    ]);
    assert!(promotion.legal);

    let normalized = normalize_moves(tokenize_movetext(
        "1.e4 d5 2.exd5 c6 3.dxc6 Nf6 4.cxb7 Nbd7 5.bxa8=Q",
    ));
    assert_eq!(normalized.coordinates.last().map(String::as_str), Some("b7a8q"));

    let unpromoted = validate_game([
        "e2e4", "d7d5", "e4d5", "c7c6", "d5c6", "g8f6", "c6b7", "b8d7", "b7a8",
    ]);
    assert_eq!(unpromoted.illegal_moves, vec!["b7a8"]);

    let record = validate_game_with(["e2e4", "e7e5", "e1g1", "d7d5"], ValidationMode::FirstIllegal);
    assert!(!record.legal);
    assert_eq!(record.illegal_moves, vec!["e1g1"]);
    assert_eq!(record.moves.len(), 4);
}

#[test]
fn test_parse_line_examples() {
    assert_eq!(
        parse_line("King's Gambit 1.e4 e5 2.f4"),
        vec![(Some("King's Gambit".to_string()), "1.e4 e5 2.f4".to_string())]
    );
    assert_eq!(
        parse_line("Andersen, Polish Gambit: 1.a3 a5 2.b4"),
        vec![(
            Some("Andersen, Polish Gambit".to_string()),
            "1.a3 a5 2.b4".to_string()
        )]
    );
}

#[test]
fn test_pgn_games_flow_through_normalizer_and_validator() {
    let pgn = r#"[Event "Club"]
[WhiteElo "1800"]
[BlackElo "x"]

1. d4 d5 2. c4 e6 3. Nc3 Nf6 1/2-1/2

[Event "Broken"]

1. e4 e5 2. Ke3 *
"#;

    let games = read_pgn_games(pgn.as_bytes(), ValidationMode::default());
    assert_eq!(games.len(), 2);

    let club = &games[0];
    assert_eq!(club.white_elo, Some(1800));
    assert_eq!(club.black_elo, None);
    assert!(club.record.legal);
    assert_eq!(club.record.moves, vec!["d2d4", "d7d5", "c2c4", "e7e6", "b1c3", "g8f6"]);
    assert!(club.parse_error.as_deref().unwrap().contains("BlackElo='x'"));

    let broken = &games[1];
    assert_eq!(broken.skipped, vec!["Ke3"]);
    assert_eq!(broken.record.moves, vec!["e2e4", "e7e5"]);
    assert!(broken.record.legal);
}
