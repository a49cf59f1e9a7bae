use super::{
    ffi::bind_info_ffi::get_named_parameter_varchar,
    error::ErrorAccumulator,
    log,
    types::PgnGame,
    validate::ValidationMode,
    visitor::{GameVisitor, reader_error_message},
};
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use pgn_reader::Reader;
use serde_json::Value;
use std::borrow::Cow;
use std::error::Error;
use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use zstd::stream::read::Decoder as ZstdDecoder;

pub(crate) type PgnInput = Box<dyn Read + Send>;

/// One open PGN stream and the visitor parsing it.
pub(crate) struct PgnReaderState {
    pgn_reader: Reader<PgnInput>,
    visitor: GameVisitor,
    path_idx: usize,
    next_game_index: usize,
    record_buffer: PgnGame,
    /// Set after a reader error; the stream is not read again.
    failed: bool,
}

impl PgnReaderState {
    fn new(input: PgnInput, path_idx: usize, mode: ValidationMode) -> Self {
        Self {
            pgn_reader: Reader::new(input),
            visitor: GameVisitor::new(mode),
            path_idx,
            next_game_index: 1,
            record_buffer: PgnGame::default(),
            failed: false,
        }
    }
}

/// Work queue shared by all threads scanning one `read_pgn` call. Readers are
/// parked here between chunks so a file is never read by two threads at once.
pub(crate) struct SharedState {
    next_path_idx: usize,
    available_readers: Vec<PgnReaderState>,
}

pub struct ReadPgnBindData {
    paths: Vec<PathBuf>,
    compression: CompressionMode,
    validation: ValidationMode,
}

pub struct ReadPgnInitData {
    state: Mutex<SharedState>,
}

impl ReadPgnInitData {
    fn lock(&self) -> Result<MutexGuard<'_, SharedState>, Box<dyn Error>> {
        self.state
            .lock()
            .map_err(|_| "read_pgn scan state lock poisoned".into())
    }
}

pub struct ReadPgnVTab;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;
const READ_PGN_COLUMN_COUNT: usize = 15;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadPgnColumn {
    Event = 0,
    Site = 1,
    Date = 2,
    White = 3,
    Black = 4,
    WhiteElo = 5,
    BlackElo = 6,
    Eco = 7,
    Opening = 8,
    Result = 9,
    Moves = 10,
    Legal = 11,
    IllegalMoves = 12,
    SkippedMoves = 13,
    ParseError = 14,
}

impl ReadPgnColumn {
    const fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        READ_PGN_COLUMNS[self.index()].name
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadPgnLogicalType {
    Varchar,
    UInteger,
    Boolean,
}

impl ReadPgnLogicalType {
    fn to_handle(self) -> LogicalTypeHandle {
        match self {
            Self::Varchar => LogicalTypeHandle::from(LogicalTypeId::Varchar),
            Self::UInteger => LogicalTypeHandle::from(LogicalTypeId::UInteger),
            Self::Boolean => LogicalTypeHandle::from(LogicalTypeId::Boolean),
        }
    }
}

struct ReadPgnColumnDef {
    name: &'static str,
    logical_type: ReadPgnLogicalType,
}

const fn column(name: &'static str, logical_type: ReadPgnLogicalType) -> ReadPgnColumnDef {
    ReadPgnColumnDef { name, logical_type }
}

const READ_PGN_COLUMNS: [ReadPgnColumnDef; READ_PGN_COLUMN_COUNT] = [
    column("Event", ReadPgnLogicalType::Varchar),
    column("Site", ReadPgnLogicalType::Varchar),
    column("Date", ReadPgnLogicalType::Varchar),
    column("White", ReadPgnLogicalType::Varchar),
    column("Black", ReadPgnLogicalType::Varchar),
    column("WhiteElo", ReadPgnLogicalType::UInteger),
    column("BlackElo", ReadPgnLogicalType::UInteger),
    column("ECO", ReadPgnLogicalType::Varchar),
    column("Opening", ReadPgnLogicalType::Varchar),
    column("Result", ReadPgnLogicalType::Varchar),
    column("moves", ReadPgnLogicalType::Varchar),
    column("legal", ReadPgnLogicalType::Boolean),
    column("illegal_moves", ReadPgnLogicalType::Varchar),
    column("skipped_moves", ReadPgnLogicalType::Varchar),
    column("parse_error", ReadPgnLogicalType::Varchar),
];

impl CompressionMode {
    fn parse(raw: &str) -> Result<Self, Box<dyn Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{normalized}'. Supported values: 'zstd' or NULL/omitted."
            )
            .into())
        }
    }
}

fn resolve_compression_mode(bind: &BindInfo) -> Result<CompressionMode, Box<dyn Error>> {
    match get_named_parameter_varchar(bind, "compression")?.into_setting() {
        None => Ok(CompressionMode::Plain),
        Some(raw) => CompressionMode::parse(&raw),
    }
}

fn resolve_validation_mode(bind: &BindInfo) -> Result<ValidationMode, Box<dyn Error>> {
    match get_named_parameter_varchar(bind, "validation")?.into_setting() {
        None => Ok(ValidationMode::default()),
        Some(raw) => Ok(ValidationMode::parse(&raw)?),
    }
}

/// A single path, or every match of a glob pattern in glob order.
fn expand_paths(pattern: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if pattern.contains(['*', '?', '[']) {
        Ok(glob::glob(pattern)?.filter_map(|entry| entry.ok()).collect())
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<PgnInput, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    // pgn-reader buffers internally, so plain files go in unwrapped.
    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|e| {
                format!(
                    "Failed to initialize zstd decoder for '{}': {}",
                    path.display(),
                    e
                )
            }),
    }
}

fn sanitize_for_cstring<'a>(
    value: &'a str,
    field_name: &str,
    parse_error: &mut ErrorAccumulator,
) -> Cow<'a, str> {
    if value.contains('\0') {
        parse_error.push(&format!("Sanitized interior NUL in {field_name}"));
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn json_string_array(items: &[String]) -> String {
    Value::from(items).to_string()
}

enum ReadNextGameOutcome {
    GameReady,
    ReaderFinished,
}

struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle) -> Self {
        Self {
            output,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    fn write_row(&mut self, game: &PgnGame) -> Result<(), Box<dyn Error>> {
        let row_idx = self.row_count;
        let mut row_parse_error = ErrorAccumulator::default();
        if let Some(parse_error) = game.parse_error.as_deref() {
            row_parse_error.push(parse_error);
        }

        let headers = [
            (ReadPgnColumn::Event, game.event.as_deref()),
            (ReadPgnColumn::Site, game.site.as_deref()),
            (ReadPgnColumn::Date, game.date.as_deref()),
            (ReadPgnColumn::White, game.white.as_deref()),
            (ReadPgnColumn::Black, game.black.as_deref()),
            (ReadPgnColumn::Eco, game.eco.as_deref()),
            (ReadPgnColumn::Opening, game.opening.as_deref()),
            (ReadPgnColumn::Result, game.result.as_deref()),
        ];
        for (column, value) in headers {
            self.write_optional_varchar(column, row_idx, value, &mut row_parse_error)?;
        }
        self.write_optional_uinteger(ReadPgnColumn::WhiteElo, row_idx, game.white_elo);
        self.write_optional_uinteger(ReadPgnColumn::BlackElo, row_idx, game.black_elo);

        let moves = game.record.moves.join(" ");
        self.write_optional_varchar(
            ReadPgnColumn::Moves,
            row_idx,
            Some(&moves),
            &mut row_parse_error,
        )?;
        self.output
            .flat_vector(ReadPgnColumn::Legal.index())
            .as_mut_slice::<bool>()[row_idx] = game.record.legal;

        let illegal = json_string_array(&game.record.illegal_moves);
        let skipped = json_string_array(&game.skipped);
        self.write_optional_varchar(
            ReadPgnColumn::IllegalMoves,
            row_idx,
            Some(&illegal),
            &mut row_parse_error,
        )?;
        self.write_optional_varchar(
            ReadPgnColumn::SkippedMoves,
            row_idx,
            Some(&skipped),
            &mut row_parse_error,
        )?;

        let mut parse_error_vec = self.output.flat_vector(ReadPgnColumn::ParseError.index());
        match row_parse_error.take() {
            None => parse_error_vec.set_null(row_idx),
            Some(parse_error) => {
                parse_error_vec.insert(row_idx, CString::new(parse_error.replace('\0', " "))?)
            }
        }

        self.row_count += 1;
        Ok(())
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }

    fn write_optional_varchar(
        &mut self,
        column: ReadPgnColumn,
        row_idx: usize,
        value: Option<&str>,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn Error>> {
        let mut vector = self.output.flat_vector(column.index());
        if let Some(value) = value {
            let sanitized = sanitize_for_cstring(value, column.name(), parse_error);
            vector.insert(row_idx, CString::new(sanitized.as_ref())?);
        } else {
            vector.set_null(row_idx);
        }
        Ok(())
    }

    fn write_optional_uinteger(&mut self, column: ReadPgnColumn, row_idx: usize, value: Option<u32>) {
        let mut vector = self.output.flat_vector(column.index());
        if let Some(value) = value {
            vector.as_mut_slice::<u32>()[row_idx] = value;
        } else {
            vector.set_null(row_idx);
        }
    }
}

fn acquire_reader(
    init_data: &ReadPgnInitData,
    bind_data: &ReadPgnBindData,
) -> Result<Option<PgnReaderState>, Box<dyn Error>> {
    loop {
        let path_idx = {
            let mut state = init_data.lock()?;

            if let Some(reader) = state.available_readers.pop() {
                return Ok(Some(reader));
            }

            if state.next_path_idx < bind_data.paths.len() {
                let path_idx = state.next_path_idx;
                state.next_path_idx += 1;
                path_idx
            } else {
                return Ok(None);
            }
        };

        let path = &bind_data.paths[path_idx];
        match open_input_stream(path, bind_data.compression) {
            Ok(input_stream) => {
                return Ok(Some(PgnReaderState::new(
                    input_stream,
                    path_idx,
                    bind_data.validation,
                )));
            }
            Err(err_msg) => {
                if bind_data.paths.len() == 1 {
                    return Err(err_msg.into());
                }

                log::warn(&err_msg);
            }
        }
    }
}

fn read_next_game(reader: &mut PgnReaderState, source_path: &Path) -> ReadNextGameOutcome {
    if reader.failed {
        return ReadNextGameOutcome::ReaderFinished;
    }
    let game_index = reader.next_game_index;

    match reader.pgn_reader.read_game(&mut reader.visitor) {
        Ok(Some(())) => reader.next_game_index += 1,
        Ok(None) => return ReadNextGameOutcome::ReaderFinished,
        Err(error) => {
            reader.next_game_index += 1;
            reader.failed = true;
            let error_msg = reader_error_message(game_index, &error);
            log::warn(format!("{error_msg} (file '{}')", source_path.display()));
            reader.visitor.finalize_game_with_error(error_msg);
        }
    }

    match reader.visitor.current_game.take() {
        Some(game) => {
            reader.record_buffer = game;
            ReadNextGameOutcome::GameReady
        }
        None => ReadNextGameOutcome::ReaderFinished,
    }
}

fn finalize_chunk(
    init_data: &ReadPgnInitData,
    current_reader_state: Option<PgnReaderState>,
    chunk_writer: &mut ChunkWriter<'_>,
) -> Result<(), Box<dyn Error>> {
    if let Some(reader) = current_reader_state {
        init_data.lock()?.available_readers.push(reader);
    }

    chunk_writer.set_output_len();
    Ok(())
}

impl VTab for ReadPgnVTab {
    type InitData = ReadPgnInitData;
    type BindData = ReadPgnBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
        let compression = resolve_compression_mode(bind)?;
        let validation = resolve_validation_mode(bind)?;
        let paths = expand_paths(&pattern)?;

        for column in READ_PGN_COLUMNS.iter() {
            bind.add_result_column(column.name, column.logical_type.to_handle());
        }

        Ok(ReadPgnBindData {
            paths,
            compression,
            validation,
        })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ReadPgnInitData {
            state: Mutex::new(SharedState {
                next_path_idx: 0,
                available_readers: Vec::new(),
            }),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        let init_data = func.get_init_data();
        let bind_data = func.get_bind_data();
        let mut chunk_writer = ChunkWriter::new(output);
        let mut current_reader_state: Option<PgnReaderState> = None;

        while !chunk_writer.is_full() {
            if current_reader_state.is_none() {
                current_reader_state = acquire_reader(init_data, bind_data)?;
                if current_reader_state.is_none() {
                    break;
                }
            }

            if let Some(mut reader) = current_reader_state.take() {
                let source_path = &bind_data.paths[reader.path_idx];
                match read_next_game(&mut reader, source_path) {
                    ReadNextGameOutcome::GameReady => {
                        chunk_writer.write_row(&reader.record_buffer)?;
                        current_reader_state = Some(reader);
                    }
                    // Dropped; the next iteration picks up another file.
                    ReadNextGameOutcome::ReaderFinished => {}
                }
            }
        }

        finalize_chunk(init_data, current_reader_state, &mut chunk_writer)
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // path or glob pattern
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            (
                "compression".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
            (
                "validation".to_string(),
                LogicalTypeHandle::from(LogicalTypeId::Varchar),
            ),
        ])
    }
}
