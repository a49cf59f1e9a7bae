//! `read_openings(path)`: one row per opening entry found in a JSON block file.

use super::{
    document::read_openings_file,
    log,
    notation::{normalize_moves, tokenize_movetext},
    types::OpeningEntry,
};
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use serde_json::Value;
use std::error::Error;
use std::ffi::CString;
use std::path::PathBuf;
use std::sync::Mutex;

const PATH_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;

const READ_OPENINGS_COLUMNS: [&str; 5] = ["name", "eco", "moves", "uci", "skipped_moves"];

/// An extracted entry plus its coordinate form.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpeningRow {
    name: Option<String>,
    eco: Option<String>,
    moves: String,
    uci: String,
    skipped_moves: String,
}

impl From<OpeningEntry> for OpeningRow {
    fn from(entry: OpeningEntry) -> Self {
        let normalized = normalize_moves(tokenize_movetext(&entry.moves));
        Self {
            name: entry.name,
            eco: entry.classification.map(|c| c.to_string()),
            uci: normalized.coordinates.join(" "),
            skipped_moves: Value::from(normalized.skipped).to_string(),
            moves: entry.moves,
        }
    }
}

pub struct ReadOpeningsBindData {
    rows: Vec<OpeningRow>,
}

pub struct ReadOpeningsInitData {
    next_row: Mutex<usize>,
}

pub struct ReadOpeningsVTab;

fn load_rows(path: PathBuf) -> Result<Vec<OpeningRow>, Box<dyn Error>> {
    match read_openings_file(&path) {
        Ok(entries) => Ok(entries.into_iter().map(OpeningRow::from).collect()),
        Err(e) => {
            log::error(e.to_string());
            Err(e.into())
        }
    }
}

fn write_text(
    output: &mut DataChunkHandle,
    column: usize,
    row_idx: usize,
    value: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut vector = output.flat_vector(column);
    match value {
        Some(value) => vector.insert(row_idx, CString::new(value.replace('\0', " "))?),
        None => vector.set_null(row_idx),
    }
    Ok(())
}

impl VTab for ReadOpeningsVTab {
    type InitData = ReadOpeningsInitData;
    type BindData = ReadOpeningsBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let path = PathBuf::from(bind.get_parameter(PATH_PARAM_INDEX).to_string());
        let rows = load_rows(path)?;

        for name in READ_OPENINGS_COLUMNS {
            bind.add_result_column(name, LogicalTypeHandle::from(LogicalTypeId::Varchar));
        }

        Ok(ReadOpeningsBindData { rows })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(ReadOpeningsInitData {
            next_row: Mutex::new(0),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        let rows = &func.get_bind_data().rows;
        let range = {
            let mut next_row = func
                .get_init_data()
                .next_row
                .lock()
                .map_err(|_| "read_openings cursor lock poisoned")?;
            let start = *next_row;
            let end = rows.len().min(start + ROWS_PER_CHUNK);
            *next_row = end;
            start..end
        };

        let mut count = 0;
        for row in &rows[range] {
            write_text(output, 0, count, row.name.as_deref())?;
            write_text(output, 1, count, row.eco.as_deref())?;
            write_text(output, 2, count, Some(&row.moves))?;
            write_text(output, 3, count, Some(&row.uci))?;
            write_text(output, 4, count, Some(&row.skipped_moves))?;
            count += 1;
        }

        output.set_len(count);
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)])
    }
}
