//! Row loops shared by the chess scalar functions.
//!
//! Every chess scalar takes one `VARCHAR` and maps NULL input to NULL output.
//!
//! # Safety
//! These helpers MUST only be called from within a DuckDB scalar `invoke()` while the
//! underlying vectors are valid.

use std::error::Error;
use std::ffi::CString;

use duckdb::{
    core::{DataChunkHandle, FlatVector, Inserter, LogicalTypeId},
    vtab::arrow::WritableVector,
};
use libduckdb_sys::duckdb_string_t;

use super::string::decode_duckdb_string;

fn ensure_type(
    vec: &FlatVector,
    expected: LogicalTypeId,
    label: &str,
) -> Result<(), Box<dyn Error>> {
    let actual = vec.logical_type().id();
    if actual != expected {
        return Err(format!(
            "chess scalar type mismatch: {label} expected {expected:?}, got {actual:?}"
        )
        .into());
    }
    Ok(())
}

/// Calls `f` for each row of the first input column. `f` receives `None` for
/// NULL rows.
fn for_each_varchar_row<F>(input: &DataChunkHandle, mut f: F) -> Result<(), Box<dyn Error>>
where
    F: FnMut(usize, Option<&str>) -> Result<(), Box<dyn Error>>,
{
    let len = input.len();
    let input_vec = input.flat_vector(0);
    ensure_type(&input_vec, LogicalTypeId::Varchar, "input[0]")?;

    for (i, s) in input_vec
        .as_slice::<duckdb_string_t>()
        .iter()
        .take(len)
        .enumerate()
    {
        if input_vec.row_is_null(i as u64) {
            f(i, None)?;
            continue;
        }

        // SAFETY: Row nullability is checked above.
        let val = unsafe { decode_duckdb_string(s) };
        f(i, Some(val.as_ref()))?;
    }

    Ok(())
}

/// Invoke a unary `VARCHAR -> VARCHAR` scalar. `f` returning `None` writes NULL.
pub fn invoke_unary_varchar_to_varchar<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str) -> Result<Option<String>, Box<dyn Error>>,
{
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Varchar, "output")?;

    for_each_varchar_row(input, |i, val| {
        match val.map(&mut f).transpose()?.flatten() {
            Some(v) => output_vec.insert(i, CString::new(v)?),
            None => output_vec.set_null(i),
        }
        Ok(())
    })
}

/// Invoke a unary `VARCHAR -> BOOLEAN` scalar.
pub fn invoke_unary_varchar_to_bool<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str) -> bool,
{
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Boolean, "output")?;

    for_each_varchar_row(input, |i, val| {
        match val {
            Some(s) => output_vec.as_mut_slice::<bool>()[i] = f(s),
            None => output_vec.set_null(i),
        }
        Ok(())
    })
}
