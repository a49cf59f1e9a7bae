use duckdb::vtab::BindInfo;
use libduckdb_sys::{
    duckdb_bind_get_named_parameter, duckdb_bind_info, duckdb_destroy_value, duckdb_free,
    duckdb_get_varchar, duckdb_is_null_value,
};
use std::ffi::{CStr, CString};
use std::os::raw::c_void;

/// A `VARCHAR` named parameter as seen at bind time.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum NamedParameterVarchar {
    Missing,
    Null,
    Value(String),
}

impl NamedParameterVarchar {
    /// Trimmed value, or `None` when omitted, SQL NULL or the literal `'null'`.
    pub(crate) fn into_setting(self) -> Option<String> {
        match self {
            Self::Missing | Self::Null => None,
            Self::Value(raw) => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("null") {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

pub(crate) fn get_named_parameter_varchar(
    bind: &BindInfo,
    name: &str,
) -> Result<NamedParameterVarchar, Box<dyn std::error::Error>> {
    let name_cstr = CString::new(name)?;

    // SAFETY: The returned value is owned by us and destroyed below; `bind_info_ptr`
    // yields the raw handle DuckDB passed to this bind callback.
    let mut value =
        unsafe { duckdb_bind_get_named_parameter(bind_info_ptr(bind), name_cstr.as_ptr()) };
    if value.is_null() {
        return Ok(NamedParameterVarchar::Missing);
    }

    // SAFETY: `value` is a valid `duckdb_value` handle and is not used after destruction.
    let result = unsafe {
        if duckdb_is_null_value(value) {
            Ok(NamedParameterVarchar::Null)
        } else {
            let varchar = duckdb_get_varchar(value);
            if varchar.is_null() {
                Err(format!("Failed to read named parameter '{name}' as VARCHAR").into())
            } else {
                let text = CStr::from_ptr(varchar).to_string_lossy().into_owned();
                duckdb_free(varchar as *mut c_void);
                Ok(NamedParameterVarchar::Value(text))
            }
        }
    };

    // SAFETY: released exactly once.
    unsafe {
        duckdb_destroy_value(&mut value);
    }

    result
}

fn bind_info_ptr(bind: &BindInfo) -> duckdb_bind_info {
    // SAFETY: `duckdb::vtab::BindInfo` wraps a single `duckdb_bind_info` and exposes no raw
    // accessor or NULL-aware named-parameter getter, so we read the handle directly.
    // Re-check the layout of `BindInfo` whenever the duckdb crate is upgraded.
    unsafe { *(bind as *const BindInfo as *const duckdb_bind_info) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_setting_missing_and_null_are_unset() {
        assert_eq!(NamedParameterVarchar::Missing.into_setting(), None);
        assert_eq!(NamedParameterVarchar::Null.into_setting(), None);
        assert_eq!(
            NamedParameterVarchar::Value(" NULL ".to_string()).into_setting(),
            None
        );
    }

    #[test]
    fn test_into_setting_trims_value() {
        assert_eq!(
            NamedParameterVarchar::Value("  first_illegal ".to_string()).into_setting(),
            Some("first_illegal".to_string())
        );
        assert_eq!(
            NamedParameterVarchar::Value("   ".to_string()).into_setting(),
            Some(String::new())
        );
    }
}
