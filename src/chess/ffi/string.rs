use libduckdb_sys::duckdb_string_t;
use std::borrow::Cow;

const INLINE_CAPACITY: usize = 12;

/// Raw bytes of a DuckDB string, inlined or heap-backed.
///
/// # Safety
///
/// `s` must be a non-NULL row of a live `VARCHAR` vector; heap-backed strings
/// are only valid while DuckDB keeps that vector alive.
unsafe fn raw_bytes(s: &duckdb_string_t) -> &[u8] {
    // SAFETY: both union variants start with the length field.
    let len = unsafe { s.value.inlined.length } as usize;
    if len == 0 {
        return &[];
    }

    if len <= INLINE_CAPACITY {
        // SAFETY: short strings keep their `len` bytes inline.
        let inlined = unsafe { &s.value.inlined.inlined };
        // SAFETY: `inlined` holds at least `len` initialized bytes.
        unsafe { std::slice::from_raw_parts(inlined.as_ptr() as *const u8, len) }
    } else {
        // SAFETY: long strings use the pointer variant.
        let ptr = unsafe { s.value.pointer.ptr };
        // SAFETY: DuckDB guarantees `ptr` references `len` bytes for this row.
        unsafe { std::slice::from_raw_parts(ptr as *const u8, len) }
    }
}

/// Decode a DuckDB string value, borrowing when it is valid UTF-8.
///
/// # Safety
///
/// Same contract as the vector row it comes from: the row must be non-NULL
/// and the vector alive for the lifetime of the returned value. Callers
/// perform row null checks first.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> Cow<'_, str> {
    // SAFETY: forwarded caller contract.
    String::from_utf8_lossy(unsafe { raw_bytes(s) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use libduckdb_sys::{
        duckdb_string_t__bindgen_ty_1, duckdb_string_t__bindgen_ty_1__bindgen_ty_1,
        duckdb_string_t__bindgen_ty_1__bindgen_ty_2,
    };
    use std::os::raw::c_char;

    fn inlined(bytes: &[u8]) -> duckdb_string_t {
        let mut inlined = [0 as c_char; 12];
        for (dst, src) in inlined.iter_mut().zip(bytes.iter().copied()) {
            *dst = src as c_char;
        }

        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                inlined: duckdb_string_t__bindgen_ty_1__bindgen_ty_2 {
                    length: bytes.len() as u32,
                    inlined,
                },
            },
        }
    }

    fn pointer(bytes: &mut [u8]) -> duckdb_string_t {
        let mut prefix = [0 as c_char; 4];
        for (dst, src) in prefix.iter_mut().zip(bytes.iter().copied()) {
            *dst = src as c_char;
        }

        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                pointer: duckdb_string_t__bindgen_ty_1__bindgen_ty_1 {
                    length: bytes.len() as u32,
                    prefix,
                    ptr: bytes.as_mut_ptr() as *mut c_char,
                },
            },
        }
    }

    #[test]
    fn test_decode_inlined_move_list() {
        let input = inlined(b"e2e4 e7e5");
        // SAFETY: fixture is a valid inlined duckdb_string_t.
        let decoded = unsafe { decode_duckdb_string(&input) };
        assert_eq!(decoded, "e2e4 e7e5");
        assert!(matches!(decoded, Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_empty() {
        let input = inlined(b"");
        // SAFETY: fixture is a valid inlined duckdb_string_t.
        assert_eq!(unsafe { decode_duckdb_string(&input) }, "");
    }

    #[test]
    fn test_decode_pointer_movetext() {
        let mut backing = b"1.e4 e5 2.Nf3 Nc6".to_vec();
        let input = pointer(backing.as_mut_slice());
        // SAFETY: backing storage outlives the decoded value.
        let decoded = unsafe { decode_duckdb_string(&input) };
        assert_eq!(decoded, "1.e4 e5 2.Nf3 Nc6");
    }

    #[test]
    fn test_decode_pointer_invalid_utf8_is_lossy() {
        let mut backing = "Réti Opening: 1.Nf3".as_bytes().to_vec();
        backing[1] = 0x80;
        let expected = String::from_utf8_lossy(&backing).into_owned();
        let input = pointer(backing.as_mut_slice());
        // SAFETY: backing storage outlives the decoded value.
        let decoded = unsafe { decode_duckdb_string(&input) };
        assert_eq!(decoded, expected);
        assert!(matches!(decoded, Cow::Owned(_)));
    }
}
