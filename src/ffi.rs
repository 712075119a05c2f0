// Thin `extern "C"` wrappers around the pure-Rust
// `Parser` API. Every entry point null-checks the handle and marshals
// `(ptr, len)` pairs; ownership of every returned pointer stays with the
// Parser until destruction or the next parse call.

use std::ffi::CString;
use std::os::raw::c_char;
use std::slice;

use crate::packed;
use crate::parser::Parser;

/// Opaque handle a foreign host carries around; never dereferenced by the
/// caller, only passed back into this module's functions.
pub struct FfiParser {
    inner: Parser,
    parallel: bool,
    thread_count: i32,
    /// Backing storage for the last `const char*` returned by
    /// `get_field`/`get_error_message`/`rows_to_json`, so the pointer
    /// stays valid until the next call that replaces it.
    last_cstrings: Vec<CString>,
}

fn as_parser<'a>(handle: *mut FfiParser) -> Option<&'a mut FfiParser> {
    if handle.is_null() {
        None
    } else {
        Some(unsafe { &mut *handle })
    }
}

#[no_mangle]
pub extern "C" fn parser_create() -> *mut FfiParser {
    Box::into_raw(Box::new(FfiParser {
        inner: Parser::new(),
        parallel: false,
        thread_count: 0,
        last_cstrings: Vec::new(),
    }))
}

#[no_mangle]
pub extern "C" fn parser_create_parallel() -> *mut FfiParser {
    let mut p = parser_create();
    if let Some(fp) = as_parser(p) {
        fp.parallel = true;
    } else {
        p = std::ptr::null_mut();
    }
    p
}

#[no_mangle]
pub extern "C" fn parser_destroy(handle: *mut FfiParser) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

#[no_mangle]
pub extern "C" fn set_thread_count(handle: *mut FfiParser, count: i32) -> i32 {
    match as_parser(handle) {
        Some(p) => {
            p.thread_count = count;
            0
        }
        None => -1,
    }
}

/// # Safety
/// `ptr` must point to at least `len` readable bytes, or be null when
/// `len == 0`.
#[no_mangle]
pub unsafe extern "C" fn parse_string(handle: *mut FfiParser, ptr: *const c_char, len: i32) -> i32 {
    let Some(fp) = as_parser(handle) else { return -1 };
    if len < 0 || (ptr.is_null() && len != 0) {
        return -1;
    }
    let input: &[u8] = if len == 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr as *const u8, len as usize)
    };

    let ok = if fp.parallel && input.len() >= crate::parallel::MIN_FILE_SIZE {
        let config = fp.inner.config.clone();
        let (merged, ok) = crate::parallel::parse_parallel(input, config);
        fp.inner = merged;
        ok
    } else {
        fp.inner.parse_auto(input)
    };

    if ok {
        0
    } else {
        -1
    }
}

#[no_mangle]
pub extern "C" fn get_row_count(handle: *mut FfiParser) -> i32 {
    match as_parser(handle) {
        Some(p) => p.inner.row_count() as i32,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn get_field_count(handle: *mut FfiParser, row: i32) -> i32 {
    match as_parser(handle) {
        Some(p) if row >= 0 => p
            .inner
            .field_count(row as usize)
            .map(|c| c as i32)
            .unwrap_or(-1),
        _ => -1,
    }
}

#[no_mangle]
pub extern "C" fn get_field(handle: *mut FfiParser, row: i32, field: i32) -> *const c_char {
    let Some(p) = as_parser(handle) else { return std::ptr::null() };
    if row < 0 || field < 0 {
        return std::ptr::null();
    }
    let Some(bytes) = p.inner.field(row as usize, field as usize) else {
        return std::ptr::null();
    };
    let Ok(cstring) = CString::new(bytes) else {
        return std::ptr::null();
    };
    let ptr = cstring.as_ptr();
    p.last_cstrings.push(cstring);
    ptr
}

macro_rules! byte_setter {
    ($name:ident, $field:ident) => {
        #[no_mangle]
        pub extern "C" fn $name(handle: *mut FfiParser, value: u8) -> i32 {
            match as_parser(handle) {
                Some(p) => {
                    let mut cfg = p.inner.config.clone();
                    cfg.$field = value;
                    match cfg.validate() {
                        Ok(()) => {
                            p.inner.config = cfg;
                            0
                        }
                        Err(_) => -1,
                    }
                }
                None => -1,
            }
        }
    };
}

macro_rules! bool_setter {
    ($name:ident, $field:ident) => {
        #[no_mangle]
        pub extern "C" fn $name(handle: *mut FfiParser, value: bool) -> i32 {
            match as_parser(handle) {
                Some(p) => {
                    p.inner.config.$field = value;
                    0
                }
                None => -1,
            }
        }
    };
}

macro_rules! int_setter {
    ($name:ident, $field:ident) => {
        #[no_mangle]
        pub extern "C" fn $name(handle: *mut FfiParser, value: i32) -> i32 {
            match as_parser(handle) {
                Some(p) => {
                    let mut cfg = p.inner.config.clone();
                    cfg.$field = value as i64;
                    match cfg.validate() {
                        Ok(()) => {
                            p.inner.config = cfg;
                            0
                        }
                        Err(_) => -1,
                    }
                }
                None => -1,
            }
        }
    };
}

byte_setter!(set_delimiter, delimiter);
byte_setter!(set_quote, quote);
byte_setter!(set_escape, escape);
byte_setter!(set_comment, comment);

bool_setter!(set_skip_empty_lines, skip_empty_lines);
bool_setter!(set_trim, trim);
bool_setter!(set_relaxed, relaxed);
bool_setter!(set_skip_lines_with_error, skip_lines_with_error);

int_setter!(set_max_row_size, max_row_size);
int_setter!(set_from_line, from_line);
int_setter!(set_to_line, to_line);

#[no_mangle]
pub extern "C" fn has_error(handle: *mut FfiParser) -> bool {
    match as_parser(handle) {
        Some(p) => p.inner.has_error(),
        None => false,
    }
}

#[no_mangle]
pub extern "C" fn get_error_code(handle: *mut FfiParser) -> i32 {
    match as_parser(handle) {
        Some(p) => p.inner.last_error().code as i32,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn get_error_line(handle: *mut FfiParser) -> i32 {
    match as_parser(handle) {
        Some(p) => p.inner.last_error().line as i32,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn get_error_column(handle: *mut FfiParser) -> i32 {
    match as_parser(handle) {
        Some(p) => p.inner.last_error().column as i32,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn get_error_message(handle: *mut FfiParser) -> *const c_char {
    let Some(p) = as_parser(handle) else { return std::ptr::null() };
    let Ok(cstring) = CString::new(p.inner.last_error().message.clone()) else {
        return std::ptr::null();
    };
    let ptr = cstring.as_ptr();
    p.last_cstrings.push(cstring);
    ptr
}

#[no_mangle]
pub extern "C" fn get_error_count(handle: *mut FfiParser) -> i32 {
    match as_parser(handle) {
        Some(p) => p.inner.error_count() as i32,
        None => -1,
    }
}

/// # Safety
/// `out_size` must point to a writable `i32` (or be null, in which case
/// the size is not reported back).
#[no_mangle]
pub unsafe extern "C" fn rows_to_packed_buffer(handle: *mut FfiParser, out_size: *mut i32) -> *const u8 {
    let Some(p) = as_parser(handle) else { return std::ptr::null() };
    let buf = packed::pack(&mut p.inner);
    if !out_size.is_null() {
        *out_size = buf.len() as i32;
    }
    let ptr = buf.as_ptr();
    p.inner.set_packed_buffer(buf);
    if p.inner.packed_buffer().is_empty() {
        std::ptr::null()
    } else {
        ptr
    }
}

#[no_mangle]
pub extern "C" fn rows_to_json(handle: *mut FfiParser) -> *const c_char {
    let Some(p) = as_parser(handle) else { return std::ptr::null() };
    let json = rows_to_json_string(p.inner.all_rows());
    let Ok(cstring) = CString::new(json) else {
        return std::ptr::null();
    };
    let ptr = cstring.as_ptr();
    p.last_cstrings.push(cstring);
    ptr
}

fn rows_to_json_string(rows: &[Vec<Vec<u8>>]) -> String {
    let mut out = String::from("[");
    for (ri, row) in rows.iter().enumerate() {
        if ri > 0 {
            out.push(',');
        }
        out.push('[');
        for (fi, field) in row.iter().enumerate() {
            if fi > 0 {
                out.push(',');
            }
            out.push('"');
            for &b in field {
                match b {
                    b'"' => out.push_str("\\\""),
                    b'\\' => out.push_str("\\\\"),
                    b'\n' => out.push_str("\\n"),
                    b'\r' => out.push_str("\\r"),
                    _ => out.push(b as char),
                }
            }
            out.push('"');
        }
        out.push(']');
    }
    out.push(']');
    out
}
