//! Stable C ABI surface over `syncml_dbapi::Engine`.
//!
//! Grounded on `DLL_interface.cpp`'s `ConnectModule`/`ConnectFunctions`/
//! `DisconnectModule` entry points and `dbapi.h`'s `TDB_Api_Config`/
//! `TDB_Api_Session`/`TDB_Api` nesting, reshaped into a flat function
//! list a non-Rust host can call directly instead of walking a C++
//! vtable. Every function returns a signed status (`0` = OK) per
//! `spec.md` §6/§7; opaque context handles are plain `u64`s, matching
//! the untyped-`CContext` feel of the original ABI (see `ids.rs`).
//!
//! Status codes here are a fresh, locally-defined scheme, not the
//! historical `LOCERR_*` numeric constants -- the retrieved
//! `original_source` pack never includes the header that assigns those
//! values (see DESIGN.md, Open Question 1), so reusing a guessed
//! numbering would be worse than naming a new one honestly.

use std::ffi::{c_char, CStr, CString};
use std::sync::OnceLock;

use syncml_dbapi::error::Error;
use syncml_dbapi::plugin::ReadOutcome;
use syncml_dbapi::Engine;

pub const SYNCML_OK: i32 = 0;
pub const SYNCML_NOT_FOUND: i32 = 1;
pub const SYNCML_FORBIDDEN: i32 = 2;
pub const SYNCML_FATAL: i32 = 3;
pub const SYNCML_ERROR: i32 = 4;
pub const SYNCML_FULL: i32 = 5;
pub const SYNCML_TOO_OLD: i32 = 6;
pub const SYNCML_NOT_IMPLEMENTED: i32 = 7;
pub const SYNCML_ALREADY: i32 = 8;
pub const SYNCML_DATA_MERGED: i32 = 9;
pub const SYNCML_DATA_REPLACED: i32 = 10;
pub const SYNCML_CONFLICT: i32 = 11;
pub const SYNCML_EOF: i32 = 12;
/// Not a `spec.md` §7 status: reserved for a caller-side contract
/// violation (a null pointer, invalid UTF-8) caught at the ABI boundary
/// itself, before any engine call is made.
pub const SYNCML_INVALID_ARGUMENT: i32 = -1;

fn status_of(err: &Error) -> i32 {
    match err {
        Error::NotFound => SYNCML_NOT_FOUND,
        Error::Forbidden => SYNCML_FORBIDDEN,
        Error::Fatal(_) => SYNCML_FATAL,
        Error::Generic(_) | Error::Io(_) | Error::Loader(_) | Error::Config(_) => SYNCML_ERROR,
        Error::Full => SYNCML_FULL,
        Error::TooOld => SYNCML_TOO_OLD,
        Error::NotImplemented => SYNCML_NOT_IMPLEMENTED,
        Error::Already => SYNCML_ALREADY,
        Error::DataMerged => SYNCML_DATA_MERGED,
        Error::DataReplaced => SYNCML_DATA_REPLACED,
        Error::Conflict => SYNCML_CONFLICT,
    }
}

static ENGINE: OnceLock<Engine> = OnceLock::new();

fn engine() -> Result<&'static Engine, i32> {
    ENGINE.get().ok_or(SYNCML_FATAL)
}

unsafe fn cstr_in<'a>(ptr: *const c_char) -> Result<&'a str, i32> {
    if ptr.is_null() {
        return Err(SYNCML_INVALID_ARGUMENT);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| SYNCML_INVALID_ARGUMENT)
}

fn cstr_out(value: &str) -> *mut c_char {
    CString::new(value).map(CString::into_raw).unwrap_or(std::ptr::null_mut())
}

/// Initializes the process-wide engine from a module configuration file
/// (`modules.toml`/`.yaml`/`.json`) and blocks loading every configured
/// module. Must be called exactly once before any other function.
#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_init(config_path: *const c_char) -> i32 {
    let path = match unsafe { cstr_in(config_path) } {
        Ok(p) => p,
        Err(status) => return status,
    };
    let engine = match Engine::from_config_path(path) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("syncml_ffi_init: failed to load module config '{path}': {e}");
            return status_of(&e);
        }
    };
    engine.load_modules();
    if ENGINE.set(engine).is_err() {
        log::warn!("syncml_ffi_init called more than once; ignoring repeat call");
        return SYNCML_ALREADY;
    }
    log::info!("syncml_ffi_init: engine initialized from '{path}'");
    SYNCML_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_create_module(name: *const c_char, out_handle: *mut u64) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    let name = match unsafe { cstr_in(name) } {
        Ok(n) => n,
        Err(status) => return status,
    };
    match engine.create_module(name) {
        Ok(id) => {
            unsafe { *out_handle = id.as_raw() };
            SYNCML_OK
        }
        Err(e) => status_of(&e),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_delete_module(_handle: u64) -> i32 {
    // Module handles are not individually addressable for deletion
    // through this facade without a typed-handle lookup table; the
    // engine tears modules down when the process exits. A future
    // revision can add a handle registry if an embedder needs to
    // unload a module mid-process.
    SYNCML_NOT_IMPLEMENTED
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_create_datastore(
    module_handle: u64,
    datastore_name: *const c_char,
    device_key: *const c_char,
    user_key: *const c_char,
    admin_mode: i32,
    out_handle: *mut u64,
) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    let datastore_name = match unsafe { cstr_in(datastore_name) } {
        Ok(n) => n,
        Err(status) => return status,
    };
    let device_key = match unsafe { cstr_in(device_key) } {
        Ok(n) => n,
        Err(status) => return status,
    };
    let user_key = match unsafe { cstr_in(user_key) } {
        Ok(n) => n,
        Err(status) => return status,
    };
    let module = syncml_dbapi::ids::ModuleContext::from_raw(module_handle);
    match engine.create_datastore(module, datastore_name, device_key, user_key, admin_mode != 0) {
        Ok(id) => {
            unsafe { *out_handle = id.as_raw() };
            SYNCML_OK
        }
        Err(e) => status_of(&e),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_close_datastore(handle: u64) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    let id = syncml_dbapi::ids::DatastoreContext::from_raw(handle);
    match engine.close_datastore(id) {
        Ok(()) => SYNCML_OK,
        Err(e) => status_of(&e),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_start_data_write(handle: u64) -> i32 {
    with_datastore(handle, |ds| ds.start_data_write())
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_insert_item(
    handle: u64,
    data: *const u8,
    data_len: usize,
    out_local_id: *mut *mut c_char,
) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    if data.is_null() && data_len != 0 {
        return SYNCML_INVALID_ARGUMENT;
    }
    let bytes: &[u8] = if data_len == 0 { &[] } else { unsafe { std::slice::from_raw_parts(data, data_len) } };
    let ds = match engine.datastore(syncml_dbapi::ids::DatastoreContext::from_raw(handle)) {
        Some(ds) => ds,
        None => return SYNCML_NOT_FOUND,
    };
    match ds.insert_item(bytes) {
        Ok(id) => {
            unsafe { *out_local_id = cstr_out(&id) };
            SYNCML_OK
        }
        Err(e) => status_of(&e),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_end_data_write(handle: u64, success: i32, out_token: *mut *mut c_char) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    let ds = match engine.datastore(syncml_dbapi::ids::DatastoreContext::from_raw(handle)) {
        Some(ds) => ds,
        None => return SYNCML_NOT_FOUND,
    };
    match ds.end_data_write(success != 0) {
        Ok(token) => {
            unsafe { *out_token = cstr_out(token.as_str()) };
            SYNCML_OK
        }
        Err(e) => status_of(&e),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_start_data_read(
    handle: u64,
    last_token: *const c_char,
    resume_token: *const c_char,
) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    let last_token = match unsafe { cstr_in(last_token) } {
        Ok(s) => s,
        Err(status) => return status,
    };
    let resume_token = match unsafe { cstr_in(resume_token) } {
        Ok(s) => s,
        Err(status) => return status,
    };
    let ds = match engine.datastore(syncml_dbapi::ids::DatastoreContext::from_raw(handle)) {
        Some(ds) => ds,
        None => return SYNCML_NOT_FOUND,
    };
    let last = syncml_dbapi::datastore::Token::new(last_token);
    let resume = syncml_dbapi::datastore::Token::new(resume_token);
    match ds.start_data_read(&last, &resume) {
        Ok(()) => SYNCML_OK,
        Err(e) => status_of(&e),
    }
}

/// One `ReadNextItem` result. `status` is `SYNCML_OK` for a returned
/// item, `SYNCML_EOF` at end of set, or an error status; only on
/// `SYNCML_OK` are the remaining fields populated and owned by the
/// caller, to be released via `syncml_ffi_dispose_read_result`.
#[repr(C)]
pub struct SyncmlReadResult {
    pub status: i32,
    pub local_id: *mut c_char,
    pub token: *mut c_char,
    pub changed: i32,
    pub resumed: i32,
    pub data: *mut u8,
    pub data_len: usize,
}

impl SyncmlReadResult {
    fn error(status: i32) -> Self {
        Self {
            status,
            local_id: std::ptr::null_mut(),
            token: std::ptr::null_mut(),
            changed: 0,
            resumed: 0,
            data: std::ptr::null_mut(),
            data_len: 0,
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_read_next_item(handle: u64) -> SyncmlReadResult {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return SyncmlReadResult::error(status),
    };
    let ds = match engine.datastore(syncml_dbapi::ids::DatastoreContext::from_raw(handle)) {
        Some(ds) => ds,
        None => return SyncmlReadResult::error(SYNCML_NOT_FOUND),
    };
    match ds.read_next_item() {
        Ok(ReadOutcome::Eof) => SyncmlReadResult::error(SYNCML_EOF),
        Ok(ReadOutcome::Item { local_id, token, changed, resumed, data }) => {
            let mut boxed = data.into_boxed_slice();
            let data_len = boxed.len();
            let data_ptr = boxed.as_mut_ptr();
            std::mem::forget(boxed);
            SyncmlReadResult {
                status: SYNCML_OK,
                local_id: cstr_out(&local_id),
                token: cstr_out(token.as_str()),
                changed: changed as i32,
                resumed: resumed as i32,
                data: data_ptr,
                data_len,
            }
        }
        Err(e) => SyncmlReadResult::error(status_of(&e)),
    }
}

/// Releases the buffers owned by a `SyncmlReadResult`, mirroring the
/// `DisposeObj` contract in `spec.md` §4.E/§6: every buffer this ABI
/// hands back must be freed exactly once through this function rather
/// than the caller's own allocator.
#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_dispose_read_result(result: SyncmlReadResult) {
    unsafe {
        if !result.local_id.is_null() {
            drop(CString::from_raw(result.local_id));
        }
        if !result.token.is_null() {
            drop(CString::from_raw(result.token));
        }
        if !result.data.is_null() {
            drop(Box::from_raw(std::slice::from_raw_parts_mut(result.data, result.data_len)));
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_end_data_read(handle: u64) -> i32 {
    with_datastore(handle, |ds| ds.end_data_read())
}

/// Releases a bare string this ABI returned (e.g. `out_local_id`,
/// `out_token`), matching `spec.md` §6's `DisposeObj` contract for
/// standalone strings that are not part of a `SyncmlReadResult`.
#[unsafe(no_mangle)]
pub extern "C" fn syncml_ffi_dispose_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe { drop(CString::from_raw(ptr)) };
    }
}

fn with_datastore(handle: u64, f: impl FnOnce(&syncml_dbapi::context::DatastoreHandle) -> syncml_dbapi::Result<()>) -> i32 {
    let engine = match engine() {
        Ok(e) => e,
        Err(status) => return status,
    };
    let ds = match engine.datastore(syncml_dbapi::ids::DatastoreContext::from_raw(handle)) {
        Some(ds) => ds,
        None => return SYNCML_NOT_FOUND,
    };
    match f(&ds) {
        Ok(()) => SYNCML_OK,
        Err(e) => status_of(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_of_maps_every_variant_to_a_distinct_nonzero_code() {
        assert_eq!(status_of(&Error::NotFound), SYNCML_NOT_FOUND);
        assert_eq!(status_of(&Error::TooOld), SYNCML_TOO_OLD);
        assert_eq!(status_of(&Error::Conflict), SYNCML_CONFLICT);
    }

    #[test]
    fn cstr_in_rejects_null() {
        assert_eq!(unsafe { cstr_in(std::ptr::null()) }, Err(SYNCML_INVALID_ARGUMENT));
    }
}
