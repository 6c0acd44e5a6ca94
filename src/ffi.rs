//! Native entry points for the managed side.
//!
//! These are the functions rewritten call sites and the stub-authoring layer import from the
//! engine library. They work on the process-wide registry and gate and follow the platform API
//! conventions of the caller:
//!
//! - `extern "system"` (stdcall on 32-bit Windows, the C convention elsewhere)
//! - Win32 `BOOL` results, `0` for false and `1` for true
//! - keys as NUL-terminated UTF-16 strings
//! - stub pointers as native-width addresses
//!
//! | Export | Operation |
//! |---|---|
//! | `StubRegistryTryAdd` | [`StubRegistry::try_add`](crate::StubRegistry::try_add) |
//! | `StubRegistryTryGet` | [`StubRegistry::try_get`](crate::StubRegistry::try_get) |
//! | `StubRegistryTryRemove` | [`StubRegistry::try_remove`](crate::StubRegistry::try_remove) |
//! | `StubRegistryClear` | [`StubRegistry::clear`](crate::StubRegistry::clear) |
//! | `StubRegistryIsEnabled` | [`ProcessingGate::is_enabled`](crate::ProcessingGate::is_enabled) |
//! | `StubRegistrySetIsEnabled` | [`ProcessingGate::set_enabled`](crate::ProcessingGate::set_enabled) |
//!
//! Every export is total. A null key is treated as absent and never inserted.
//!
//! # Bootstrap
//!
//! The exports do not run [`ensure_engine_loadable`](crate::ensure_engine_loadable). Reaching
//! one means the library hosting it is already loaded: the managed side locates and loads the
//! engine before its first call, and rewritten call sites only exist once the engine is running.
//! Repeating the lookup here would put a registration query on the call-site path.
#![allow(non_snake_case)]

use std::ffi::c_void;

use widestring::{U16CStr, U16Str};

use crate::{
    registry::StubPointer,
    runtime::{gate, registry},
};

/// Win32 `BOOL`
pub type Bool = i32;

/// `BOOL` false
pub const FALSE: Bool = 0;
/// `BOOL` true
pub const TRUE: Bool = 1;

fn to_bool(value: bool) -> Bool {
    if value {
        TRUE
    } else {
        FALSE
    }
}

/// # Safety
/// `key` must be null or point to a NUL-terminated UTF-16 string that stays valid for `'a`.
unsafe fn wide_key<'a>(key: *const u16) -> Option<&'a U16Str> {
    if key.is_null() {
        return None;
    }
    Some(U16CStr::from_ptr_str(key).as_ustr())
}

/// # Safety
/// `out` must be null or valid for a pointer-sized write.
unsafe fn write_out(out: *mut *mut c_void, pointer: Option<StubPointer>) {
    if !out.is_null() {
        *out = pointer.unwrap_or(StubPointer::NULL).as_ptr();
    }
}

/// Registers `func_ptr` for `key` unless the key is taken. Returns `TRUE` if inserted.
///
/// # Safety
/// `key` must be null or a valid NUL-terminated UTF-16 string.
#[no_mangle]
pub unsafe extern "system" fn StubRegistryTryAdd(key: *const u16, func_ptr: *mut c_void) -> Bool {
    match wide_key(key) {
        Some(key) => to_bool(registry().try_add(key, StubPointer::from_raw(func_ptr))),
        None => FALSE,
    }
}

/// Looks up `key`. Returns `TRUE` and stores the pointer in `*out` if present; stores null and
/// returns `FALSE` otherwise.
///
/// # Safety
/// `key` must be null or a valid NUL-terminated UTF-16 string. `out` must be null or valid for a
/// pointer-sized write.
#[no_mangle]
pub unsafe extern "system" fn StubRegistryTryGet(key: *const u16, out: *mut *mut c_void) -> Bool {
    let found = wide_key(key).and_then(|key| registry().try_get(key));
    write_out(out, found);
    to_bool(found.is_some())
}

/// Removes `key`. Returns `TRUE` and stores the removed pointer in `*out` if it was present;
/// stores null and returns `FALSE` otherwise.
///
/// # Safety
/// Same requirements as [`StubRegistryTryGet`].
#[no_mangle]
pub unsafe extern "system" fn StubRegistryTryRemove(
    key: *const u16,
    out: *mut *mut c_void,
) -> Bool {
    let removed = wide_key(key).and_then(|key| registry().try_remove(key));
    write_out(out, removed);
    to_bool(removed.is_some())
}

/// Removes every entry.
#[no_mangle]
pub extern "system" fn StubRegistryClear() {
    registry().clear();
}

/// Returns `TRUE` if call sites should look for a stub.
#[no_mangle]
pub extern "system" fn StubRegistryIsEnabled() -> Bool {
    to_bool(gate().is_enabled())
}

/// Opens the gate for any non-zero `value`, closes it for zero.
#[no_mangle]
pub extern "system" fn StubRegistrySetIsEnabled(value: Bool) {
    gate().set_enabled(value != FALSE);
}
