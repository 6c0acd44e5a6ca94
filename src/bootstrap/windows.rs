//! COM registration lookup and DLL directory setup on Windows.

use std::{
    io,
    path::{Path, PathBuf},
    ptr,
};

use uguid::Guid;
use widestring::{U16CStr, U16CString};
use windows_sys::Win32::{
    Foundation::{ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_SUCCESS},
    System::{
        LibraryLoader::SetDllDirectoryW,
        Registry::{RegGetValueW, HKEY_CLASSES_ROOT, RRF_RT_REG_EXPAND_SZ, RRF_RT_REG_SZ},
    },
};

use crate::{
    bootstrap::{ComponentDatabase, EngineLoader},
    Error, Result,
};

/// The value can change between the size query and the read.
const READ_ATTEMPTS: usize = 4;

/// `REG_EXPAND_SZ` values come back with environment references expanded.
const STRING_VALUE: u32 = RRF_RT_REG_SZ | RRF_RT_REG_EXPAND_SZ;

/// Reads `HKEY_CLASSES_ROOT\CLSID\{id}\InprocServer32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemComponentDatabase;

impl ComponentDatabase for SystemComponentDatabase {
    fn registered_path(&self, component: Guid) -> Result<PathBuf> {
        let subkey = U16CString::from_str(format!("CLSID\\{{{component}}}\\InprocServer32"))
            .map_err(|e| Error::Registration {
                component,
                reason: e.to_string(),
            })?;

        for _ in 0..READ_ATTEMPTS {
            let mut size: u32 = 0;
            // SAFETY: `subkey` is NUL-terminated; a null value name selects the default value.
            let status = unsafe {
                RegGetValueW(
                    HKEY_CLASSES_ROOT,
                    subkey.as_ptr(),
                    ptr::null(),
                    STRING_VALUE,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    &mut size,
                )
            };
            check_status(status, component)?;

            let mut buffer = vec![0u16; (size as usize).div_ceil(2)];
            // SAFETY: `buffer` holds `size` bytes, as reported by the query above.
            let status = unsafe {
                RegGetValueW(
                    HKEY_CLASSES_ROOT,
                    subkey.as_ptr(),
                    ptr::null(),
                    STRING_VALUE,
                    ptr::null_mut(),
                    buffer.as_mut_ptr().cast(),
                    &mut size,
                )
            };
            if status == ERROR_MORE_DATA {
                continue;
            }
            check_status(status, component)?;

            let value = U16CStr::from_slice_truncate(&buffer)
                .map_err(|e| Error::Registration {
                    component,
                    reason: e.to_string(),
                })?;
            if value.is_empty() {
                return Err(Error::ComponentNotRegistered { component });
            }
            return Ok(PathBuf::from(value.to_os_string()));
        }

        Err(Error::Registration {
            component,
            reason: "value kept changing while it was read".to_string(),
        })
    }
}

fn check_status(status: u32, component: Guid) -> Result<()> {
    match status {
        ERROR_SUCCESS => Ok(()),
        ERROR_FILE_NOT_FOUND => Err(Error::ComponentNotRegistered { component }),
        other => Err(Error::Registration {
            component,
            reason: io::Error::from_raw_os_error(other as i32).to_string(),
        }),
    }
}

/// Sets the process DLL directory to the engine's directory.
///
/// The loader searches this directory after the application directory. There is a single such
/// slot per process, so a later call replaces the directory set by an earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEngineLoader;

impl EngineLoader for SystemEngineLoader {
    fn make_loadable(&self, _binary: &Path, directory: &Path) -> Result<()> {
        let search_path_error = |reason: String| Error::SearchPath {
            directory: directory.to_path_buf(),
            reason,
        };

        let wide = U16CString::from_os_str(directory.as_os_str())
            .map_err(|e| search_path_error(e.to_string()))?;

        // SAFETY: `wide` is NUL-terminated and outlives the call.
        if unsafe { SetDllDirectoryW(wide.as_ptr()) } == 0 {
            return Err(search_path_error(io::Error::last_os_error().to_string()));
        }
        Ok(())
    }
}
