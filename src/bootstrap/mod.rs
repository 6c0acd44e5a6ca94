//! Locating the native interception engine.
//!
//! Before any stub can be registered, the engine that rewrites call sites has to be loadable.
//! The engine is installed as an in-process component; its binary path is looked up once in the
//! operating system's component-registration database, and the dynamic loader is prepared so
//! that later references to the engine resolve to that binary.
//!
//! # Key Components
//!
//! - [`ComponentDatabase`] - Where installed components are registered
//! - [`EngineLoader`] - Prepares the dynamic loader for a located binary
//! - [`EngineLocator`] - Resolves the engine through a database and hands it to a loader
//! - [`ensure_engine_loadable`] - Process-wide, run-once bootstrap on the system backends
//!
//! # Platform Backends
//!
//! | Platform | Registration | Loader |
//! |---|---|---|
//! | Windows | `HKCR\CLSID\{id}\InprocServer32` default value | `SetDllDirectoryW` on the binary's directory |
//! | Unix | `CORECLR_PROFILER` / `CORECLR_PROFILER_PATH[_64\|_32]` | `dlopen(RTLD_NOW \| RTLD_GLOBAL)` on the binary |
//!
//! The Unix loader fixes its search list at process start, so changing `LD_LIBRARY_PATH`
//! afterwards would not reach this process. The binary is opened by absolute path instead and
//! kept open; later references to the same soname resolve to the loaded copy.
//!
//! # Failure
//!
//! A missing registration or an inaccessible binary is a broken installation. The bootstrap is
//! not retried; the first outcome is cached for the lifetime of the process and returned to every
//! caller, so the entry point can report it and exit.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{SystemComponentDatabase, SystemEngineLoader};
#[cfg(windows)]
pub use windows::{SystemComponentDatabase, SystemEngineLoader};

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use uguid::{guid, Guid};

use crate::{Error, Result};

/// Component identifier under which the interception engine registers itself.
pub const ENGINE_COMPONENT_ID: Guid = guid!("532C1F05-F8F3-4FBA-8724-699A31756ABD");

/// Read access to the operating system's component-registration database.
pub trait ComponentDatabase {
    /// Returns the registered in-process binary path of `component`.
    ///
    /// # Errors
    /// Returns [`Error::ComponentNotRegistered`] if there is no registration for `component`,
    /// or [`Error::Registration`] if the registration exists but cannot be read.
    fn registered_path(&self, component: Guid) -> Result<PathBuf>;
}

/// Makes a located engine binary resolvable by the dynamic loader.
pub trait EngineLoader {
    /// Prepares the loader for `binary`, which lives in `directory`.
    ///
    /// # Errors
    /// Returns [`Error::SearchPath`] or [`Error::EngineLoad`] depending on the backend.
    fn make_loadable(&self, binary: &Path, directory: &Path) -> Result<()>;
}

impl<T: ComponentDatabase + ?Sized> ComponentDatabase for &T {
    fn registered_path(&self, component: Guid) -> Result<PathBuf> {
        (**self).registered_path(component)
    }
}

impl<T: EngineLoader + ?Sized> EngineLoader for &T {
    fn make_loadable(&self, binary: &Path, directory: &Path) -> Result<()> {
        (**self).make_loadable(binary, directory)
    }
}

/// Where the engine was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLocation {
    component: Guid,
    binary: PathBuf,
    directory: PathBuf,
}

impl EngineLocation {
    /// The component identifier that was resolved
    #[must_use]
    pub fn component(&self) -> Guid {
        self.component
    }

    /// Path of the engine binary, as registered
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Directory containing the engine binary
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Resolves the engine through a [`ComponentDatabase`] and makes it loadable through an
/// [`EngineLoader`].
pub struct EngineLocator<D, L> {
    component: Guid,
    database: D,
    loader: L,
}

impl EngineLocator<SystemComponentDatabase, SystemEngineLoader> {
    /// Locator for [`ENGINE_COMPONENT_ID`] on the platform backends
    #[must_use]
    pub fn system() -> Self {
        EngineLocator::new(
            ENGINE_COMPONENT_ID,
            SystemComponentDatabase,
            SystemEngineLoader,
        )
    }
}

impl<D: ComponentDatabase, L: EngineLoader> EngineLocator<D, L> {
    /// Creates a locator for `component`
    pub fn new(component: Guid, database: D, loader: L) -> Self {
        EngineLocator {
            component,
            database,
            loader,
        }
    }

    /// Looks up the engine binary, checks it is accessible, and hands it to the loader.
    ///
    /// # Errors
    /// - [`Error::ComponentNotRegistered`] if the component has no registration
    /// - [`Error::Registration`] if the registration could not be read
    /// - [`Error::ComponentInaccessible`] if the registered binary is missing or not a file
    /// - [`Error::SearchPath`] or [`Error::EngineLoad`] if the loader rejected the binary
    pub fn locate(&self) -> Result<EngineLocation> {
        let binary = self.database.registered_path(self.component)?;
        log::debug!(
            "component {{{}}} registered at '{}'",
            self.component,
            binary.display()
        );

        let inaccessible = |reason: String| Error::ComponentInaccessible {
            component: self.component,
            path: binary.clone(),
            reason,
        };

        match fs::metadata(&binary) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(inaccessible("not a file".to_string())),
            Err(e) => return Err(inaccessible(e.to_string())),
        }

        let directory = match binary.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => return Err(inaccessible("path has no parent directory".to_string())),
        };

        self.loader.make_loadable(&binary, &directory)?;

        Ok(EngineLocation {
            component: self.component,
            binary,
            directory,
        })
    }
}

static ENGINE: OnceLock<Result<EngineLocation>> = OnceLock::new();

/// Makes the interception engine loadable, once per process.
///
/// The first call runs [`EngineLocator::system`]; every later call returns the same outcome
/// without touching the registration database again.
///
/// # Errors
/// Returns the deployment error of the first attempt. See [`EngineLocator::locate`].
pub fn ensure_engine_loadable() -> Result<&'static EngineLocation> {
    let outcome = ENGINE.get_or_init(|| {
        let outcome = EngineLocator::system().locate();
        match &outcome {
            Ok(location) => log::info!(
                "interception engine '{}' is loadable from '{}'",
                location.binary().display(),
                location.directory().display()
            ),
            Err(e) => log::error!("interception engine bootstrap failed: {e}"),
        }
        outcome
    });

    match outcome {
        Ok(location) => Ok(location),
        Err(e) => Err(e.clone()),
    }
}
