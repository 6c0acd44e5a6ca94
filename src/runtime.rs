//! Process-wide registry and gate.
//!
//! The process has exactly one [`StubRegistry`] and one [`ProcessingGate`]. The registry is
//! created on first access and lives until the process exits; the gate starts enabled.
//!
//! From Rust, both are only reachable through a [`StubRuntime`], and obtaining one runs the
//! engine bootstrap first, so Rust code cannot touch the registry in a process whose engine
//! could not be located. The exports in [`crate::ffi`] operate on the same instances.

use std::sync::LazyLock;

use widestring::U16Str;

use crate::{
    bootstrap::{ensure_engine_loadable, EngineLocation},
    gate::{ProcessingDisabled, ProcessingGate},
    registry::{StubPointer, StubRegistry},
    Result,
};

static REGISTRY: LazyLock<StubRegistry> = LazyLock::new(StubRegistry::new);
static GATE: ProcessingGate = ProcessingGate::new();

pub(crate) fn registry() -> &'static StubRegistry {
    &REGISTRY
}

pub(crate) fn gate() -> &'static ProcessingGate {
    &GATE
}

/// Handle to the process-wide registry and gate.
///
/// Obtaining a handle makes sure the interception engine is loadable first, which happens once
/// per process. After that the handle is a thin, copyable view of the shared state.
///
/// # Examples
///
/// ```rust,no_run
/// use stubgate::{StubKey, StubPointer, StubRuntime};
///
/// let runtime = StubRuntime::attach()?;
/// let key = StubKey::new("System.DateTime.get_Now");
///
/// runtime.with_processing_disabled(|| {
///     runtime.try_add(&key, StubPointer::new(0x7ff6_0000_1000));
/// });
/// assert!(runtime.resolve(&key).is_some());
/// # Ok::<(), stubgate::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StubRuntime {
    engine: &'static EngineLocation,
}

impl StubRuntime {
    /// Bootstraps the engine on first use and returns a handle.
    ///
    /// # Errors
    /// Returns the deployment error from [`ensure_engine_loadable`]. It is the same error on
    /// every call; the bootstrap is not retried.
    pub fn attach() -> Result<Self> {
        Ok(StubRuntime {
            engine: ensure_engine_loadable()?,
        })
    }

    /// Where the engine was found
    #[must_use]
    pub fn engine(&self) -> &'static EngineLocation {
        self.engine
    }

    /// Returns the replacement for `key` if processing is enabled and a stub is registered.
    ///
    /// This is the check a rewritten call site performs. `None` means the call site runs its
    /// original body.
    #[inline]
    pub fn resolve(&self, key: &U16Str) -> Option<StubPointer> {
        if !GATE.is_enabled() {
            return None;
        }
        REGISTRY.try_get(key)
    }

    /// See [`StubRegistry::try_add`]
    pub fn try_add(&self, key: &U16Str, pointer: StubPointer) -> bool {
        registry().try_add(key, pointer)
    }

    /// See [`StubRegistry::try_get`]
    pub fn try_get(&self, key: &U16Str) -> Option<StubPointer> {
        registry().try_get(key)
    }

    /// See [`StubRegistry::try_remove`]
    pub fn try_remove(&self, key: &U16Str) -> Option<StubPointer> {
        registry().try_remove(key)
    }

    /// See [`StubRegistry::clear`]
    pub fn clear(&self) {
        registry().clear();
    }

    /// See [`ProcessingGate::is_enabled`]
    pub fn is_enabled(&self) -> bool {
        gate().is_enabled()
    }

    /// See [`ProcessingGate::set_enabled`]
    pub fn set_enabled(&self, value: bool) {
        gate().set_enabled(value);
    }

    /// See [`ProcessingGate::disable`]. The same nesting caveat applies.
    #[must_use = "the gate re-opens as soon as the guard is dropped"]
    pub fn disable_processing(&self) -> ProcessingDisabled<'static> {
        gate().disable()
    }

    /// See [`ProcessingGate::with_disabled`]
    pub fn with_processing_disabled<T>(&self, f: impl FnOnce() -> T) -> T {
        gate().with_disabled(f)
    }
}
