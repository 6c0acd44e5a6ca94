//! Global on/off switch for call-site redirection.
//!
//! Every rewritten call site checks the [`ProcessingGate`] before it consults the registry.
//! The instrumentation layer closes the gate while it installs stubs, so the registration
//! machinery is not itself redirected while the table is being changed.
//!
//! # Scoped disable does not nest
//!
//! [`ProcessingGate::disable`] returns a [`ProcessingDisabled`] guard. Dropping the guard sets
//! the gate to *enabled*, whatever the state was when the guard was created:
//!
//! ```rust
//! use stubgate::ProcessingGate;
//!
//! let gate = ProcessingGate::new();
//! let outer = gate.disable();
//! {
//!     let _inner = gate.disable();
//! }
//! // The outer scope is still alive, but the gate is open again.
//! assert!(gate.is_enabled());
//! drop(outer);
//! ```
//!
//! Callers that may already be inside a disabled scope must not open another one.
//!
//! # Memory Ordering
//!
//! The flag is read and written with `SeqCst`, so a gate change is ordered before any registry
//! access that follows it in program order on the writing thread, and a reader that sees the new
//! state also sees everything the writer did before changing it.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide enable flag for redirection. Starts enabled.
#[derive(Debug)]
pub struct ProcessingGate {
    enabled: AtomicBool,
}

impl ProcessingGate {
    /// Creates an enabled gate
    #[must_use]
    pub const fn new() -> Self {
        ProcessingGate {
            enabled: AtomicBool::new(true),
        }
    }

    /// Returns true if call sites should look for a stub
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Opens or closes the gate. Takes effect for all subsequent reads.
    #[inline]
    pub fn set_enabled(&self, value: bool) {
        self.enabled.store(value, Ordering::SeqCst);
    }

    /// Closes the gate until the returned guard is dropped.
    ///
    /// The guard re-enables on drop, including during a panic unwind. It does not restore the
    /// previous state; see the [module documentation](self) for what that means for nesting.
    #[must_use = "the gate re-opens as soon as the guard is dropped"]
    pub fn disable(&self) -> ProcessingDisabled<'_> {
        self.set_enabled(false);
        ProcessingDisabled { gate: self }
    }

    /// Runs `f` with the gate closed and returns its result.
    pub fn with_disabled<T>(&self, f: impl FnOnce() -> T) -> T {
        let _disabled = self.disable();
        f()
    }
}

impl Default for ProcessingGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`ProcessingGate::disable`]. Re-enables the gate when dropped.
#[derive(Debug)]
pub struct ProcessingDisabled<'a> {
    gate: &'a ProcessingGate,
}

impl Drop for ProcessingDisabled<'_> {
    fn drop(&mut self) {
        self.gate.set_enabled(true);
    }
}
