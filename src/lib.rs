// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'ffi.rs' dereferences raw pointers handed over by the managed side
// - 'bootstrap/windows.rs' calls into the Win32 registry and loader APIs
// - 'bootstrap/unix.rs' opens the engine with dlopen

//! # stubgate
//!
//! Runtime substrate for call-site interception ("stubbing") of .NET members.
//!
//! An instrumentation engine rewrites selected call sites so that, instead of running their
//! original body, they look up a replacement implementation by a textual key and call it through
//! a raw function pointer. This crate holds the other half of that contract:
//!
//! - a process-wide, concurrent **stub registry** mapping call-site keys to replacement pointers
//! - a process-wide **processing gate** that switches redirection on and off, with a scoped
//!   disable used while stubs are being installed
//! - a **bootstrap** step that locates the engine through the operating system's component
//!   registration and makes it loadable
//! - the **native exports** the managed side calls into
//!
//! ## Quick Start
//!
//! ```rust
//! use stubgate::prelude::*;
//!
//! let registry = StubRegistry::new();
//! let gate = ProcessingGate::new();
//! let key = StubKey::new("Foo.Bar.get_Baz");
//!
//! gate.with_disabled(|| {
//!     assert!(registry.try_add(&key, StubPointer::new(0xDEAD_0000)));
//! });
//!
//! assert!(gate.is_enabled());
//! assert_eq!(registry.try_get(&key), Some(StubPointer::new(0xDEAD_0000)));
//! ```
//!
//! ## Architecture
//!
//! - [`registry`] - [`StubRegistry`], [`StubKey`], [`StubPointer`]
//! - [`gate`] - [`ProcessingGate`] and its [`ProcessingDisabled`] guard
//! - [`runtime`] - the process-wide instances and the [`StubRuntime`] handle
//! - [`bootstrap`] - engine discovery and loader setup
//! - [`ffi`] - `extern "system"` exports
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Error Handling
//!
//! Registry and gate operations cannot fail. A key that is missing or already taken is reported
//! through the return value. Only the bootstrap returns errors, and those describe a broken
//! installation:
//!
//! ```rust,no_run
//! use stubgate::StubRuntime;
//!
//! fn main() {
//!     let runtime = match StubRuntime::attach() {
//!         Ok(runtime) => runtime,
//!         Err(e) => {
//!             eprintln!("{e}");
//!             std::process::exit(1);
//!         }
//!     };
//!     println!("engine directory: {}", runtime.engine().directory().display());
//! }
//! ```
//!
//! ## Logging
//!
//! The bootstrap reports through the [`log`](https://docs.rs/log) facade. Registry and gate
//! operations are on the call-site hot path and do not log.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use stubgate::prelude::*;
///
/// let registry = StubRegistry::new();
/// assert!(registry.is_empty());
/// ```
pub mod prelude;

/// The concurrent call-site redirection table.
///
/// # Key Types
///
/// - [`registry::StubRegistry`] - Key to pointer map, safe under concurrent use
/// - [`registry::StubKey`] - UTF-16 call-site key
/// - [`registry::StubPointer`] - Opaque replacement address
/// - [`registry::RegistryConfig`] - Sizing for a registry instance
pub mod registry;

/// The global enable/disable switch for redirection.
pub mod gate;

/// Locating the interception engine and making it loadable.
pub mod bootstrap;

/// The process-wide registry and gate.
pub mod runtime;

/// `extern "system"` exports forming the native/managed boundary.
pub mod ffi;

/// `stubgate` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `stubgate` Error type
///
/// See [`Error`] for the error categories.
pub use error::Error;

/// Registry types, see [`registry`].
pub use registry::{RegistryConfig, StubKey, StubPointer, StubRegistry};

/// Gate types, see [`gate`].
pub use gate::{ProcessingDisabled, ProcessingGate};

/// Process-wide handle, see [`runtime`].
pub use runtime::StubRuntime;

/// Engine bootstrap, see [`bootstrap`].
pub use bootstrap::{ensure_engine_loadable, EngineLocation};
