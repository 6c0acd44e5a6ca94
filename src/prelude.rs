//! # stubgate Prelude
//!
//! This module provides a convenient prelude for the most commonly used types of the stubgate
//! library. Import this module to get quick access to the registry, the gate and the
//! process-wide handle.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all stubgate operations
pub use crate::Error;

/// The result type used throughout stubgate
pub use crate::Result;

// ================================================================================================
// Registry
// ================================================================================================

/// Call-site table and its key and value types
pub use crate::registry::{RegistryConfig, StubKey, StubPointer, StubRegistry};

// ================================================================================================
// Gate
// ================================================================================================

/// Redirection switch and its scope guard
pub use crate::gate::{ProcessingDisabled, ProcessingGate};

// ================================================================================================
// Process-wide State
// ================================================================================================

/// Handle to the process-wide registry and gate
pub use crate::runtime::StubRuntime;

/// Engine bootstrap
pub use crate::bootstrap::{ensure_engine_loadable, EngineLocation, ENGINE_COMPONENT_ID};
