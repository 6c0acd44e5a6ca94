use std::path::PathBuf;

use thiserror::Error;
use uguid::Guid;

macro_rules! invalid_config {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvalidConfig {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvalidConfig {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Registry and gate operations are total and never produce an `Error`: a missing or already
/// present key is reported through the return value. Errors only come out of the bootstrap
/// step that makes the interception engine loadable, and out of configuration validation.
///
/// # Error Categories
///
/// ## Deployment Errors
/// - [`Error::ComponentNotRegistered`] - The engine component is absent from the registration database
/// - [`Error::Registration`] - The registration database could not be read
/// - [`Error::ComponentInaccessible`] - The registered engine binary cannot be accessed
/// - [`Error::EngineLoad`] - The dynamic loader rejected the engine binary
/// - [`Error::SearchPath`] - The engine directory could not be added to the library search path
///
/// ## Configuration Errors
/// - [`Error::InvalidConfig`] - A registry configuration value was rejected
///
/// Deployment errors are meant to be fatal. They are returned to the caller rather than
/// aborting, so the process entry point can report them and exit.
///
/// # Examples
///
/// ```rust,no_run
/// use stubgate::{Error, StubRuntime};
///
/// match StubRuntime::attach() {
///     Ok(runtime) => println!("engine at {}", runtime.engine().binary().display()),
///     Err(Error::ComponentNotRegistered { component }) => {
///         eprintln!("install the interception engine ({{{component}}}) first");
///         std::process::exit(1);
///     }
///     Err(e) => {
///         eprintln!("{e}");
///         std::process::exit(1);
///     }
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The interception engine is not registered in the component-registration database.
    #[error("Interception engine component {{{component}}} is not registered")]
    ComponentNotRegistered {
        /// Identifier that was looked up
        component: Guid,
    },

    /// The registration of the engine exists but could not be read.
    #[error("Failed to read the registration of interception engine component {{{component}}} - {reason}")]
    Registration {
        /// Identifier that was looked up
        component: Guid,
        /// Why the read failed
        reason: String,
    },

    /// The engine is registered, but its binary cannot be accessed.
    ///
    /// Usually a broken installation: the registration points at a file that was moved or
    /// deleted, or at something that is not a file.
    #[error("Interception engine component {{{component}}} is registered at '{location}', which is not accessible - {reason}", location = .path.display())]
    ComponentInaccessible {
        /// Identifier that was looked up
        component: Guid,
        /// The registered binary path
        path: PathBuf,
        /// Why the path was rejected
        reason: String,
    },

    /// The dynamic loader could not load the engine binary.
    #[error("Failed to load interception engine '{location}' - {reason}", location = .path.display())]
    EngineLoad {
        /// The binary that was loaded
        path: PathBuf,
        /// The loader's error message
        reason: String,
    },

    /// Adding the engine directory to the native library search path failed.
    #[error("Failed to add '{location}' to the native library search path - {reason}", location = .directory.display())]
    SearchPath {
        /// The directory that should have been added
        directory: PathBuf,
        /// Why the operation failed
        reason: String,
    },

    /// A configuration value was rejected.
    ///
    /// The error includes the source location where the value was validated.
    #[error("Invalid configuration - {file}:{line}: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}

#[cfg(test)]
mod tests {
    use uguid::guid;

    use super::*;

    #[test]
    fn not_registered_names_component() {
        let err = Error::ComponentNotRegistered {
            component: guid!("532C1F05-F8F3-4FBA-8724-699A31756ABD"),
        };

        let msg = err.to_string().to_ascii_lowercase();
        assert!(msg.contains("{532c1f05-f8f3-4fba-8724-699a31756abd}"));
        assert!(msg.contains("not registered"));
    }

    #[test]
    fn inaccessible_names_path() {
        let err = Error::ComponentInaccessible {
            component: guid!("532C1F05-F8F3-4FBA-8724-699A31756ABD"),
            path: PathBuf::from("/opt/engine/libengine.so"),
            reason: "not found".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("/opt/engine/libengine.so"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn registration_names_component() {
        let err = Error::Registration {
            component: guid!("532C1F05-F8F3-4FBA-8724-699A31756ABD"),
            reason: "Access is denied.".to_string(),
        };

        let msg = err.to_string().to_ascii_lowercase();
        assert!(msg.contains("{532c1f05-f8f3-4fba-8724-699a31756abd}"));
        assert!(msg.contains("access is denied"));
    }

    #[test]
    fn engine_load_names_binary() {
        let err = Error::EngineLoad {
            path: PathBuf::from("/opt/engine/libengine.so"),
            reason: "file too short".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("/opt/engine/libengine.so"));
        assert!(msg.contains("file too short"));
    }

    #[test]
    fn invalid_config_records_location() {
        let err = invalid_config!("shard amount {} is not a power of two", 3);

        match err {
            Error::InvalidConfig {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "shard amount 3 is not a power of two");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
