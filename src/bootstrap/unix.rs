//! CoreCLR profiler registration, as used outside Windows.
//!
//! There is no component registry on these platforms. The runtime host instead learns which
//! profiler to load from its environment: `CORECLR_PROFILER` holds the component identifier and
//! `CORECLR_PROFILER_PATH` (or its pointer-width specific variant) holds the binary.

use std::{
    env,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW};
use uguid::Guid;

use crate::{
    bootstrap::{ComponentDatabase, EngineLoader},
    Error, Result,
};

const PROFILER_VARIABLE: &str = "CORECLR_PROFILER";

#[cfg(target_pointer_width = "64")]
const PROFILER_PATH_VARIABLES: [&str; 2] = ["CORECLR_PROFILER_PATH_64", "CORECLR_PROFILER_PATH"];
#[cfg(not(target_pointer_width = "64"))]
const PROFILER_PATH_VARIABLES: [&str; 2] = ["CORECLR_PROFILER_PATH_32", "CORECLR_PROFILER_PATH"];

/// Engine libraries opened by [`SystemEngineLoader`]. They stay loaded for the rest of the
/// process.
static PRELOADED: Mutex<Vec<Library>> = Mutex::new(Vec::new());

/// Reads the profiler registration from the process environment.
///
/// The width-specific path variable wins over the plain one; an empty value counts as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemComponentDatabase;

impl ComponentDatabase for SystemComponentDatabase {
    fn registered_path(&self, component: Guid) -> Result<PathBuf> {
        let registered = env::var(PROFILER_VARIABLE)
            .ok()
            .and_then(|value| parse_component_id(&value));
        if registered != Some(component) {
            return Err(Error::ComponentNotRegistered { component });
        }

        PROFILER_PATH_VARIABLES
            .iter()
            .filter_map(|name| env::var_os(name))
            .find(|value| !value.is_empty())
            .map(PathBuf::from)
            .ok_or(Error::ComponentNotRegistered { component })
    }
}

/// Opens the engine binary with `RTLD_NOW | RTLD_GLOBAL` and keeps it open.
///
/// Its symbols are bound immediately, so a broken binary fails here rather than at the first
/// intercepted call. Later `dlopen` calls for the same soname get the already loaded copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEngineLoader;

impl EngineLoader for SystemEngineLoader {
    fn make_loadable(&self, binary: &Path, _directory: &Path) -> Result<()> {
        // SAFETY: loading the engine runs its initialisers; the engine is built to be loaded
        // into a running host process.
        let library = unsafe { Library::open(Some(binary.as_os_str()), RTLD_NOW | RTLD_GLOBAL) }
            .map_err(|e| Error::EngineLoad {
                path: binary.to_path_buf(),
                reason: e.to_string(),
            })?;

        PRELOADED
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(library);
        Ok(())
    }
}

/// Accepts `{xxxxxxxx-...}` as well as the bare form.
fn parse_component_id(value: &str) -> Option<Guid> {
    let trimmed = value.trim();
    let bare = trimmed
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(trimmed);

    Guid::try_parse(bare).ok()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use uguid::guid;

    use super::*;
    use crate::test::temp_engine_binary;

    const ENGINE: Guid = guid!("532C1F05-F8F3-4FBA-8724-699A31756ABD");

    fn clear_profiler_environment() {
        env::remove_var(PROFILER_VARIABLE);
        for name in PROFILER_PATH_VARIABLES {
            env::remove_var(name);
        }
    }

    #[test]
    fn component_id_forms() {
        assert_eq!(
            parse_component_id("{532C1F05-F8F3-4FBA-8724-699A31756ABD}"),
            Some(ENGINE)
        );
        assert_eq!(
            parse_component_id("532c1f05-f8f3-4fba-8724-699a31756abd"),
            Some(ENGINE)
        );
        assert_eq!(
            parse_component_id("  {532C1F05-F8F3-4FBA-8724-699A31756ABD}\n"),
            Some(ENGINE)
        );
        assert_eq!(parse_component_id("{not-a-guid}"), None);
        assert_eq!(parse_component_id(""), None);
    }

    // The profiler variables are process-wide, so every case runs in this one test.
    #[test]
    fn profiler_environment() {
        let [width_specific, plain] = PROFILER_PATH_VARIABLES;
        let specific_binary = temp_engine_binary("env_specific");
        let plain_binary = temp_engine_binary("env_plain");
        let database = SystemComponentDatabase;

        clear_profiler_environment();
        assert_eq!(
            database.registered_path(ENGINE),
            Err(Error::ComponentNotRegistered { component: ENGINE })
        );

        // Path without a matching profiler id
        env::set_var(plain, &plain_binary);
        env::set_var(PROFILER_VARIABLE, "{00000000-1111-2222-3333-444444444444}");
        assert_eq!(
            database.registered_path(ENGINE),
            Err(Error::ComponentNotRegistered { component: ENGINE })
        );
        env::set_var(PROFILER_VARIABLE, "garbage");
        assert!(database.registered_path(ENGINE).is_err());

        // Plain path only
        env::set_var(PROFILER_VARIABLE, "{532C1F05-F8F3-4FBA-8724-699A31756ABD}");
        assert_eq!(database.registered_path(ENGINE), Ok(plain_binary.clone()));

        // Width-specific path takes precedence
        env::set_var(width_specific, &specific_binary);
        assert_eq!(database.registered_path(ENGINE), Ok(specific_binary.clone()));

        // Empty width-specific path falls back to the plain one
        env::set_var(width_specific, "");
        assert_eq!(database.registered_path(ENGINE), Ok(plain_binary.clone()));

        // Both empty
        env::set_var(plain, "");
        assert_eq!(
            database.registered_path(ENGINE),
            Err(Error::ComponentNotRegistered { component: ENGINE })
        );

        clear_profiler_environment();
    }

    #[test]
    fn loader_rejects_non_library() {
        let binary = temp_engine_binary("not_elf");
        fs::write(&binary, b"not a shared object").unwrap();

        match SystemEngineLoader.make_loadable(&binary, binary.parent().unwrap()) {
            Err(Error::EngineLoad { path, reason }) => {
                assert_eq!(path, binary);
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn loader_rejects_missing_binary() {
        let binary = env::temp_dir().join("stubgate-definitely-missing/libengine.so");

        assert!(matches!(
            SystemEngineLoader.make_loadable(&binary, binary.parent().unwrap()),
            Err(Error::EngineLoad { .. })
        ));
    }
}
