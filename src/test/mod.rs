use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use uguid::Guid;

use crate::{
    bootstrap::{ComponentDatabase, EngineLoader},
    Error, Result,
};

/// In-memory component registration database
#[derive(Default)]
pub struct FakeDatabase {
    entries: HashMap<Guid, PathBuf>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, component: Guid, path: &Path) -> Self {
        self.entries.insert(component, path.to_path_buf());
        self
    }
}

impl ComponentDatabase for FakeDatabase {
    fn registered_path(&self, component: Guid) -> Result<PathBuf> {
        self.entries
            .get(&component)
            .cloned()
            .ok_or(Error::ComponentNotRegistered { component })
    }
}

/// Loader that only remembers what it was given, as `(binary, directory)` pairs
#[derive(Default)]
pub struct RecordingLoader {
    loaded: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl RecordingLoader {
    pub fn loaded(&self) -> Vec<(PathBuf, PathBuf)> {
        self.loaded.lock().unwrap().clone()
    }
}

impl EngineLoader for RecordingLoader {
    fn make_loadable(&self, binary: &Path, directory: &Path) -> Result<()> {
        self.loaded
            .lock()
            .unwrap()
            .push((binary.to_path_buf(), directory.to_path_buf()));
        Ok(())
    }
}

/// Loader that rejects every binary
pub struct FailingLoader;

impl EngineLoader for FailingLoader {
    fn make_loadable(&self, binary: &Path, _directory: &Path) -> Result<()> {
        Err(Error::EngineLoad {
            path: binary.to_path_buf(),
            reason: "rejected by test".to_string(),
        })
    }
}

/// Creates an empty stand-in engine binary in its own temp directory and returns its path.
pub fn temp_engine_binary(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stubgate-{}-{tag}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let binary = dir.join("engine.bin");
    fs::write(&binary, b"").unwrap();
    binary
}
