//! Small string key/value surface kept apart from the namespaces.
//!
//! Stored as a TOML table so it stays human readable and survives a reset of
//! the staging namespace.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::error::{PuzzleError, Result};

pub struct Preferences {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
}

impl Preferences {
    /// Load preferences from `path`; a missing file means no preferences.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|e| {
                PuzzleError::validation(format!(
                    "failed to parse preferences {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(PuzzleError::storage(
                    path.display().to_string(),
                    "read preferences",
                    e,
                ))
            }
        };
        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| PuzzleError::state("preferences lock poisoned"))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.lock()?.get(key).cloned();
        log::debug!("Getting preference {}: {:?}", key, value);
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        log::debug!("Setting preference {}: {}", key, value);
        let mut values = self.lock()?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    pub fn clear(&self) -> Result<()> {
        let mut values = self.lock()?;
        values.clear();
        self.persist(&values)
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = toml::to_string(values).map_err(|e| {
            PuzzleError::validation(format!("failed to serialize preferences: {}", e))
        })?;
        fs::write(path, contents)
            .map_err(|e| PuzzleError::storage(path.display().to_string(), "write preferences", e))
    }
}
