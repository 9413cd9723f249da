//! In-process key/value namespace.

use std::collections::HashMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use super::{in_bounds, KvStore};
use crate::error::{PuzzleError, Result};

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    values: HashMap<String, Vec<u8>>,
}

/// Key/value namespace held in memory. Used by tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PuzzleError::state("memory store lock poisoned"))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.values.insert(key.to_string(), value.to_vec()).is_none() {
            inner.order.push(key.to_string());
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.order.clone())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.values.remove(key).is_some() {
            inner.order.retain(|k| k != key);
        }
        Ok(())
    }

    fn remove_range(&self, start: Bound<&str>, end: Bound<&str>) -> Result<()> {
        let mut inner = self.lock()?;
        let Inner { order, values } = &mut *inner;
        order.retain(|k| {
            let doomed = in_bounds(k, start, end);
            if doomed {
                values.remove(k);
            }
            !doomed
        });
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.lock()?;
        inner.order.clear();
        inner.values.clear();
        Ok(())
    }
}
