//! Explicitly constructed storage context shared by every component.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{DirStore, KvStore, MemoryStore, Preferences};
use crate::constants::{NS_LOG, NS_PARQUET, NS_TMP, PREFERENCES_FILE};
use crate::error::{PuzzleError, Result};

/// Handles to every namespace plus the preferences surface.
///
/// Cheap to clone; clones share the same underlying stores.
#[derive(Clone)]
pub struct Db {
    /// Cached dataset parts and their file list.
    pub parquet: Arc<dyn KvStore>,
    /// Staged chunks of the current pipeline run.
    pub tmp: Arc<dyn KvStore>,
    /// Permanent diagnostic log.
    pub log: Arc<dyn KvStore>,
    pub prefs: Arc<Preferences>,
    root: Option<PathBuf>,
}

impl Db {
    /// Open the on-disk layout rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| PuzzleError::storage(root.display().to_string(), "create store root", e))?;
        log::info!("Opening store at {}", root.display());

        Ok(Self {
            parquet: Arc::new(DirStore::open(root.join(NS_PARQUET))?),
            tmp: Arc::new(DirStore::open(root.join(NS_TMP))?),
            log: Arc::new(DirStore::open(root.join(NS_LOG))?),
            prefs: Arc::new(Preferences::load(root.join(PREFERENCES_FILE))?),
            root: Some(root),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            parquet: Arc::new(MemoryStore::new()),
            tmp: Arc::new(MemoryStore::new()),
            log: Arc::new(MemoryStore::new()),
            prefs: Arc::new(Preferences::in_memory()),
            root: None,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Wipe every namespace and the preferences.
    pub fn clear_all(&self) -> Result<()> {
        self.parquet.clear()?;
        self.tmp.clear()?;
        self.log.clear()?;
        self.prefs.clear()?;
        log::info!("Store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_namespaces_are_independent() {
        let db = Db::in_memory();
        db.parquet.put("k", b"parquet").unwrap();
        db.tmp.put("k", b"tmp").unwrap();
        assert_eq!(db.parquet.get("k").unwrap(), Some(b"parquet".to_vec()));
        assert_eq!(db.tmp.get("k").unwrap(), Some(b"tmp".to_vec()));

        db.tmp.clear().unwrap();
        assert!(db.parquet.contains("k").unwrap());
    }

    #[test]
    fn test_open_and_clear_all() {
        let dir = tempdir().unwrap();
        let db = Db::open(dir.path()).unwrap();
        db.parquet.put("data/a.parquet", b"PAR1").unwrap();
        db.prefs.set("last-synced-at", "x").unwrap();

        let reopened = Db::open(dir.path()).unwrap();
        assert!(reopened.parquet.contains("data/a.parquet").unwrap());
        assert!(reopened.prefs.get("last-synced-at").unwrap().is_some());

        reopened.clear_all().unwrap();
        assert!(reopened.parquet.keys().unwrap().is_empty());
        assert!(reopened.prefs.get("last-synced-at").unwrap().is_none());
    }
}
