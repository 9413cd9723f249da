//! Directory-backed key/value namespace.
//!
//! Each entry is one file named `<seq>.<encoded key>` where `seq` is the
//! zero-padded insertion sequence and the key is base64url encoded. Writes
//! land in a temporary file first and are renamed into place, so an entry is
//! either absent or complete.

use std::collections::HashMap;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{in_bounds, KvStore};
use crate::codec;
use crate::error::{PuzzleError, Result};

const TMP_SUFFIX: &str = ".partial";

#[derive(Default)]
struct Index {
    /// (seq, key) in insertion order.
    entries: Vec<(u64, String)>,
    by_key: HashMap<String, u64>,
    next_seq: u64,
}

impl Index {
    fn file_name(seq: u64, key: &str) -> String {
        format!("{:012}.{}", seq, codec::encode(key.as_bytes()))
    }

    fn parse_file_name(name: &str) -> Option<(u64, String)> {
        let (seq, encoded) = name.split_once('.')?;
        let seq = seq.parse::<u64>().ok()?;
        let key = String::from_utf8(codec::decode(encoded).ok()?).ok()?;
        Some((seq, key))
    }
}

/// Key/value namespace persisted as one file per entry.
pub struct DirStore {
    dir: PathBuf,
    index: Mutex<Index>,
}

impl DirStore {
    /// Open (creating if needed) the namespace directory and rebuild the
    /// insertion index from file names. Leftover partial writes are removed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| PuzzleError::storage(dir.display().to_string(), "create namespace", e))?;

        let mut index = Index::default();
        let read = fs::read_dir(&dir)
            .map_err(|e| PuzzleError::storage(dir.display().to_string(), "list namespace", e))?;
        for entry in read {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(TMP_SUFFIX) {
                let _ = fs::remove_file(entry.path());
                continue;
            }
            match Index::parse_file_name(&name) {
                Some((seq, key)) => {
                    index.next_seq = index.next_seq.max(seq + 1);
                    index.by_key.insert(key.clone(), seq);
                    index.entries.push((seq, key));
                }
                None => log::warn!("Ignoring foreign file in {}: {}", dir.display(), name),
            }
        }
        index.entries.sort_by_key(|(seq, _)| *seq);

        log::debug!(
            "Opened store namespace {} with {} entries",
            dir.display(),
            index.entries.len()
        );

        Ok(Self {
            dir,
            index: Mutex::new(index),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> Result<MutexGuard<'_, Index>> {
        self.index
            .lock()
            .map_err(|_| PuzzleError::state("directory store lock poisoned"))
    }

    fn path_of(&self, seq: u64, key: &str) -> PathBuf {
        self.dir.join(Index::file_name(seq, key))
    }

    fn delete_file(&self, seq: u64, key: &str) -> Result<()> {
        let path = self.path_of(seq, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PuzzleError::storage(key, "remove", e)),
        }
    }
}

impl KvStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let seq = match self.lock()?.by_key.get(key) {
            Some(&seq) => seq,
            None => return Ok(None),
        };
        match fs::read(self.path_of(seq, key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PuzzleError::storage(key, "read", e)),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        // Held across the write so two puts of one key cannot interleave.
        let mut index = self.lock()?;
        let (seq, is_new) = match index.by_key.get(key) {
            Some(&seq) => (seq, false),
            None => (index.next_seq, true),
        };

        let path = self.path_of(seq, key);
        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, value).map_err(|e| PuzzleError::storage(key, "write", e))?;
        fs::rename(&tmp, &path).map_err(|e| PuzzleError::storage(key, "commit", e))?;

        if is_new {
            index.next_seq += 1;
            index.by_key.insert(key.to_string(), seq);
            index.entries.push((seq, key.to_string()));
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .entries
            .iter()
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut index = self.lock()?;
        if let Some(seq) = index.by_key.remove(key) {
            index.entries.retain(|(s, _)| *s != seq);
            self.delete_file(seq, key)?;
        }
        Ok(())
    }

    fn remove_range(&self, start: Bound<&str>, end: Bound<&str>) -> Result<()> {
        let mut index = self.lock()?;
        let doomed: Vec<(u64, String)> = index
            .entries
            .iter()
            .filter(|(_, key)| in_bounds(key, start, end))
            .cloned()
            .collect();
        for (seq, key) in &doomed {
            self.delete_file(*seq, key)?;
            index.by_key.remove(key);
        }
        index.entries.retain(|(_, key)| !in_bounds(key, start, end));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut index = self.lock()?;
        for (seq, key) in &index.entries {
            self.delete_file(*seq, key)?;
        }
        *index = Index::default();
        Ok(())
    }
}
