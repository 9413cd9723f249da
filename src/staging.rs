//! Numbered, gapless batches persisted between pipeline passes.
//!
//! Chunk `n` of a purpose exists iff chunks `0..n` exist; the first missing
//! index ends the sequence. Keys are `<purpose>-<index>` in the staging
//! namespace.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::columnar::{encode_records, PuzzleFile, RecordWriteOptions};
use crate::error::{PuzzleError, Result};
use crate::store::KvStore;
use crate::types::PuzzleRecord;

/// A batch type that can be staged under its own key prefix.
pub trait StagedBatch: Sized {
    /// Key prefix of this batch type.
    const PURPOSE: &'static str;

    fn encode(&self) -> Result<Vec<u8>>;

    fn decode(bytes: Vec<u8>) -> Result<Self>;
}

impl StagedBatch for Vec<PuzzleRecord> {
    const PURPOSE: &'static str = "records";

    fn encode(&self) -> Result<Vec<u8>> {
        encode_records(self, &RecordWriteOptions::default())
    }

    fn decode(bytes: Vec<u8>) -> Result<Self> {
        PuzzleFile::open("staged records", bytes)?.read_all()
    }
}

impl StagedBatch for String {
    const PURPOSE: &'static str = "pgn";

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(bytes: Vec<u8>) -> Result<Self> {
        String::from_utf8(bytes).map_err(|e| PuzzleError::Decode {
            context: "staged pgn chunk".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

fn chunk_key(purpose: &str, index: usize) -> String {
    format!("{}-{}", purpose, index)
}

/// Typed view over the staging namespace.
#[derive(Clone)]
pub struct Staging {
    store: Arc<dyn KvStore>,
}

impl Staging {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn set_chunk<T: StagedBatch>(&self, index: usize, batch: &T) -> Result<()> {
        let key = chunk_key(T::PURPOSE, index);
        log::debug!("Staging {}", key);
        self.store.put(&key, &batch.encode()?)
    }

    pub fn get_chunk<T: StagedBatch>(&self, index: usize) -> Result<Option<T>> {
        match self.store.get(&chunk_key(T::PURPOSE, index))? {
            Some(bytes) => Ok(Some(T::decode(bytes)?)),
            None => Ok(None),
        }
    }

    /// Lazily yield chunks `0, 1, 2, ...` until the first missing index.
    pub fn iter_chunks<T: StagedBatch>(&self) -> ChunkIter<T> {
        ChunkIter {
            store: Arc::clone(&self.store),
            next: 0,
            done: false,
            _batch: PhantomData,
        }
    }

    /// Number of consecutive chunks present from index 0.
    pub fn count_chunks<T: StagedBatch>(&self) -> Result<usize> {
        let mut n = 0;
        while self.store.contains(&chunk_key(T::PURPOSE, n))? {
            n += 1;
        }
        Ok(n)
    }

    /// Drop every staged chunk of every purpose.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}

/// Iterator over one purpose's staged chunks. Fused after the end or an error.
pub struct ChunkIter<T> {
    store: Arc<dyn KvStore>,
    next: usize,
    done: bool,
    _batch: PhantomData<T>,
}

impl<T: StagedBatch> Iterator for ChunkIter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let key = chunk_key(T::PURPOSE, self.next);
        let bytes = match self.store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        self.next += 1;
        let decoded = T::decode(bytes);
        if decoded.is_err() {
            self.done = true;
        }
        Some(decoded)
    }
}

impl<T: StagedBatch> std::iter::FusedIterator for ChunkIter<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::ops::Bound;
    use std::sync::Mutex;

    /// Store wrapper recording every key read.
    struct Recording {
        inner: MemoryStore,
        reads: Mutex<Vec<String>>,
    }

    impl KvStore for Recording {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.reads.lock().unwrap().push(key.to_string());
            self.inner.get(key)
        }
        fn put(&self, key: &str, value: &[u8]) -> Result<()> {
            self.inner.put(key, value)
        }
        fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys()
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
        fn remove_range(&self, start: Bound<&str>, end: Bound<&str>) -> Result<()> {
            self.inner.remove_range(start, end)
        }
        fn clear(&self) -> Result<()> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_iteration_stops_at_first_missing_index() {
        let store = Arc::new(Recording {
            inner: MemoryStore::new(),
            reads: Mutex::new(Vec::new()),
        });
        let staging = Staging::new(store.clone());
        for i in 0..3 {
            staging.set_chunk(i, &format!("chunk {}", i)).unwrap();
        }
        // A chunk past the gap is never reached.
        staging.set_chunk(4, &"orphan".to_string()).unwrap();

        let mut iter = staging.iter_chunks::<String>();
        let chunks: Vec<String> = iter.by_ref().map(|c| c.unwrap()).collect();
        assert_eq!(chunks, vec!["chunk 0", "chunk 1", "chunk 2"]);
        assert!(iter.next().is_none());

        let reads = store.reads.lock().unwrap().clone();
        assert_eq!(reads, vec!["pgn-0", "pgn-1", "pgn-2", "pgn-3"]);
    }

    #[test]
    fn test_fresh_iteration_restarts_at_zero() {
        let staging = Staging::new(Arc::new(MemoryStore::new()));
        staging.set_chunk(0, &"a".to_string()).unwrap();
        assert_eq!(staging.iter_chunks::<String>().count(), 1);
        assert_eq!(staging.iter_chunks::<String>().count(), 1);
        assert_eq!(staging.count_chunks::<String>().unwrap(), 1);
    }

    #[test]
    fn test_record_chunks_and_purposes_are_separate() {
        let staging = Staging::new(Arc::new(MemoryStore::new()));
        let batch = vec![PuzzleRecord {
            id: "00008".to_string(),
            initial_position: "r6k/pp2r2p/4Rp1Q/3p4/8/1N1P2R1/PqP2bPP/7K b - - 0 24"
                .to_string(),
            move_list: "f2g3 e6e7 b2b1 b3c1 b1c1 h6c1".to_string(),
            rating: 1913,
            popularity: 95,
            themes: vec!["crushing".to_string()],
        }];
        staging.set_chunk(0, &batch).unwrap();

        assert_eq!(staging.count_chunks::<String>().unwrap(), 0);
        let back: Vec<Vec<PuzzleRecord>> = staging
            .iter_chunks::<Vec<PuzzleRecord>>()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(back, vec![batch]);

        staging.clear().unwrap();
        assert!(staging.get_chunk::<Vec<PuzzleRecord>>(0).unwrap().is_none());
    }

    #[test]
    fn test_undecodable_chunk_ends_iteration_with_error() {
        let store = Arc::new(MemoryStore::new());
        store.put("records-0", b"garbage").unwrap();
        store.put("records-1", b"garbage").unwrap();
        let staging = Staging::new(store);
        let mut iter = staging.iter_chunks::<Vec<PuzzleRecord>>();
        assert!(matches!(iter.next(), Some(Err(PuzzleError::Decode { .. }))));
        assert!(iter.next().is_none());
    }
}
