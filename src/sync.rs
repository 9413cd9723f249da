//! Local cache of the dataset parts and its freshness.
//!
//! At most one refresh runs at a time. A refresh requested while another is
//! in flight is a no-op; callers block on [`DatasetSync::wait_until_idle`]
//! to observe the outcome of the in-flight one.
//!
//! A refresh is all-or-nothing: it clears the cached parts, stores the new
//! file list, downloads every part in list order, and only then records the
//! freshness timestamp. An interrupted refresh leaves a file list whose later
//! parts are missing; readers fail on the first absent part.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock};

use crate::constants::{FRESHNESS_WINDOW, LAST_SYNCED_AT_KEY, LIST_PARQUET_PATHS_KEY};
use crate::error::{PuzzleError, Result};
use crate::store::Db;
use crate::transport::DatasetTransport;

/// Outcome of one refresh, shared with every caller waiting on it.
#[derive(Debug, Default)]
struct RefreshSlot {
    outcome: OnceLock<std::result::Result<(), PuzzleError>>,
}

#[derive(Debug, Default)]
struct SyncPhase {
    /// Set while a refresh runs; waiters keep their own handle to it.
    in_flight: Option<Arc<RefreshSlot>>,
    last_synced_at: Option<DateTime<Utc>>,
}

pub struct DatasetSync {
    db: Db,
    transport: Arc<dyn DatasetTransport>,
    phase: Mutex<SyncPhase>,
    idle: Condvar,
}

impl DatasetSync {
    /// Build the manager, reading the persisted freshness marker.
    pub fn new(db: Db, transport: Arc<dyn DatasetTransport>) -> Result<Self> {
        let last_synced_at = match db.prefs.get(LAST_SYNCED_AT_KEY)? {
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => Some(ts.with_timezone(&Utc)),
                Err(e) => {
                    log::warn!("Ignoring unreadable {} '{}': {}", LAST_SYNCED_AT_KEY, raw, e);
                    None
                }
            },
            None => None,
        };
        log::debug!("Last synced at {:?}", last_synced_at);

        Ok(Self {
            db,
            transport,
            phase: Mutex::new(SyncPhase {
                last_synced_at,
                ..Default::default()
            }),
            idle: Condvar::new(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SyncPhase>> {
        self.phase
            .lock()
            .map_err(|_| PuzzleError::state("sync state lock poisoned"))
    }

    pub fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock()?.last_synced_at)
    }

    pub fn is_refreshing(&self) -> Result<bool> {
        Ok(self.lock()?.in_flight.is_some())
    }

    /// True if never synced or the last sync is older than the freshness
    /// window. While a refresh is in flight, returns `if_in_progress`.
    pub fn needs_refresh(&self, if_in_progress: bool) -> Result<bool> {
        let phase = self.lock()?;
        if phase.in_flight.is_some() {
            return Ok(if_in_progress);
        }
        Ok(match phase.last_synced_at {
            None => true,
            Some(ts) => {
                let age = Utc::now().signed_duration_since(ts);
                age.to_std().map_or(false, |age| age > FRESHNESS_WINDOW)
            }
        })
    }

    /// Download the dataset again, unless a refresh is already running.
    pub fn refresh(&self) -> Result<()> {
        let slot = {
            let mut phase = self.lock()?;
            if phase.in_flight.is_some() {
                log::info!("Refresh already in progress, joining it");
                return Ok(());
            }
            let slot = Arc::new(RefreshSlot::default());
            phase.in_flight = Some(Arc::clone(&slot));
            slot
        };

        let outcome = self.download_all();

        let mut phase = self.lock()?;
        phase.in_flight = None;
        let settled = match &outcome {
            Ok(synced_at) => {
                phase.last_synced_at = Some(*synced_at);
                Ok(())
            }
            Err(e) => {
                log::warn!("Refresh failed: {}", e);
                Err(e.duplicate())
            }
        };
        // Only this call settles the slot.
        let _ = slot.outcome.set(settled);
        drop(phase);
        self.idle.notify_all();

        outcome.map(|_| ())
    }

    /// Block until no refresh is in flight, returning the outcome of the one
    /// that was running when called (`Ok` if none was).
    pub fn wait_until_idle(&self) -> Result<()> {
        let mut phase = self.lock()?;
        let slot = match &phase.in_flight {
            Some(slot) => Arc::clone(slot),
            None => return Ok(()),
        };
        while slot.outcome.get().is_none() {
            phase = self
                .idle
                .wait(phase)
                .map_err(|_| PuzzleError::state("sync state lock poisoned"))?;
        }
        drop(phase);

        match slot.outcome.get() {
            Some(Err(e)) => Err(e.duplicate()),
            _ => Ok(()),
        }
    }

    /// Refresh if stale (or join a running refresh), then wait for it.
    pub fn ensure_fresh(&self) -> Result<()> {
        if self.needs_refresh(true)? {
            self.refresh()?;
        }
        self.wait_until_idle()
    }

    fn download_all(&self) -> Result<DateTime<Utc>> {
        let paths = self.transport.list()?;
        if paths.is_empty() {
            return Err(PuzzleError::transport(
                "listing dataset",
                "no parquet files found",
            ));
        }
        log::info!("Refreshing {} dataset parts", paths.len());

        let parquet = &self.db.parquet;
        parquet.clear()?;
        parquet.put(LIST_PARQUET_PATHS_KEY, &serde_json::to_vec(&paths)?)?;

        for (i, path) in paths.iter().enumerate() {
            log::info!("Downloading part {} of {}: {}", i + 1, paths.len(), path);
            let bytes = self.transport.fetch(path)?;
            parquet.put(path, &bytes)?;
        }

        let now = Utc::now();
        self.db.prefs.set(LAST_SYNCED_AT_KEY, &now.to_rfc3339())?;
        log::info!("Dataset synced at {}", now.to_rfc3339());
        Ok(now)
    }

    /// The cached file list, in read order.
    pub fn file_list(&self) -> Result<Vec<String>> {
        let raw = self.db.parquet.get(LIST_PARQUET_PATHS_KEY)?.ok_or_else(|| {
            PuzzleError::state("no parquet file paths found in the store, refresh required")
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// The cached bytes of one listed part.
    pub fn part(&self, path: &str) -> Result<Vec<u8>> {
        self.db.parquet.get(path)?.ok_or_else(|| {
            PuzzleError::state(format!(
                "parquet file '{}' not found in the store, refresh required",
                path
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::thread;

    #[derive(Default)]
    struct Counting {
        lists: AtomicUsize,
        fetches: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl DatasetTransport for Counting {
        fn list(&self) -> Result<Vec<String>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["data/a.parquet".to_string(), "data/b.parquet".to_string()])
        }

        fn fetch(&self, path: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(path) {
                return Err(PuzzleError::transport(path, "connection reset"));
            }
            Ok(path.as_bytes().to_vec())
        }
    }

    /// Listing blocks until released, announcing that it started.
    struct Gated {
        inner: Counting,
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl DatasetTransport for Gated {
        fn list(&self) -> Result<Vec<String>> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            self.inner.list()
        }

        fn fetch(&self, path: &str) -> Result<Vec<u8>> {
            self.inner.fetch(path)
        }
    }

    #[test]
    fn test_refresh_stores_parts_and_timestamp() {
        let db = Db::in_memory();
        let transport = Arc::new(Counting::default());
        let sync = DatasetSync::new(db.clone(), transport.clone()).unwrap();
        assert!(sync.needs_refresh(false).unwrap());

        sync.refresh().unwrap();
        assert!(!sync.needs_refresh(true).unwrap());
        assert_eq!(sync.file_list().unwrap(), vec!["data/a.parquet", "data/b.parquet"]);
        assert_eq!(sync.part("data/b.parquet").unwrap(), b"data/b.parquet");
        assert!(db.prefs.get(LAST_SYNCED_AT_KEY).unwrap().is_some());

        // A second manager reads the persisted marker.
        let again = DatasetSync::new(db, transport).unwrap();
        assert!(again.last_synced_at().unwrap().is_some());
        assert!(!again.needs_refresh(true).unwrap());
    }

    #[test]
    fn test_stale_marker_needs_refresh() {
        let db = Db::in_memory();
        let old = Utc::now() - chrono::Duration::days(8);
        db.prefs.set(LAST_SYNCED_AT_KEY, &old.to_rfc3339()).unwrap();
        let sync = DatasetSync::new(db.clone(), Arc::new(Counting::default())).unwrap();
        assert!(sync.needs_refresh(false).unwrap());

        let recent = Utc::now() - chrono::Duration::days(1);
        db.prefs.set(LAST_SYNCED_AT_KEY, &recent.to_rfc3339()).unwrap();
        let sync = DatasetSync::new(db, Arc::new(Counting::default())).unwrap();
        assert!(!sync.needs_refresh(true).unwrap());
    }

    #[test]
    fn test_failed_refresh_keeps_timestamp_absent() {
        let db = Db::in_memory();
        let transport = Arc::new(Counting {
            fail_on: Some("data/b.parquet"),
            ..Default::default()
        });
        let sync = DatasetSync::new(db, transport).unwrap();

        let err = sync.refresh().unwrap_err();
        assert!(matches!(err, PuzzleError::Transport { .. }));
        assert!(sync.last_synced_at().unwrap().is_none());
        assert!(sync.needs_refresh(false).unwrap());

        // The list was written, the second part never arrived.
        assert_eq!(sync.file_list().unwrap().len(), 2);
        assert!(sync.part("data/a.parquet").is_ok());
        assert!(matches!(
            sync.part("data/b.parquet"),
            Err(PuzzleError::State(_))
        ));
    }

    #[test]
    fn test_missing_file_list_is_state_error() {
        let sync = DatasetSync::new(Db::in_memory(), Arc::new(Counting::default())).unwrap();
        assert!(matches!(sync.file_list(), Err(PuzzleError::State(_))));
        assert!(sync.wait_until_idle().is_ok());
    }

    #[test]
    fn test_concurrent_refresh_is_single_flight() {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let transport = Arc::new(Gated {
            inner: Counting::default(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let sync = Arc::new(DatasetSync::new(Db::in_memory(), transport.clone()).unwrap());

        let first = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || sync.refresh())
        };
        entered_rx.recv().unwrap();

        // In flight: the second refresh joins, staleness uses the fallback.
        assert!(sync.is_refreshing().unwrap());
        sync.refresh().unwrap();
        assert!(!sync.needs_refresh(false).unwrap());
        assert!(sync.needs_refresh(true).unwrap());

        let waiter = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || sync.wait_until_idle())
        };

        release_tx.send(()).unwrap();
        first.join().unwrap().unwrap();
        waiter.join().unwrap().unwrap();
        sync.wait_until_idle().unwrap();

        assert_eq!(transport.inner.lists.load(Ordering::SeqCst), 1);
        assert_eq!(transport.inner.fetches.load(Ordering::SeqCst), 2);
        assert!(sync.last_synced_at().unwrap().is_some());
    }

    /// First listing blocks until released and then fails with a storage
    /// error; later listings succeed at once.
    struct FailsFirst {
        lists: AtomicUsize,
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl DatasetTransport for FailsFirst {
        fn list(&self) -> Result<Vec<String>> {
            if self.lists.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.lock().unwrap().send(()).unwrap();
                self.release.lock().unwrap().recv().unwrap();
                return Err(PuzzleError::storage(
                    LIST_PARQUET_PATHS_KEY,
                    "write",
                    std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                ));
            }
            Ok(vec!["data/a.parquet".to_string()])
        }

        fn fetch(&self, path: &str) -> Result<Vec<u8>> {
            Ok(path.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_waiter_gets_outcome_of_awaited_refresh() {
        let (entered_tx, entered_rx) = channel();
        let (release_tx, release_rx) = channel();
        let transport = Arc::new(FailsFirst {
            lists: AtomicUsize::new(0),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let sync = Arc::new(DatasetSync::new(Db::in_memory(), transport).unwrap());

        let first = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || sync.refresh())
        };
        entered_rx.recv().unwrap();

        let waiter = {
            let sync = Arc::clone(&sync);
            thread::spawn(move || sync.wait_until_idle())
        };
        // Held by the phase, the refreshing thread and the waiter.
        loop {
            let holders = sync
                .phase
                .lock()
                .unwrap()
                .in_flight
                .as_ref()
                .map_or(0, Arc::strong_count);
            if holders >= 3 {
                break;
            }
            thread::yield_now();
        }

        release_tx.send(()).unwrap();
        assert!(matches!(
            first.join().unwrap(),
            Err(PuzzleError::Storage { .. })
        ));

        // A newer refresh succeeds before the waiter necessarily wakes.
        sync.refresh().unwrap();
        assert!(sync.last_synced_at().unwrap().is_some());

        let err = waiter.join().unwrap().unwrap_err();
        match err {
            PuzzleError::Storage { key, source, .. } => {
                assert_eq!(key, LIST_PARQUET_PATHS_KEY);
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("expected storage error, got {:?}", other),
        }
        assert!(sync.wait_until_idle().is_ok());
    }

    #[test]
    fn test_ensure_fresh_skips_when_recent() {
        let transport = Arc::new(Counting::default());
        let sync = DatasetSync::new(Db::in_memory(), transport.clone()).unwrap();
        sync.ensure_fresh().unwrap();
        sync.ensure_fresh().unwrap();
        assert_eq!(transport.lists.load(Ordering::SeqCst), 1);
    }
}
