//! Rolling diagnostic log kept in the durable store.
//!
//! Lines survive restarts so a failed export can be inspected afterwards with
//! `puzzle-pgn log`. Keys are `<millis:016>-<drift:04>`, which sort in write
//! order even when several lines share a millisecond.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use crate::error::{PuzzleError, Result};
use crate::store::KvStore;

#[derive(Debug, Serialize, Deserialize)]
struct LogLine {
    at_millis: i64,
    level: String,
    message: String,
}

pub struct PermaLog {
    store: Arc<dyn KvStore>,
    window: usize,
    /// Last millisecond used and the drift counter within it.
    clock: Mutex<(i64, u32)>,
}

impl PermaLog {
    pub fn new(store: Arc<dyn KvStore>, window: usize) -> Self {
        Self {
            store,
            window: window.max(1),
            clock: Mutex::new((i64::MIN, 0)),
        }
    }

    fn next_key(&self, now_millis: i64) -> Result<(i64, String)> {
        let mut clock = self
            .clock
            .lock()
            .map_err(|_| PuzzleError::state("permanent log clock poisoned"))?;
        let (last, drift) = *clock;
        // Never go backwards, even if the wall clock does.
        *clock = if now_millis > last {
            (now_millis, 0)
        } else {
            (last, drift + 1)
        };
        let (millis, drift) = *clock;
        Ok((millis, format!("{:016}-{:04}", millis, drift)))
    }

    pub fn record(&self, level: log::Level, message: &str) -> Result<()> {
        let (at_millis, key) = self.next_key(Utc::now().timestamp_millis())?;
        let line = LogLine {
            at_millis,
            level: level.as_str().to_string(),
            message: message.to_string(),
        };
        self.store.put(&key, &serde_json::to_vec(&line)?)
    }

    pub fn info(&self, message: &str) -> Result<()> {
        self.record(log::Level::Info, message)
    }

    /// Trim to the last `window` lines, then render them oldest first.
    pub fn dump(&self) -> Result<String> {
        let mut keys = self.store.keys()?;
        keys.sort();
        if keys.len() > self.window {
            let first_kept = keys.len() - self.window;
            self.store
                .remove_range(Bound::Unbounded, Bound::Excluded(keys[first_kept].as_str()))?;
            keys.drain(..first_kept);
        }

        let mut lines = Vec::with_capacity(keys.len());
        for key in &keys {
            let Some(raw) = self.store.get(key)? else {
                continue;
            };
            let line: LogLine = serde_json::from_slice(&raw)?;
            let at = DateTime::<Utc>::from_timestamp_millis(line.at_millis)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| line.at_millis.to_string());
            lines.push(format!("{} {} {}", at, line.level, line.message));
        }
        Ok(lines.join("\n"))
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}
