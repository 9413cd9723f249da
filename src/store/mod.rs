//! Durable key/value storage.
//!
//! The pipeline only talks to the [`KvStore`] trait. Three namespaces are
//! used, each its own store instance:
//!
//! ```text
//! <root>/
//! ├── prefs.toml   # freshness marker, survives namespace resets
//! ├── parquet/     # file list + one entry per dataset part
//! ├── tmp/         # staged chunks of the current pipeline run
//! └── log/         # permanent diagnostic log lines
//! ```

mod db;
mod dir;
mod memory;
mod prefs;

use std::ops::Bound;

use crate::error::Result;

pub use db::Db;
pub use dir::DirStore;
pub use memory::MemoryStore;
pub use prefs::Preferences;

/// One namespace of the durable key/value surface.
///
/// Keys iterate in insertion order; overwriting a key keeps its position.
/// Values may be tens of megabytes (raw dataset parts).
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// All keys, in insertion order.
    fn keys(&self) -> Result<Vec<String>>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key within the bounds, compared lexicographically.
    fn remove_range(&self, start: Bound<&str>, end: Bound<&str>) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

pub(crate) fn in_bounds(key: &str, start: Bound<&str>, end: Bound<&str>) -> bool {
    let after_start = match start {
        Bound::Included(s) => key >= s,
        Bound::Excluded(s) => key > s,
        Bound::Unbounded => true,
    };
    let before_end = match end {
        Bound::Included(e) => key <= e,
        Bound::Excluded(e) => key < e,
        Bound::Unbounded => true,
    };
    after_start && before_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds("b", Bound::Included("b"), Bound::Unbounded));
        assert!(!in_bounds("b", Bound::Excluded("b"), Bound::Unbounded));
        assert!(in_bounds("a", Bound::Unbounded, Bound::Excluded("b")));
        assert!(!in_bounds("b", Bound::Unbounded, Bound::Excluded("b")));
        assert!(in_bounds("b", Bound::Unbounded, Bound::Included("b")));
    }
}
