//! Constants used throughout the puzzle_pgn library for dataset locations,
//! storage keys, pipeline tuning and safety limits.
//!
//! Centralizing these constants keeps the worker, the sync manager and the
//! CLI in agreement about keys and defaults.

use std::time::Duration;

// ============================================================================
// Remote dataset
// ============================================================================

/// Tree listing endpoint of the puzzle dataset (JSON).
pub const DEFAULT_LIST_URL: &str =
    "https://huggingface.co/api/datasets/Lichess/chess-puzzles/tree/main/data";

/// Base URL that listed paths are resolved against for download.
pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://huggingface.co/datasets/Lichess/chess-puzzles/resolve/main";

/// Extension of dataset parts.
pub const PARQUET_EXTENSION: &str = "parquet";

/// A completed sync older than this is stale.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// ============================================================================
// Storage keys
// ============================================================================

/// Namespace holding the cached dataset parts and their file list.
pub const NS_PARQUET: &str = "parquet";

/// Namespace holding staged chunks of the current pipeline run.
pub const NS_TMP: &str = "tmp";

/// Namespace holding the permanent diagnostic log.
pub const NS_LOG: &str = "log";

/// Key of the ordered file list inside `NS_PARQUET`.
/// Listed paths are themselves keys of the part contents.
pub const LIST_PARQUET_PATHS_KEY: &str = "parquetPaths";

/// Preferences key of the last successful sync (RFC 3339).
pub const LAST_SYNCED_AT_KEY: &str = "last-synced-at";

/// Preferences file name at the store root.
pub const PREFERENCES_FILE: &str = "prefs.toml";

// ============================================================================
// Pipeline tuning
// ============================================================================

/// Rows decoded per window from one dataset part.
pub const DEFAULT_ROW_READ_CHUNK_SIZE: usize = 1_000_000;

/// Records formatted per staged output chunk.
pub const DEFAULT_RECORD_TO_PGN_CHUNK_SIZE: usize = 50_000;

/// Lines kept by the permanent diagnostic log.
pub const DEFAULT_LOG_WINDOW: usize = 100;

// ============================================================================
// Puzzle domain
// ============================================================================

/// Lowest rating offered as a filter bound.
pub const FLOOR_PUZZLE_RATING: i64 = 400;

/// Highest rating offered as a filter bound.
pub const CEILING_PUZZLE_RATING: i64 = 4000;

/// Maximum distance between the smallest and largest ordering key.
///
/// Ratings and popularity are small bounded integers; a wider span means the
/// input is not what bucketed ordering was built for.
pub const MAX_BUCKET_KEY_SPAN: usize = 1 << 20;

/// Site tag prefix, completed with the puzzle id.
pub const PUZZLE_SITE_PREFIX: &str = "https://lichess.org/training/";
