//! Unified error type for the puzzle_pgn library.
//!
//! Library code returns `PuzzleError`; the CLI wraps it in `anyhow::Result`
//! for convenience.
//!
//! # Error Categories
//!
//! - **Transport**: listing or fetching a remote dataset part failed
//! - **Decode**: a cached part or staged batch is not decodable parquet
//! - **State**: an operation ran out of its required order
//! - **Move**: a puzzle's FEN or UCI moves do not fit the position
//! - **Storage**: durable key/value store I/O
//! - **Overflow**: a bucket key span exceeded its limit
//! - **Validation**: invalid options or configuration values
//! - **Worker**: terminal error reported by the background executor

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Unified error type for the puzzle_pgn library.
#[derive(Debug)]
pub enum PuzzleError {
    /// Remote listing or download failure.
    Transport { context: String, detail: String },

    /// Columnar decode failure (corrupt blob, unexpected column type, null).
    Decode {
        context: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation invoked out of order (missing file list, missing chunk, ...).
    State(String),

    /// A puzzle's notation cannot be played against its position.
    Move { puzzle_id: String, detail: String },

    /// I/O error from the durable store, with the key or path involved.
    Storage {
        key: String,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Numeric span or size limit exceeded.
    Overflow {
        context: String,
        limit: usize,
        actual: usize,
    },

    /// Invalid parameters.
    Validation(String),

    /// Failure reported by the background executor's terminal message.
    Worker(String),
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::Transport { context, detail } => {
                write!(f, "Transport error ({}): {}", context, detail)
            }
            PuzzleError::Decode { context, source } => {
                if let Some(src) = source {
                    write!(f, "Decode error ({}): {}", context, src)
                } else {
                    write!(f, "Decode error: {}", context)
                }
            }
            PuzzleError::State(msg) => write!(f, "State error: {}", msg),
            PuzzleError::Move { puzzle_id, detail } => {
                write!(f, "Move error in puzzle '{}': {}", puzzle_id, detail)
            }
            PuzzleError::Storage {
                key,
                operation,
                source,
            } => write!(
                f,
                "Storage error during {} on '{}': {}",
                operation, key, source
            ),
            PuzzleError::Overflow {
                context,
                limit,
                actual,
            } => write!(
                f,
                "Overflow in {}: limit is {}, got {}",
                context, limit, actual
            ),
            PuzzleError::Validation(msg) => write!(f, "Validation error: {}", msg),
            PuzzleError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for PuzzleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PuzzleError::Storage { source, .. } => Some(source),
            PuzzleError::Decode {
                source: Some(s), ..
            } => Some(s.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversion traits
// ============================================================================

impl From<std::io::Error> for PuzzleError {
    fn from(err: std::io::Error) -> Self {
        PuzzleError::Storage {
            key: String::new(),
            operation: "unknown",
            source: err,
        }
    }
}

impl From<parquet::errors::ParquetError> for PuzzleError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        PuzzleError::Decode {
            context: "parquet operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<arrow::error::ArrowError> for PuzzleError {
    fn from(err: arrow::error::ArrowError) -> Self {
        PuzzleError::Decode {
            context: "arrow operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for PuzzleError {
    fn from(err: serde_json::Error) -> Self {
        PuzzleError::Decode {
            context: "json value".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Convenience type alias for Results using PuzzleError.
pub type Result<T> = std::result::Result<T, PuzzleError>;

// ============================================================================
// Helper constructors
// ============================================================================

impl PuzzleError {
    /// Create a transport error.
    pub fn transport(context: impl Into<String>, detail: impl Into<String>) -> Self {
        PuzzleError::Transport {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Create a decode error without source.
    pub fn decode(context: impl Into<String>) -> Self {
        PuzzleError::Decode {
            context: context.into(),
            source: None,
        }
    }

    /// Create a state error.
    pub fn state(msg: impl Into<String>) -> Self {
        PuzzleError::State(msg.into())
    }

    /// Create a move error for one puzzle.
    pub fn bad_move(puzzle_id: impl Into<String>, detail: impl Into<String>) -> Self {
        PuzzleError::Move {
            puzzle_id: puzzle_id.into(),
            detail: detail.into(),
        }
    }

    /// Create a storage error with key context.
    pub fn storage(key: impl Into<String>, operation: &'static str, source: std::io::Error) -> Self {
        PuzzleError::Storage {
            key: key.into(),
            operation,
            source,
        }
    }

    /// Create an overflow error.
    pub fn overflow(context: impl Into<String>, limit: usize, actual: usize) -> Self {
        PuzzleError::Overflow {
            context: context.into(),
            limit,
            actual,
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        PuzzleError::Validation(msg.into())
    }

    /// Copy of this error with the same variant and fields. Wrapped sources
    /// are carried over by message (and I/O kind).
    pub fn duplicate(&self) -> Self {
        match self {
            PuzzleError::Transport { context, detail } => PuzzleError::transport(context, detail),
            PuzzleError::Decode { context, source } => PuzzleError::Decode {
                context: context.clone(),
                source: source.as_ref().map(|s| s.to_string().into()),
            },
            PuzzleError::State(msg) => PuzzleError::State(msg.clone()),
            PuzzleError::Move { puzzle_id, detail } => PuzzleError::bad_move(puzzle_id, detail),
            PuzzleError::Storage {
                key,
                operation,
                source,
            } => PuzzleError::storage(
                key.clone(),
                *operation,
                std::io::Error::new(source.kind(), source.to_string()),
            ),
            PuzzleError::Overflow {
                context,
                limit,
                actual,
            } => PuzzleError::overflow(context, *limit, *actual),
            PuzzleError::Validation(msg) => PuzzleError::Validation(msg.clone()),
            PuzzleError::Worker(msg) => PuzzleError::Worker(msg.clone()),
        }
    }
}

// ============================================================================
// Thread-safe error capture
// ============================================================================

/// Thread-safe error capture that stores only the first error.
///
/// The executor thread uses it when the initiator has dropped its end of
/// the channel and a terminal error can no longer be delivered.
pub struct FirstErrorCapture {
    has_error: AtomicBool,
    error: Mutex<Option<PuzzleError>>,
}

impl FirstErrorCapture {
    /// Create a new, empty error capture.
    pub fn new() -> Self {
        Self {
            has_error: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Store an error, but only if no error has been stored yet.
    /// Returns true if this error was stored, false if an error already existed.
    pub fn store(&self, err: PuzzleError) -> bool {
        if self
            .has_error
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            if let Ok(mut guard) = self.error.lock() {
                *guard = Some(err);
            }
            true
        } else {
            false
        }
    }

    /// Store a string error, wrapped as `PuzzleError::Worker`.
    pub fn store_msg(&self, msg: impl Into<String>) -> bool {
        self.store(PuzzleError::Worker(msg.into()))
    }

    /// Retrieve the stored error, if any.
    pub fn get(&self) -> Option<PuzzleError> {
        if self.has_error.load(Ordering::SeqCst) {
            self.error.lock().ok().and_then(|mut g| g.take())
        } else {
            None
        }
    }

    /// Check if an error has been stored.
    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }
}

impl Default for FirstErrorCapture {
    fn default() -> Self {
        Self::new()
    }
}
