//! Chess puzzle dataset to PGN export.
//!
//! Caches the puzzle dataset's parquet parts in a local store, filters and
//! orders them in bounded row windows, stages the result in numbered chunks
//! and formats each puzzle as a PGN game, all on a background executor.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use puzzle_pgn::{
//!     DatasetSync, Db, FilterSortOptions, HubTransport, OrderBy, PgnExport, Pipeline,
//!     SendWork, Staging, WorkerHandle,
//! };
//!
//! let db = Db::open(".puzzle-pgn")?;
//! let sync = Arc::new(DatasetSync::new(db.clone(), Arc::new(HubTransport::default()))?);
//! let staging = Staging::new(db.tmp.clone());
//!
//! let mut worker = WorkerHandle::spawn(Pipeline::new(sync, staging.clone()))?;
//! let opts = FilterSortOptions {
//!     order_by: OrderBy::ByRating,
//!     max_records: Some(100),
//!     ..Default::default()
//! };
//! worker.run(SendWork::new(opts), |s| eprintln!("{}", s), |_| {})?;
//! PgnExport::new(staging).write_to("puzzles.pgn".as_ref())?;
//! # Ok::<(), puzzle_pgn::PuzzleError>(())
//! ```

pub mod bucket;
pub mod codec;
pub mod columnar;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod logging;
pub mod permalog;
pub mod pgn;
pub mod pipeline;
pub mod staging;
pub mod store;
pub mod sync;
pub mod themes;
pub mod transport;
pub mod types;
pub mod worker;

pub use bucket::RecordBucket;
pub use columnar::{encode_records, PuzzleFile, RecordWriteOptions};
pub use error::{FirstErrorCapture, PuzzleError, Result};
pub use export::{OutputFormat, PgnExport};
pub use permalog::PermaLog;
pub use pgn::{puzzle_to_pgn, records_to_pgn, PgnFlags};
pub use pipeline::{LogReporter, Pipeline, Reporter, RunSummary};
pub use staging::{ChunkIter, StagedBatch, Staging};
pub use store::{Db, DirStore, KvStore, MemoryStore, Preferences};
pub use sync::DatasetSync;
pub use transport::{DatasetTransport, HubTransport, MirrorTransport};
pub use types::{FilterSortOptions, OrderBy, PuzzleRecord};
pub use worker::{MainMessage, SendWork, WorkerHandle, WorkerMessage};
