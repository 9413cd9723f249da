//! The export run: freshness, decode/filter/order, staging, formatting.
//!
//! Every step is sequential. Peak memory is one decode window plus the
//! collected matches; formatting reads the ordered records back one staged
//! chunk at a time.

use std::sync::Arc;

use crate::bucket::RecordBucket;
use crate::columnar::PuzzleFile;
use crate::error::Result;
use crate::pgn::{records_to_pgn, PgnFlags};
use crate::staging::Staging;
use crate::sync::DatasetSync;
use crate::types::{OrderBy, PuzzleRecord};
use crate::worker::SendWork;

/// Progress sink for a run.
pub trait Reporter {
    /// User-facing progress text.
    fn status(&self, msg: &str);

    /// Diagnostic text.
    fn log(&self, msg: &str);
}

/// Reporter that forwards to the `log` facade only.
pub struct LogReporter;

impl Reporter for LogReporter {
    fn status(&self, msg: &str) {
        log::info!("{}", msg);
    }

    fn log(&self, msg: &str) {
        log::debug!("{}", msg);
    }
}

/// Counts of one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub rows_read: usize,
    pub matched: usize,
    pub kept: usize,
    pub record_chunks: usize,
    pub pgn_chunks: usize,
}

pub struct Pipeline {
    sync: Arc<DatasetSync>,
    staging: Staging,
}

impl Pipeline {
    pub fn new(sync: Arc<DatasetSync>, staging: Staging) -> Self {
        Self { sync, staging }
    }

    pub fn run(&self, work: &SendWork, reporter: &dyn Reporter) -> Result<RunSummary> {
        work.validate()?;

        // Leftovers of an earlier run are stale.
        self.staging.clear()?;

        let outcome = self.run_stages(work, reporter);
        if let Err(e) = &outcome {
            // A failed run leaves no partial output behind.
            reporter.log(&format!("Run failed, discarding staged chunks: {}", e));
            if let Err(clear_err) = self.staging.clear() {
                log::warn!("Failed to discard staged chunks: {}", clear_err);
            }
        }
        outcome
    }

    fn run_stages(&self, work: &SendWork, reporter: &dyn Reporter) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        reporter.status("Checking dataset freshness...");
        if self.sync.needs_refresh(true)? {
            reporter.status("Downloading puzzle dataset...");
        }
        self.sync.ensure_fresh()?;

        let ordered = self.collect(work, reporter, &mut summary)?;
        summary.kept = ordered.len();

        summary.record_chunks = self.stage_records(ordered, work.record_to_pgn_chunk_size)?;
        reporter.log(&format!(
            "Staged {} records in {} chunks",
            summary.kept, summary.record_chunks
        ));

        summary.pgn_chunks = self.format_chunks(work, reporter, summary.kept)?;
        reporter.status(&format!("Exported {} puzzles", summary.kept));
        Ok(summary)
    }

    fn collect(
        &self,
        work: &SendWork,
        reporter: &dyn Reporter,
        summary: &mut RunSummary,
    ) -> Result<Vec<PuzzleRecord>> {
        let opts = &work.opts;
        let files = self.sync.file_list()?;
        let mut bucket = RecordBucket::new(opts.order_by);

        for (i, path) in files.iter().enumerate() {
            reporter.log(&format!("Retrieving parquet file {}", path));
            let file = PuzzleFile::open(path.as_str(), self.sync.part(path)?)?;
            let num_rows = file.num_rows();
            reporter.log(&format!("Retrieved {}, numRows: {}", path, num_rows));

            for window in file.windows(work.row_read_chunk_size) {
                reporter.status(&format!(
                    "Reading parquet file {} of {}, rows {}/{}...",
                    i + 1,
                    files.len(),
                    window.start,
                    num_rows
                ));
                let rows = file.read_rows(window.start, window.end)?;
                summary.rows_read += rows.len();
                for record in rows {
                    if opts.matches(&record) {
                        bucket.push(record)?;
                    }
                }
            }
        }

        summary.matched = bucket.len();
        reporter.log(&format!(
            "All parquet files read, {} of {} rows match",
            summary.matched, summary.rows_read
        ));
        match opts.order_by {
            OrderBy::ByRating => reporter.status("Sorting by rating"),
            OrderBy::ByPopularity => reporter.status("Sorting by popularity"),
            OrderBy::None => {}
        }
        if let Some(max) = opts.max_records {
            reporter.status(&format!("Only keeping first {}", max));
        }
        Ok(bucket.into_ordered(opts.max_records))
    }

    fn stage_records(&self, ordered: Vec<PuzzleRecord>, chunk_size: usize) -> Result<usize> {
        let mut staged = 0;
        for (i, chunk) in ordered.chunks(chunk_size).enumerate() {
            self.staging.set_chunk(i, &chunk.to_vec())?;
            staged += 1;
        }
        Ok(staged)
    }

    fn format_chunks(&self, work: &SendWork, reporter: &dyn Reporter, total: usize) -> Result<usize> {
        let flags = PgnFlags::from(&work.opts);
        let mut written = 0;
        for (i, batch) in self.staging.iter_chunks::<Vec<PuzzleRecord>>().enumerate() {
            reporter.status(&format!(
                "Exporting puzzles to PGN... ({}/{})",
                (i * work.record_to_pgn_chunk_size).min(total),
                total
            ));
            let text = records_to_pgn(&batch?, flags)?;
            self.staging.set_chunk(i, &text)?;
            written += 1;
        }
        Ok(written)
    }
}
