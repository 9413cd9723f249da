//! Messages exchanged between the initiator and the background executor.
//!
//! Both families are plain data. On the wire (serde) each message carries its
//! variant name in a `tpe` field.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RECORD_TO_PGN_CHUNK_SIZE, DEFAULT_ROW_READ_CHUNK_SIZE};
use crate::error::{PuzzleError, Result};
use crate::types::FilterSortOptions;

/// The unit of work of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendWork {
    pub opts: FilterSortOptions,
    /// Rows decoded per window.
    pub row_read_chunk_size: usize,
    /// Records per staged chunk, and so per output chunk.
    #[serde(rename = "recordToPGNChunkSize")]
    pub record_to_pgn_chunk_size: usize,
}

impl SendWork {
    pub fn new(opts: FilterSortOptions) -> Self {
        Self {
            opts,
            row_read_chunk_size: DEFAULT_ROW_READ_CHUNK_SIZE,
            record_to_pgn_chunk_size: DEFAULT_RECORD_TO_PGN_CHUNK_SIZE,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_read_chunk_size == 0 {
            return Err(PuzzleError::validation("row read chunk size must be > 0"));
        }
        if self.record_to_pgn_chunk_size == 0 {
            return Err(PuzzleError::validation(
                "record to PGN chunk size must be > 0",
            ));
        }
        self.opts.validate()
    }
}

/// Initiator to executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tpe", rename_all = "camelCase")]
pub enum MainMessage {
    SendWork(SendWork),
}

/// Executor to initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tpe", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// Progress text for the user.
    Status { status: String },
    /// Diagnostic text, never shown as progress.
    Log { log: String },
    /// Terminal: results are in the staging namespace.
    WorkDone,
    /// Terminal: the run failed.
    Error { error: String },
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerMessage::WorkDone | WorkerMessage::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderBy;

    #[test]
    fn test_send_work_wire_shape() {
        let work = SendWork {
            opts: FilterSortOptions {
                order_by: OrderBy::ByRating,
                max_records: Some(2),
                ..Default::default()
            },
            row_read_chunk_size: 10,
            record_to_pgn_chunk_size: 5,
        };
        let json = serde_json::to_value(MainMessage::SendWork(work.clone())).unwrap();
        assert_eq!(json["tpe"], "sendWork");
        assert_eq!(json["rowReadChunkSize"], 10);
        assert_eq!(json["recordToPGNChunkSize"], 5);
        assert_eq!(json["opts"]["orderBy"], "byRating");
        assert_eq!(json["opts"]["maxRecords"], 2);

        let back: MainMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, MainMessage::SendWork(work));
    }

    #[test]
    fn test_worker_message_tags() {
        let status = serde_json::to_value(WorkerMessage::Status {
            status: "Reading".to_string(),
        })
        .unwrap();
        assert_eq!(status["tpe"], "status");
        assert_eq!(status["status"], "Reading");

        let done = serde_json::to_string(&WorkerMessage::WorkDone).unwrap();
        assert_eq!(done, r#"{"tpe":"workDone"}"#);

        let err: WorkerMessage =
            serde_json::from_str(r#"{"tpe":"error","error":"boom"}"#).unwrap();
        assert!(err.is_terminal());
        assert!(!WorkerMessage::Log { log: String::new() }.is_terminal());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let mut work = SendWork::new(FilterSortOptions::default());
        assert!(work.validate().is_ok());
        work.row_read_chunk_size = 0;
        assert!(work.validate().is_err());
        work.row_read_chunk_size = 1;
        work.record_to_pgn_chunk_size = 0;
        assert!(work.validate().is_err());
    }
}
