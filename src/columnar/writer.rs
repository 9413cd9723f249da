//! Encode puzzle rows as an in-memory parquet blob.
//!
//! Used to stage filtered record batches between pipeline passes, and by
//! tests to fabricate dataset parts.

use arrow::array::{ArrayRef, Int64Array, ListBuilder, StringArray, StringBuilder};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{WriterProperties, WriterVersion};
use std::sync::Arc;

use super::puzzle_schema;
use crate::error::{PuzzleError, Result};
use crate::types::PuzzleRecord;

/// Options for [`encode_records`].
#[derive(Debug, Clone)]
pub struct RecordWriteOptions {
    /// Maximum rows per row group. Default: 100,000.
    pub row_group_size: usize,
}

impl Default for RecordWriteOptions {
    fn default() -> Self {
        Self {
            row_group_size: 100_000,
        }
    }
}

impl RecordWriteOptions {
    pub fn validate(&self) -> Result<()> {
        if self.row_group_size == 0 {
            return Err(PuzzleError::validation("row_group_size must be > 0"));
        }
        Ok(())
    }

    fn to_writer_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .set_compression(Compression::ZSTD(ZstdLevel::default()))
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Encode `records` with the puzzle schema into a zstd parquet blob.
pub fn encode_records(records: &[PuzzleRecord], options: &RecordWriteOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let schema = puzzle_schema();

    let ids: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.id.as_str()),
    ));
    let fens: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.initial_position.as_str()),
    ));
    let moves: ArrayRef = Arc::new(StringArray::from_iter_values(
        records.iter().map(|r| r.move_list.as_str()),
    ));
    let ratings: ArrayRef = Arc::new(Int64Array::from_iter_values(
        records.iter().map(|r| r.rating),
    ));
    let popularity: ArrayRef = Arc::new(Int64Array::from_iter_values(
        records.iter().map(|r| r.popularity),
    ));

    let mut themes_builder = ListBuilder::new(StringBuilder::new());
    for record in records {
        let values = themes_builder.values();
        for theme in &record.themes {
            values.append_value(theme);
        }
        themes_builder.append(true);
    }
    let themes: ArrayRef = Arc::new(themes_builder.finish());

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![ids, fens, moves, ratings, popularity, themes],
    )?;

    let mut buf = Vec::new();
    {
        let mut writer =
            ArrowWriter::try_new(&mut buf, schema, Some(options.to_writer_properties()))?;
        writer.write(&batch)?;
        writer.close()?;
    }
    Ok(buf)
}
