//! Windowed decode of one parquet blob into puzzle records.
//!
//! The blob is held as [`Bytes`] so every window decode shares the same
//! buffer. A window only touches the row groups it overlaps, and rows outside
//! the window are skipped by a row selection, so peak memory is bounded by the
//! window size rather than by the file.

use arrow::array::{
    Array, ArrayRef, GenericListArray, Int64Array, OffsetSizeTrait, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReaderBuilder, RowSelection,
    RowSelector,
};
use parquet::arrow::ProjectionMask;
use std::ops::Range;

use super::{COL_FEN, COL_ID, COL_MOVES, COL_POPULARITY, COL_RATING, COL_THEMES, PUZZLE_COLUMNS};
use crate::error::{PuzzleError, Result};
use crate::types::PuzzleRecord;

/// One opened dataset part (or staged record batch).
pub struct PuzzleFile {
    name: String,
    bytes: Bytes,
    metadata: ArrowReaderMetadata,
    projection: ProjectionMask,
    /// (first row, row count) per row group.
    row_groups: Vec<(usize, usize)>,
    num_rows: usize,
}

impl PuzzleFile {
    /// Parse the footer and check the projected columns exist.
    ///
    /// # Errors
    /// Returns `PuzzleError::Decode` if the blob is not parquet, uses an
    /// unsupported codec, or lacks one of the projected columns.
    pub fn open(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        let bytes = bytes.into();

        let metadata = ArrowReaderMetadata::load(&bytes, ArrowReaderOptions::new()).map_err(
            |e| PuzzleError::Decode {
                context: format!("reading footer of '{}'", name),
                source: Some(Box::new(e)),
            },
        )?;

        let schema = metadata.schema();
        let mut roots = Vec::with_capacity(PUZZLE_COLUMNS.len());
        for column in PUZZLE_COLUMNS {
            let idx = schema.index_of(column).map_err(|_| {
                PuzzleError::decode(format!("'{}' is missing required column '{}'", name, column))
            })?;
            roots.push(idx);
        }
        let projection = ProjectionMask::roots(metadata.parquet_schema(), roots);

        let mut row_groups = Vec::with_capacity(metadata.metadata().num_row_groups());
        let mut offset = 0usize;
        for rg in metadata.metadata().row_groups() {
            let rows = rg.num_rows() as usize;
            row_groups.push((offset, rows));
            offset += rows;
        }

        Ok(Self {
            name,
            bytes,
            metadata,
            projection,
            row_groups,
            num_rows: offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Consecutive row ranges of at most `window` rows covering the file.
    pub fn windows(&self, window: usize) -> RowWindows {
        RowWindows {
            next: 0,
            total: self.num_rows,
            window: window.max(1),
        }
    }

    pub fn read_all(&self) -> Result<Vec<PuzzleRecord>> {
        self.read_rows(0, self.num_rows)
    }

    /// Decode rows `start..end` (end clamped to the row count).
    pub fn read_rows(&self, start: usize, end: usize) -> Result<Vec<PuzzleRecord>> {
        let end = end.min(self.num_rows);
        if start >= end {
            return Ok(Vec::new());
        }

        // Row groups overlapping the window, and how the window sits in them.
        let selected: Vec<usize> = self
            .row_groups
            .iter()
            .enumerate()
            .filter(|(_, &(first, rows))| first < end && first + rows > start)
            .map(|(i, _)| i)
            .collect();
        let group_start = self.row_groups[selected[0]].0;
        let group_rows: usize = selected.iter().map(|&i| self.row_groups[i].1).sum();

        let skip = start - group_start;
        let take = end - start;
        let trailing = group_rows - skip - take;

        let mut selectors = Vec::with_capacity(3);
        if skip > 0 {
            selectors.push(RowSelector::skip(skip));
        }
        selectors.push(RowSelector::select(take));
        if trailing > 0 {
            selectors.push(RowSelector::skip(trailing));
        }

        let reader =
            ParquetRecordBatchReaderBuilder::new_with_metadata(self.bytes.clone(), self.metadata.clone())
                .with_row_groups(selected)
                .with_row_selection(RowSelection::from(selectors))
                .with_projection(self.projection.clone())
                .with_batch_size(take)
                .build()
                .map_err(|e| PuzzleError::Decode {
                    context: format!("building reader for '{}'", self.name),
                    source: Some(Box::new(e)),
                })?;

        let mut records = Vec::with_capacity(take);
        for batch in reader {
            let batch = batch.map_err(|e| PuzzleError::Decode {
                context: format!("decoding rows {}..{} of '{}'", start, end, self.name),
                source: Some(Box::new(e)),
            })?;
            self.decode_batch(&batch, start + records.len(), &mut records)?;
        }

        if records.len() != take {
            return Err(PuzzleError::decode(format!(
                "'{}': expected {} rows in window {}..{}, decoded {}",
                self.name,
                take,
                start,
                end,
                records.len()
            )));
        }
        Ok(records)
    }

    fn decode_batch(
        &self,
        batch: &RecordBatch,
        first_row: usize,
        out: &mut Vec<PuzzleRecord>,
    ) -> Result<()> {
        let ids = self.string_column(batch, COL_ID)?;
        let fens = self.string_column(batch, COL_FEN)?;
        let moves = self.string_column(batch, COL_MOVES)?;
        let ratings = self.int_column(batch, COL_RATING)?;
        let popularity = self.int_column(batch, COL_POPULARITY)?;
        let themes = self.themes_column(batch)?;

        for i in 0..batch.num_rows() {
            for (column, null) in [
                (COL_ID, ids.is_null(i)),
                (COL_FEN, fens.is_null(i)),
                (COL_MOVES, moves.is_null(i)),
                (COL_RATING, ratings.is_null(i)),
                (COL_POPULARITY, popularity.is_null(i)),
            ] {
                if null {
                    return Err(PuzzleError::decode(format!(
                        "'{}': unexpected null in column '{}' at row {}",
                        self.name,
                        column,
                        first_row + i
                    )));
                }
            }
            out.push(PuzzleRecord {
                id: ids.value(i).to_string(),
                initial_position: fens.value(i).to_string(),
                move_list: moves.value(i).to_string(),
                rating: ratings.value(i),
                popularity: popularity.value(i),
                themes: themes[i].clone(),
            });
        }
        Ok(())
    }

    fn column<'a>(&self, batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
        batch.column_by_name(name).ok_or_else(|| {
            PuzzleError::decode(format!("'{}': column '{}' not decoded", self.name, name))
        })
    }

    fn string_column(&self, batch: &RecordBatch, name: &str) -> Result<StringArray> {
        let casted = cast(self.column(batch, name)?, &DataType::Utf8)?;
        casted
            .as_any()
            .downcast_ref::<StringArray>()
            .cloned()
            .ok_or_else(|| {
                PuzzleError::decode(format!("'{}': column '{}' is not a string", self.name, name))
            })
    }

    fn int_column(&self, batch: &RecordBatch, name: &str) -> Result<Int64Array> {
        let casted = cast(self.column(batch, name)?, &DataType::Int64)?;
        casted
            .as_any()
            .downcast_ref::<Int64Array>()
            .cloned()
            .ok_or_else(|| {
                PuzzleError::decode(format!(
                    "'{}': column '{}' is not an integer",
                    self.name, name
                ))
            })
    }

    /// Themes come either as a list of strings or one space separated string.
    fn themes_column(&self, batch: &RecordBatch) -> Result<Vec<Vec<String>>> {
        let column = self.column(batch, COL_THEMES)?;
        match column.data_type() {
            DataType::List(_) => list_of_strings(
                column
                    .as_any()
                    .downcast_ref::<GenericListArray<i32>>()
                    .ok_or_else(|| PuzzleError::decode("Themes list downcast failed"))?,
            ),
            DataType::LargeList(_) => list_of_strings(
                column
                    .as_any()
                    .downcast_ref::<GenericListArray<i64>>()
                    .ok_or_else(|| PuzzleError::decode("Themes large list downcast failed"))?,
            ),
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
                let strings = self.string_column(batch, COL_THEMES)?;
                Ok((0..strings.len())
                    .map(|i| {
                        if strings.is_null(i) {
                            Vec::new()
                        } else {
                            strings
                                .value(i)
                                .split_whitespace()
                                .map(str::to_string)
                                .collect()
                        }
                    })
                    .collect())
            }
            other => Err(PuzzleError::decode(format!(
                "'{}': column '{}' has unsupported type {:?}",
                self.name, COL_THEMES, other
            ))),
        }
    }
}

fn list_of_strings<O: OffsetSizeTrait>(list: &GenericListArray<O>) -> Result<Vec<Vec<String>>> {
    let values = cast(list.values(), &DataType::Utf8)?;
    let values = values
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| PuzzleError::decode("Themes items are not strings"))?;
    let offsets = list.value_offsets();

    Ok((0..list.len())
        .map(|i| {
            if list.is_null(i) {
                return Vec::new();
            }
            (offsets[i].as_usize()..offsets[i + 1].as_usize())
                .filter(|&j| !values.is_null(j))
                .map(|j| values.value(j).to_string())
                .collect()
        })
        .collect())
}

/// Iterator over consecutive row windows of one file.
#[derive(Debug, Clone)]
pub struct RowWindows {
    next: usize,
    total: usize,
    window: usize,
}

impl Iterator for RowWindows {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next;
        let end = (start + self.window).min(self.total);
        self.next = end;
        Some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columnar::{encode_records, RecordWriteOptions};
    use arrow::array::ListBuilder;
    use arrow::array::StringBuilder;
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn records(n: usize) -> Vec<PuzzleRecord> {
        (0..n)
            .map(|i| PuzzleRecord {
                id: format!("p{:04}", i),
                initial_position: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
                    .to_string(),
                move_list: "e2e4 e7e5".to_string(),
                rating: 1000 + i as i64,
                popularity: (i as i64 % 201) - 100,
                themes: if i % 2 == 0 {
                    vec!["opening".to_string()]
                } else {
                    vec![]
                },
            })
            .collect()
    }

    #[test]
    fn test_windows_cover_file() {
        let blob = encode_records(&records(10), &RecordWriteOptions::default()).unwrap();
        let file = PuzzleFile::open("t", blob).unwrap();
        let windows: Vec<_> = file.windows(4).collect();
        assert_eq!(windows, vec![0..4, 4..8, 8..10]);
        assert_eq!(file.windows(100).count(), 1);
    }

    #[test]
    fn test_windows_across_row_groups_match_full_read() {
        let original = records(23);
        let blob = encode_records(&original, &RecordWriteOptions { row_group_size: 5 }).unwrap();
        let file = PuzzleFile::open("multi", blob).unwrap();
        assert_eq!(file.num_rows(), 23);

        let mut windowed = Vec::new();
        for range in file.windows(7) {
            let rows = file.read_rows(range.start, range.end).unwrap();
            assert_eq!(rows.len(), range.len());
            windowed.extend(rows);
        }
        assert_eq!(windowed, original);
        assert_eq!(file.read_all().unwrap(), original);
    }

    #[test]
    fn test_read_rows_clamps_and_handles_empty() {
        let blob = encode_records(&records(3), &RecordWriteOptions::default()).unwrap();
        let file = PuzzleFile::open("t", blob).unwrap();
        assert_eq!(file.read_rows(2, 100).unwrap().len(), 1);
        assert!(file.read_rows(3, 5).unwrap().is_empty());

        let empty = encode_records(&[], &RecordWriteOptions::default()).unwrap();
        let file = PuzzleFile::open("empty", empty).unwrap();
        assert_eq!(file.num_rows(), 0);
        assert_eq!(file.windows(10).count(), 0);
    }

    #[test]
    fn test_corrupt_blob_is_decode_error() {
        let err = PuzzleFile::open("bad", b"definitely not parquet".to_vec())
            .err()
            .unwrap();
        assert!(matches!(err, PuzzleError::Decode { .. }));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_missing_column_is_decode_error() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            COL_ID,
            DataType::Utf8,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["a"])) as ArrayRef],
        )
        .unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
            writer.write(&batch).unwrap();
            writer.close().unwrap();
        }
        let err = PuzzleFile::open("partial", buf).err().unwrap();
        assert!(err.to_string().contains("FEN"));
    }

    #[test]
    fn test_dataset_style_columns_decode() {
        // Dataset shape: 32-bit ratings, extra columns, space separated themes.
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_ID, DataType::LargeUtf8, false),
            Field::new("GameUrl", DataType::Utf8, false),
            Field::new(COL_FEN, DataType::Utf8, false),
            Field::new(COL_MOVES, DataType::Utf8, false),
            Field::new(COL_RATING, DataType::Int32, false),
            Field::new(COL_POPULARITY, DataType::Int32, false),
            Field::new(COL_THEMES, DataType::Utf8, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(arrow::array::LargeStringArray::from(vec!["000aY"])),
            Arc::new(StringArray::from(vec!["https://lichess.org/x"])),
            Arc::new(StringArray::from(vec![
                "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            ])),
            Arc::new(StringArray::from(vec!["f1c4 g8f6"])),
            Arc::new(arrow::array::Int32Array::from(vec![1500])),
            Arc::new(arrow::array::Int32Array::from(vec![-12])),
            Arc::new(StringArray::from(vec![Some("opening short")])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
            writer.write(&batch).unwrap();
            writer.close().unwrap();
        }

        let file = PuzzleFile::open("dataset", buf).unwrap();
        let rows = file.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "000aY");
        assert_eq!(rows[0].rating, 1500);
        assert_eq!(rows[0].popularity, -12);
        assert_eq!(rows[0].themes, vec!["opening", "short"]);
    }

    #[test]
    fn test_null_theme_list_is_empty() {
        let schema = crate::columnar::puzzle_schema();
        let mut themes = ListBuilder::new(StringBuilder::new());
        themes.append(false);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["x"])),
            Arc::new(StringArray::from(vec!["8/8/8/8/8/8/8/K6k w - - 0 1"])),
            Arc::new(StringArray::from(vec!["a1a2"])),
            Arc::new(Int64Array::from(vec![800])),
            Arc::new(Int64Array::from(vec![0])),
            Arc::new(themes.finish()),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
            writer.write(&batch).unwrap();
            writer.close().unwrap();
        }
        let rows = PuzzleFile::open("n", buf).unwrap().read_all().unwrap();
        assert!(rows[0].themes.is_empty());
    }
}
