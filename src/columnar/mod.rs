//! Columnar (parquet) decode and encode of puzzle rows.
//!
//! # Column Projection
//!
//! | Column | Arrow Type | Nullable | Field |
//! |--------|-----------|----------|-------|
//! | `PuzzleId` | Utf8 / LargeUtf8 | No | `id` |
//! | `FEN` | Utf8 / LargeUtf8 | No | `initial_position` |
//! | `Moves` | Utf8 / LargeUtf8 | No | `move_list` |
//! | `Rating` | any integer | No | `rating` |
//! | `Popularity` | any integer | No | `popularity` |
//! | `Themes` | List<Utf8> or space separated Utf8 | Yes | `themes` |
//!
//! Other columns of the dataset (`GameUrl`, `NbPlays`, ...) are never decoded.

mod reader;
mod writer;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub use reader::{PuzzleFile, RowWindows};
pub use writer::{encode_records, RecordWriteOptions};

pub const COL_ID: &str = "PuzzleId";
pub const COL_FEN: &str = "FEN";
pub const COL_MOVES: &str = "Moves";
pub const COL_RATING: &str = "Rating";
pub const COL_POPULARITY: &str = "Popularity";
pub const COL_THEMES: &str = "Themes";

/// The fixed projection, in decode order.
pub const PUZZLE_COLUMNS: [&str; 6] = [
    COL_ID,
    COL_FEN,
    COL_MOVES,
    COL_RATING,
    COL_POPULARITY,
    COL_THEMES,
];

/// Schema used when this crate writes puzzle rows itself.
pub fn puzzle_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(COL_ID, DataType::Utf8, false),
        Field::new(COL_FEN, DataType::Utf8, false),
        Field::new(COL_MOVES, DataType::Utf8, false),
        Field::new(COL_RATING, DataType::Int64, false),
        Field::new(COL_POPULARITY, DataType::Int64, false),
        Field::new(
            COL_THEMES,
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            true,
        ),
    ]))
}
