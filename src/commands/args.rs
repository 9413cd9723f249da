//! Command-line argument definitions for the puzzle-pgn CLI.

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::PathBuf;

use puzzle_pgn::constants::{CEILING_PUZZLE_RATING, FLOOR_PUZZLE_RATING};
use puzzle_pgn::OrderBy;

use super::arg_parsing::{parse_positive_usize, parse_theme_group};

#[derive(Parser)]
#[command(name = "puzzle-pgn")]
#[command(about = "Filter the Lichess puzzle database and export it as PGN")]
#[command(
    long_about = "puzzle-pgn: download the Lichess puzzle dataset once, then export any slice of it as PGN.

WORKFLOW:
  1. Cache the dataset:   puzzle-pgn sync
  2. Export puzzles:      puzzle-pgn export -o puzzles.pgn --theme fork --max-puzzles 500

The dataset is refreshed automatically when the cache is older than one week.

OUTPUT FORMAT (export):
  Format auto-detected from extension:
  - .pgn or no extension: Plain PGN
  - .gz: Gzip-compressed PGN
  - -: stdout

  Each puzzle is one game starting from the position after the opponent's
  first move, separated from the next by a blank line."
)]
#[command(after_help = "EXAMPLES:
  # Forks or pins (any of the groups), 1500-1800, easiest first
  puzzle-pgn export -o tactics.pgn --theme fork --theme pin \\
      --min-rating 1500 --max-rating 1800 --sort-by rating

  # Mate-in-2 endgames (all themes of one group), most popular first
  puzzle-pgn export -o mates.pgn.gz --theme mateIn2,endgame --sort-by popularity --max-puzzles 1000

  # Use a local copy of the dataset
  puzzle-pgn --mirror /srv/lichess-puzzles export -o - --max-puzzles 10")]
pub struct Cli {
    /// Verbose progress output with timestamps (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// TOML config file ([storage], [dataset], [pipeline], [logging])
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of the local store (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Read dataset parts from this local directory instead of the hub
    #[arg(long, global = true)]
    pub mirror: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the dataset if the cache is stale
    Sync {
        /// Download even if the cache is fresh
        #[arg(long)]
        force: bool,
    },

    /// Show cache freshness and the cached file list
    Status,

    /// Filter, order and export puzzles as PGN
    Export(ExportArgs),

    /// List the known puzzle themes
    Themes,

    /// Print the permanent diagnostic log
    Log {
        /// Clear the log instead of printing it
        #[arg(long)]
        clear: bool,
    },

    /// Delete the cached dataset, staged chunks, log and preferences
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    /// Rating ascending
    Rating,
    /// Popularity descending
    Popularity,
}

impl From<SortBy> for OrderBy {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::Rating => OrderBy::ByRating,
            SortBy::Popularity => OrderBy::ByPopularity,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output path (.pgn, .gz, or - for stdout)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Comma separated themes that must all be present.
    /// Repeat to accept any of several groups: --theme fork,short --theme pin
    #[arg(short, long, value_parser = parse_theme_group)]
    pub theme: Vec<BTreeSet<String>>,

    /// Lowest puzzle rating to keep
    #[arg(long, default_value_t = FLOOR_PUZZLE_RATING)]
    pub min_rating: i64,

    /// Highest puzzle rating to keep
    #[arg(long, default_value_t = CEILING_PUZZLE_RATING)]
    pub max_rating: i64,

    /// Keep only the first N puzzles after ordering
    #[arg(short = 'n', long, value_parser = parse_positive_usize)]
    pub max_puzzles: Option<usize>,

    /// Order of the exported puzzles (default: dataset order)
    #[arg(long, value_enum)]
    pub sort_by: Option<SortBy>,

    /// Omit the PuzzleId/PuzzleRating/PuzzlePopularity/PuzzleThemes tags
    #[arg(long)]
    pub no_tags: bool,

    /// Add a comment summarizing the puzzle after the last move
    #[arg(long)]
    pub comments: bool,

    /// Rows decoded at once per parquet file (overrides the config file)
    #[arg(long, value_parser = parse_positive_usize)]
    pub row_chunk_size: Option<usize>,

    /// Puzzles per staged PGN chunk (overrides the config file)
    #[arg(long, value_parser = parse_positive_usize)]
    pub pgn_chunk_size: Option<usize>,
}
