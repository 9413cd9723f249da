//! Core types used throughout the puzzle_pgn library.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{CEILING_PUZZLE_RATING, FLOOR_PUZZLE_RATING};
use crate::error::{PuzzleError, Result};
use crate::themes;

/// One decoded puzzle row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    /// FEN before the opponent's first move.
    pub initial_position: String,
    /// Space separated UCI moves, the first one being the opponent's.
    pub move_list: String,
    pub rating: i64,
    pub popularity: i64,
    /// Theme keys in dataset order.
    pub themes: Vec<String>,
}

impl PuzzleRecord {
    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }

    /// One line summary, used as the trailing PGN comment.
    pub fn summary(&self) -> String {
        format!(
            "{}, rating {}, popularity {}, themes: {}",
            self.id,
            self.rating,
            self.popularity,
            self.themes.join(", ")
        )
    }
}

/// Ordering key of the filtered result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    /// Encounter order: file list order, then row order.
    #[default]
    None,
    /// Rating ascending.
    ByRating,
    /// Popularity descending.
    ByPopularity,
}

/// Filter, ordering and rendering choices for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSortOptions {
    /// OR of groups, each group an AND of theme keys.
    pub theme_groups: Vec<BTreeSet<String>>,
    pub min_rating: i64,
    pub max_rating: i64,
    pub max_records: Option<usize>,
    pub order_by: OrderBy,
    pub include_metadata_tags: bool,
    pub include_metadata_comment: bool,
}

impl Default for FilterSortOptions {
    fn default() -> Self {
        Self {
            theme_groups: Vec::new(),
            min_rating: FLOOR_PUZZLE_RATING,
            max_rating: CEILING_PUZZLE_RATING,
            max_records: None,
            order_by: OrderBy::None,
            include_metadata_tags: true,
            include_metadata_comment: false,
        }
    }
}

impl FilterSortOptions {
    /// Whether a record passes the rating range and theme groups.
    pub fn matches(&self, record: &PuzzleRecord) -> bool {
        record.rating >= self.min_rating
            && record.rating <= self.max_rating
            && (self.theme_groups.is_empty()
                || self
                    .theme_groups
                    .iter()
                    .any(|group| group.iter().all(|theme| record.has_theme(theme))))
    }

    /// Reject option sets that cannot produce a meaningful export.
    pub fn validate(&self) -> Result<()> {
        if self.min_rating > self.max_rating {
            return Err(PuzzleError::validation(format!(
                "minimum rating {} cannot be greater than maximum rating {}",
                self.min_rating, self.max_rating
            )));
        }
        if self.max_records == Some(0) {
            return Err(PuzzleError::validation("max_records must be >= 1"));
        }
        for group in &self.theme_groups {
            if group.is_empty() {
                return Err(PuzzleError::validation("theme group cannot be empty"));
            }
            if let Some(unknown) = group.iter().find(|t| !themes::is_known(t)) {
                return Err(PuzzleError::validation(format!(
                    "unknown puzzle theme '{}'",
                    unknown
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rating: i64, themes: &[&str]) -> PuzzleRecord {
        PuzzleRecord {
            id: "abcde".to_string(),
            initial_position: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            move_list: "e2e4".to_string(),
            rating,
            popularity: 90,
            themes: themes.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn group(themes: &[&str]) -> BTreeSet<String> {
        themes.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_empty_groups_match_everything_in_range() {
        let opts = FilterSortOptions {
            min_rating: 1000,
            max_rating: 1200,
            ..Default::default()
        };
        assert!(opts.matches(&record(1000, &[])));
        assert!(opts.matches(&record(1200, &["fork"])));
        assert!(!opts.matches(&record(999, &[])));
        assert!(!opts.matches(&record(1201, &[])));
    }

    #[test]
    fn test_groups_are_or_of_ands() {
        let opts = FilterSortOptions {
            theme_groups: vec![group(&["fork", "short"]), group(&["mateIn2"])],
            ..Default::default()
        };
        assert!(opts.matches(&record(1500, &["short", "fork", "middlegame"])));
        assert!(opts.matches(&record(1500, &["mateIn2"])));
        assert!(!opts.matches(&record(1500, &["fork"])));
        assert!(!opts.matches(&record(1500, &[])));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let opts = FilterSortOptions {
            min_rating: 2000,
            max_rating: 1000,
            ..Default::default()
        };
        assert!(matches!(opts.validate(), Err(PuzzleError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_theme() {
        let opts = FilterSortOptions {
            theme_groups: vec![group(&["fork", "notATheme"])],
            ..Default::default()
        };
        let err = opts.validate().unwrap_err();
        assert!(err.to_string().contains("notATheme"));
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let opts = FilterSortOptions {
            max_records: Some(0),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        assert!(FilterSortOptions::default().validate().is_ok());
    }

    #[test]
    fn test_summary() {
        let r = record(1500, &["fork", "short"]);
        assert_eq!(r.summary(), "abcde, rating 1500, popularity 90, themes: fork, short");
    }
}
