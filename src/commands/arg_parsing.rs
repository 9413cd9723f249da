//! Argument parsing utilities for CLI commands.

use std::collections::BTreeSet;

use puzzle_pgn::themes;

/// Parse one `--theme` group: comma separated keys that must all be present.
pub fn parse_theme_group(s: &str) -> Result<BTreeSet<String>, String> {
    let group: BTreeSet<String> = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if group.is_empty() {
        return Err("theme group must name at least one theme".to_string());
    }
    if let Some(unknown) = group.iter().find(|t| !themes::is_known(t)) {
        return Err(format!(
            "unknown theme '{}' (see `puzzle-pgn themes`)",
            unknown
        ));
    }
    Ok(group)
}

/// Parse a strictly positive count (chunk sizes, --max-puzzles).
pub fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let val: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid positive integer", s))?;
    if val == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(val)
}
