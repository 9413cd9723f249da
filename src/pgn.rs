//! Formatting one puzzle record as a self-contained PGN game.
//!
//! The first listed move belongs to the opponent and is played before
//! recording, so the `FEN` tag holds the position the solver faces.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use std::fmt::Write;

use crate::constants::PUZZLE_SITE_PREFIX;
use crate::error::{PuzzleError, Result};
use crate::types::{FilterSortOptions, PuzzleRecord};

/// Rendering switches taken from the run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgnFlags {
    pub include_tags: bool,
    pub include_comment: bool,
}

impl From<&FilterSortOptions> for PgnFlags {
    fn from(opts: &FilterSortOptions) -> Self {
        Self {
            include_tags: opts.include_metadata_tags,
            include_comment: opts.include_metadata_comment,
        }
    }
}

fn play_uci(pos: &Chess, uci: &str, puzzle_id: &str) -> Result<shakmaty::Move> {
    let parsed: Uci = uci
        .parse()
        .map_err(|_| PuzzleError::bad_move(puzzle_id, format!("invalid UCI move '{}'", uci)))?;
    parsed
        .to_move(pos)
        .map_err(|_| PuzzleError::bad_move(puzzle_id, format!("illegal move '{}'", uci)))
}

fn push_tag(out: &mut String, name: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    // Writing to a String cannot fail.
    let _ = writeln!(out, "[{} \"{}\"]", name, escaped);
}

/// Render `record` as one PGN block (no trailing newline).
pub fn puzzle_to_pgn(record: &PuzzleRecord, flags: PgnFlags) -> Result<String> {
    let id = record.id.as_str();

    let fen: Fen = record
        .initial_position
        .parse()
        .map_err(|e| PuzzleError::bad_move(id, format!("invalid FEN: {}", e)))?;
    let mut pos: Chess = fen
        .into_position(CastlingMode::Standard)
        .map_err(|e| PuzzleError::bad_move(id, format!("invalid position: {}", e)))?;

    let mut moves = record.move_list.split_whitespace();
    let first = moves
        .next()
        .ok_or_else(|| PuzzleError::bad_move(id, "empty move list"))?;
    let opening = play_uci(&pos, first, id)?;
    pos.play_unchecked(&opening);

    let start_fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();

    let mut out = String::new();
    push_tag(&mut out, "Event", "?");
    push_tag(&mut out, "Site", &format!("{}{}", PUZZLE_SITE_PREFIX, id));
    push_tag(&mut out, "Date", "????.??.??");
    push_tag(&mut out, "Round", "?");
    push_tag(&mut out, "White", "?");
    push_tag(&mut out, "Black", "?");
    push_tag(&mut out, "Result", "*");
    push_tag(&mut out, "SetUp", "1");
    push_tag(&mut out, "FEN", &start_fen);
    if flags.include_tags {
        push_tag(&mut out, "PuzzleId", id);
        push_tag(&mut out, "PuzzleRating", &record.rating.to_string());
        push_tag(&mut out, "PuzzlePopularity", &record.popularity.to_string());
        push_tag(&mut out, "PuzzleThemes", &record.themes.join(", "));
    }
    out.push('\n');

    let mut tokens: Vec<String> = Vec::new();
    for (i, uci) in moves.enumerate() {
        let number = pos.fullmoves().get();
        match pos.turn() {
            Color::White => tokens.push(format!("{}.", number)),
            Color::Black if i == 0 => tokens.push(format!("{}...", number)),
            Color::Black => {}
        }
        let m = play_uci(&pos, uci, id)?;
        tokens.push(SanPlus::from_move_and_play_unchecked(&mut pos, &m).to_string());
    }

    if flags.include_comment {
        if tokens.is_empty() {
            return Err(PuzzleError::bad_move(
                id,
                "no solution move to attach the comment to",
            ));
        }
        tokens.push(format!("{{ {} }}", record.summary()));
    }
    tokens.push("*".to_string());
    out.push_str(&tokens.join(" "));
    Ok(out)
}

/// Render a batch of records, blocks separated by one blank line.
pub fn records_to_pgn(records: &[PuzzleRecord], flags: PgnFlags) -> Result<String> {
    let blocks = records
        .iter()
        .map(|r| puzzle_to_pgn(r, flags))
        .collect::<Result<Vec<_>>>()?;
    Ok(blocks.join("\n\n"))
}
