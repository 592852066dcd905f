//! Helpers for the FEN-like `repString` board representations.
//!
//! A rep string is a list of ranks separated by `/`, followed by a space and
//! the side to move. Inside a rank, every letter is a piece and every run of
//! digits is that many empty squares, so `3q2q3` and `10` are both ranks ten
//! squares wide.

use tracing::warn;

/// Ranks are cut off after this many squares.
pub const MAX_RANK_WIDTH: usize = 64;

/// The squares of every rank, `None` being an empty square.
pub fn parse_ranks(rep_string: &str) -> Vec<Vec<Option<char>>> {
    board_part(rep_string)
        .split('/')
        .filter(|rank| !rank.is_empty())
        .map(parse_rank)
        .collect()
}

/// The squares of one rank. A rank wider than [`MAX_RANK_WIDTH`] is cut off
/// there, however long its runs of empty squares claim to be.
pub fn parse_rank(rank: &str) -> Vec<Option<char>> {
    let mut squares = Vec::with_capacity(rank.len().min(MAX_RANK_WIDTH));
    let mut empty_run = 0usize;
    let mut truncated = false;
    for c in rank.chars() {
        if let Some(digit) = c.to_digit(10) {
            empty_run = empty_run
                .checked_mul(10)
                .and_then(|run| run.checked_add(digit as usize))
                .unwrap_or(usize::MAX);
            continue;
        }
        truncated |= push_empty(&mut squares, empty_run);
        empty_run = 0;
        if squares.len() < MAX_RANK_WIDTH {
            squares.push(Some(c));
        } else {
            truncated = true;
        }
    }
    truncated |= push_empty(&mut squares, empty_run);
    if truncated {
        warn!(%rank, max = MAX_RANK_WIDTH, "Rank is too wide, cutting it off");
    }
    squares
}

/// Appends up to `run` empty squares, returning whether some did not fit.
fn push_empty(squares: &mut Vec<Option<char>>, run: usize) -> bool {
    let room = MAX_RANK_WIDTH - squares.len();
    squares.extend(std::iter::repeat(None).take(run.min(room)));
    run > room
}

pub fn board_part(rep_string: &str) -> &str {
    rep_string.split_whitespace().next().unwrap_or("")
}

/// The first character after the board, usually whose turn it is.
pub fn side_to_move(rep_string: &str) -> Option<char> {
    rep_string
        .split_whitespace()
        .nth(1)
        .and_then(|side| side.chars().next())
}
