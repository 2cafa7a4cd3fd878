//! Win detection and terminal-condition evaluation.

use super::draw::is_full;
use crate::{Board, Cell, Mark, Square};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Result of evaluating a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// No three-in-a-row and at least one empty square.
    Ongoing,
    /// The mark has three in a row.
    Won(Mark),
    /// Full board with no three-in-a-row.
    Draw,
}

impl Verdict {
    /// Returns the winning mark, if any.
    pub fn winner(self) -> Option<Mark> {
        match self {
            Verdict::Won(mark) => Some(mark),
            Verdict::Ongoing | Verdict::Draw => None,
        }
    }

    /// Returns true for a drawn board.
    pub fn is_draw(self) -> bool {
        matches!(self, Verdict::Draw)
    }

    /// Returns true when the game can no longer continue.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Verdict::Ongoing)
    }
}

const fn c(row: i32, col: i32) -> Cell {
    Cell::new(row, col)
}

// Rows, then columns, then primary and anti diagonal. First match wins.
const LINES: [[Cell; 3]; 8] = [
    [c(0, 0), c(0, 1), c(0, 2)],
    [c(1, 0), c(1, 1), c(1, 2)],
    [c(2, 0), c(2, 1), c(2, 2)],
    [c(0, 0), c(1, 0), c(2, 0)],
    [c(0, 1), c(1, 1), c(2, 1)],
    [c(0, 2), c(1, 2), c(2, 2)],
    [c(0, 0), c(1, 1), c(2, 2)],
    [c(0, 2), c(1, 1), c(2, 0)],
];

/// Checks if there is a winner on the board.
///
/// Returns `Some(mark)` for the first line holding three identical marks.
#[instrument(level = "trace")]
pub fn check_winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| {
        let square = board.get(*a)?;
        if square != Square::Empty && Some(square) == board.get(*b) && Some(square) == board.get(*c)
        {
            square.mark()
        } else {
            None
        }
    })
}

/// Evaluates the board for a terminal condition.
#[instrument(level = "trace")]
pub fn evaluate(board: &Board) -> Verdict {
    match check_winner(board) {
        Some(mark) => Verdict::Won(mark),
        None if is_full(board) => Verdict::Draw,
        None => Verdict::Ongoing,
    }
}
