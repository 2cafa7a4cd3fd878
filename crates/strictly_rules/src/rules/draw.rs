//! Draw detection.

use crate::{Board, Square};
use tracing::instrument;

/// Checks if the board is full (no empty square left).
///
/// A full board with no winner is a draw.
#[instrument(level = "trace")]
pub fn is_full(board: &Board) -> bool {
    board
        .rows()
        .iter()
        .flatten()
        .all(|square| *square != Square::Empty)
}
