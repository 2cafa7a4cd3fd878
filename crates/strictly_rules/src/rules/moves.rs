//! Move legality and application.

use crate::{Board, Cell, GRID_SIZE, Mark, Square};
use tracing::{instrument, trace};

/// Error returned when a move cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The coordinate lies outside the grid.
    #[display("Cell {} is out of bounds", _0)]
    OutOfBounds(Cell),

    /// The target square already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    Occupied(Cell),
}

impl std::error::Error for MoveError {}

/// Returns true iff `(row, col)` lies on the grid and the square is empty.
#[instrument(level = "trace", skip(board))]
pub fn is_legal_move(board: &Board, row: i32, col: i32) -> bool {
    matches!(board.get(Cell::new(row, col)), Some(Square::Empty))
}

/// Places `mark` at `(row, col)`, returning the new board.
///
/// The input board is left untouched; on success the returned board differs
/// from it only at the target cell.
///
/// # Errors
///
/// Returns [`MoveError`] if the cell is out of bounds or occupied.
#[instrument(level = "trace", skip(board))]
pub fn apply_move(board: &Board, row: i32, col: i32, mark: Mark) -> Result<Board, MoveError> {
    let cell = Cell::new(row, col);
    match board.get(cell) {
        None => Err(MoveError::OutOfBounds(cell)),
        Some(Square::Occupied(_)) => Err(MoveError::Occupied(cell)),
        Some(Square::Empty) => {
            trace!(%cell, %mark, "Applying move");
            Ok(board.with(cell, Square::Occupied(mark)))
        }
    }
}

/// Yields every empty cell in row-major order.
///
/// Each call returns a fresh iterator; a full board yields nothing.
pub fn available_cells(board: &Board) -> impl Iterator<Item = Cell> + '_ {
    (0..GRID_SIZE as i32)
        .flat_map(|row| (0..GRID_SIZE as i32).map(move |col| Cell::new(row, col)))
        .filter(move |cell| board.get(*cell) == Some(Square::Empty))
}
