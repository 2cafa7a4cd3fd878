//! Move selection for automated seats.

use crate::rules::{apply_move, available_cells, check_winner, is_legal_move};
use crate::{Board, Cell, Mark};
use rand::seq::IteratorRandom;
use tracing::{debug, instrument};

/// Returned when asked to move on a board with no free cell.
///
/// The sentinel is off the grid, so the rules reject it.
pub const NO_MOVE: Cell = Cell::new(-1, -1);

/// Chooses the next cell for an automated participant.
pub trait MovePolicy: Send + Sync + std::fmt::Debug {
    /// Returns a cell to play for `own` against `opponent`.
    fn choose_move(&self, board: &Board, own: Mark, opponent: Mark) -> Cell;
}

/// Win if possible, block the opponent, take the centre, otherwise random.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPolicy;

impl HeuristicPolicy {
    /// Finds a cell completing three in a row for `mark`.
    fn winning_cell(board: &Board, mark: Mark) -> Option<Cell> {
        available_cells(board).find(|cell| {
            apply_move(board, cell.row, cell.col, mark)
                .is_ok_and(|next| check_winner(&next) == Some(mark))
        })
    }
}

impl MovePolicy for HeuristicPolicy {
    #[instrument(skip(self, board))]
    fn choose_move(&self, board: &Board, own: Mark, opponent: Mark) -> Cell {
        if let Some(cell) = Self::winning_cell(board, own) {
            debug!(%cell, "Taking winning cell");
            return cell;
        }

        if let Some(cell) = Self::winning_cell(board, opponent) {
            debug!(%cell, "Blocking opponent");
            return cell;
        }

        if is_legal_move(board, 1, 1) {
            debug!("Taking centre");
            return Cell::new(1, 1);
        }

        let cell = available_cells(board)
            .choose(&mut rand::thread_rng())
            .unwrap_or(NO_MOVE);
        debug!(%cell, "Picked random free cell");
        cell
    }
}

/// Picks the first free cell in row-major order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFreePolicy;

impl MovePolicy for FirstFreePolicy {
    #[instrument(skip(self, board))]
    fn choose_move(&self, board: &Board, _own: Mark, _opponent: Mark) -> Cell {
        available_cells(board).next().unwrap_or(NO_MOVE)
    }
}
