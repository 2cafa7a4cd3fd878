//! Strictly Rules - pure rules engine for the 3x3 grid game.
//!
//! Boards are small `Copy` values; every move produces a new board, so
//! history can be shared freely between threads without locking.
//!
//! # Example
//!
//! ```
//! use strictly_rules::{Board, Mark, Verdict, apply_move, evaluate};
//!
//! let board = apply_move(&Board::new(), 1, 1, Mark::X).unwrap();
//! assert_eq!(evaluate(&board), Verdict::Ongoing);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod policy;
mod rules;
mod types;

pub use policy::{FirstFreePolicy, HeuristicPolicy, MovePolicy, NO_MOVE};
pub use rules::{
    MoveError, Verdict, apply_move, available_cells, check_winner, evaluate, is_full,
    is_legal_move,
};
pub use types::{Board, Cell, GRID_SIZE, Mark, Square};
