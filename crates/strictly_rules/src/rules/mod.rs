//! Rules for the 3x3 grid game.
//!
//! Pure functions over immutable [`Board`](crate::Board) values: move
//! legality, move application and terminal-condition detection. Nothing in
//! here holds state, so every function is safe to call from any thread.

pub mod draw;
pub mod moves;
pub mod win;

pub use draw::is_full;
pub use moves::{MoveError, apply_move, available_cells, is_legal_move};
pub use win::{Verdict, check_winner, evaluate};
