//! Core domain types for the 3x3 grid.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Side length of the fixed grid.
pub const GRID_SIZE: usize = 3;

/// A mark placed by a participant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Mark {
    /// First mark (always the session creator).
    X,
    /// Second mark.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark in this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

// Squares travel as "", "X" or "O" so observers get a plain string grid.
impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Square::Empty => serializer.serialize_str(""),
            Square::Occupied(mark) => serializer.collect_str(mark),
        }
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "" => Ok(Square::Empty),
            other => other
                .parse::<Mark>()
                .map(Square::Occupied)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// A coordinate on the board.
///
/// Coordinates are signed so that out-of-range input from callers can be
/// represented and rejected by the rules rather than by the type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("({row}, {col})")]
pub struct Cell {
    /// Row index (0-2 when in bounds).
    pub row: i32,
    /// Column index (0-2 when in bounds).
    pub col: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the array indices if the cell lies on the grid.
    pub fn indices(self) -> Option<(usize, usize)> {
        let row = usize::try_from(self.row).ok()?;
        let col = usize::try_from(self.col).ok()?;
        (row < GRID_SIZE && col < GRID_SIZE).then_some((row, col))
    }
}

/// Fixed 3x3 board.
///
/// `Board` is `Copy`: every transition produces a new value and historical
/// boards are never aliased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [[Square; GRID_SIZE]; GRID_SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a board from explicit rows.
    pub fn from_rows(squares: [[Square; GRID_SIZE]; GRID_SIZE]) -> Self {
        Self { squares }
    }

    /// Gets the square at the given cell, or `None` when out of bounds.
    pub fn get(&self, cell: Cell) -> Option<Square> {
        cell.indices().map(|(row, col)| self.squares[row][col])
    }

    /// Returns a copy of this board with `square` written at `cell`.
    ///
    /// Out-of-bounds cells leave the board unchanged.
    pub(crate) fn with(mut self, cell: Cell, square: Square) -> Self {
        if let Some((row, col)) = cell.indices() {
            self.squares[row][col] = square;
        }
        self
    }

    /// Returns the rows of the board.
    pub fn rows(&self) -> &[[Square; GRID_SIZE]; GRID_SIZE] {
        &self.squares
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        self.squares
            .iter()
            .map(|row| {
                row.iter()
                    .map(|square| match square {
                        Square::Empty => ".".to_string(),
                        Square::Occupied(mark) => mark.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect::<Vec<_>>()
            .join("\n-+-+-\n")
    }
}
