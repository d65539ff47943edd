use serde::{Deserialize, Serialize};

pub const CELL_COUNT: usize = 9;

/// The eight winning lines, in the order they are checked: rows, columns,
/// main diagonal, anti-diagonal. The first completed line decides the winner.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardOutcome {
    InProgress,
    Win(Mark),
    Tie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    CellOccupied(usize),
    OutOfRange(usize),
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::CellOccupied(index) => write!(f, "Cell {} is already occupied", index),
            BoardError::OutOfRange(index) => {
                write!(f, "Cell index {} is outside the board", index)
            }
        }
    }
}

impl std::error::Error for BoardError {}

/// A 3x3 grid stored row-major. Serializes as a list of nine `null | "X" | "O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    pub fn empty() -> Self {
        Board::default()
    }

    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Board { cells }
    }

    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied_count() == CELL_COUNT
    }

    pub fn is_empty(&self) -> bool {
        self.occupied_count() == 0
    }

    /// Returns a new board with `mark` placed at `index`. `self` is left untouched.
    pub fn apply_move(&self, index: usize, mark: Mark) -> Result<Board, BoardError> {
        match self.cells.get(index) {
            None => Err(BoardError::OutOfRange(index)),
            Some(Some(_)) => Err(BoardError::CellOccupied(index)),
            Some(None) => {
                let mut next = *self;
                next.cells[index] = Some(mark);
                Ok(next)
            }
        }
    }

    /// First completed line in `WINNING_LINES` order, with its mark.
    pub fn winning_line(&self) -> Option<([usize; 3], Mark)> {
        WINNING_LINES.iter().find_map(|line| {
            let [a, b, c] = *line;
            match (self.cells[a], self.cells[b], self.cells[c]) {
                (Some(first), Some(second), Some(third)) if first == second && second == third => {
                    Some((*line, first))
                }
                _ => None,
            }
        })
    }

    pub fn compute_outcome(&self) -> BoardOutcome {
        if let Some((_, mark)) = self.winning_line() {
            BoardOutcome::Win(mark)
        } else if self.is_full() {
            BoardOutcome::Tie
        } else {
            BoardOutcome::InProgress
        }
    }

    /// Indices whose contents differ between the two boards.
    pub fn changed_cells(&self, other: &Board) -> Vec<usize> {
        (0..CELL_COUNT)
            .filter(|&index| self.cells[index] != other.cells[index])
            .collect()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                match cell {
                    Some(mark) => write!(f, "{}", mark)?,
                    None => write!(f, ".")?,
                }
            }
        }
        Ok(())
    }
}
