use serde::Serialize;
use thiserror::Error;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 9;

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// One of the two active player slots. Seat 0 marks "X", seat 1 marks "O".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Wire index of the seat (0 or 1).
    pub fn index(self) -> u8 {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    /// The opposing seat.
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Board symbol owned by this seat.
    pub fn symbol(self) -> &'static str {
        match self {
            Seat::First => "X",
            Seat::Second => "O",
        }
    }

    pub fn from_index(index: u8) -> Option<Seat> {
        match index {
            0 => Some(Seat::First),
            1 => Some(Seat::Second),
            _ => None,
        }
    }
}

impl Serialize for Seat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}

/// Contents of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Mark(Seat),
}

impl Cell {
    fn symbol(self) -> &'static str {
        match self {
            Cell::Empty => " ",
            Cell::Mark(seat) => seat.symbol(),
        }
    }
}

/// A 3×3 board snapshot. Cheap to copy; the rules engine only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([Cell; BOARD_CELLS]);

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.0.get(index).copied()
    }

    /// Marks a cell for a seat. Callers validate first; out-of-range or
    /// occupied indices are ignored rather than panicking.
    pub fn mark(&mut self, index: usize, seat: Seat) {
        if let Some(cell @ Cell::Empty) = self.0.get_mut(index) {
            *cell = Cell::Mark(seat);
        }
    }

    pub fn clear(&mut self) {
        self.0 = [Cell::Empty; BOARD_CELLS];
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|cell| *cell != Cell::Empty)
    }

    pub fn filled_cells(&self) -> usize {
        self.0.iter().filter(|cell| **cell != Cell::Empty).count()
    }

    /// Wire representation: the 9-element `"X"` / `"O"` / `" "` array.
    pub fn symbols(&self) -> [&'static str; BOARD_CELLS] {
        let mut symbols = [" "; BOARD_CELLS];
        for (symbol, cell) in symbols.iter_mut().zip(self.0.iter()) {
            *symbol = cell.symbol();
        }
        symbols
    }

    /// Builds a board from wire symbols. Test and tooling convenience.
    pub fn from_symbols(symbols: [&str; BOARD_CELLS]) -> Option<Board> {
        let mut board = Board::new();
        for (index, symbol) in symbols.iter().enumerate() {
            board.0[index] = match *symbol {
                " " => Cell::Empty,
                "X" => Cell::Mark(Seat::First),
                "O" => Cell::Mark(Seat::Second),
                _ => return None,
            };
        }
        Some(board)
    }
}

/// Terminal result of evaluating a board snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Undecided,
    Win(Seat),
    Draw,
}

/// Why a candidate move was rejected. Each maps to an `error` reply; none
/// mutates any state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("cell index out of range (expected 0..8)")]
    OutOfRange,

    #[error("cell is already occupied")]
    Occupied,

    #[error("not your turn")]
    NotYourTurn,
}

/// Validates a candidate move against a board snapshot. The turn check is
/// defense-in-depth; the coordinator checks it before calling.
pub fn validate_move(
    board: &Board,
    turn: Seat,
    seat: Seat,
    cell: usize,
) -> Result<(), MoveRejection> {
    if seat != turn {
        return Err(MoveRejection::NotYourTurn);
    }
    match board.cell(cell) {
        None => Err(MoveRejection::OutOfRange),
        Some(Cell::Mark(_)) => Err(MoveRejection::Occupied),
        Some(Cell::Empty) => Ok(()),
    }
}

/// Evaluates a board for a terminal outcome: a completed line wins for its
/// owner, a full board with no line is a draw, anything else is undecided.
pub fn evaluate_outcome(board: &Board) -> Outcome {
    for line in &WIN_LINES {
        if let Some(Cell::Mark(seat)) = board.cell(line[0]) {
            if board.cell(line[1]) == Some(Cell::Mark(seat))
                && board.cell(line[2]) == Some(Cell::Mark(seat))
            {
                return Outcome::Win(seat);
            }
        }
    }
    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::Undecided
    }
}
