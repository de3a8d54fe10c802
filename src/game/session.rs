use thiserror::Error;

use crate::game::rules::{self, Board, MoveRejection, Outcome, Seat};

/// Session-level state gating which messages are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForPlayers,
    InProgress,
    Finished,
}

/// What a successfully applied move produced. Carries the snapshots the
/// coordinator broadcasts after releasing the lock on actual socket writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// Game continues; the board snapshot and the seat to move next.
    Continue { board: Board, next_turn: Seat },
    /// Terminal outcome reached; the final board before the reset.
    Finished { board: Board, outcome: Outcome },
}

/// Why a move was not applied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    #[error("no game in progress")]
    NotInProgress,

    #[error(transparent)]
    Move(#[from] MoveRejection),
}

/// The single shared game record: board contents, whose turn it is, and the
/// cumulative win/tie counters. One instance per process, mutated only while
/// the coordinator holds the session lock.
#[derive(Debug, Clone, Copy)]
pub struct SessionState {
    board: Board,
    turn: Seat,
    win_counts: [u32; 2],
    tie_count: u32,
    phase: Phase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        SessionState {
            board: Board::new(),
            turn: Seat::First,
            win_counts: [0, 0],
            tie_count: 0,
            phase: Phase::WaitingForPlayers,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// Only meaningful while the phase is `InProgress`.
    pub fn turn(&self) -> Seat {
        self.turn
    }

    pub fn win_counts(&self) -> [u32; 2] {
        self.win_counts
    }

    pub fn tie_count(&self) -> u32 {
        self.tie_count
    }

    /// Starts a fresh game once both seats are filled: board cleared, seat 0
    /// to move first.
    pub fn begin_game(&mut self) {
        self.board.clear();
        self.turn = Seat::First;
        self.phase = Phase::InProgress;
    }

    /// Validates and applies one move as a single logical transition. A
    /// rejection leaves board, turn and counters untouched. On a terminal
    /// outcome the counters are bumped and the session resets: back to
    /// `InProgress` when both seats are still occupied, otherwise
    /// `WaitingForPlayers`.
    pub fn apply_move(
        &mut self,
        seat: Seat,
        cell: usize,
        both_seated: bool,
    ) -> Result<MoveResult, SessionRejection> {
        if self.phase != Phase::InProgress {
            return Err(SessionRejection::NotInProgress);
        }
        rules::validate_move(&self.board, self.turn, seat, cell)?;

        self.board.mark(cell, seat);
        match rules::evaluate_outcome(&self.board) {
            Outcome::Undecided => {
                self.turn = self.turn.other();
                Ok(MoveResult::Continue {
                    board: self.board,
                    next_turn: self.turn,
                })
            }
            outcome => {
                match outcome {
                    Outcome::Win(winner) => {
                        self.win_counts[winner.index() as usize] += 1;
                    }
                    Outcome::Draw => self.tie_count += 1,
                    Outcome::Undecided => unreachable!(),
                }
                let board = self.board;
                self.phase = Phase::Finished;
                self.reset(both_seated);
                Ok(MoveResult::Finished { board, outcome })
            }
        }
    }

    /// Disconnect transition: the abandoned game counts as a tie, the board
    /// resets, and the session waits for a new opponent.
    pub fn reset_after_disconnect(&mut self) -> u32 {
        self.tie_count += 1;
        self.reset(false);
        self.tie_count
    }

    fn reset(&mut self, both_seated: bool) {
        self.board.clear();
        self.turn = Seat::First;
        self.phase = if both_seated {
            Phase::InProgress
        } else {
            Phase::WaitingForPlayers
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_progress() -> SessionState {
        let mut state = SessionState::new();
        state.begin_game();
        state
    }

    #[test]
    fn starts_waiting_with_empty_board_and_zero_counters() {
        let state = SessionState::new();
        assert_eq!(state.phase(), Phase::WaitingForPlayers);
        assert_eq!(state.board().filled_cells(), 0);
        assert_eq!(state.win_counts(), [0, 0]);
        assert_eq!(state.tie_count(), 0);
    }

    #[test]
    fn begin_game_gives_seat_zero_the_first_turn() {
        let state = in_progress();
        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.turn(), Seat::First);
    }

    #[test]
    fn turn_alternates_after_every_non_terminal_move() {
        let mut state = in_progress();
        let mut mover = Seat::First;
        for cell in [0, 3, 1, 4] {
            match state.apply_move(mover, cell, true).expect("valid move") {
                MoveResult::Continue { next_turn, .. } => {
                    assert_eq!(next_turn, mover.other());
                }
                other => panic!("unexpected terminal result: {other:?}"),
            }
            mover = mover.other();
        }
        assert_eq!(state.board().filled_cells(), 4);
    }

    #[test]
    fn top_row_completion_wins_for_seat_zero() {
        let mut state = in_progress();
        // Seat 0 marks 0, 1, 2; seat 1 marks 3, 4 in between.
        for (seat, cell) in [
            (Seat::First, 0),
            (Seat::Second, 3),
            (Seat::First, 1),
            (Seat::Second, 4),
        ] {
            state.apply_move(seat, cell, true).expect("valid move");
        }
        let result = state.apply_move(Seat::First, 2, true).expect("winning move");
        match result {
            MoveResult::Finished { board, outcome } => {
                assert_eq!(outcome, Outcome::Win(Seat::First));
                assert_eq!(board.symbols()[..3], ["X", "X", "X"]);
            }
            other => panic!("expected finish, got {other:?}"),
        }
        assert_eq!(state.win_counts(), [1, 0]);
        // Both seats still occupied: fresh game starts immediately.
        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.turn(), Seat::First);
        assert_eq!(state.board().filled_cells(), 0);
    }

    #[test]
    fn full_board_without_line_counts_a_tie() {
        let mut state = in_progress();
        // Fills to X O X / X O O / O X X with no completed line.
        for (seat, cell) in [
            (Seat::First, 0),
            (Seat::Second, 1),
            (Seat::First, 2),
            (Seat::Second, 4),
            (Seat::First, 3),
            (Seat::Second, 5),
            (Seat::First, 7),
            (Seat::Second, 6),
            (Seat::First, 8),
        ] {
            if let Err(err) = state.apply_move(seat, cell, true) {
                panic!("move ({seat:?}, {cell}) rejected: {err}");
            }
        }
        assert_eq!(state.tie_count(), 1);
        assert_eq!(state.win_counts(), [0, 0]);
        assert_eq!(state.phase(), Phase::InProgress);
    }

    #[test]
    fn rejection_mutates_nothing() {
        let mut state = in_progress();
        state.apply_move(Seat::First, 0, true).expect("valid move");
        let before = (
            state.board(),
            state.turn(),
            state.win_counts(),
            state.tie_count(),
            state.phase(),
        );

        assert_eq!(
            state.apply_move(Seat::Second, 0, true),
            Err(SessionRejection::Move(MoveRejection::Occupied))
        );
        assert_eq!(
            state.apply_move(Seat::First, 5, true),
            Err(SessionRejection::Move(MoveRejection::NotYourTurn))
        );
        assert_eq!(
            state.apply_move(Seat::Second, 12, true),
            Err(SessionRejection::Move(MoveRejection::OutOfRange))
        );

        let after = (
            state.board(),
            state.turn(),
            state.win_counts(),
            state.tie_count(),
            state.phase(),
        );
        assert_eq!(before, after);
    }

    #[test]
    fn moves_rejected_outside_in_progress() {
        let mut state = SessionState::new();
        assert_eq!(
            state.apply_move(Seat::First, 0, false),
            Err(SessionRejection::NotInProgress)
        );
    }

    #[test]
    fn terminal_reset_waits_when_a_seat_is_free() {
        let mut state = in_progress();
        for (seat, cell) in [
            (Seat::First, 0),
            (Seat::Second, 3),
            (Seat::First, 1),
            (Seat::Second, 4),
        ] {
            state.apply_move(seat, cell, true).expect("valid move");
        }
        state
            .apply_move(Seat::First, 2, false)
            .expect("winning move");
        assert_eq!(state.phase(), Phase::WaitingForPlayers);
        assert_eq!(state.board().filled_cells(), 0);
    }

    #[test]
    fn disconnect_counts_a_tie_and_resets() {
        let mut state = in_progress();
        state.apply_move(Seat::First, 4, true).expect("valid move");

        let ties = state.reset_after_disconnect();
        assert_eq!(ties, 1);
        assert_eq!(state.tie_count(), 1);
        assert_eq!(state.phase(), Phase::WaitingForPlayers);
        assert_eq!(state.board().filled_cells(), 0);
        assert_eq!(state.win_counts(), [0, 0]);
    }
}
