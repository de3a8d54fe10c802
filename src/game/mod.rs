// src/game/mod.rs
pub mod rules;
pub mod session;

// Re-export public components
pub use rules::{evaluate_outcome, validate_move, Board, Cell, MoveRejection, Outcome, Seat};
pub use session::{MoveResult, Phase, SessionRejection, SessionState};
