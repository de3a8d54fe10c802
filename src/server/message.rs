use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{Board, Outcome, Seat};

/// Represents different types of errors that can occur when processing messages
#[derive(Error, Debug)]
pub enum MessageError {
    /// Error when the payload is not a JSON object or a field is missing or
    /// mistyped.
    #[error("invalid message format")]
    InvalidFormat,

    /// Error when the `type` tag names no known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Error when message serialization fails.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Messages a participant can send to the server. One variant per `type`
/// tag; anything else is a protocol error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim a cell (0..8).
    Move { data: usize },

    /// Relay a chat line to everyone else.
    Chat { data: String },

    /// Leave gracefully.
    Quit,
}

/// The sender identity attached to relayed chat: a seat index for seated
/// participants, `"spectator"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    Seat(Seat),
    Spectator,
}

impl Serialize for ChatSender {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChatSender::Seat(seat) => serializer.serialize_u8(seat.index()),
            ChatSender::Spectator => serializer.serialize_str("spectator"),
        }
    }
}

/// Winner field of a `game_over` message: a seat index or the string
/// `"Draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Seat(Seat),
    Draw,
}

impl Serialize for Winner {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Winner::Seat(seat) => serializer.serialize_u8(seat.index()),
            Winner::Draw => serializer.serialize_str("Draw"),
        }
    }
}

/// Messages the server sends to participants.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Identity notification sent on join; `None` marks a spectator.
    PlayerId { player_id: Option<u8> },

    /// Both seats are filled; a fresh game begins.
    StartGame { current_turn: u8 },

    /// Board changed; game continues.
    Update {
        board: [&'static str; 9],
        current_turn: u8,
    },

    /// Terminal outcome reached.
    GameOver {
        winner: Winner,
        board: [&'static str; 9],
        win_counts: [u32; 2],
        tie_count: u32,
    },

    /// Relayed chat from another participant.
    Chat { from: ChatSender, message: String },

    /// The seated opponent vanished; the game counted as a tie and reset.
    PlayerDisconnect {
        tie_count: u32,
        board: [&'static str; 9],
    },

    /// A recoverable protocol or rule error.
    Error { message: String },
}

impl ServerMessage {
    pub fn update(board: &Board, current_turn: Seat) -> Self {
        ServerMessage::Update {
            board: board.symbols(),
            current_turn: current_turn.index(),
        }
    }

    pub fn game_over(
        outcome: Outcome,
        board: &Board,
        win_counts: [u32; 2],
        tie_count: u32,
    ) -> Self {
        let winner = match outcome {
            Outcome::Win(seat) => Winner::Seat(seat),
            _ => Winner::Draw,
        };
        ServerMessage::GameOver {
            winner,
            board: board.symbols(),
            win_counts,
            tie_count,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Decodes one wire line into a `ClientMessage`. The tag is inspected first
/// so an unrecognized command and a malformed payload report differently, as
/// the error taxonomy requires.
pub fn decode(line: &str) -> Result<ClientMessage, MessageError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|_| MessageError::InvalidFormat)?;
    let tag = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or(MessageError::InvalidFormat)?;
    if matches!(tag, "move" | "chat" | "quit") {
        serde_json::from_value(value).map_err(|_| MessageError::InvalidFormat)
    } else {
        Err(MessageError::UnknownCommand(tag.to_string()))
    }
}

/// Encodes a server message as one wire line (no trailing newline; the
/// client writer appends it).
pub fn encode(message: &ServerMessage) -> Result<String, MessageError> {
    serde_json::to_string(message).map_err(|e| MessageError::Serialization(e.to_string()))
}

/// The acknowledgement for a graceful quit. The only untyped payload on the
/// wire, kept as the original protocol shaped it.
pub fn quit_ack() -> String {
    r#"{"response":"You have disconnected."}"#.to_string()
}
