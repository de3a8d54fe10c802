//! Authoritative session server for a two-seat three-in-a-row game over
//! plain TCP, with chat-only spectators.
//!
//! One JSON object per newline-terminated line in each direction. The
//! server owns the single shared game session; connection tasks serialize
//! every state transition through one lock and fan updates out to all
//! participants in a consistent order.

pub mod config;
pub mod game;
pub mod server;
pub mod utils;

pub use config::ServerConfig;
pub use server::ServerState;
pub use utils::error::ServerError;
