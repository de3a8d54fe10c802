use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::{MoveResult, Phase, Seat};
use crate::server::message::{self, ChatSender, ClientMessage, ServerMessage};
use crate::server::{Client, ServerState};
use crate::utils::error::ServerError;

/// Runs the session coordinator for one accepted connection: registers the
/// participant, assigns a seat or spectator role, then dispatches inbound
/// messages until EOF, I/O failure or a graceful quit. Disconnect cleanup
/// always runs on the way out, whatever ended the loop.
pub async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
    addr: SocketAddr,
) -> Result<(), ServerError> {
    let (read_half, write_half) = stream.into_split();
    let client = Client::new(addr, write_half);
    let client_id = client.id;

    state.metrics.connections.inc();
    info!("New connection: {}", addr);

    let process_result = async {
        join_session(&client, &state).await?;

        let mut lines = BufReader::new(read_half).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            state.metrics.messages_received.inc();

            match message::decode(line) {
                Ok(ClientMessage::Move { data }) => handle_move(&client, &state, data).await?,
                Ok(ClientMessage::Chat { data }) => handle_chat(&client, &state, data).await?,
                Ok(ClientMessage::Quit) => {
                    info!("Participant {} quit", addr);
                    client.send(message::quit_ack())?;
                    break;
                }
                Err(e) => {
                    debug!("Protocol error from {}: {}", addr, e);
                    reply(&client, &state, &ServerMessage::error(e.to_string()))?;
                }
            }
        }
        Ok::<(), ServerError>(())
    }
    .await;

    handle_disconnect(&client_id, &state).await;
    state.clients.remove(&client_id);
    state.metrics.connections.dec();
    info!("Connection closed: {}", addr);

    process_result
}

/// Registers the participant in the session: seat assignment, the identity
/// notification, a board snapshot for spectators joining mid-game, and the
/// start broadcast when this join fills the second seat.
async fn join_session(client: &Client, state: &ServerState) -> Result<(), ServerError> {
    let mut session = state.session.lock().await;

    let seat = session.seats.assign(client.id);
    // The identity message is enqueued before the connection becomes
    // broadcast-visible in the manager, so no concurrent broadcast can
    // outrun it in this participant's queue.
    reply(
        client,
        state,
        &ServerMessage::PlayerId {
            player_id: seat.map(Seat::index),
        },
    )?;
    state.clients.add(client.clone());

    match seat {
        Some(seat) => {
            info!("Participant {} takes seat {}", client.addr, seat.index());
            if session.seats.both_seated() && session.state.phase() == Phase::WaitingForPlayers {
                session.state.begin_game();
                info!("Both seats filled, game starts");
                broadcast(
                    state,
                    &ServerMessage::StartGame {
                        current_turn: session.state.turn().index(),
                    },
                )?;
            }
        }
        None => {
            info!("Participant {} joins as spectator", client.addr);
            if session.state.phase() == Phase::InProgress {
                reply(
                    client,
                    state,
                    &ServerMessage::update(&session.state.board(), session.state.turn()),
                )?;
            }
        }
    }
    Ok(())
}

/// Applies one move as a single critical section: seat lookup, validation,
/// state transition and the enqueue of the resulting broadcast all happen
/// under the session lock, so every participant observes board versions in
/// the same relative order. Actual socket writes run on the per-client
/// writer tasks, outside the lock.
async fn handle_move(client: &Client, state: &ServerState, cell: usize) -> Result<(), ServerError> {
    let mut session = state.session.lock().await;

    let Some(seat) = session.seats.seat_of(&client.id) else {
        warn!("Move from unseated participant {}", client.addr);
        return reply(client, state, &ServerMessage::error("no seat assigned"));
    };

    let both_seated = session.seats.both_seated();
    match session.state.apply_move(seat, cell, both_seated) {
        Ok(MoveResult::Continue { board, next_turn }) => {
            debug!(
                "Seat {} marks cell {}, seat {} to move",
                seat.index(),
                cell,
                next_turn.index()
            );
            broadcast(state, &ServerMessage::update(&board, next_turn))
        }
        Ok(MoveResult::Finished { board, outcome }) => {
            info!("Game over: {:?}", outcome);
            state.metrics.games_completed.inc();
            broadcast(
                state,
                &ServerMessage::game_over(
                    outcome,
                    &board,
                    session.state.win_counts(),
                    session.state.tie_count(),
                ),
            )
        }
        Err(rejection) => {
            debug!("Rejected move from {}: {}", client.addr, rejection);
            reply(client, state, &ServerMessage::error(rejection.to_string()))
        }
    }
}

/// Relays chat to every other participant, tagged with the sender's seat or
/// a spectator marker. No game state changes.
async fn handle_chat(client: &Client, state: &ServerState, text: String) -> Result<(), ServerError> {
    let from = {
        let session = state.session.lock().await;
        session
            .seats
            .seat_of(&client.id)
            .map(ChatSender::Seat)
            .unwrap_or(ChatSender::Spectator)
    };

    let line = message::encode(&ServerMessage::Chat {
        from,
        message: text,
    })?;
    let delivered = state.clients.broadcast_except(&client.id, &line);
    state.metrics.messages_sent.inc_by(delivered as u64);
    Ok(())
}

/// Disconnect transition: frees the seat and, when the leaver abandons an
/// opponent mid-game, counts the game as a tie, resets the board and
/// promotes the survivor to seat 0 for the next game.
async fn handle_disconnect(client_id: &Uuid, state: &ServerState) {
    let mut session = state.session.lock().await;

    let Some(seat) = session.seats.release(client_id) else {
        return;
    };
    info!("Seat {} released", seat.index());

    match session.state.phase() {
        Phase::WaitingForPlayers => {}
        Phase::InProgress | Phase::Finished => {
            if let Some(remaining) = session.seats.sole_occupant() {
                let tie_count = session.state.reset_after_disconnect();
                session.seats.promote_sole_occupant();
                state.metrics.games_completed.inc();
                info!("Opponent left mid-game, counting a tie (total {})", tie_count);

                let notice = ServerMessage::PlayerDisconnect {
                    tie_count,
                    board: session.state.board().symbols(),
                };
                match message::encode(&notice) {
                    Ok(line) => {
                        let _ = state.clients.send_to(&remaining, line);
                        state.metrics.messages_sent.inc();
                    }
                    Err(e) => warn!("Failed to encode disconnect notice: {}", e),
                }
            }
        }
    }
}

/// Sends one message to one participant.
fn reply(client: &Client, state: &ServerState, message: &ServerMessage) -> Result<(), ServerError> {
    client.send(message::encode(message)?)?;
    state.metrics.messages_sent.inc();
    Ok(())
}

/// Enqueues one message to every participant. The sent counter reflects
/// queues that actually accepted the line, not the nominal roster size.
fn broadcast(state: &ServerState, message: &ServerMessage) -> Result<(), ServerError> {
    let line = message::encode(message)?;
    let delivered = state.clients.broadcast(&line);
    state.metrics.messages_sent.inc_by(delivered as u64);
    Ok(())
}
