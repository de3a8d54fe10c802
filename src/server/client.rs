use std::{net::SocketAddr, sync::Arc};

use dashmap::DashMap;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tracing::{debug, error};
use uuid::Uuid;

/// Represents errors that may occur in client operations.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Failed to send message")]
    SendFailed,
    #[error("Client not found")]
    NotFound,
}

/// One connected participant. Owns the write half of the TCP connection
/// through an outbound queue: `send` enqueues a line without blocking, and a
/// dedicated writer task drains the queue onto the socket. Socket writes
/// therefore never happen while the session lock is held.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier for the participant.
    pub id: Uuid,
    /// Socket address of the participant.
    pub addr: SocketAddr,
    /// Queue of newline-terminated wire lines.
    sender: mpsc::UnboundedSender<String>,
    /// Guard to track whether the writer task is still alive.
    connection_guard: Arc<()>,
}

impl Client {
    /// Creates a new `Client` around the write half of an accepted
    /// connection and spawns its writer task.
    pub fn new(addr: SocketAddr, writer: OwnedWriteHalf) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<String>();
        let connection_guard = Arc::new(());

        tokio::spawn({
            let guard = connection_guard.clone();
            async move {
                let mut writer = writer;
                while let Some(line) = receiver.recv().await {
                    let framed = format!("{line}\n");
                    if let Err(e) = writer.write_all(framed.as_bytes()).await {
                        debug!("Failed to send message to {}: {}", addr, e);
                        break;
                    }
                }
                let _ = writer.shutdown().await;
                drop(guard);
            }
        });

        Client {
            id: Uuid::new_v4(),
            addr,
            sender,
            connection_guard,
        }
    }

    /// Queues one wire line for delivery. Best-effort: a dead peer surfaces
    /// as `ClientError::SendFailed` and never blocks the caller.
    pub fn send(&self, line: String) -> Result<(), ClientError> {
        self.sender.send(line).map_err(|_| ClientError::SendFailed)
    }

    /// Whether the writer task is still draining the queue.
    pub fn is_connected(&self) -> bool {
        Arc::strong_count(&self.connection_guard) > 1
    }
}

/// Manages every connected participant and fans messages out to them.
#[derive(Clone, Default)]
pub struct ClientManager {
    clients: Arc<DashMap<Uuid, Client>>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
        }
    }

    pub fn add(&self, client: Client) {
        self.clients.insert(client.id, client);
    }

    pub fn remove(&self, id: &Uuid) {
        self.clients.remove(id);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Sends one line to one participant, if still present.
    pub fn send_to(&self, id: &Uuid, line: String) -> Result<(), ClientError> {
        match self.clients.get(id) {
            Some(client) => client.send(line),
            None => Err(ClientError::NotFound),
        }
    }

    /// Cleans up participants whose writer task has exited.
    pub fn cleanup(&self) {
        self.clients.retain(|_, client| {
            let connected = client.is_connected();
            if !connected {
                debug!("Removing disconnected participant: {}", client.id);
            }
            connected
        });
    }

    /// Delivers one line to every participant and returns how many queues
    /// accepted it. Individual failures evict the dead participant and never
    /// abort the rest of the set.
    pub fn broadcast(&self, line: &str) -> usize {
        self.fan_out(line, None)
    }

    /// Delivers one line to everyone except the named participant and
    /// returns how many queues accepted it.
    pub fn broadcast_except(&self, except: &Uuid, line: &str) -> usize {
        self.fan_out(line, Some(except))
    }

    fn fan_out(&self, line: &str, except: Option<&Uuid>) -> usize {
        // Eviction happens after iteration; removing mid-iteration can
        // deadlock on the shard lock.
        let mut delivered = 0;
        let mut dead = Vec::new();
        for entry in self.clients.iter() {
            if Some(entry.key()) == except {
                continue;
            }
            match entry.value().send(line.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    error!("Broadcast failed to {}: {}", entry.key(), e);
                    dead.push(*entry.key());
                }
            }
        }
        for id in dead {
            self.clients.remove(&id);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    /// A client backed by a real loopback socket, plus the peer end so the
    /// test can read what the writer task delivers.
    async fn loopback_client() -> (Client, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted, peer) = tokio::join!(
            async { listener.accept().await.unwrap() },
            async { TcpStream::connect(addr).await.unwrap() }
        );
        let (server_side, peer_addr) = accepted;
        let (_read_half, write_half) = server_side.into_split();
        (Client::new(peer_addr, write_half), peer)
    }

    async fn drain_lines(peer: TcpStream) -> Vec<String> {
        let mut lines = BufReader::new(peer).lines();
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            out.push(line);
        }
        out
    }

    #[tokio::test]
    async fn fan_out_reports_deliveries_and_skips_the_sender() {
        let manager = ClientManager::new();
        let (a, a_peer) = loopback_client().await;
        let (b, b_peer) = loopback_client().await;
        let a_id = a.id;
        manager.add(a);
        manager.add(b);

        assert_eq!(manager.broadcast(r#"{"type":"start_game","current_turn":0}"#), 2);
        assert_eq!(
            manager.broadcast_except(&a_id, r#"{"type":"chat","from":0,"message":"hi"}"#),
            1
        );

        // Dropping the manager closes both queues; the writer tasks flush
        // and shut the sockets down, so the peers see the lines then EOF.
        drop(manager);
        assert_eq!(drain_lines(a_peer).await.len(), 1);
        assert_eq!(drain_lines(b_peer).await.len(), 2);
    }
}
