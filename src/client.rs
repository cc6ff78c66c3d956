//! Client handle and client-side helpers
//!
//! `ClientHandle` is the server's view of one connected peer: an identifier
//! for logging and removal, plus a queue into that peer's writer task.
//! Membership (the registry holds a clone) and I/O (the connection handler
//! owns the socket) are kept apart so dispatch never touches a socket that
//! a handler is reading from.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Chunk;
use crate::types::ClientId;

/// Outbound queue depth per client
pub const OUTBOUND_BUFFER_SIZE: usize = 32;

/// Name the client program prefixes to each line by default
pub const DEFAULT_CLIENT_NAME: &str = "[CLIENT]";

/// Connected client information
#[derive(Debug, Clone)]
pub struct ClientHandle {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Remote address, for logging
    pub peer_addr: SocketAddr,
    /// Server → Client chunk channel
    sender: mpsc::Sender<Chunk>,
}

impl ClientHandle {
    /// Create a handle and the receiving end its writer task drains
    pub fn new(peer_addr: SocketAddr) -> (Self, mpsc::Receiver<Chunk>) {
        let (sender, receiver) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let handle = Self {
            id: ClientId::new(),
            peer_addr,
            sender,
        };
        (handle, receiver)
    }

    /// Queue a chunk for this client
    ///
    /// Returns an error if the writer has shut down (client disconnected).
    pub async fn send(&self, chunk: Chunk) -> Result<(), SendError> {
        self.sender
            .send(chunk)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientHandle {}

/// True for a line that asks the client program to quit (`q` or `Q`)
pub fn is_quit_command(line: &str) -> bool {
    matches!(line.trim_end_matches(['\r', '\n']), "q" | "Q")
}

/// Format a stdin line for sending: `"{name} {line}\n"`
pub fn format_outgoing(name: &str, line: &str) -> String {
    format!("{} {}\n", name, line.trim_end_matches(['\r', '\n']))
}
