//! Connection handler
//!
//! One task per admitted client. Reads chunks until EOF or an error, logs
//! each one, and hands it to the `Dispatcher` when relaying is enabled.
//! Socket writes happen in a separate writer task fed by the client's
//! outbound queue, so a handler that is busy dispatching never stalls
//! deliveries addressed to it.

use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::ClientHandle;
use crate::dispatcher::Dispatcher;
use crate::message::{Chunk, READ_BUFFER_SIZE};
use crate::registry::ClientRegistry;
use crate::types::ClientId;

/// Why a connection ended
#[derive(Debug)]
pub enum DisconnectReason {
    /// Zero-length read
    PeerClosed,
    /// Read returned an error
    ReadFailed(io::Error),
    /// The writer task could not write to the socket
    WriteFailed,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => f.write_str("closed by peer"),
            Self::ReadFailed(e) => write!(f, "read error: {}", e),
            Self::WriteFailed => f.write_str("write error"),
        }
    }
}

/// Serve one admitted client until it disconnects
///
/// The handle must already be registered. On exit the writer is torn down,
/// the client is removed from the registry and the stream is closed.
pub async fn handle_connection<S>(
    stream: S,
    handle: ClientHandle,
    outbound: mpsc::Receiver<Chunk>,
    registry: Arc<ClientRegistry>,
    dispatcher: Dispatcher,
) -> DisconnectReason
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let mut write_task = tokio::spawn(write_loop(writer, outbound, handle.id));
    let mut writer_finished = false;
    let mut buf = [0u8; READ_BUFFER_SIZE];

    let reason = loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break DisconnectReason::PeerClosed,
                Ok(n) => {
                    let chunk = Chunk::from(&buf[..n]);
                    info!("Message from client {}: {}", handle.id, chunk.to_text());

                    if dispatcher.mode().echoes() {
                        let report = dispatcher.deliver(&chunk, &handle).await;
                        if report.is_partial() {
                            debug!(
                                "Partial delivery from {}: {}/{}",
                                handle.id, report.delivered, report.attempted
                            );
                        }
                    }
                }
                Err(e) => break DisconnectReason::ReadFailed(e),
            },
            _ = &mut write_task => {
                writer_finished = true;
                break DisconnectReason::WriteFailed;
            }
        }
    };

    // Writer goes first: once the receiver is dropped, sends from any
    // snapshot still holding this handle fail instead of reaching the socket
    if !writer_finished {
        write_task.abort();
        let _ = write_task.await;
    }
    registry.remove(handle.id).await;
    drop(reader);

    info!(
        "Client {} ({}) disconnected ({})",
        handle.id, handle.peer_addr, reason
    );
    reason
}

/// Drain the outbound queue into the socket until a write fails
async fn write_loop<S>(mut writer: WriteHalf<S>, mut outbound: mpsc::Receiver<Chunk>, id: ClientId)
where
    S: AsyncWrite,
{
    while let Some(chunk) = outbound.recv().await {
        if let Err(e) = writer.write_all(chunk.as_bytes()).await {
            debug!("Write to {} failed: {}", id, e);
            break;
        }
    }
    debug!("Write task ended for {}", id);
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use tokio::io::{duplex, DuplexStream};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    use super::*;
    use crate::types::RelayMode;

    const WAIT: Duration = Duration::from_secs(2);

    fn addr() -> SocketAddr {
        "127.0.0.1:7000".parse().unwrap()
    }

    /// Register a client and start its handler; returns the peer's end
    async fn connect(
        registry: &Arc<ClientRegistry>,
        dispatcher: &Dispatcher,
    ) -> (ClientHandle, DuplexStream, JoinHandle<DisconnectReason>) {
        let (server_side, peer_side) = duplex(4096);
        let (handle, outbound) = ClientHandle::new(addr());
        assert!(registry.try_add(handle.clone()).await);

        let task = tokio::spawn(handle_connection(
            server_side,
            handle.clone(),
            outbound,
            Arc::clone(registry),
            dispatcher.clone(),
        ));
        (handle, peer_side, task)
    }

    fn setup(mode: RelayMode) -> (Arc<ClientRegistry>, Dispatcher) {
        let registry = Arc::new(ClientRegistry::new(4));
        let dispatcher = Dispatcher::new(mode, Arc::clone(&registry));
        (registry, dispatcher)
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let (registry, dispatcher) = setup(RelayMode::Echo);
        let (_handle, mut peer, _task) = connect(&registry, &dispatcher).await;

        peer.write_all(b"ping\n").await.unwrap();

        let mut buf = [0u8; 5];
        timeout(WAIT, peer.read_exact(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf, b"ping\n");
    }

    #[tokio::test]
    async fn test_eof_deregisters() {
        let (registry, dispatcher) = setup(RelayMode::Echo);
        let (handle, peer, task) = connect(&registry, &dispatcher).await;
        assert!(registry.contains(handle.id).await);

        drop(peer);

        let reason = timeout(WAIT, task).await.unwrap().unwrap();
        assert!(matches!(reason, DisconnectReason::PeerClosed));
        assert!(!registry.contains(handle.id).await);
    }

    #[tokio::test]
    async fn test_disabled_mode_stays_silent() {
        let (registry, dispatcher) = setup(RelayMode::Disabled);
        let (_handle, mut peer, _task) = connect(&registry, &dispatcher).await;

        peer.write_all(b"hello").await.unwrap();

        let mut buf = [0u8; 16];
        let read = timeout(Duration::from_millis(200), peer.read(&mut buf)).await;
        assert!(read.is_err(), "nothing should be written back");
    }

    #[tokio::test]
    async fn test_other_client_survives_disconnect() {
        let (registry, dispatcher) = setup(RelayMode::Broadcast);
        let (a, peer_a, task_a) = connect(&registry, &dispatcher).await;
        let (b, mut peer_b, _task_b) = connect(&registry, &dispatcher).await;

        drop(peer_a);
        timeout(WAIT, task_a).await.unwrap().unwrap();

        assert!(!registry.contains(a.id).await);
        assert!(registry.contains(b.id).await);

        peer_b.write_all(b"still here").await.unwrap();
        let mut buf = [0u8; 10];
        timeout(WAIT, peer_b.read_exact(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf, b"still here");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_removed_client_receives_nothing() {
        let (registry, dispatcher) = setup(RelayMode::Broadcast);
        let (_a, mut peer_a, _task_a) = connect(&registry, &dispatcher).await;
        let (b, mut peer_b, _task_b) = connect(&registry, &dispatcher).await;

        // Half-close: B's handler sees EOF while B can still read
        peer_b.shutdown().await.unwrap();
        timeout(WAIT, async {
            while registry.contains(b.id).await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // A stale copy of B's handle, as held by an older snapshot
        assert_eq!(
            b.send(Chunk::from("stale")).await,
            Err(crate::error::SendError::ChannelClosed)
        );

        peer_a.write_all(b"late").await.unwrap();
        let mut buf = [0u8; 4];
        timeout(WAIT, peer_a.read_exact(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf, b"late");

        let mut rest = Vec::new();
        timeout(WAIT, peer_b.read_to_end(&mut rest)).await.unwrap().unwrap();
        assert!(rest.is_empty(), "removed client got {:?}", rest);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(DisconnectReason::PeerClosed.to_string(), "closed by peer");
        assert_eq!(DisconnectReason::WriteFailed.to_string(), "write error");
    }
}
