//! Fan-out of received chunks
//!
//! Chooses recipients according to the `RelayMode` and queues the chunk on
//! each recipient's writer. A failed recipient is skipped, never fatal: its
//! own connection handler notices the broken writer and deregisters it.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::client::ClientHandle;
use crate::message::Chunk;
use crate::registry::ClientRegistry;
use crate::types::RelayMode;

/// Outcome of one `deliver` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients the chunk was offered to
    pub attempted: usize,
    /// Recipients whose writer accepted it
    pub delivered: usize,
}

impl DeliveryReport {
    /// True when some recipient could not be reached
    pub fn is_partial(&self) -> bool {
        self.delivered < self.attempted
    }
}

/// Routes chunks to clients
#[derive(Debug, Clone)]
pub struct Dispatcher {
    mode: RelayMode,
    registry: Arc<ClientRegistry>,
}

impl Dispatcher {
    pub fn new(mode: RelayMode, registry: Arc<ClientRegistry>) -> Self {
        Self { mode, registry }
    }

    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    /// Deliver `chunk` from `sender` according to the relay mode
    ///
    /// Echo writes back to the sender only. Broadcast writes to every client
    /// in a registry snapshot, sender included, in snapshot order. Disabled
    /// writes nothing. There is no rollback on partial delivery.
    pub async fn deliver(&self, chunk: &Chunk, sender: &ClientHandle) -> DeliveryReport {
        match self.mode {
            RelayMode::Disabled => DeliveryReport::default(),
            RelayMode::Echo => Self::fan_out(chunk, std::slice::from_ref(sender)).await,
            RelayMode::Broadcast => {
                let recipients = self.registry.snapshot().await;
                Self::fan_out(chunk, &recipients).await
            }
        }
    }

    async fn fan_out(chunk: &Chunk, recipients: &[ClientHandle]) -> DeliveryReport {
        let mut report = DeliveryReport {
            attempted: recipients.len(),
            delivered: 0,
        };

        for recipient in recipients {
            match recipient.send(chunk.clone()).await {
                Ok(()) => {
                    trace!("Queued {} bytes for {}", chunk.len(), recipient.id);
                    report.delivered += 1;
                }
                Err(e) => {
                    debug!("Skipping {}: {}", recipient.id, e);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::sync::mpsc;

    use super::*;

    fn handle() -> (ClientHandle, mpsc::Receiver<Chunk>) {
        let addr: SocketAddr = "127.0.0.1:6000".parse().unwrap();
        ClientHandle::new(addr)
    }

    async fn registry_with(handles: &[&ClientHandle]) -> Arc<ClientRegistry> {
        let registry = Arc::new(ClientRegistry::new(8));
        for h in handles {
            assert!(registry.try_add((*h).clone()).await);
        }
        registry
    }

    #[tokio::test]
    async fn test_echo_reaches_only_sender() {
        let (a, mut ra) = handle();
        let (b, mut rb) = handle();
        let registry = registry_with(&[&a, &b]).await;
        let dispatcher = Dispatcher::new(RelayMode::Echo, registry);

        let report = dispatcher.deliver(&Chunk::from("ping"), &a).await;

        assert_eq!(report, DeliveryReport { attempted: 1, delivered: 1 });
        assert_eq!(ra.try_recv().unwrap(), Chunk::from("ping"));
        assert!(rb.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let (a, mut ra) = handle();
        let (b, mut rb) = handle();
        let (c, mut rc) = handle();
        let registry = registry_with(&[&a, &b, &c]).await;
        let dispatcher = Dispatcher::new(RelayMode::Broadcast, registry);

        let report = dispatcher.deliver(&Chunk::from("hello"), &b).await;

        assert_eq!(report.delivered, 3);
        for rx in [&mut ra, &mut rb, &mut rc] {
            assert_eq!(rx.try_recv().unwrap(), Chunk::from("hello"));
        }
    }

    #[tokio::test]
    async fn test_disabled_writes_nothing() {
        let (a, mut ra) = handle();
        let registry = registry_with(&[&a]).await;
        let dispatcher = Dispatcher::new(RelayMode::Disabled, registry);

        let report = dispatcher.deliver(&Chunk::from("x"), &a).await;

        assert_eq!(report, DeliveryReport::default());
        assert!(ra.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_recipient() {
        let (a, mut ra) = handle();
        let (b, rb) = handle();
        let (c, mut rc) = handle();
        let registry = registry_with(&[&a, &b, &c]).await;
        drop(rb);
        let dispatcher = Dispatcher::new(RelayMode::Broadcast, registry);

        let report = dispatcher.deliver(&Chunk::from("hi"), &a).await;

        assert_eq!(report, DeliveryReport { attempted: 3, delivered: 2 });
        assert!(report.is_partial());
        assert_eq!(ra.try_recv().unwrap(), Chunk::from("hi"));
        assert_eq!(rc.try_recv().unwrap(), Chunk::from("hi"));
    }

    #[tokio::test]
    async fn test_broadcast_ignores_removed_client() {
        let (a, mut ra) = handle();
        let (b, mut rb) = handle();
        let registry = registry_with(&[&a, &b]).await;
        registry.remove(b.id).await;
        let dispatcher = Dispatcher::new(RelayMode::Broadcast, Arc::clone(&registry));

        dispatcher.deliver(&Chunk::from("bye"), &a).await;

        assert_eq!(ra.try_recv().unwrap(), Chunk::from("bye"));
        assert!(rb.try_recv().is_err());
    }
}
