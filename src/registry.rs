//! Client registry
//!
//! The set of currently connected clients, bounded by a fixed capacity.
//! Every operation takes the same lock for its whole critical section, so
//! admission, removal and snapshots never observe each other half-done.

use tokio::sync::Mutex;
use tracing::debug;

use crate::client::ClientHandle;
use crate::types::ClientId;

/// Default ceiling on simultaneous clients
pub const DEFAULT_MAX_CLIENTS: usize = 256;

/// Registry for tracking connected clients
///
/// Entries are kept in admission order. Removal shifts later entries down
/// so the order of the remaining clients is preserved.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: Mutex<Vec<ClientHandle>>,
    capacity: usize,
}

impl ClientRegistry {
    /// Create an empty registry admitting at most `capacity` clients
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Admit a client if there is room
    ///
    /// Returns false when the registry is full or the handle is already
    /// registered; the caller is responsible for closing the connection.
    pub async fn try_add(&self, handle: ClientHandle) -> bool {
        let mut clients = self.clients.lock().await;

        if clients.len() >= self.capacity {
            return false;
        }
        if clients.iter().any(|c| c.id == handle.id) {
            debug!("Client {} already registered", handle.id);
            return false;
        }

        clients.push(handle);
        true
    }

    /// Remove a client by ID
    ///
    /// Returns true if an entry was removed. Removing an absent ID is a no-op.
    pub async fn remove(&self, id: ClientId) -> bool {
        let mut clients = self.clients.lock().await;

        match clients.iter().position(|c| c.id == id) {
            Some(index) => {
                // Vec::remove shifts the tail, keeping order
                clients.remove(index);
                true
            }
            None => false,
        }
    }

    /// Point-in-time copy of all registered clients, in admission order
    pub async fn snapshot(&self) -> Vec<ClientHandle> {
        self.clients.lock().await.clone()
    }

    /// Number of registered clients
    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }

    /// Check if a client is registered
    pub async fn contains(&self, id: ClientId) -> bool {
        self.clients.lock().await.iter().any(|c| c.id == id)
    }

    /// Configured capacity ceiling
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLIENTS)
    }
}
