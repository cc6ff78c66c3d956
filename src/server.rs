//! Accept loop
//!
//! `RelayServer` owns the listening socket, the shared registry and the
//! dispatcher. Each accepted connection is checked against the capacity
//! ceiling and, if admitted, served by its own `handle_connection` task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::client::ClientHandle;
use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::registry::ClientRegistry;

/// The relay server
pub struct RelayServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    dispatcher: Dispatcher,
}

impl RelayServer {
    /// Bind the listening socket
    ///
    /// Failure here is fatal: no handler can run without a listener.
    pub async fn bind(config: &ServerConfig) -> Result<Self, AppError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;

        let registry = Arc::new(ClientRegistry::new(config.max_clients));
        let dispatcher = Dispatcher::new(config.mode, Arc::clone(&registry));

        Ok(Self {
            listener,
            registry,
            dispatcher,
        })
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry, for inspection
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run the accept loop forever
    ///
    /// Accept errors are logged and the loop keeps going.
    pub async fn run(self) {
        info!(
            "Relay server started on {} (mode: {}, max {} clients)",
            self.listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            self.dispatcher.mode(),
            self.registry.capacity()
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.admit(stream, addr).await,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Register an accepted connection and spawn its handler, or close it
    /// if the registry is full
    async fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        let (handle, outbound) = ClientHandle::new(addr);

        if !self.registry.try_add(handle.clone()).await {
            warn!("Too many clients. Connection from {} rejected", addr);
            drop(stream);
            return;
        }

        info!(
            "Client {} connected from {} ({}/{} clients)",
            handle.id,
            handle.peer_addr,
            self.registry.len().await,
            self.registry.capacity()
        );

        let registry = Arc::clone(&self.registry);
        let dispatcher = self.dispatcher.clone();

        // Spawn handler task for each connection
        tokio::spawn(handle_connection(stream, handle, outbound, registry, dispatcher));
    }
}
