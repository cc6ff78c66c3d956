//! Multi-client TCP Text Relay Library
//!
//! Clients connect and send arbitrary text; the server logs every chunk
//! and, depending on its mode, echoes it to the sender or broadcasts it
//! to every connected client.
//!
//! # Modes
//! - Disabled (default): receive and log only
//! - Echo (`-e`): write each chunk back to its sender
//! - Broadcast (`-e -b`): write each chunk to every connected client
//!
//! # Architecture
//! - `RelayServer` accepts connections and enforces the capacity ceiling
//! - `ClientRegistry` is the only shared state, behind a single mutex
//! - Each connection has a `handle_connection` task plus a writer task
//!   draining the client's outbound queue
//! - `Dispatcher` picks recipients and queues chunks on their writers
//!
//! # Example
//! ```ignore
//! use text_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::new("127.0.0.1", 9000, true, true, 256).unwrap();
//!     let server = RelayServer::bind(&config).await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::ClientHandle;
pub use config::{ClientArgs, ServerArgs, ServerConfig};
pub use dispatcher::{DeliveryReport, Dispatcher};
pub use error::{AppError, SendError};
pub use handler::{handle_connection, DisconnectReason};
pub use message::Chunk;
pub use registry::ClientRegistry;
pub use server::RelayServer;
pub use types::{ClientId, RelayMode};
