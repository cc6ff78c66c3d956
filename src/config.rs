//! Server and client configuration
//!
//! Everything comes from the command line; there is no config file.

use clap::Parser;

use crate::client::DEFAULT_CLIENT_NAME;
use crate::error::AppError;
use crate::registry::DEFAULT_MAX_CLIENTS;
use crate::types::RelayMode;

/// Multi-client TCP text relay server.
#[derive(Parser, Debug)]
#[command(name = "relay_server", about = "Multi-client TCP text relay server")]
pub struct ServerArgs {
    /// Port to listen on.
    pub port: u16,

    /// Echo each message back to its sender.
    #[arg(short = 'e', long = "echo")]
    pub echo: bool,

    /// Send each message to every connected client (requires -e).
    #[arg(short = 'b', long = "broadcast")]
    pub broadcast: bool,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Maximum simultaneous clients.
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS)]
    pub max_clients: usize,
}

/// Interactive client for the relay server.
#[derive(Parser, Debug)]
#[command(name = "relay_client", about = "Interactive client for the relay server")]
pub struct ClientArgs {
    /// Server host.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Name prefixed to every line sent.
    #[arg(long, default_value = DEFAULT_CLIENT_NAME)]
    pub name: String,
}

impl ClientArgs {
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub mode: RelayMode,
    pub max_clients: usize,
}

impl ServerConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        echo: bool,
        broadcast: bool,
        max_clients: usize,
    ) -> Result<Self, AppError> {
        let mode = RelayMode::from_flags(echo, broadcast).ok_or(AppError::BroadcastRequiresEcho)?;
        if max_clients == 0 {
            return Err(AppError::InvalidCapacity);
        }

        Ok(Self {
            host: host.into(),
            port,
            mode,
            max_clients,
        })
    }

    /// `host:port` string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TryFrom<ServerArgs> for ServerConfig {
    type Error = AppError;

    fn try_from(args: ServerArgs) -> Result<Self, Self::Error> {
        Self::new(args.host, args.port, args.echo, args.broadcast, args.max_clients)
    }
}
