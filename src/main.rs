//! Relay Server - Entry Point
//!
//! Parses the command line, binds the listener and runs the accept loop.

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use text_relay::{RelayServer, ServerArgs, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=text_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("text_relay=info,relay_server=info")),
        )
        .init();

    let args = ServerArgs::parse();

    // Fatal startup errors are logged, then returned for a nonzero exit
    let config = ServerConfig::try_from(args).inspect_err(|e| error!("{}", e))?;
    let server = RelayServer::bind(&config)
        .await
        .inspect_err(|e| error!("{}", e))?;

    server.run().await;
    Ok(())
}
