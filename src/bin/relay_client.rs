//! Relay Client - Entry Point
//!
//! Sends stdin lines to the server and copies whatever the server sends to
//! stdout. A line of `q` or `Q` quits.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use text_relay::client::{format_outgoing, is_quit_command};
use text_relay::message::READ_BUFFER_SIZE;
use text_relay::ClientArgs;

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never mix with relayed text
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = ClientArgs::parse();
    let addr = args.server_addr();

    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to connect to {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    println!("Connected to server.........");

    let (mut reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut stdin_open = true;
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if is_quit_command(&line) {
                        break;
                    }
                    let outgoing = format_outgoing(&args.name, &line);
                    if let Err(e) = writer.write_all(outgoing.as_bytes()).await {
                        error!("Failed to send: {}", e);
                        break;
                    }
                }
                Ok(None) => {
                    // Keep printing server output after stdin ends
                    debug!("stdin closed");
                    stdin_open = false;
                }
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    debug!("Server closed the connection");
                    break;
                }
                Ok(n) => {
                    if stdout.write_all(&buf[..n]).await.is_err() || stdout.flush().await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read from server: {}", e);
                    break;
                }
            },
        }
    }

    let _ = writer.shutdown().await;

    // A blocked stdin read would keep the runtime from shutting down
    std::process::exit(0);
}
