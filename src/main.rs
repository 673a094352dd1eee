//! Group Chat Server - Entry Point
//!
//! Usage: group-chat-server [port]

use log::{error, info};
use std::process::ExitCode;

use group_chat_server::{ChatServerError, Server, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port_override = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<u16>() {
            Ok(port) if port != 0 => Some(port),
            _ => {
                error!("Invalid port: {}", arg);
                error!("Usage: group-chat-server [port]");
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    match run(port_override).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server startup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, binds, and serves until Ctrl-C.
async fn run(port_override: Option<u16>) -> Result<(), ChatServerError> {
    let config = ServerConfig::load()?;
    let config = match port_override {
        Some(port) => config.with_port(port),
        None => config,
    };

    info!("Launching group chat server...");
    let server = Server::bind(config).await?;

    tokio::select! {
        _ = server.start() => {}
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
