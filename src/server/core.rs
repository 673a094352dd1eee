use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::client::handle_client;
use crate::config::ServerConfig;
use crate::error::ChatServerError;
use crate::registry::Registry;

/// The chat server: a bound listener plus the context handed to each worker.
pub struct Server {
    registry: Registry,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener described by `config`.
    ///
    /// A bind failure is returned to the caller; it is fatal for the process.
    pub async fn bind(config: ServerConfig) -> Result<Self, ChatServerError> {
        let addr = config.listen_socket();

        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!("Server bound to {}", addr);
                listener
            }
            Err(source) => {
                error!("Failed to bind to {}: {}", addr, source);
                return Err(ChatServerError::Bind { addr, source });
            }
        };

        Ok(Self {
            registry: Registry::new(config.max_clients, config.max_id_length),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChatServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared registry, e.g. for inspecting membership.
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// Accepts connections forever, one worker task per client.
    pub async fn start(&self) {
        info!(
            "Starting group chat server on {} (max {} clients)",
            self.config.listen_socket(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Client connected: {}", addr);
                    let registry = self.registry.clone();
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(handle_client(stream, addr, registry, config));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
