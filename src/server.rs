//! ChatServer implementation
//!
//! The per-process shared state: the connection registry plus configuration.
//! One instance is created at startup and handed to every connection handler
//! behind an `Arc`; there is no global client map.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broadcast::{self, Origin};
use crate::handler::handle_connection;
use crate::message::ServerMessage;
use crate::registry::Registry;

/// Default per-client mailbox capacity
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Default maximum inbound line length in bytes
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Server tunables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Outbound messages buffered per client before broadcasts start dropping
    ///
    /// Values below 1 are treated as 1.
    pub mailbox_capacity: usize,
    /// Longest accepted inbound line; longer lines close the connection
    pub max_line_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// The chat server
///
/// Owns the registry. Handlers reach other sessions only through it.
#[derive(Debug, Default)]
pub struct ChatServer {
    registry: Registry,
    config: ServerConfig,
}

impl ChatServer {
    /// Create a ChatServer with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    /// The registry of joined sessions
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration this server was built with
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Fan a message out to everyone except `origin`
    pub fn broadcast(&self, origin: Origin<'_>, message: &ServerMessage) {
        broadcast::broadcast(&self.registry, origin, message);
    }

    /// Run the accept loop
    ///
    /// Spawns one handler task per connection. Accept errors are logged and
    /// the loop keeps going; it only returns if the task is dropped.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        info!("ChatServer started");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let server = Arc::clone(&self);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, server).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
