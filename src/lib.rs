//! Multi-client Line Chat Server Library
//!
//! A small TCP chat service built on tokio: clients connect, pick a
//! username, and exchange newline-delimited text messages.
//!
//! # Features
//! - Username negotiation with automatic `name1`, `name2`, ... disambiguation
//! - Broadcast chat to every other participant
//! - Join and leave announcements
//! - `/users` and `/quit` commands with private replies
//! - Disconnection handling
//!
//! # Architecture
//! - `Registry` is the only shared mutable state: a name → session map
//!   behind a reader/writer lock that is never held across I/O
//! - Each connection has a `handler` task plus a drain task that writes the
//!   session's bounded mailbox to the socket
//! - Broadcasts never wait on a recipient: a full mailbox drops the message
//!   for that recipient only
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use line_chat_server::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:9000").await.unwrap();
//!     let server = Arc::new(ChatServer::new(ServerConfig::default()));
//!     server.run(listener).await;
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod command;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{broadcast, Origin};
pub use client::Client;
pub use command::{dispatch, Command, Flow};
pub use error::{AppError, CommandError, RegistryError, SendError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ServerMessage};
pub use registry::Registry;
pub use server::{ChatServer, ServerConfig};
pub use types::{ClientId, NameCandidates};
