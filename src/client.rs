//! Client struct definition
//!
//! Represents a joined client: its identity, display name and the sending
//! half of its outbound mailbox.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Joined client session
///
/// The registry and the connection handler share it behind an `Arc`.
/// The mailbox closes when the last `Arc<Client>` is dropped, which
/// ends the session's drain task after it writes whatever is still queued.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Display name, unique in the registry while the session is live
    pub name: String,
    /// Remote endpoint of the connection
    pub peer_addr: SocketAddr,
    /// Server → Client mailbox (bounded)
    mailbox: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client session around the given mailbox
    pub fn new(
        id: ClientId,
        name: String,
        peer_addr: SocketAddr,
        mailbox: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            id,
            name,
            peer_addr,
            mailbox,
        }
    }

    /// Enqueue a message without waiting
    ///
    /// Fails with `MailboxFull` when the client is not keeping up.
    pub fn try_deliver(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.mailbox.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::MailboxFull,
            mpsc::error::TrySendError::Closed(_) => SendError::MailboxClosed,
        })
    }

    /// Enqueue a private reply, waiting for room in the mailbox
    ///
    /// Only the client's own handler should call this, so the wait never
    /// stalls anyone else.
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.mailbox
            .send(msg)
            .await
            .map_err(|_| SendError::MailboxClosed)
    }
}
