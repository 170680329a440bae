//! Broadcast fan-out
//!
//! Delivers one message to every joined session except the sender.
//! Delivery is best-effort: a recipient whose mailbox is full simply misses
//! the message. A single slow client therefore never stalls the sender or
//! the other recipients.

use tracing::debug;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::registry::Registry;

/// Who a broadcast comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin<'a> {
    /// Server announcement, delivered to everyone
    System,
    /// A participant, who does not get their own message back
    Client(&'a str),
}

impl<'a> Origin<'a> {
    fn excluded(self) -> Option<&'a str> {
        match self {
            Origin::System => None,
            Origin::Client(name) => Some(name),
        }
    }
}

/// Fan `message` out to every session in `registry` except `origin`
///
/// Never waits on a recipient. Per-recipient failures are logged and
/// otherwise invisible to the caller.
pub fn broadcast(registry: &Registry, origin: Origin<'_>, message: &ServerMessage) {
    let mut delivered = 0usize;
    let mut dropped = 0usize;

    registry.for_each_except(origin.excluded(), |client| {
        match client.try_deliver(message.clone()) {
            Ok(()) => delivered += 1,
            Err(SendError::MailboxFull) => {
                debug!("Mailbox full for {}, message dropped", client.name);
                dropped += 1;
            }
            Err(SendError::MailboxClosed) => {
                // Recipient is tearing down; its handler removes it.
                debug!("Mailbox closed for {}, skipping", client.name);
            }
        }
    });

    debug!(
        "Broadcast from {:?}: delivered {}, dropped {}",
        origin, delivered, dropped
    );
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::client::Client;
    use crate::types::ClientId;

    fn join(
        registry: &Registry,
        name: &str,
        capacity: usize,
    ) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(capacity);
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let client = Client::new(ClientId::new(), name.to_string(), addr, tx);
        registry.add(Arc::new(client)).unwrap();
        rx
    }

    fn chat(from: &str, body: &str) -> ServerMessage {
        ServerMessage::Chat {
            from: from.to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sender_is_excluded() {
        let registry = Registry::new();
        let mut alice = join(&registry, "alice", 8);
        let mut bob = join(&registry, "bob", 8);
        let mut carol = join(&registry, "carol", 8);

        broadcast(&registry, Origin::Client("alice"), &chat("alice", "hi"));

        assert_eq!(bob.try_recv().ok(), Some(chat("alice", "hi")));
        assert_eq!(carol.try_recv().ok(), Some(chat("alice", "hi")));
        assert!(alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_system_reaches_everyone() {
        let registry = Registry::new();
        let mut alice = join(&registry, "alice", 8);
        let mut bob = join(&registry, "bob", 8);
        let joined = ServerMessage::Joined {
            name: "bob".to_string(),
        };

        broadcast(&registry, Origin::System, &joined);

        assert_eq!(alice.try_recv().ok(), Some(joined.clone()));
        assert_eq!(bob.try_recv().ok(), Some(joined));
    }

    #[tokio::test]
    async fn test_full_mailbox_drops_overflow() {
        let registry = Registry::new();
        let mut slow = join(&registry, "slow", 2);
        let mut fast = join(&registry, "fast", 8);

        for i in 0..3 {
            broadcast(&registry, Origin::Client("sender"), &chat("sender", &i.to_string()));
        }

        // The slow recipient kept the first two and lost the overflow
        assert_eq!(slow.try_recv().ok(), Some(chat("sender", "0")));
        assert_eq!(slow.try_recv().ok(), Some(chat("sender", "1")));
        assert!(slow.try_recv().is_err());

        // Everyone else got all three, in order
        for i in 0..3 {
            assert_eq!(fast.try_recv().ok(), Some(chat("sender", &i.to_string())));
        }
    }

    #[tokio::test]
    async fn test_closed_mailbox_does_not_affect_others() {
        let registry = Registry::new();
        let gone = join(&registry, "gone", 8);
        let mut bob = join(&registry, "bob", 8);
        drop(gone);

        broadcast(&registry, Origin::System, &chat("x", "still here"));

        assert_eq!(bob.try_recv().ok(), Some(chat("x", "still here")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new();
        broadcast(&registry, Origin::System, &ServerMessage::Goodbye);
        assert!(registry.is_empty());
    }
}
