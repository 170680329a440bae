//! Slash command dispatcher
//!
//! Interprets `/`-prefixed lines for the issuing client. Replies are private:
//! they go to the issuer's own mailbox and nowhere else. `/quit` only asks the
//! connection handler to close; the handler owns registry removal.

use tracing::debug;

use crate::client::Client;
use crate::error::CommandError;
use crate::message::ServerMessage;
use crate::registry::Registry;

/// Recognized slash commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List online users
    Users,
    /// Leave the chat
    Quit,
}

impl Command {
    /// Parse a command line, ignoring surrounding whitespace
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        match line.trim() {
            "/users" => Ok(Command::Users),
            "/quit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// What the connection handler should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading lines
    Continue,
    /// Move to closing
    Quit,
}

/// Run one command line on behalf of `client`
pub async fn dispatch(line: &str, client: &Client, registry: &Registry) -> Flow {
    let (reply, flow) = match Command::parse(line) {
        Ok(Command::Users) => {
            let names = registry.snapshot();
            (ServerMessage::Online { names }, Flow::Continue)
        }
        Ok(Command::Quit) => (ServerMessage::Goodbye, Flow::Quit),
        Err(e) => {
            debug!("{} from {}", e, client.name);
            (e.into(), Flow::Continue)
        }
    };

    if client.send(reply).await.is_err() {
        // Drain task is gone, so the connection is too
        return Flow::Quit;
    }
    flow
}
