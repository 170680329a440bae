//! Message protocol definitions
//!
//! Newline-delimited text protocol. Every `ServerMessage` renders to exactly
//! one line (without the terminator, which the line codec appends), and every
//! inbound line is classified as a `ClientMessage`.

use std::fmt;

use crate::error::CommandError;

/// Prefix that marks an inbound line as a slash command
pub const COMMAND_PREFIX: char = '/';

/// Client → Server message
///
/// Every line after the username is either chat or a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Plain chat body, relayed as sent
    Chat(String),
    /// Line starting with `/`, handed to the command dispatcher
    Command(String),
}

impl ClientMessage {
    /// Classify one inbound line
    pub fn parse(line: String) -> Self {
        if line.starts_with(COMMAND_PREFIX) {
            ClientMessage::Command(line)
        } else {
            ClientMessage::Chat(line)
        }
    }
}

/// Server → Client message
///
/// Everything the server ever writes to a client, one variant per line shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Username request, sent before any other traffic
    Prompt,
    /// Private greeting after a successful join
    Welcome { name: String },
    /// Chat line from another participant
    Chat { from: String, body: String },
    /// System announcement: someone joined
    Joined { name: String },
    /// System announcement: someone left
    Left { name: String },
    /// Reply to `/users`
    Online { names: Vec<String> },
    /// Reply to an unrecognized command
    UnknownCommand,
    /// Reply to `/quit`
    Goodbye,
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Prompt => write!(f, "Enter username:"),
            ServerMessage::Welcome { name } => {
                write!(f, "Welcome, {}! Commands: /users, /quit", name)
            }
            ServerMessage::Chat { from, body } => write!(f, "{}: {}", from, body),
            ServerMessage::Joined { name } => write!(f, "*** {} has joined the chat ***", name),
            ServerMessage::Left { name } => write!(f, "*** {} has left the chat ***", name),
            ServerMessage::Online { names } => {
                write!(f, "Online ({}): {}", names.len(), names.join(", "))
            }
            ServerMessage::UnknownCommand => {
                write!(f, "Unknown command. Available: /users, /quit")
            }
            ServerMessage::Goodbye => write!(f, "Goodbye!"),
        }
    }
}

/// Convert CommandError to ServerMessage for client notification
impl From<CommandError> for ServerMessage {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Unknown(_) => ServerMessage::UnknownCommand,
        }
    }
}
