//! Error types for the chat server
//!
//! Defines application-level errors, registry errors and mailbox send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Application-level errors
///
/// Everything here is fatal for the connection it happened on and
/// for no other.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error: read/write failure or an oversized line (fatal)
    #[error("Line codec error: {0}")]
    Codec(#[from] LinesCodecError),
}

/// Command dispatch errors
///
/// Recovered locally: the issuing client gets a private informational line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Slash command that the dispatcher does not recognize
    #[error("Unknown command: {0}")]
    Unknown(String),
}

/// Registry mutation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another live session already holds this display name
    #[error("Name already in use: {0}")]
    DuplicateName(String),
}

/// Message send errors
///
/// Occurs when enqueueing into a client's mailbox fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The mailbox is at capacity (recipient is not draining fast enough)
    #[error("Mailbox full")]
    MailboxFull,

    /// The receiving end of the mailbox has been closed
    #[error("Mailbox closed")]
    MailboxClosed,
}
