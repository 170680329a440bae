//! Connection handler
//!
//! Drives one client through `NEGOTIATING → ACTIVE → CLOSING → CLOSED`:
//! asks for a name, joins the registry, relays inbound lines to the
//! broadcaster or the command dispatcher, and drains the client's mailbox
//! to the socket from a separate task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, info, warn};

use crate::broadcast::Origin;
use crate::client::Client;
use crate::command::{dispatch, Flow};
use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ChatServer;
use crate::types::ClientId;

/// How long a closing session may spend flushing its mailbox
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the active phase ended
#[derive(Debug)]
enum CloseReason {
    EndOfStream,
    Quit,
    ReadFailed,
    WriteFailed,
}

/// Handle a new connection
///
/// Works on any duplex byte stream. Errors are returned only for failures
/// before the client has joined; once joined, every I/O failure is treated
/// as a disconnect.
pub async fn handle_connection<S>(
    stream: S,
    peer_addr: SocketAddr,
    server: Arc<ChatServer>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let client_id = ClientId::new();
    debug!("Client {} connected from {}", client_id, peer_addr);

    let (reader, writer) = tokio::io::split(stream);
    let mut lines = FramedRead::new(
        reader,
        LinesCodec::new_with_max_length(server.config().max_line_length),
    );
    let mut sink = FramedWrite::new(writer, LinesCodec::new());

    // Name negotiation
    sink.send(ServerMessage::Prompt.to_string()).await?;

    let Some(requested) = lines.next().await else {
        debug!("Client {} left before choosing a name", client_id);
        return Ok(());
    };
    let requested = requested?;
    let requested = match requested.trim() {
        "" => peer_addr.to_string(),
        name => name.to_string(),
    };

    let (mailbox_tx, mailbox_rx) = mpsc::channel(server.config().mailbox_capacity.max(1));
    let client = server
        .registry()
        .claim(&requested, |name| Client::new(client_id, name, peer_addr, mailbox_tx));
    info!("Client {} joined as '{}'", client_id, client.name);

    let mut write_task = tokio::spawn(drain_mailbox(mailbox_rx, sink, client_id));

    server.broadcast(
        Origin::System,
        &ServerMessage::Joined {
            name: client.name.clone(),
        },
    );
    if let Err(e) = client
        .send(ServerMessage::Welcome {
            name: client.name.clone(),
        })
        .await
    {
        debug!("Welcome for {} not queued: {}", client_id, e);
    }

    // Active until the client goes away, quits, or can no longer be written to
    let reason = tokio::select! {
        reason = read_lines(&mut lines, &client, &server) => reason,
        _ = &mut write_task => CloseReason::WriteFailed,
    };
    debug!("Client {} closing: {:?}", client_id, reason);

    // Closing
    let name = client.name.clone();
    if server.registry().remove_session(&client) {
        server.broadcast(Origin::System, &ServerMessage::Left { name: name.clone() });
    }

    // Last handle to the session: dropping it closes the mailbox
    drop(client);

    if !matches!(reason, CloseReason::WriteFailed)
        && tokio::time::timeout(FLUSH_TIMEOUT, &mut write_task)
            .await
            .is_err()
    {
        warn!("Client {} did not drain in time, aborting writer", client_id);
        write_task.abort();
    }

    info!("Client {} ('{}') disconnected", client_id, name);

    Ok(())
}

/// Read and route lines until the client stops talking or quits
async fn read_lines<R>(
    lines: &mut FramedRead<R, LinesCodec>,
    client: &Client,
    server: &ChatServer,
) -> CloseReason
where
    R: AsyncRead + Unpin,
{
    while let Some(result) = lines.next().await {
        let line = match result {
            Ok(line) => line,
            Err(e) => {
                debug!("Read from {} failed: {}", client.id, e);
                return CloseReason::ReadFailed;
            }
        };

        match ClientMessage::parse(line) {
            ClientMessage::Command(command) => {
                if dispatch(&command, client, server.registry()).await == Flow::Quit {
                    return CloseReason::Quit;
                }
            }
            ClientMessage::Chat(body) => {
                server.broadcast(
                    Origin::Client(&client.name),
                    &ServerMessage::Chat {
                        from: client.name.clone(),
                        body,
                    },
                );
            }
        }
    }

    CloseReason::EndOfStream
}

/// Write mailbox messages to the client, one line each
///
/// Ends when the mailbox closes or a write fails, then closes the sink.
async fn drain_mailbox<W>(
    mut mailbox: mpsc::Receiver<ServerMessage>,
    mut sink: FramedWrite<W, LinesCodec>,
    client_id: ClientId,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = mailbox.recv().await {
        if let Err(e) = sink.send(msg.to_string()).await {
            debug!("Write to {} failed: {}", client_id, e);
            break;
        }
    }
    debug!("Write task ended for {}", client_id);

    if let Err(e) = SinkExt::<String>::close(&mut sink).await {
        debug!("Closing writer for {} failed: {}", client_id, e);
    }
}
