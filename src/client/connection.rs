//! Module `connection`
//!
//! Outbound half of a client connection. Every line bound for a client goes
//! through its [`Outbox`], a bounded queue drained by a dedicated writer task
//! that owns the socket's write half. Senders never touch the socket, so a
//! slow or stalled client can only fill its own queue.

use log::{debug, info, warn};
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::task::JoinHandle;

/// Cloneable sending side of one client's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: Sender<String>,
}

/// Outcome of queueing one line for a client
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The client's queue is full; the line was dropped
    Dropped,
    /// The client's writer has shut down
    Gone,
}

impl Outbox {
    /// Queue one line (without trailing newline) for the client.
    ///
    /// Never waits: a full queue drops the line, and a closed one means the
    /// recipient has already gone away.
    pub fn send_line(&self, line: impl Into<String>) -> Delivery {
        match self.tx.try_send(line.into()) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(line)) => {
                warn!("Outbox full, dropping line: {}", line);
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => Delivery::Gone,
        }
    }

    /// Queue several lines in order
    pub fn send_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            if self.send_line(line) == Delivery::Gone {
                break;
            }
        }
    }
}

/// Creates an outbox and the receiving end its writer drains.
pub fn outbox(capacity: usize) -> (Outbox, Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Outbox { tx }, rx)
}

/// Send the same line to every outbox in `recipients`.
pub fn deliver_all(recipients: &[Outbox], line: &str) {
    for outbox in recipients {
        outbox.send_line(line);
    }
}

/// Spawns the writer task for one connection.
///
/// Writes each queued line followed by `\n` until every [`Outbox`] clone has
/// been dropped, then shuts the write half down. A write failure ends the
/// task; later sends to this client report [`Delivery::Gone`].
pub fn spawn_writer<W>(mut writer: W, mut rx: Receiver<String>, peer: SocketAddr) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            let mut frame = line.into_bytes();
            frame.push(b'\n');

            if let Err(e) = writer.write_all(&frame).await {
                info!("Write to {} failed, closing writer: {}", peer, e);
                rx.close();
                break;
            }

            // Flush only once the queue is momentarily empty
            if rx.is_empty() {
                if let Err(e) = writer.flush().await {
                    info!("Flush to {} failed, closing writer: {}", peer, e);
                    rx.close();
                    break;
                }
            }
        }

        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of {} write half failed: {}", peer, e);
        }
        debug!("Writer for {} finished", peer);
    })
}
