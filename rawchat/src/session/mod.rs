//! Session engine: three activities multiplexing one connection.
//!
//! # Architecture
//!
//! ```text
//!  local input ──► input feeder ─┐
//!                                ├─► outbound queue ──► dispatcher ──► socket
//!  socket ──► inbound monitor ───┘ (PONG)
//!                   │
//!                   └─► shutdown signal ──► run() returns
//! ```
//!
//! Every shared resource has exactly one closer:
//!
//! - the outbound queue is closed by the inbound monitor, which holds the
//!   only strong [`Outbox`]; the input feeder only gets an [`InputOutbox`]
//!   that cannot keep the queue alive,
//! - the socket is closed by the input feeder, which owns the
//!   [`TransportCloser`](crate::transport::TransportCloser),
//! - the shutdown signal is a oneshot consumed by the inbound monitor.

pub mod inbound;
pub mod input;
pub mod outbound;

use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;

use tokio::sync::{mpsc, oneshot};

use rawchat_proto::escape::escape_unprintables;
use rawchat_proto::line;

use crate::config::SessionConfig;
use crate::transport::Connection;

/// The outbound queue was closed before the line could be enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("outbound queue closed")]
pub struct QueueClosed;

/// Strong sending side of the outbound queue.
///
/// Exactly one exists per session and it belongs to the inbound monitor.
/// Dropping it closes the queue once in-flight sends complete.
#[derive(Debug)]
pub struct Outbox {
    tx: mpsc::Sender<String>,
}

impl Outbox {
    /// Enqueue one unterminated line.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] if the dispatcher is gone.
    pub async fn send(&self, line: impl Into<String>) -> Result<(), QueueClosed> {
        self.tx.send(line.into()).await.map_err(|_| QueueClosed)
    }

    /// Weak handle for the local input feeder.
    #[must_use]
    pub fn for_input(&self) -> InputOutbox {
        InputOutbox {
            tx: self.tx.downgrade(),
        }
    }
}

/// Sending side of the outbound queue for the local input feeder.
///
/// Holds a weak sender: it never keeps the queue open on its own, so the
/// input feeder cannot delay or race the queue closure.
#[derive(Debug, Clone)]
pub struct InputOutbox {
    tx: mpsc::WeakSender<String>,
}

impl InputOutbox {
    /// Enqueue one line from a blocking (non-async) thread.
    ///
    /// Must not be called from inside the async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] if the queue has been closed.
    pub fn blocking_send(&self, line: String) -> Result<(), QueueClosed> {
        let tx = self.tx.upgrade().ok_or(QueueClosed)?;
        tx.blocking_send(line).map_err(|_| QueueClosed)
    }
}

/// Create the outbound queue.
///
/// Returns the single strong [`Outbox`] and the receiver for the dispatcher.
#[must_use]
pub fn outbound_queue(capacity: usize) -> (Outbox, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Outbox { tx }, rx)
}

/// Why the session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The peer closed the stream (or the local side shut the socket down).
    RemoteClosed,
    /// Reading from the stream failed.
    ReadFailed(String),
    /// The inbound monitor stopped without signalling.
    MonitorLost,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteClosed => write!(f, "remote host closed the connection"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
            Self::MonitorLost => write!(f, "inbound monitor stopped unexpectedly"),
        }
    }
}

/// How protocol lines are rendered in the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineDisplay {
    escape: bool,
}

impl LineDisplay {
    /// `escape` enables `\uXXXX` rendering of unprintable characters.
    #[must_use]
    pub const fn new(escape: bool) -> Self {
        Self { escape }
    }

    /// Render `line` for logging, without its trailing terminator.
    #[must_use]
    pub fn render<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if self.escape {
            let escaped = escape_unprintables(line);
            Cow::Owned(line::strip_terminator(&escaped).to_string())
        } else {
            Cow::Borrowed(line::strip_terminator(line))
        }
    }
}

/// Run a session over an established connection until shutdown.
///
/// Spawns the input feeder on its own OS thread (local input is read with
/// blocking I/O) and the inbound monitor and outbound dispatcher as tokio
/// tasks, then waits for the shutdown signal. Nothing here times out: with
/// a silent peer and open local input this waits forever.
///
/// The dispatcher and feeder are not joined; they end on their own once the
/// queue and the socket are closed, or with the process.
///
/// # Errors
///
/// Returns an I/O error if the input feeder thread cannot be spawned.
pub async fn run<I>(
    conn: Connection,
    input: I,
    config: SessionConfig,
) -> std::io::Result<ShutdownReason>
where
    I: BufRead + Send + 'static,
{
    let (reader, writer, closer) = conn.into_parts();
    let line_display = LineDisplay::new(config.replace_unprintables);
    let (outbox, queue) = outbound_queue(config.channel_capacity);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    input::spawn_feeder(input, outbox.for_input(), closer)?;
    tokio::spawn(outbound::dispatch(writer, queue, line_display));
    tokio::spawn(inbound::monitor(reader, outbox, shutdown_tx, line_display));

    let reason = shutdown_rx.await.unwrap_or(ShutdownReason::MonitorLost);
    tracing::info!(%reason, "session ended");
    Ok(reason)
}
