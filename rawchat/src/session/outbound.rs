//! Outbound dispatcher: the only writer on the socket once a session runs.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use rawchat_proto::line;

use super::LineDisplay;

/// Counters reported when the dispatcher stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Lines written and flushed without error.
    pub sent: usize,
    /// Lines whose write or flush failed.
    pub failed: usize,
}

/// Write one line plus terminator and flush it right away.
///
/// # Errors
///
/// Returns the first write or flush error.
pub async fn write_line<W>(writer: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line::frame(text).as_bytes()).await?;
    writer.flush().await
}

/// Drain the outbound queue into `writer` until it is closed and empty.
///
/// Failures are logged and the loop moves on to the next message. A dead
/// socket therefore keeps getting write attempts until the inbound monitor
/// notices and closes the queue; nothing here detects it.
pub async fn dispatch<W>(
    mut writer: W,
    mut queue: mpsc::Receiver<String>,
    line_display: LineDisplay,
) -> DispatchStats
where
    W: AsyncWrite + Unpin,
{
    let mut stats = DispatchStats::default();
    while let Some(message) = queue.recv().await {
        let framed = line::frame(&message);
        let mut ok = true;

        if let Err(e) = writer.write_all(framed.as_bytes()).await {
            tracing::warn!(error = %e, "write failed");
            ok = false;
        }
        if let Err(e) = writer.flush().await {
            tracing::warn!(error = %e, "flush failed");
            ok = false;
        }
        let shown = line_display.render(&message);
        tracing::info!("< {shown}");

        if ok {
            stats.sent += 1;
        } else {
            stats.failed += 1;
        }
    }

    tracing::debug!(sent = stats.sent, failed = stats.failed, "outbound queue drained");
    stats
}
