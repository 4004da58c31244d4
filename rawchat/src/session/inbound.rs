//! Inbound monitor: reads the socket, logs lines, answers keepalives.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::oneshot;

use rawchat_proto::command::{self, PONG};
use rawchat_proto::line;

use super::{LineDisplay, Outbox, ShutdownReason};

/// Read lines until the stream ends, then signal shutdown and close the
/// outbound queue, in that order.
///
/// A `PING` at the start of a line enqueues one `PONG`. Lines are decoded
/// as UTF-8 lossily so stray bytes never end the session.
///
/// Returns the reason that was signalled.
pub async fn monitor<R>(
    mut reader: R,
    outbox: Outbox,
    shutdown: oneshot::Sender<ShutdownReason>,
    line_display: LineDisplay,
) -> ShutdownReason
where
    R: AsyncBufRead + Unpin,
{
    let reason = read_lines(&mut reader, &outbox, line_display).await;
    match &reason {
        ShutdownReason::ReadFailed(e) => tracing::error!(error = %e, "connection read failed"),
        _ => tracing::info!("Remote host closed the connection."),
    }

    if shutdown.send(reason.clone()).is_err() {
        tracing::debug!("shutdown receiver already gone");
    }
    drop(outbox);
    reason
}

async fn read_lines<R>(
    reader: &mut R,
    outbox: &Outbox,
    line_display: LineDisplay,
) -> ShutdownReason
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(512);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return ShutdownReason::RemoteClosed,
            Ok(n) if !line::is_complete(&buf) => {
                tracing::debug!(bytes = n, "discarding unterminated data at end of stream");
                return ShutdownReason::RemoteClosed;
            }
            Ok(_) => {}
            Err(e) => return ShutdownReason::ReadFailed(e.to_string()),
        }

        let text = String::from_utf8_lossy(&buf);
        let shown = line_display.render(&text);
        tracing::info!("> {shown}");

        if command::is_ping(&text) && outbox.send(PONG).await.is_err() {
            tracing::warn!("outbound queue closed, keepalive reply dropped");
        }
    }
}
