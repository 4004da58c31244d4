//! Local input feeder: forwards typed lines and closes the socket on EOF.

use std::io::BufRead;
use std::thread::JoinHandle;

use rawchat_proto::line;

use crate::transport::TransportCloser;

use super::InputOutbox;

/// Forward each line of `input` to the outbound queue, verbatim.
///
/// Only the terminator is removed. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD rather than ending input.
///
/// When input ends (or fails, or the queue is gone) the transport is closed
/// through `closer`, which is what ends the session from the local side.
/// The shutdown signal and the queue are left alone.
///
/// Returns the number of lines forwarded.
pub fn feed<R: BufRead>(mut input: R, outbox: &InputOutbox, closer: TransportCloser) -> usize {
    let mut forwarded = 0;
    let mut buf = Vec::with_capacity(512);
    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "local input read failed");
                break;
            }
        }
        let text = String::from_utf8_lossy(&buf);
        let typed = line::strip_terminator(&text).to_string();
        if outbox.blocking_send(typed).is_err() {
            tracing::debug!("outbound queue closed, stopping local input");
            break;
        }
        forwarded += 1;
    }

    tracing::info!(lines = forwarded, "local input ended, closing connection");
    if let Err(e) = closer.close() {
        tracing::debug!(error = %e, "connection already closed");
    }
    forwarded
}

/// Run [`feed`] on a dedicated OS thread.
///
/// Blocking reads of local input stay off the async runtime.
///
/// # Errors
///
/// Returns an I/O error if the thread cannot be spawned.
pub fn spawn_feeder<R>(
    input: R,
    outbox: InputOutbox,
    closer: TransportCloser,
) -> std::io::Result<JoinHandle<usize>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("local-input".to_string())
        .spawn(move || feed(input, &outbox, closer))
}
