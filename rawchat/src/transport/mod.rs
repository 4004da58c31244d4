//! Line transport: the single duplex connection to the chat server.
//!
//! [`connect`] opens either a plaintext TCP stream or a TLS stream on top of
//! TCP and returns a [`Connection`]. The connection is split once into a
//! buffered read half, a write half and a [`TransportCloser`]:
//!
//! - the read half belongs to the inbound monitor,
//! - the write half belongs to the outbound dispatcher,
//! - the closer belongs to the local input feeder.
//!
//! Closing shuts the socket down in both directions, which makes a pending
//! read on the read half return end-of-stream. That is the only way a
//! blocked read is ever interrupted.

pub mod tls;

use std::io;
use std::net::{Shutdown, SocketAddr};

use tokio::io::{AsyncRead, AsyncWrite, BufReader, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

use crate::config::ServerConfig;

/// Any duplex byte stream the client can run a session over.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> DuplexStream for T {}

/// Type-erased stream, plain TCP or TLS.
pub type BoxedStream = Box<dyn DuplexStream>;

/// Buffered read half handed to the inbound monitor.
pub type LineReader = BufReader<ReadHalf<BoxedStream>>;

/// Write half handed to the outbound dispatcher.
pub type LineWriter = WriteHalf<BoxedStream>;

/// Errors that can occur while establishing the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The TCP connection could not be established.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The host is not a valid TLS server name.
    #[error("invalid TLS server name {0:?}")]
    InvalidServerName(String),

    /// The TLS client configuration could not be built.
    #[error("TLS client config error: {0}")]
    TlsConfig(#[from] rustls::Error),

    /// The TLS handshake failed (includes certificate rejection).
    #[error("TLS handshake failed: {0}")]
    TlsHandshake(io::Error),

    /// Any other socket-level failure.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

/// An established connection to the chat server.
pub struct Connection {
    reader: LineReader,
    writer: LineWriter,
    closer: TransportCloser,
    peer_addr: SocketAddr,
    secure: bool,
}

impl Connection {
    /// Wrap an established stream.
    ///
    /// `closer` must refer to the socket underneath `stream`.
    pub fn new(
        stream: BoxedStream,
        closer: TransportCloser,
        peer_addr: SocketAddr,
        secure: bool,
    ) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read_half),
            writer,
            closer,
            peer_addr,
            secure,
        }
    }

    /// Remote endpoint.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    /// Write half, for the setup lines sent before the session starts.
    pub const fn writer_mut(&mut self) -> &mut LineWriter {
        &mut self.writer
    }

    /// Split into the three single-owner parts.
    #[must_use]
    pub fn into_parts(self) -> (LineReader, LineWriter, TransportCloser) {
        (self.reader, self.writer, self.closer)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

/// Shuts the underlying socket down.
///
/// Holds a duplicate of the socket descriptor, so it can act while the
/// stream halves are busy in other tasks. `close` consumes the closer: the
/// transport is closed at most once.
#[derive(Debug)]
pub struct TransportCloser {
    socket: std::net::TcpStream,
}

impl TransportCloser {
    /// Shut the socket down in both directions.
    ///
    /// A pending read on the connection returns end-of-stream (or an error
    /// for TLS streams cut short), and later writes fail.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the socket could not be shut down, e.g.
    /// because the peer already reset it.
    pub fn close(self) -> io::Result<()> {
        self.socket.shutdown(Shutdown::Both)
    }
}

/// Split a closer off a connected TCP stream.
///
/// Must be called from within a tokio runtime.
///
/// # Errors
///
/// Returns an I/O error if the descriptor cannot be duplicated or the
/// stream cannot be re-registered with the runtime.
pub fn detach_closer(stream: TcpStream) -> io::Result<(TcpStream, TransportCloser)> {
    let std_stream = stream.into_std()?;
    let socket = std_stream.try_clone()?;
    let stream = TcpStream::from_std(std_stream)?;
    Ok((stream, TransportCloser { socket }))
}

/// Open the connection described by `server`.
///
/// Plaintext mode connects to `plain_port`; otherwise a TLS session is
/// negotiated on `tls_port`, verifying the certificate against `host`.
/// There is no connect timeout and no retry.
///
/// # Errors
///
/// Returns [`TransportError`] if the TCP connect, the TLS setup, or the
/// TLS handshake fails.
pub async fn connect(server: &ServerConfig) -> Result<Connection, TransportError> {
    let port = server.port();
    let tcp = TcpStream::connect((server.host.as_str(), port))
        .await
        .map_err(|source| TransportError::Connect {
            host: server.host.clone(),
            port,
            source,
        })?;
    tcp.set_nodelay(true)?;
    let peer_addr = tcp.peer_addr()?;
    let (tcp, closer) = detach_closer(tcp)?;

    let stream: BoxedStream = if server.insecure {
        Box::new(tcp)
    } else {
        let connector = tls::connector()?;
        let name = tls::server_name(&server.host)?;
        let tls_stream = connector
            .connect(name, tcp)
            .await
            .map_err(TransportError::TlsHandshake)?;
        Box::new(tls_stream)
    };

    tracing::debug!(peer = %peer_addr, secure = !server.insecure, "transport established");
    Ok(Connection::new(stream, closer, peer_addr, !server.insecure))
}
