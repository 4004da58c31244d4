//! Startup sequence: credentials, connection, setup lines.
//!
//! Every failure here is fatal and maps to a process exit code through
//! [`StartupError::exit_code`]. Nothing is retried.

use std::process::ExitCode;

use tokio::io::AsyncWrite;

use rawchat_proto::command::{Handshake, HandshakeError};

use crate::config::{ClientConfig, ConfigError};
use crate::session::outbound::write_line;
use crate::transport::{self, Connection, TransportError};

/// Exit code for a missing or unusable credential (and other init failures).
pub const EXIT_MISSING_CREDENTIAL: u8 = 1;

/// Exit code for a failed connection or setup exchange.
pub const EXIT_CONNECT_FAILED: u8 = 2;

/// Fatal errors before the session starts.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration could not be loaded, or the token is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Credentials cannot be turned into setup lines.
    #[error("invalid credentials: {0}")]
    Credentials(#[from] HandshakeError),

    /// The transport could not be established.
    #[error(transparent)]
    Connect(#[from] TransportError),

    /// Writing the setup lines failed.
    #[error("failed to send setup lines: {0}")]
    Handshake(std::io::Error),

    /// The local input thread could not be started.
    #[error("failed to start local input reader: {0}")]
    Input(std::io::Error),
}

impl StartupError {
    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Credentials(_) | Self::Input(_) => EXIT_MISSING_CREDENTIAL,
            Self::Connect(_) | Self::Handshake(_) => EXIT_CONNECT_FAILED,
        }
    }
}

impl From<StartupError> for ExitCode {
    fn from(err: StartupError) -> Self {
        Self::from(err.exit_code())
    }
}

/// Send the three setup lines, logging each with the token masked.
///
/// # Errors
///
/// Returns the first write or flush error.
pub async fn handshake<W>(writer: &mut W, credentials: &Handshake) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for (line, shown) in credentials
        .lines()
        .iter()
        .zip(credentials.redacted_lines().iter())
    {
        write_line(writer, line).await?;
        tracing::info!("< {shown}");
    }
    Ok(())
}

/// Validate credentials, connect, and send the setup lines.
///
/// Credentials are checked before any connection attempt.
///
/// # Errors
///
/// Returns [`StartupError`] for invalid credentials, connection failure, or
/// a failed setup write.
pub async fn start(config: &ClientConfig) -> Result<Connection, StartupError> {
    let credentials = Handshake::new(config.token.as_str(), config.nick.as_str())?;

    let mut conn = transport::connect(&config.server).await?;
    tracing::info!(peer = %conn.peer_addr(), secure = conn.is_secure(), "Connected to {}", conn.peer_addr());

    handshake(conn.writer_mut(), &credentials)
        .await
        .map_err(StartupError::Handshake)?;
    Ok(conn)
}
