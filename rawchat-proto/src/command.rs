//! Protocol commands the client emits on its own.
//!
//! The client only speaks three setup lines and one keepalive reply. All
//! other traffic is passed through untouched.

/// Prefix that marks a keepalive probe from the server.
pub const PING: &str = "PING";

/// Reply sent for every keepalive probe. The probe payload is not echoed.
pub const PONG: &str = "PONG";

/// Capability request sent once after `NICK`.
pub const CAPABILITY_REQUEST: &str = "CAP REQ :twitch.tv/membership twitch.tv/commands";

/// Prefix the server expects in front of the OAuth token.
const OAUTH_PREFIX: &str = "oauth:";

/// Errors raised while building handshake lines.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// The auth token is empty.
    #[error("auth token is empty")]
    EmptyToken,

    /// The nickname is empty.
    #[error("nickname is empty")]
    EmptyNick,

    /// A credential contains CR or LF and would split into several lines.
    #[error("{field} contains a line terminator")]
    EmbeddedTerminator {
        /// Which credential was rejected.
        field: &'static str,
    },
}

/// Returns `true` if `line` is a keepalive probe.
///
/// The check is case-sensitive and anchored at offset 0, so
/// `:tmi.twitch.tv PING` or `ping` do not match.
#[must_use]
pub fn is_ping(line: &str) -> bool {
    line.starts_with(PING)
}

/// Credentials sent during connection setup.
#[derive(Clone, PartialEq, Eq)]
pub struct Handshake {
    token: String,
    nick: String,
}

impl std::fmt::Debug for Handshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handshake")
            .field("token", &"***")
            .field("nick", &self.nick)
            .finish()
    }
}

impl Handshake {
    /// Validates credentials for the setup lines.
    ///
    /// A leading `oauth:` on the token is accepted and not doubled.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError`] if either value is empty or contains a
    /// line terminator.
    pub fn new(token: impl Into<String>, nick: impl Into<String>) -> Result<Self, HandshakeError> {
        let token = token.into();
        let nick = nick.into();

        let token = if let Some(bare) = token.strip_prefix(OAUTH_PREFIX) {
            bare.to_string()
        } else {
            token
        };
        if token.is_empty() {
            return Err(HandshakeError::EmptyToken);
        }
        if nick.is_empty() {
            return Err(HandshakeError::EmptyNick);
        }
        if has_terminator(&token) {
            return Err(HandshakeError::EmbeddedTerminator { field: "token" });
        }
        if has_terminator(&nick) {
            return Err(HandshakeError::EmbeddedTerminator { field: "nick" });
        }

        Ok(Self { token, nick })
    }

    /// The three setup lines in send order, without terminators.
    #[must_use]
    pub fn lines(&self) -> [String; 3] {
        [
            format!("PASS {OAUTH_PREFIX}{}", self.token),
            format!("NICK {}", self.nick),
            CAPABILITY_REQUEST.to_string(),
        ]
    }

    /// The same lines with the token masked, for logging.
    #[must_use]
    pub fn redacted_lines(&self) -> [String; 3] {
        [
            format!("PASS {OAUTH_PREFIX}***"),
            format!("NICK {}", self.nick),
            CAPABILITY_REQUEST.to_string(),
        ]
    }
}

fn has_terminator(value: &str) -> bool {
    value.contains(['\r', '\n'])
}
