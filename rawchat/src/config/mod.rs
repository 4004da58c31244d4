//! Configuration system for the `rawchat` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/rawchat/config.toml`)
//! 4. Compiled defaults
//!
//! The auth token is only taken from the CLI or the environment, never from
//! the config file. A missing token is fatal; a missing nickname falls back
//! to [`DEFAULT_NICK`].

use std::path::PathBuf;

/// Nickname used when none is configured.
pub const DEFAULT_NICK: &str = "ircdefault";

/// Twitch chat server.
pub const DEFAULT_HOST: &str = "irc.chat.twitch.tv";

/// Plaintext port.
pub const DEFAULT_PLAIN_PORT: u16 = 6667;

/// TLS port.
pub const DEFAULT_TLS_PORT: u16 = 6697;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The auth token is absent from both CLI and environment.
    #[error("TW_OAUTH environment variable missing")]
    MissingToken,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    auth: AuthFileConfig,
    session: SessionFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    host: Option<String>,
    plain_port: Option<u16>,
    tls_port: Option<u16>,
    insecure: Option<bool>,
}

/// `[auth]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    nick: Option<String>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    channel_capacity: Option<usize>,
    replace_unprintables: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Hostname, also used as the TLS server name.
    pub host: String,
    /// Port used when `insecure` is set.
    pub plain_port: u16,
    /// Port used for TLS.
    pub tls_port: u16,
    /// Use a plaintext connection instead of TLS.
    pub insecure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            plain_port: DEFAULT_PLAIN_PORT,
            tls_port: DEFAULT_TLS_PORT,
            insecure: false,
        }
    }
}

impl ServerConfig {
    /// Port for the selected connection mode.
    #[must_use]
    pub const fn port(&self) -> u16 {
        if self.insecure {
            self.plain_port
        } else {
            self.tls_port
        }
    }
}

/// Settings for the running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capacity of the outbound message queue.
    pub channel_capacity: usize,
    /// Escape unprintable characters in logged lines.
    pub replace_unprintables: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            replace_unprintables: false,
        }
    }
}

/// Fully resolved client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Connection target.
    pub server: ServerConfig,
    /// OAuth token, without the `oauth:` prefix.
    pub token: String,
    /// Nickname to register.
    pub nick: String,
    /// Session engine settings.
    pub session: SessionConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server", &self.server)
            .field("token", &"***")
            .field("nick", &self.nick)
            .field("session", &self.session)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// The token check runs before the config file is touched, so a missing
    /// credential is reported even when the file is broken.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if no token was supplied, or
    /// another [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let token = non_empty(cli.token.as_deref()).ok_or(ConfigError::MissingToken)?;
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file, token.to_string()))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile, token: String) -> Self {
        let server_defaults = ServerConfig::default();
        let session_defaults = SessionConfig::default();

        let nick = non_empty(cli.nick.as_deref())
            .or_else(|| non_empty(file.auth.nick.as_deref()))
            .map_or_else(
                || {
                    tracing::warn!(fallback = DEFAULT_NICK, "TW_NICK environment variable missing");
                    DEFAULT_NICK.to_string()
                },
                str::to_string,
            );

        Self {
            server: ServerConfig {
                host: cli
                    .host
                    .clone()
                    .or_else(|| file.server.host.clone())
                    .unwrap_or(server_defaults.host),
                plain_port: cli
                    .plain_port
                    .or(file.server.plain_port)
                    .unwrap_or(server_defaults.plain_port),
                tls_port: cli
                    .tls_port
                    .or(file.server.tls_port)
                    .unwrap_or(server_defaults.tls_port),
                insecure: cli.insecure || file.server.insecure.unwrap_or(server_defaults.insecure),
            },
            token,
            nick,
            session: SessionConfig {
                channel_capacity: file
                    .session
                    .channel_capacity
                    .filter(|c| *c > 0)
                    .unwrap_or(session_defaults.channel_capacity),
                replace_unprintables: cli.replace_unprintables
                    || file
                        .session
                        .replace_unprintables
                        .unwrap_or(session_defaults.replace_unprintables),
            },
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Raw line-protocol client for Twitch chat")]
pub struct CliArgs {
    /// Use a plaintext connection.
    #[arg(long, env = "RAWCHAT_INSECURE")]
    pub insecure: bool,

    /// Replace unprintable characters like SOH with their `\uXXXX` form in logs.
    #[arg(long, env = "RAWCHAT_REPLACE_UNPRINTABLES")]
    pub replace_unprintables: bool,

    /// OAuth token (with or without the `oauth:` prefix).
    #[arg(long, env = "TW_OAUTH", hide_env_values = true)]
    pub token: Option<String>,

    /// Nickname to register with.
    #[arg(long, env = "TW_NICK")]
    pub nick: Option<String>,

    /// Chat server hostname.
    #[arg(long)]
    pub host: Option<String>,

    /// Port for plaintext connections.
    #[arg(long)]
    pub plain_port: Option<u16>,

    /// Port for TLS connections.
    #[arg(long)]
    pub tls_port: Option<u16>,

    /// Path to config file (default: `~/.config/rawchat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "RAWCHAT_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("rawchat").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
