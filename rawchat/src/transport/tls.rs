//! TLS client setup.
//!
//! Certificates are verified against the Mozilla root set shipped in
//! `webpki-roots` and the configured host name. TLS 1.2 is the lowest
//! protocol version offered.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use super::TransportError;

/// Protocol versions offered to the server, newest first.
pub static PROTOCOL_VERSIONS: &[&rustls::SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// Build the rustls client configuration.
///
/// # Errors
///
/// Returns [`TransportError::TlsConfig`] if the crypto provider rejects the
/// protocol versions.
pub fn client_config() -> Result<rustls::ClientConfig, TransportError> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(PROTOCOL_VERSIONS)?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(config)
}

/// Build a connector from [`client_config`].
///
/// # Errors
///
/// See [`client_config`].
pub fn connector() -> Result<TlsConnector, TransportError> {
    Ok(TlsConnector::from(Arc::new(client_config()?)))
}

/// Parse `host` as the name the server certificate must match.
///
/// # Errors
///
/// Returns [`TransportError::InvalidServerName`] for strings that are
/// neither DNS names nor IP addresses.
pub fn server_name(host: &str) -> Result<ServerName<'static>, TransportError> {
    ServerName::try_from(host.to_string())
        .map_err(|_| TransportError::InvalidServerName(host.to_string()))
}
