//! TLS-specific error types for the rustls adapter

/// Failures of the rustls-backed engine
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Handshake already started: {0}")]
    AlreadyStarted(&'static str),
    #[error("TLS error: {0}")]
    Rustls(#[from] rustls::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
