use std::error::Error as StdError;
use std::fmt;

use super::BoxError;

/// A Result alias where the Err case is `alpn_shim_engine::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while negotiating ALPN over a wrapped engine.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Protocol list rejected or changed too late
    Configuration,
    /// Handshake bytes were inconsistent; the connection is closed
    Handshake,
    /// The engine lacks a capability the selected strategy needs
    Environment,
    /// The underlying engine reported an error
    Engine,
    /// Operation not available on the active strategy
    Unsupported,
    /// Negotiated protocol queried before the handshake finished
    NotNegotiated,
}

impl Error {
    #[must_use]
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner { kind, source: None }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<BoxError>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("alpn_shim::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.inner.kind {
            Kind::Configuration => "invalid ALPN configuration",
            Kind::Handshake => "TLS handshake failed",
            Kind::Environment => "TLS engine incompatible with ALPN negotiation",
            Kind::Engine => "TLS engine error",
            Kind::Unsupported => "unsupported operation",
            Kind::NotNegotiated => "application protocol not yet negotiated",
        };
        match self.inner.source {
            Some(ref source) => write!(f, "{prefix}: {source}"),
            None => f.write_str(prefix),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
