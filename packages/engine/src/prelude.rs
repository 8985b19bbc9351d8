//! ALPN Shim Prelude
//!
//! The types needed to wrap an engine and read the negotiated protocol.

pub use crate::config::{AlpnConfig, AlpnConfigProvider, NegotiationMode, StaticAlpnConfig};
pub use crate::engine::{
    AlpnEngine, EngineResult, HandshakeStatus, ProtocolSelector, Role, Status, Strategy, TlsEngine,
};
pub use crate::error::{BoxError, Error, Kind, Result};
#[cfg(feature = "__rustls")]
pub use crate::tls::RustlsEngine;
pub use crate::transcript::{HandshakeHash, HandshakeTranscript};
