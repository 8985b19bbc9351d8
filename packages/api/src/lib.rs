//! ALPN Shim Public API
//!
//! Application-Layer Protocol Negotiation for TLS engines that lack it.
//! Wrap any [`TlsEngine`] and drive it as before; the negotiated protocol is
//! available from [`AlpnEngine::application_protocol`] once the handshake
//! completes.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;
pub mod protocols;

pub use builder::AlpnEngineBuilder;

// Re-export important types from the engine package
pub use alpn_shim_engine::{
    AlpnConfig, AlpnEngine, BoxError, EngineResult, Error, HandshakeHash, HandshakeStatus,
    HandshakeTranscript, Kind, NegotiationMode, ProtocolSelector, Result, Role, Status, Strategy,
    TlsEngine,
};
#[cfg(feature = "rustls")]
pub use alpn_shim_engine::RustlsEngine;
pub use alpn_shim_engine::{codec, prelude};

/// Main entry point providing static builder methods
pub struct Alpn;

impl Alpn {
    /// Start an empty builder.
    pub fn builder() -> AlpnEngineBuilder {
        AlpnEngineBuilder::new()
    }

    /// Builder preferring HTTP/2 with HTTP/1.1 fallback.
    pub fn http() -> AlpnEngineBuilder {
        AlpnEngineBuilder::new()
            .protocol(protocols::H2)
            .protocol(protocols::HTTP_1_1)
    }
}
