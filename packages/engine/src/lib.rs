//! # ALPN Shim Engine
//!
//! Adds Application-Layer Protocol Negotiation (RFC 7301) to TLS engines that
//! do not negotiate it themselves.
//!
//! [`AlpnEngine`] sits between the application and a [`TlsEngine`]. When the
//! engine has native ALPN the wrapper only forwards the protocol list. When it
//! does not, the wrapper edits the Hello messages crossing `wrap` and `unwrap`
//! and repairs the engine's handshake hash so Finished still verifies.
//!
//! ## Features
//!
//! - **Record codec** for TLS 1.0-1.2 handshake records and Hello messages
//! - **ClientHello rewriting** and offer inspection
//! - **ServerHello stripping** with record reassembly sized to the caller's buffer
//! - **Transcript resynchronization** through a narrow capability trait
//! - **rustls adapter** negotiating ALPN natively
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alpn_shim_engine::prelude::*;
//!
//! let config = AlpnConfig::with_protocols(["h2", "http/1.1"]);
//! let mut engine = AlpnEngine::new(my_engine, config)?;
//! // drive engine.wrap / engine.unwrap exactly as the bare engine
//! let negotiated = engine.application_protocol()?;
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod alpn;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod prelude;
#[cfg(feature = "__rustls")]
pub mod tls;
pub mod transcript;

pub use config::{AlpnConfig, NegotiationMode};
pub use engine::{
    AlpnEngine, EngineResult, HandshakeStatus, ProtocolSelector, Role, Status, Strategy, TlsEngine,
};
pub use error::{BoxError, Error, Kind, Result};
#[cfg(feature = "__rustls")]
pub use tls::RustlsEngine;
pub use transcript::{HandshakeHash, HandshakeTranscript};
