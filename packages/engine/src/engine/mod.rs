//! Engine Wrapper
//!
//! [`TlsEngine`] is the contract a TLS implementation offers the wrapper:
//! non-blocking `wrap`/`unwrap` over caller-owned buffers, in the shape of a
//! classic SSL engine. [`AlpnEngine`] wraps any such engine and adds ALPN,
//! either by forwarding to the engine's own support or by rewriting the Hello
//! messages that pass through it.

pub mod carry_over;
pub mod state;
pub mod wrapper;

pub use carry_over::CarryOver;
pub use state::EngineState;
pub use wrapper::{AlpnEngine, Strategy};

use std::sync::Arc;

use crate::error::BoxError;
use crate::transcript::HandshakeTranscript;

/// Server-side callback choosing a protocol from the client's offer.
///
/// Receives the offered protocols in the client's order; `None` declines.
pub type ProtocolSelector = Arc<dyn Fn(&[String]) -> Option<String> + Send + Sync>;

/// Which side of the handshake an engine plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

/// Outcome of a single `wrap` or `unwrap` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Not enough input for a complete record; nothing was consumed.
    BufferUnderflow,
    /// The destination cannot hold the next record.
    BufferOverflow,
    Closed,
}

/// What the engine needs next to make handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStatus {
    NotHandshaking,
    /// Reported once, by the call that completed the handshake.
    Finished,
    NeedTask,
    NeedWrap,
    NeedUnwrap,
}

impl HandshakeStatus {
    /// Whether a handshake is still in progress.
    #[inline]
    #[must_use]
    pub fn is_handshaking(self) -> bool {
        matches!(self, Self::NeedTask | Self::NeedWrap | Self::NeedUnwrap)
    }
}

/// Result of a `wrap` or `unwrap` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineResult {
    pub status: Status,
    pub handshake_status: HandshakeStatus,
    pub bytes_consumed: usize,
    pub bytes_produced: usize,
}

impl EngineResult {
    #[must_use]
    pub fn new(
        status: Status,
        handshake_status: HandshakeStatus,
        bytes_consumed: usize,
        bytes_produced: usize,
    ) -> Self {
        Self {
            status,
            handshake_status,
            bytes_consumed,
            bytes_produced,
        }
    }

    /// Incomplete input: nothing consumed, more bytes needed.
    #[must_use]
    pub fn underflow() -> Self {
        Self::new(Status::BufferUnderflow, HandshakeStatus::NeedUnwrap, 0, 0)
    }

    #[must_use]
    pub fn closed(handshake_status: HandshakeStatus) -> Self {
        Self::new(Status::Closed, handshake_status, 0, 0)
    }
}

/// A synchronous, non-blocking TLS engine.
///
/// Engines that want ALPN added by rewriting must expose their handshake hash
/// through [`TlsEngine::transcript`], consume at most one record per
/// `unwrap`, and produce at most one record per `wrap`.
pub trait TlsEngine {
    fn role(&self) -> Role;

    /// Encode application data from `src` into TLS records written to `dst`.
    ///
    /// During the handshake `src` is ignored and handshake records are
    /// produced instead.
    ///
    /// # Errors
    ///
    /// Any failure of the engine itself.
    fn wrap(&mut self, src: &[&[u8]], dst: &mut [u8]) -> Result<EngineResult, BoxError>;

    /// Decode TLS records from `src`, writing application data into `dst`.
    ///
    /// # Errors
    ///
    /// Any failure of the engine itself, including a failed Finished check.
    fn unwrap(&mut self, src: &[u8], dst: &mut [&mut [u8]]) -> Result<EngineResult, BoxError>;

    fn handshake_status(&self) -> HandshakeStatus;

    /// # Errors
    ///
    /// When the engine cannot start a handshake in its current state.
    fn begin_handshake(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn close_inbound(&mut self) {}

    fn close_outbound(&mut self) {}

    /// Whether the engine negotiates ALPN itself.
    fn supports_native_alpn(&self) -> bool {
        false
    }

    /// Configure the engine's own ALPN list.
    ///
    /// # Errors
    ///
    /// The default implementation always fails; engines with native ALPN
    /// override it.
    fn set_native_application_protocols(&mut self, _protocols: &[String]) -> Result<(), BoxError> {
        Err("engine has no native ALPN support".into())
    }

    /// The protocol the engine negotiated natively, if any. May be queried
    /// while handshaking.
    fn native_application_protocol(&self) -> Option<String> {
        None
    }

    /// Install a callback that picks the protocol during the handshake.
    ///
    /// # Errors
    ///
    /// The default implementation always fails; engines that let the
    /// application choose override it.
    fn set_native_protocol_selector(
        &mut self,
        _selector: ProtocolSelector,
    ) -> Result<(), BoxError> {
        Err("engine has no handshake protocol selector".into())
    }

    fn native_protocol_selector(&self) -> Option<ProtocolSelector> {
        None
    }

    /// Access to the running handshake hash.
    fn transcript(&mut self) -> Option<&mut dyn HandshakeTranscript> {
        None
    }
}
