//! ALPN-adding wrapper around a [`TlsEngine`].

use tracing::{debug, trace, warn};

use super::state::EngineState;
use super::{EngineResult, HandshakeStatus, ProtocolSelector, Role, Status, TlsEngine};
use crate::alpn::{self, HelloRewrite, Reassembled};
use crate::codec::{CodecError, ContentType, ProtocolVersion};
use crate::config::{AlpnConfig, NegotiationMode, Validator};
use crate::error::{self, BoxError, Result};
use crate::transcript;

/// How ALPN is obtained for this connection. Chosen once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The engine negotiates ALPN itself; every call passes straight through.
    Native,
    /// Hello messages are rewritten on their way through the engine.
    Rewrite,
}

/// A TLS engine with ALPN.
///
/// Drop-in replacement for the engine it wraps: call [`wrap`](Self::wrap) and
/// [`unwrap`](Self::unwrap) exactly as on the bare engine, then read the
/// outcome from [`application_protocol`](Self::application_protocol).
pub struct AlpnEngine<E> {
    engine: E,
    strategy: Strategy,
    state: EngineState,
}

impl<E: TlsEngine> AlpnEngine<E> {
    /// Wrap `engine`, choosing a negotiation strategy from `config.mode`.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the protocol list is invalid
    /// - `Environment` if the engine lacks what the requested mode needs
    /// - `Engine` if the engine rejects its native protocol list
    pub fn new(mut engine: E, config: AlpnConfig) -> Result<Self> {
        config.validate()?;
        let strategy = select_strategy(&mut engine, &config)?;
        debug!(
            role = ?engine.role(),
            ?strategy,
            protocols = ?config.protocols,
            "ALPN strategy selected"
        );

        if strategy == Strategy::Native && config.is_enabled() {
            engine
                .set_native_application_protocols(&config.protocols)
                .map_err(error::engine)?;
        }
        Ok(Self {
            engine,
            strategy,
            state: EngineState::new(config.protocols),
        })
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Replace the supported protocol list.
    ///
    /// # Errors
    ///
    /// `Configuration` once the handshake has started or when the list is
    /// invalid; `Engine` when a native engine rejects it.
    pub fn set_application_protocols<I, S>(&mut self, protocols: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.state.started {
            return Err(error::configuration(
                "application protocols cannot change after the handshake has started",
            ));
        }
        let config = AlpnConfig::with_protocols(protocols);
        config.validate()?;
        if self.strategy == Strategy::Native {
            self.engine
                .set_native_application_protocols(&config.protocols)
                .map_err(error::engine)?;
        }
        self.state.protocols = config.protocols;
        Ok(())
    }

    #[must_use]
    pub fn application_protocols(&self) -> &[String] {
        &self.state.protocols
    }

    /// The negotiated protocol. `None` means the peers agreed on none.
    ///
    /// # Errors
    ///
    /// `NotNegotiated` when a natively negotiating engine is still
    /// handshaking.
    pub fn application_protocol(&self) -> Result<Option<String>> {
        match self.strategy {
            Strategy::Native => {
                if self.engine.handshake_status().is_handshaking() {
                    return Err(error::not_negotiated());
                }
                Ok(self.engine.native_application_protocol())
            }
            Strategy::Rewrite => Ok(self.state.selected_protocol.clone()),
        }
    }

    /// The protocol selected so far in an ongoing handshake.
    ///
    /// # Errors
    ///
    /// `Unsupported` on the rewrite strategy, where the selection is only
    /// known once the peer's Hello has been processed.
    pub fn handshake_application_protocol(&self) -> Result<Option<String>> {
        match self.strategy {
            Strategy::Native => Ok(self.engine.native_application_protocol()),
            Strategy::Rewrite => Err(error::unsupported("handshake application protocol")),
        }
    }

    /// Let the application choose the protocol from the client's offer.
    ///
    /// # Errors
    ///
    /// `Unsupported` on the rewrite strategy, which always selects from the
    /// configured list; `Engine` when a native engine refuses the callback.
    pub fn set_handshake_application_protocol_selector(
        &mut self,
        selector: ProtocolSelector,
    ) -> Result<()> {
        match self.strategy {
            Strategy::Native => self
                .engine
                .set_native_protocol_selector(selector)
                .map_err(error::engine),
            Strategy::Rewrite => Err(error::unsupported("handshake protocol selector")),
        }
    }

    /// The selector installed on a natively negotiating engine.
    ///
    /// # Errors
    ///
    /// `Unsupported` on the rewrite strategy.
    pub fn handshake_application_protocol_selector(&self) -> Result<Option<ProtocolSelector>> {
        match self.strategy {
            Strategy::Native => Ok(self.engine.native_protocol_selector()),
            Strategy::Rewrite => Err(error::unsupported("handshake protocol selector")),
        }
    }

    /// Produce outbound records.
    ///
    /// Output left over from a previous rewrite is delivered first; such a
    /// call consumes nothing and reports `NeedWrap` until the slot is empty.
    ///
    /// # Errors
    ///
    /// `Handshake` when the engine's own Hello cannot be parsed or its
    /// transcript cannot be corrected (the wrapper is closed afterwards);
    /// `Engine` for failures of the wrapped engine.
    pub fn wrap(&mut self, src: &[&[u8]], dst: &mut [u8]) -> Result<EngineResult> {
        if self.state.closed {
            return Ok(EngineResult::closed(self.engine.handshake_status()));
        }
        self.state.started = true;

        if !self.state.carry_over.is_empty() {
            if dst.is_empty() {
                return Ok(EngineResult::new(
                    Status::BufferOverflow,
                    HandshakeStatus::NeedWrap,
                    0,
                    0,
                ));
            }
            let produced = self.state.carry_over.drain_into(dst);
            let handshake_status = if self.state.carry_over.is_empty() {
                self.engine.handshake_status()
            } else {
                HandshakeStatus::NeedWrap
            };
            return Ok(EngineResult::new(Status::Ok, handshake_status, 0, produced));
        }

        match (self.strategy, self.engine.role()) {
            (Strategy::Native, _) => self.engine.wrap(src, dst).map_err(error::engine),
            (Strategy::Rewrite, Role::Client) => self.wrap_client_hello(src, dst),
            (Strategy::Rewrite, Role::Server) => self.wrap_server_hello(src, dst),
        }
    }

    /// Consume inbound records.
    ///
    /// # Errors
    ///
    /// `Handshake` when the peer's Hello is malformed or selects a protocol we
    /// never offered (the wrapper is closed afterwards); `Engine` for failures
    /// of the wrapped engine.
    pub fn unwrap(&mut self, src: &[u8], dst: &mut [&mut [u8]]) -> Result<EngineResult> {
        if self.state.closed {
            return Ok(EngineResult::closed(self.engine.handshake_status()));
        }
        self.state.started = true;

        match (self.strategy, self.engine.role()) {
            (Strategy::Native, _) => self.engine.unwrap(src, dst).map_err(error::engine),
            (Strategy::Rewrite, Role::Client) => self.unwrap_server_hello(src, dst),
            (Strategy::Rewrite, Role::Server) => self.unwrap_client_hello(src, dst),
        }
    }

    /// # Errors
    ///
    /// Whatever the wrapped engine reports.
    pub fn begin_handshake(&mut self) -> Result<()> {
        self.engine.begin_handshake().map_err(error::engine)
    }

    pub fn close_inbound(&mut self) {
        self.engine.close_inbound();
    }

    pub fn close_outbound(&mut self) {
        self.engine.close_outbound();
    }

    /// `NeedWrap` while rewritten output is still parked, otherwise the
    /// engine's own status.
    #[must_use]
    pub fn handshake_status(&self) -> HandshakeStatus {
        if self.state.carry_over.is_empty() {
            self.engine.handshake_status()
        } else {
            HandshakeStatus::NeedWrap
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.engine.role()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    pub fn get_ref(&self) -> &E {
        &self.engine
    }

    pub fn get_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_inner(self) -> E {
        self.engine
    }

    fn wrap_client_hello(&mut self, src: &[&[u8]], dst: &mut [u8]) -> Result<EngineResult> {
        if self.state.our_hello_sent || self.state.protocols.is_empty() {
            return self.engine.wrap(src, dst).map_err(error::engine);
        }
        let result = self.engine.wrap(src, dst).map_err(error::engine)?;
        if result.bytes_produced == 0 {
            return Ok(result);
        }

        let produced = &dst[..result.bytes_produced];
        let rewrite = match alpn::rewrite_client_hello(produced, &self.state.protocols) {
            Ok(Some(rewrite)) => rewrite,
            Ok(None) => {
                debug!("first outbound flight carries no editable ClientHello");
                self.state.our_hello_sent = true;
                return Ok(result);
            }
            Err(e) => return Err(self.fail(e.into())),
        };
        self.resynchronize(&rewrite)?;
        self.state.our_hello_sent = true;
        debug!(offered = ?self.state.protocols, "ClientHello sent with ALPN");
        Ok(self.deliver(rewrite.output, dst, result))
    }

    fn wrap_server_hello(&mut self, src: &[&[u8]], dst: &mut [u8]) -> Result<EngineResult> {
        let pending = self.state.unwrap_hello_seen && !self.state.our_hello_sent;
        let Some(protocol) = self.state.selected_protocol.clone().filter(|_| pending) else {
            if pending {
                self.state.our_hello_sent = true;
            }
            return self.engine.wrap(src, dst).map_err(error::engine);
        };

        let result = self.engine.wrap(src, dst).map_err(error::engine)?;
        if result.bytes_produced == 0 {
            return Ok(result);
        }
        let produced = &dst[..result.bytes_produced];
        let rewrite = match alpn::inject_server_flight(produced, protocol.as_bytes()) {
            Ok(Some(rewrite)) => rewrite,
            Ok(None) => {
                debug!("outbound record is not a ServerHello; passing through");
                return Ok(result);
            }
            Err(e) => return Err(self.fail(e.into())),
        };
        self.resynchronize(&rewrite)?;
        self.state.our_hello_sent = true;
        debug!(%protocol, "ServerHello sent with ALPN");
        Ok(self.deliver(rewrite.output, dst, result))
    }

    fn unwrap_client_hello(&mut self, src: &[u8], dst: &mut [&mut [u8]]) -> Result<EngineResult> {
        if !self.state.unwrap_hello_seen {
            if self.state.protocols.is_empty() {
                self.state.unwrap_hello_seen = true;
            } else {
                let offered = match alpn::explore_client_hello(src) {
                    Ok(offered) => offered,
                    Err(e) if e.is_underflow() => return Ok(EngineResult::underflow()),
                    Err(e) => return Err(self.fail(e.into())),
                };
                self.state.selected_protocol = offered
                    .as_deref()
                    .and_then(|offered| alpn::select_protocol(offered, &self.state.protocols));
                self.state.unwrap_hello_seen = true;
                debug!(
                    offered = offered.as_ref().map(Vec::len),
                    selected = ?self.state.selected_protocol,
                    "ClientHello inspected"
                );
            }
        }
        self.engine.unwrap(src, dst).map_err(error::engine)
    }

    fn unwrap_server_hello(&mut self, src: &[u8], dst: &mut [&mut [u8]]) -> Result<EngineResult> {
        if self.state.unwrap_hello_seen
            || !self.state.our_hello_sent
            || self.state.protocols.is_empty()
        {
            return self.engine.unwrap(src, dst).map_err(error::engine);
        }
        if src.len() < 3 {
            return Ok(EngineResult::underflow());
        }
        let version = ProtocolVersion::new(src[1], src[2]);
        if src[0] != ContentType::Handshake as u8 || !version.carries_editable_hello() {
            return self.engine.unwrap(src, dst).map_err(error::engine);
        }

        let strip = match alpn::strip_server_flight(src) {
            Ok(Some(strip)) => strip,
            Ok(None) => {
                debug!("server selected no application protocol");
                self.state.unwrap_hello_seen = true;
                return self.engine.unwrap(src, dst).map_err(error::engine);
            }
            Err(e) if e.is_underflow() => return Ok(EngineResult::underflow()),
            Err(e) => return Err(self.fail(e.into())),
        };
        if !self.state.offers(&strip.selected_protocol) {
            let e = CodecError::malformed(format!(
                "server selected {:?}, which was never offered",
                String::from_utf8_lossy(&strip.selected_protocol)
            ));
            return Err(self.fail(e.into()));
        }

        let rewrite = strip.rewrite;
        let mut result = self
            .engine
            .unwrap(&rewrite.output, dst)
            .map_err(error::engine)?;
        if result.bytes_consumed == 0 {
            return Ok(result);
        }
        if result.bytes_consumed < rewrite.head_len {
            let e = error::handshake(format!(
                "engine consumed {} of the {}-byte rewritten ServerHello record",
                result.bytes_consumed, rewrite.head_len
            ));
            return Err(self.fail(e));
        }

        self.resynchronize(&rewrite)?;
        self.state.unwrap_hello_seen = true;
        let selected = String::from_utf8_lossy(&strip.selected_protocol).into_owned();
        debug!(protocol = %selected, "ServerHello ALPN accepted");
        self.state.selected_protocol = Some(selected);
        result.bytes_consumed += rewrite.original_head_len - rewrite.head_len;
        Ok(result)
    }

    fn resynchronize(&mut self, rewrite: &HelloRewrite) -> Result<()> {
        let outcome = match self.engine.transcript() {
            Some(transcript) => transcript::resynchronize(transcript, &rewrite.substitution()),
            None => Err(error::environment("a handshake transcript")),
        };
        outcome.map_err(|e| self.fail(e))
    }

    /// Copy `output` into `dst`, parking what does not fit.
    fn deliver(
        &mut self,
        output: Vec<u8>,
        dst: &mut [u8],
        mut result: EngineResult,
    ) -> EngineResult {
        let Reassembled { ready, deferred } = Reassembled::split(output, dst.len());
        dst[..ready.len()].copy_from_slice(&ready);
        trace!(bytes = %hex::encode(&ready), "rewritten handshake output");
        if let Some(deferred) = deferred {
            self.state.carry_over.park(deferred);
            result.handshake_status = HandshakeStatus::NeedWrap;
        }
        result.bytes_produced = ready.len();
        result
    }

    fn fail(&mut self, err: error::Error) -> error::Error {
        warn!(error = %err, "ALPN handshake rewrite failed; closing engine");
        self.engine.close_outbound();
        self.state.closed = true;
        err
    }
}

fn select_strategy<E: TlsEngine>(engine: &mut E, config: &AlpnConfig) -> Result<Strategy> {
    let native = engine.supports_native_alpn();
    let transcript = engine.transcript().is_some();
    match config.mode {
        NegotiationMode::Native if native => Ok(Strategy::Native),
        NegotiationMode::Native => Err(error::environment("native ALPN")),
        NegotiationMode::Rewrite if transcript => Ok(Strategy::Rewrite),
        NegotiationMode::Rewrite => Err(error::environment("a handshake transcript")),
        NegotiationMode::Detect if native => Ok(Strategy::Native),
        NegotiationMode::Detect if transcript || !config.is_enabled() => Ok(Strategy::Rewrite),
        NegotiationMode::Detect => Err(error::environment("native ALPN or a handshake transcript")),
    }
}

impl<E: TlsEngine> TlsEngine for AlpnEngine<E> {
    fn role(&self) -> Role {
        AlpnEngine::role(self)
    }

    fn wrap(
        &mut self,
        src: &[&[u8]],
        dst: &mut [u8],
    ) -> std::result::Result<EngineResult, BoxError> {
        AlpnEngine::wrap(self, src, dst).map_err(Into::into)
    }

    fn unwrap(
        &mut self,
        src: &[u8],
        dst: &mut [&mut [u8]],
    ) -> std::result::Result<EngineResult, BoxError> {
        AlpnEngine::unwrap(self, src, dst).map_err(Into::into)
    }

    fn handshake_status(&self) -> HandshakeStatus {
        AlpnEngine::handshake_status(self)
    }

    fn begin_handshake(&mut self) -> std::result::Result<(), BoxError> {
        AlpnEngine::begin_handshake(self).map_err(Into::into)
    }

    fn close_inbound(&mut self) {
        AlpnEngine::close_inbound(self);
    }

    fn close_outbound(&mut self) {
        AlpnEngine::close_outbound(self);
    }

    fn supports_native_alpn(&self) -> bool {
        true
    }

    fn set_native_application_protocols(
        &mut self,
        protocols: &[String],
    ) -> std::result::Result<(), BoxError> {
        self.set_application_protocols(protocols.iter().cloned())
            .map_err(Into::into)
    }

    fn set_native_protocol_selector(
        &mut self,
        selector: ProtocolSelector,
    ) -> std::result::Result<(), BoxError> {
        self.set_handshake_application_protocol_selector(selector)
            .map_err(Into::into)
    }

    fn native_protocol_selector(&self) -> Option<ProtocolSelector> {
        self.handshake_application_protocol_selector().ok().flatten()
    }

    fn native_application_protocol(&self) -> Option<String> {
        match self.strategy {
            Strategy::Native => self.engine.native_application_protocol(),
            Strategy::Rewrite => self.state.selected_protocol.clone(),
        }
    }
}

impl<E> std::fmt::Debug for AlpnEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlpnEngine")
            .field("strategy", &self.strategy)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
