//! Core `AlpnEngineBuilder` structure and base functionality

use alpn_shim_engine::config::{AlpnConfig, NegotiationMode, Validator};
use alpn_shim_engine::{AlpnEngine, Result, TlsEngine};
use tracing::debug;

/// Fluent configuration for an [`AlpnEngine`].
///
/// ```rust,ignore
/// let engine = Alpn::builder()
///     .protocol(protocols::H2)
///     .protocol(protocols::HTTP_1_1)
///     .build(my_engine)?;
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "builders do nothing until `build` is called"]
pub struct AlpnEngineBuilder {
    config: AlpnConfig,
}

impl AlpnEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one protocol; earlier calls are preferred.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.protocols.push(protocol.into());
        self
    }

    /// Replace the whole protocol list.
    pub fn protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn mode(mut self, mode: NegotiationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Require the engine's own ALPN support.
    pub fn native(self) -> Self {
        self.mode(NegotiationMode::Native)
    }

    /// Rewrite handshakes even when the engine could negotiate natively.
    pub fn rewrite(self) -> Self {
        self.mode(NegotiationMode::Rewrite)
    }

    /// The configuration collected so far.
    #[must_use]
    pub fn config(&self) -> &AlpnConfig {
        &self.config
    }

    /// Check the protocol list without building.
    ///
    /// # Errors
    ///
    /// `Configuration` when the list cannot be sent on the wire.
    pub fn validate(&self) -> Result<()> {
        self.config.validate().map_err(Into::into)
    }

    /// Wrap `engine`.
    ///
    /// # Errors
    ///
    /// Whatever [`AlpnEngine::new`] reports for this configuration and engine.
    pub fn build<E: TlsEngine>(self, engine: E) -> Result<AlpnEngine<E>> {
        debug!(
            protocols = ?self.config.protocols,
            mode = ?self.config.mode,
            "building ALPN engine"
        );
        AlpnEngine::new(engine, self.config)
    }
}

impl From<AlpnConfig> for AlpnEngineBuilder {
    fn from(config: AlpnConfig) -> Self {
        Self { config }
    }
}
