//! Protocol Configuration Module
//!
//! Application-protocol list and negotiation strategy for a wrapped engine.

use super::validation::{ConfigResult, ConfigValidator, Validator};

/// How the wrapper obtains ALPN from the underlying engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationMode {
    /// Use the engine's own ALPN when it has one, rewrite handshakes otherwise.
    #[default]
    Detect,
    /// Require native ALPN; never touch handshake bytes.
    Native,
    /// Always rewrite handshakes, even if the engine could negotiate itself.
    Rewrite,
}

/// Protocol configuration provider trait
pub trait AlpnConfigProvider {
    fn protocols(&self) -> &[String];
    fn mode(&self) -> NegotiationMode;
}

/// Runtime protocol configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlpnConfig {
    /// Supported protocols in preference order. Empty disables ALPN.
    pub protocols: Vec<String>,
    pub mode: NegotiationMode,
}

impl AlpnConfig {
    /// Configuration offering `protocols` with strategy detection.
    #[must_use]
    pub fn with_protocols<I, S>(protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protocols: protocols.into_iter().map(Into::into).collect(),
            mode: NegotiationMode::Detect,
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: NegotiationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether any protocol is configured.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.protocols.is_empty()
    }
}

impl Validator for AlpnConfig {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_protocol_list(&self.protocols)
    }
}

impl AlpnConfigProvider for AlpnConfig {
    #[inline]
    fn protocols(&self) -> &[String] {
        &self.protocols
    }

    #[inline]
    fn mode(&self) -> NegotiationMode {
        self.mode
    }
}

/// Compile-time protocol configuration: HTTP/2 preferred, HTTP/1.1 fallback.
pub struct StaticAlpnConfig;

impl StaticAlpnConfig {
    pub const PROTOCOLS: [&'static str; 2] = ["h2", "http/1.1"];
}

impl From<StaticAlpnConfig> for AlpnConfig {
    fn from(_: StaticAlpnConfig) -> Self {
        AlpnConfig::with_protocols(StaticAlpnConfig::PROTOCOLS)
    }
}
