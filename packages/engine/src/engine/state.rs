//! Per-connection negotiation state.

use super::carry_over::CarryOver;

/// Everything the wrapper remembers about one connection.
///
/// The two hello flags only ever go from `false` to `true`; each guards
/// exactly one transcript resynchronization.
#[derive(Debug, Default, Clone)]
pub struct EngineState {
    /// The peer's first Hello has been inspected or rewritten.
    pub unwrap_hello_seen: bool,
    /// Our own first Hello has been produced (and rewritten if needed).
    pub our_hello_sent: bool,
    pub selected_protocol: Option<String>,
    /// Locally supported protocols in preference order.
    pub protocols: Vec<String>,
    pub carry_over: CarryOver,
    /// Set by the first `wrap` or `unwrap`; the protocol list is frozen after.
    pub started: bool,
    /// Set after a fatal handshake error.
    pub closed: bool,
}

impl EngineState {
    #[must_use]
    pub fn new(protocols: Vec<String>) -> Self {
        Self {
            protocols,
            ..Self::default()
        }
    }

    /// Whether the configured list offers the protocol named by `wire`.
    #[must_use]
    pub fn offers(&self, wire: &[u8]) -> bool {
        self.protocols.iter().any(|p| p.as_bytes() == wire)
    }
}
