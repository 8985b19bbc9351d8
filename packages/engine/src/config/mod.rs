//! Configuration
//!
//! ALPN protocol list, negotiation strategy and their validation.

pub mod protocol;
pub mod validation;

pub use protocol::{AlpnConfig, AlpnConfigProvider, NegotiationMode, StaticAlpnConfig};
pub use validation::{ConfigDefaults, ConfigResult, ConfigValidator, ConfigurationError, Validator};
