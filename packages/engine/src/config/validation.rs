//! Configuration validation utilities

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid protocol identifier: {0}")]
    InvalidProtocol(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration conflict: {0}")]
    Conflict(String),
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` variant if any validation fails:
    /// - `InvalidProtocol` - if a protocol identifier cannot be sent on the wire
    /// - `InvalidParameter` - if the encoded list exceeds its length field
    /// - `Conflict` - if the same identifier is listed twice
    fn validate(&self) -> ConfigResult<()>;
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a single ALPN protocol identifier
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidProtocol` if the identifier is
    /// empty, longer than 255 bytes, or not printable ASCII.
    pub fn validate_protocol_id(protocol: &str) -> ConfigResult<()> {
        if protocol.is_empty() {
            return Err(ConfigurationError::InvalidProtocol(
                "protocol identifier cannot be empty".to_string(),
            ));
        }

        if protocol.len() > ConfigDefaults::MAX_PROTOCOL_ID_LEN {
            return Err(ConfigurationError::InvalidProtocol(format!(
                "{protocol:.16}... exceeds {} bytes",
                ConfigDefaults::MAX_PROTOCOL_ID_LEN
            )));
        }

        if !protocol.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(ConfigurationError::InvalidProtocol(format!(
                "{protocol:?} must be printable ASCII"
            )));
        }

        Ok(())
    }

    /// Validate an ordered protocol list
    ///
    /// # Errors
    ///
    /// Returns the first per-identifier error, `Conflict` for a duplicate, or
    /// `InvalidParameter` when the encoded list would not fit its 16-bit length.
    pub fn validate_protocol_list<S: AsRef<str>>(protocols: &[S]) -> ConfigResult<()> {
        let mut encoded_len = 0usize;
        for (i, protocol) in protocols.iter().enumerate() {
            let protocol = protocol.as_ref();
            Self::validate_protocol_id(protocol)?;
            if protocols[..i].iter().any(|p| p.as_ref() == protocol) {
                return Err(ConfigurationError::Conflict(format!(
                    "{protocol} listed more than once"
                )));
            }
            encoded_len += 1 + protocol.len();
        }

        if encoded_len > ConfigDefaults::MAX_PROTOCOL_LIST_LEN {
            return Err(ConfigurationError::InvalidParameter(format!(
                "protocol list encodes to {encoded_len} bytes, limit is {}",
                ConfigDefaults::MAX_PROTOCOL_LIST_LEN
            )));
        }

        Ok(())
    }
}

/// Common configuration defaults
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const MAX_PROTOCOL_ID_LEN: usize = 255;
    pub const MAX_PROTOCOL_LIST_LEN: usize = u16::MAX as usize - 2;
}
