//! Codec error types for record and handshake parsing

/// Errors raised while parsing or re-encoding handshake bytes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Not enough bytes yet; the caller should retry with more input.
    #[error("buffer underflow: need {needed} bytes, have {available}")]
    Underflow { needed: usize, available: usize },
    /// Length fields disagree with each other or with the available bytes.
    #[error("malformed handshake data: {0}")]
    Malformed(String),
    /// The Hello message does not fit inside a single record.
    #[error("handshake message fragmented across records")]
    Fragmented,
}

impl CodecError {
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        CodecError::Malformed(what.into())
    }

    /// Returns true if more input could resolve this error.
    #[must_use]
    pub fn is_underflow(&self) -> bool {
        matches!(self, CodecError::Underflow { .. })
    }
}
