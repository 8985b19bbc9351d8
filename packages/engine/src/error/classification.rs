use std::error::Error as StdError;

use super::helpers::TranscriptMismatch;
use super::types::{Error, Kind};
use crate::codec::CodecError;

impl Error {
    /// Returns true if the protocol list was rejected.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), Kind::Configuration)
    }

    /// Returns true if the handshake failed and the connection is closed.
    #[must_use]
    pub fn is_handshake(&self) -> bool {
        matches!(self.kind(), Kind::Handshake)
    }

    /// Returns true if the engine cannot support the selected strategy.
    #[must_use]
    pub fn is_environment(&self) -> bool {
        matches!(self.kind(), Kind::Environment)
    }

    /// Returns true if the underlying engine reported the error.
    #[must_use]
    pub fn is_engine(&self) -> bool {
        matches!(self.kind(), Kind::Engine)
    }

    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind(), Kind::Unsupported)
    }

    #[must_use]
    pub fn is_not_negotiated(&self) -> bool {
        matches!(self.kind(), Kind::NotNegotiated)
    }

    /// Returns true if a handshake length field was inconsistent.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.source_chain_has(|err| {
            matches!(err.downcast_ref::<CodecError>(), Some(CodecError::Malformed(_)))
        })
    }

    /// Returns true if the engine's transcript did not contain an edited Hello.
    #[must_use]
    pub fn is_transcript_mismatch(&self) -> bool {
        self.source_chain_has(|err| err.is::<TranscriptMismatch>())
    }

    fn source_chain_has(&self, pred: impl Fn(&(dyn StdError + 'static)) -> bool) -> bool {
        let mut source = self.source();

        while let Some(err) = source {
            if pred(err) {
                return true;
            }
            source = err.source();
        }

        false
    }
}
