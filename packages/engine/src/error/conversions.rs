use super::types::Error;
use crate::codec::CodecError;
use crate::config::ConfigurationError;

impl From<CodecError> for Error {
    fn from(error: CodecError) -> Self {
        super::handshake(error)
    }
}

impl From<ConfigurationError> for Error {
    fn from(error: ConfigurationError) -> Self {
        super::configuration(error)
    }
}
