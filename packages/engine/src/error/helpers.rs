use std::fmt;

/// A marker type naming an engine capability that could not be found.
#[derive(Debug)]
pub struct MissingCapability(pub &'static str);

impl fmt::Display for MissingCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine does not provide {}", self.0)
    }
}

impl std::error::Error for MissingCapability {}

/// A marker type naming an operation the active strategy cannot perform.
#[derive(Debug)]
pub struct UnsupportedOperation(pub &'static str);

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not available when ALPN is negotiated by rewriting", self.0)
    }
}

impl std::error::Error for UnsupportedOperation {}

/// A marker type to indicate the handshake is still in progress.
#[derive(Debug)]
pub struct NotYetNegotiated;

impl fmt::Display for NotYetNegotiated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("handshake still in progress")
    }
}

impl std::error::Error for NotYetNegotiated {}

/// The engine's transcript did not contain the Hello it should have hashed.
#[derive(Debug)]
pub struct TranscriptMismatch {
    pub hashed_len: usize,
    pub transcript_len: usize,
}

impl fmt::Display for TranscriptMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-byte hello not found in {}-byte handshake transcript",
            self.hashed_len, self.transcript_len
        )
    }
}

impl std::error::Error for TranscriptMismatch {}
