//! Running handshake hash for engines that implement [`HandshakeTranscript`]

use std::fmt;

use ring::digest;

use super::HandshakeTranscript;

/// Handshake-message accumulator.
///
/// Keeps the raw bytes next to the running digest so the transcript can be
/// captured and replayed. Intermediate digests are taken from a clone of the
/// context, leaving the running state untouched.
#[derive(Clone)]
pub struct HandshakeHash {
    algorithm: &'static digest::Algorithm,
    context: digest::Context,
    data: Vec<u8>,
}

impl HandshakeHash {
    #[must_use]
    pub fn new(algorithm: &'static digest::Algorithm) -> Self {
        Self {
            algorithm,
            context: digest::Context::new(algorithm),
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn sha256() -> Self {
        Self::new(&digest::SHA256)
    }

    /// Feed one handshake message (header included).
    pub fn update(&mut self, message: &[u8]) {
        self.context.update(message);
        self.data.extend_from_slice(message);
    }

    /// Digest over everything hashed so far.
    #[must_use]
    pub fn current_hash(&self) -> digest::Digest {
        self.context.clone().finish()
    }

    #[must_use]
    pub fn algorithm(&self) -> &'static digest::Algorithm {
        self.algorithm
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for HandshakeHash {
    fn default() -> Self {
        Self::sha256()
    }
}

impl fmt::Debug for HandshakeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeHash")
            .field("algorithm", self.algorithm)
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl HandshakeTranscript for HandshakeHash {
    fn capture_transcript_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn reset_transcript(&mut self) {
        self.context = digest::Context::new(self.algorithm);
        self.data.clear();
    }

    fn append_transcript_bytes(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}
