//! Transcript Resynchronizer
//!
//! The Finished message authenticates a hash over every handshake message.
//! After a Hello has been edited on its way through the engine, the engine's
//! running hash covers bytes the peer never saw. [`resynchronize`] rewinds the
//! hash and replays the transcript with the wire form of the Hello substituted
//! back in.

pub mod hash;

pub use hash::HandshakeHash;

use tracing::{debug, trace};

use crate::error::{self, Result};

/// Narrow access to an engine's running handshake hash.
///
/// Implemented once per concrete TLS stack; this is the only way the wrapper
/// touches engine internals.
pub trait HandshakeTranscript {
    /// Every handshake byte hashed so far, in order.
    fn capture_transcript_bytes(&self) -> Vec<u8>;

    /// Return the hash to its initial, empty state.
    fn reset_transcript(&mut self);

    /// Feed bytes into the hash as if the engine had processed them.
    fn append_transcript_bytes(&mut self, bytes: &[u8]);
}

/// Replace one Hello in the transcript with another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// The Hello exactly as the engine hashed it.
    pub hashed: Vec<u8>,
    /// The Hello exactly as it crossed the wire.
    pub wire: Vec<u8>,
}

impl Substitution {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.hashed == self.wire
    }
}

/// Rebuild the engine's handshake hash with `substitution` applied.
///
/// Captures the hashed bytes, swaps the first occurrence of
/// `substitution.hashed` for `substitution.wire`, resets the hash and replays
/// the corrected sequence. Must run exactly once per edited Hello.
///
/// # Errors
///
/// Returns a handshake error when the engine's transcript does not contain
/// the Hello it is supposed to have hashed; continuing would only fail later
/// at Finished verification.
pub fn resynchronize(
    transcript: &mut dyn HandshakeTranscript,
    substitution: &Substitution,
) -> Result<()> {
    if substitution.is_noop() {
        return Ok(());
    }
    let captured = transcript.capture_transcript_bytes();
    let Some(at) = find(&captured, &substitution.hashed) else {
        return Err(error::handshake(error::TranscriptMismatch {
            hashed_len: substitution.hashed.len(),
            transcript_len: captured.len(),
        }));
    };

    let mut corrected =
        Vec::with_capacity(captured.len() - substitution.hashed.len() + substitution.wire.len());
    corrected.extend_from_slice(&captured[..at]);
    corrected.extend_from_slice(&substitution.wire);
    corrected.extend_from_slice(&captured[at + substitution.hashed.len()..]);

    transcript.reset_transcript();
    transcript.append_transcript_bytes(&corrected);
    debug!(
        offset = at,
        before = captured.len(),
        after = corrected.len(),
        "handshake transcript resynchronized"
    );
    trace!(transcript = %hex::encode(&corrected), "replayed transcript");
    Ok(())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_matches_direct_hash_of_wire_bytes() {
        let mut engine_view = HandshakeHash::sha256();
        engine_view.update(b"client-hello");
        engine_view.update(b"server-hello");
        engine_view.update(b"server-hello-done");

        resynchronize(
            &mut engine_view,
            &Substitution {
                hashed: b"server-hello".to_vec(),
                wire: b"server-hello+alpn".to_vec(),
            },
        )
        .unwrap();

        let mut wire_view = HandshakeHash::sha256();
        wire_view.update(b"client-hello");
        wire_view.update(b"server-hello+alpn");
        wire_view.update(b"server-hello-done");

        assert_eq!(
            engine_view.current_hash().as_ref(),
            wire_view.current_hash().as_ref()
        );
        assert_eq!(
            engine_view.capture_transcript_bytes(),
            wire_view.capture_transcript_bytes()
        );
    }

    #[test]
    fn applying_twice_diverges() {
        let mut once = HandshakeHash::sha256();
        once.update(b"hello");
        let sub = Substitution {
            hashed: b"hello".to_vec(),
            wire: b"hello-hello".to_vec(),
        };
        resynchronize(&mut once, &sub).unwrap();
        let after_once = once.current_hash();
        resynchronize(&mut once, &sub).unwrap();
        assert_ne!(once.current_hash().as_ref(), after_once.as_ref());
    }

    #[test]
    fn missing_hello_is_a_handshake_error() {
        let mut hash = HandshakeHash::sha256();
        hash.update(b"something else");
        let err = resynchronize(
            &mut hash,
            &Substitution {
                hashed: b"client-hello".to_vec(),
                wire: b"client-hello+alpn".to_vec(),
            },
        )
        .unwrap_err();
        assert!(err.is_handshake());
        assert_eq!(hash.capture_transcript_bytes(), b"something else".to_vec());
    }

    #[test]
    fn identical_bytes_are_a_noop() {
        let mut hash = HandshakeHash::sha256();
        let sub = Substitution {
            hashed: b"x".to_vec(),
            wire: b"x".to_vec(),
        };
        resynchronize(&mut hash, &sub).unwrap();
        assert!(hash.is_empty());
    }
}
