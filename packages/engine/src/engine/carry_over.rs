//! Single-slot buffer for rewritten output that did not fit the caller's
//! destination.

use bytes::Bytes;
use tracing::debug;

/// Bytes produced by a rewrite but not yet delivered.
///
/// Holds at most one chunk. It is always drained before the engine is asked
/// for new output, so nothing is reordered or duplicated.
#[derive(Debug, Default, Clone)]
pub struct CarryOver {
    pending: Option<Bytes>,
}

impl CarryOver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.as_ref().map_or(0, Bytes::len)
    }

    /// Park `bytes` for the next call. Empty input leaves the slot empty.
    pub fn park(&mut self, bytes: Bytes) {
        debug_assert!(self.pending.is_none(), "carry-over slot already occupied");
        if bytes.is_empty() {
            return;
        }
        debug!(parked = bytes.len(), "rewritten output parked for the next wrap");
        self.pending = Some(bytes);
    }

    /// Copy as much pending output as fits into `dst`, returning the count.
    pub fn drain_into(&mut self, dst: &mut [u8]) -> usize {
        let Some(pending) = self.pending.as_mut() else {
            return 0;
        };
        let n = pending.len().min(dst.len());
        let chunk = pending.split_to(n);
        dst[..n].copy_from_slice(&chunk);
        if pending.is_empty() {
            self.pending = None;
        }
        debug!(drained = n, left = self.len(), "carry-over drained");
        n
    }
}
