//! ALPN injection and extraction over raw handshake records
//!
//! [`client_hello`] adds the extension to an outbound ClientHello and reads
//! the offer out of an inbound one. [`server_hello`] strips the extension from
//! an inbound ServerHello, injects it into an outbound one, and rebuilds the
//! surrounding records.

pub mod client_hello;
pub mod server_hello;

pub use client_hello::{explore_client_hello, rewrite_client_hello};
pub use crate::codec::extract_records;
pub use server_hello::{
    Reassembled, ServerHelloStrip, StrippedHello, inject_alpn_extension, inject_server_flight,
    reassemble, strip_alpn_extension, strip_server_flight,
};

use crate::transcript::Substitution;

/// A Hello edited in place at the head of a record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloRewrite {
    /// The complete corrected record stream.
    pub output: Vec<u8>,
    /// The Hello message as the underlying engine hashes it.
    pub engine_message: Vec<u8>,
    /// The Hello message as it travels on the wire.
    pub wire_message: Vec<u8>,
    /// Encoded length of the rebuilt record(s) carrying the Hello.
    pub head_len: usize,
    /// Encoded length of the record carrying the Hello before the edit.
    pub original_head_len: usize,
}

impl HelloRewrite {
    /// Transcript correction that makes the engine's hash reflect the wire.
    #[must_use]
    pub fn substitution(&self) -> Substitution {
        Substitution {
            hashed: self.engine_message.clone(),
            wire: self.wire_message.clone(),
        }
    }
}

/// Server-side selection: the first protocol in the client's offered order
/// that is also configured locally.
#[must_use]
pub fn select_protocol(offered: &[Vec<u8>], configured: &[String]) -> Option<String> {
    offered.iter().find_map(|candidate| {
        configured
            .iter()
            .find(|local| local.as_bytes() == candidate.as_slice())
            .cloned()
    })
}
