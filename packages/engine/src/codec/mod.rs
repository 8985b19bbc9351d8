//! Record Codec
//!
//! Byte-exact parsing and re-encoding of TLS records, handshake headers,
//! Hello messages and their extension lists. Parse products borrow the
//! caller's buffer and live only for a single wrap/unwrap call.

pub mod error;
pub mod extension;
pub mod handshake;
pub mod hello;
pub mod reader;
pub mod record;

pub use error::CodecError;
pub use extension::{EXT_ALPN, Extension, decode_alpn_payload, encode_alpn_payload};
pub use handshake::{HANDSHAKE_HEADER_LEN, HandshakeHeader, HandshakeType, split_first_message};
pub use hello::{HelloKind, HelloMessage};
pub use record::{
    ContentType, HandshakeRecord, MAX_PLAINTEXT_LEN, ProtocolVersion, RECORD_HEADER_LEN,
    RecordHeader, extract_records,
};
