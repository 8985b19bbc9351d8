//! ServerHello Explorer
//!
//! Client side: pull the selected protocol out of the ServerHello at the head
//! of the first server flight and hand the engine a ServerHello without it.
//! Server side: put the selected protocol into the engine's ServerHello.

use bytes::{BufMut, Bytes};
use tracing::debug;

use super::HelloRewrite;
use crate::codec::{
    CodecError, ContentType, EXT_ALPN, Extension, HandshakeHeader, HandshakeRecord,
    HandshakeType, HelloKind, HelloMessage, MAX_PLAINTEXT_LEN, RecordHeader, decode_alpn_payload,
    encode_alpn_payload, extract_records, split_first_message,
};

/// A ServerHello with its ALPN extension removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedHello {
    pub bytes: Vec<u8>,
    /// `None` means the peer did not choose a protocol, which is a normal outcome.
    pub selected_protocol: Option<Vec<u8>>,
}

/// Remove the ALPN extension from a complete ServerHello message.
///
/// Without an ALPN extension the message comes back unchanged.
///
/// # Errors
///
/// `Malformed` when the ServerHello's lengths are inconsistent or its ALPN
/// extension does not name exactly one protocol.
pub fn strip_alpn_extension(message: &[u8]) -> Result<StrippedHello, CodecError> {
    let hello = HelloMessage::parse(message, HelloKind::Server)?;
    let Some(ext) = hello.find_extension(EXT_ALPN) else {
        return Ok(StrippedHello {
            bytes: message.to_vec(),
            selected_protocol: None,
        });
    };
    let mut protocols = decode_alpn_payload(ext.data)?;
    if protocols.len() != 1 {
        return Err(CodecError::malformed(format!(
            "ServerHello ALPN must name one protocol, found {}",
            protocols.len()
        )));
    }
    let bytes = hello
        .without_extension(EXT_ALPN)?
        .ok_or_else(|| CodecError::malformed("ALPN extension vanished while stripping"))?;
    Ok(StrippedHello {
        bytes,
        selected_protocol: protocols.pop(),
    })
}

/// Append an ALPN extension naming `protocol` to a complete ServerHello.
///
/// # Errors
///
/// `Malformed` when the ServerHello is inconsistent or already carries ALPN.
pub fn inject_alpn_extension(message: &[u8], protocol: &[u8]) -> Result<Vec<u8>, CodecError> {
    let hello = HelloMessage::parse(message, HelloKind::Server)?;
    if hello.find_extension(EXT_ALPN).is_some() {
        return Err(CodecError::malformed("ServerHello already carries ALPN"));
    }
    let payload = encode_alpn_payload(&[protocol])?;
    hello.with_extension_appended(&Extension {
        ext_type: EXT_ALPN,
        data: &payload,
    })
}

/// Output of [`reassemble`]: what fits now and what must wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    pub ready: Vec<u8>,
    pub deferred: Option<Bytes>,
}

impl Reassembled {
    /// Split `stream` at `capacity`; the tail, if any, becomes `deferred`.
    #[must_use]
    pub fn split(mut stream: Vec<u8>, capacity: usize) -> Self {
        let deferred = (stream.len() > capacity).then(|| Bytes::from(stream.split_off(capacity)));
        Self {
            ready: stream,
            deferred,
        }
    }
}

/// Rebuild a record stream around a rewritten first payload.
///
/// The first payload is framed with `first_header`'s type and version and
/// fragmented at 2^14 bytes; `remaining` records follow verbatim. When the
/// stream exceeds `capacity` it is split at exactly that offset and the tail
/// is returned as `deferred`.
///
/// # Errors
///
/// `Malformed` when a record header cannot be encoded.
pub fn reassemble(
    first_header: &RecordHeader,
    first_payload: &[u8],
    remaining: &[HandshakeRecord<'_>],
    capacity: usize,
) -> Result<Reassembled, CodecError> {
    let mut stream = Vec::with_capacity(
        first_payload.len() + 5 + remaining.iter().map(HandshakeRecord::encoded_len).sum::<usize>(),
    );
    if first_payload.is_empty() {
        first_header.with_length(0)?.write_to(&mut stream);
    }
    for fragment in first_payload.chunks(MAX_PLAINTEXT_LEN) {
        first_header.with_length(fragment.len())?.write_to(&mut stream);
        stream.put_slice(fragment);
    }
    for record in remaining {
        record.write_to(&mut stream);
    }

    Ok(Reassembled::split(stream, capacity))
}

/// ServerHello with ALPN removed, plus the protocol it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHelloStrip {
    pub rewrite: HelloRewrite,
    pub selected_protocol: Vec<u8>,
}

/// Client side: strip ALPN from the ServerHello heading `data`.
///
/// Every record in `data` must be complete. Only the first record is edited;
/// the rest of a bundled flight is passed through untouched. Returns `None`
/// when there is nothing to strip: the first record is not a ServerHello or
/// the server did not select a protocol.
///
/// A ServerHello split across several records cannot be edited in place and
/// is reported as `Fragmented`. Unlike a fragmented ClientHello, which is
/// simply sent without ALPN, this one may carry an extension the engine never
/// asked for, so the caller must treat it as fatal.
///
/// # Errors
///
/// `Underflow` when any record is incomplete; `Fragmented` when the
/// ServerHello runs past its record; `Malformed` when the ServerHello is
/// inconsistent.
pub fn strip_server_flight(data: &[u8]) -> Result<Option<ServerHelloStrip>, CodecError> {
    let records = extract_records(data)?;
    let Some((first, remaining)) = split_hello_record(&records, HandshakeType::ServerHello)? else {
        return Ok(None);
    };
    let (message, rest) = split_first_message(first.payload)?;
    let stripped = strip_alpn_extension(message)?;
    let Some(selected_protocol) = stripped.selected_protocol else {
        debug!("ServerHello carries no ALPN extension");
        return Ok(None);
    };

    let mut first_payload = stripped.bytes.clone();
    first_payload.extend_from_slice(rest);
    let rebuilt = reassemble(&first.header, &first_payload, remaining, usize::MAX)?;
    Ok(Some(ServerHelloStrip {
        rewrite: HelloRewrite {
            head_len: rebuilt.ready.len() - tail_len(remaining),
            output: rebuilt.ready,
            engine_message: stripped.bytes,
            wire_message: message.to_vec(),
            original_head_len: first.encoded_len(),
        },
        selected_protocol,
    }))
}

/// Server side: inject `protocol` into the ServerHello heading the engine's
/// output in `data`.
///
/// Returns `None` when `data` does not start with a ServerHello.
///
/// # Errors
///
/// `Malformed` when the engine's ServerHello is inconsistent.
pub fn inject_server_flight(
    data: &[u8],
    protocol: &[u8],
) -> Result<Option<HelloRewrite>, CodecError> {
    let records = extract_records(data)?;
    let Some((first, remaining)) = split_hello_record(&records, HandshakeType::ServerHello)? else {
        return Ok(None);
    };
    let (message, rest) = split_first_message(first.payload)?;
    let injected = inject_alpn_extension(message, protocol)?;

    let mut first_payload = injected.clone();
    first_payload.extend_from_slice(rest);
    let rebuilt = reassemble(&first.header, &first_payload, remaining, usize::MAX)?;
    Ok(Some(HelloRewrite {
        head_len: rebuilt.ready.len() - tail_len(remaining),
        output: rebuilt.ready,
        engine_message: message.to_vec(),
        wire_message: injected,
        original_head_len: first.encoded_len(),
    }))
}

fn tail_len(records: &[HandshakeRecord<'_>]) -> usize {
    records.iter().map(HandshakeRecord::encoded_len).sum()
}

type HelloRecords<'r, 'a> = (&'r HandshakeRecord<'a>, &'r [HandshakeRecord<'a>]);

/// First record if it is an editable handshake record opening with `expected`.
fn split_hello_record<'r, 'a>(
    records: &'r [HandshakeRecord<'a>],
    expected: HandshakeType,
) -> Result<Option<HelloRecords<'r, 'a>>, CodecError> {
    let Some((first, remaining)) = records.split_first() else {
        return Ok(None);
    };
    if first.header.content_type != ContentType::Handshake
        || !first.header.version.carries_editable_hello()
    {
        return Ok(None);
    }
    let header = HandshakeHeader::parse(first.payload)?;
    if header.handshake_type() != Some(expected) {
        debug!(msg_type = header.msg_type, "first handshake message is not a {expected:?}");
        return Ok(None);
    }
    Ok(Some((first, remaining)))
}
