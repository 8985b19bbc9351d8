//! ClientHello Rewriter and offer inspection

use tracing::{debug, warn};

use super::HelloRewrite;
use super::server_hello::reassemble;
use crate::codec::{
    CodecError, ContentType, EXT_ALPN, Extension, HandshakeHeader, HandshakeType, HelloKind,
    HelloMessage, RECORD_HEADER_LEN, RecordHeader, decode_alpn_payload, encode_alpn_payload,
    extract_records, split_first_message,
};

/// Inject an ALPN extension carrying `protocols` into the ClientHello at the
/// head of `data`.
///
/// `data` is the engine's freshly produced output, record header included.
/// The extension is appended to the extensions block (the block is created
/// when absent) and the block, handshake and record lengths grow by exactly
/// the injected size. Records after the first are copied verbatim.
///
/// Returns `None` when `data` does not start with a single-record ClientHello
/// or the ClientHello already offers ALPN.
///
/// # Errors
///
/// `Malformed` when the ClientHello's length fields are inconsistent or the
/// protocol list cannot be encoded.
pub fn rewrite_client_hello<S: AsRef<[u8]>>(
    data: &[u8],
    protocols: &[S],
) -> Result<Option<HelloRewrite>, CodecError> {
    let records = extract_records(data)?;
    let Some((first, remaining)) = records.split_first() else {
        return Ok(None);
    };
    if first.header.content_type != ContentType::Handshake
        || !first.header.version.carries_editable_hello()
    {
        debug!(version = ?first.header.version, "first record is not an editable handshake record");
        return Ok(None);
    }
    let (message, rest) = match split_first_message(first.payload) {
        Ok(split) => split,
        Err(CodecError::Fragmented) => {
            warn!("ClientHello spans several records; ALPN not offered");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if HandshakeHeader::parse(message)?.handshake_type() != Some(HandshakeType::ClientHello) {
        return Ok(None);
    }

    let hello = HelloMessage::parse(message, HelloKind::Client)?;
    if hello.find_extension(EXT_ALPN).is_some() {
        debug!("ClientHello already offers ALPN; leaving it alone");
        return Ok(None);
    }
    let payload = encode_alpn_payload(protocols)?;
    let rewritten = hello.with_extension_appended(&Extension {
        ext_type: EXT_ALPN,
        data: &payload,
    })?;

    let mut first_payload = Vec::with_capacity(rewritten.len() + rest.len());
    first_payload.extend_from_slice(&rewritten);
    first_payload.extend_from_slice(rest);
    let rebuilt = reassemble(&first.header, &first_payload, remaining, usize::MAX)?;
    let head_len = rebuilt.ready.len() - remaining.iter().map(|r| r.encoded_len()).sum::<usize>();

    debug!(
        injected = rewritten.len() - message.len(),
        "ALPN extension injected into ClientHello"
    );
    Ok(Some(HelloRewrite {
        output: rebuilt.ready,
        engine_message: message.to_vec(),
        wire_message: rewritten,
        head_len,
        original_head_len: first.encoded_len(),
    }))
}

/// Read the protocols offered in the ClientHello at the head of `data`
/// without modifying anything.
///
/// Only the first record has to be complete. Returns `None` when the bytes are
/// not a TLS handshake record, the ClientHello is fragmented, or it carries no
/// ALPN extension.
///
/// # Errors
///
/// `Underflow` when the first record is incomplete; `Malformed` when the
/// ClientHello or its ALPN list is internally inconsistent.
pub fn explore_client_hello(data: &[u8]) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
    if data.len() < RECORD_HEADER_LEN {
        return Err(CodecError::Underflow {
            needed: RECORD_HEADER_LEN,
            available: data.len(),
        });
    }
    if data[0] != ContentType::Handshake as u8 {
        // SSLv2-compatible hello or not TLS at all; the engine decides.
        return Ok(None);
    }
    let header = RecordHeader::parse(data)?;
    let end = RECORD_HEADER_LEN + usize::from(header.length);
    if data.len() < end {
        return Err(CodecError::Underflow {
            needed: end,
            available: data.len(),
        });
    }
    let payload = &data[RECORD_HEADER_LEN..end];
    let message = match split_first_message(payload) {
        Ok((message, _)) => message,
        Err(CodecError::Fragmented) => {
            debug!("ClientHello spans several records; ignoring its ALPN offer");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if HandshakeHeader::parse(message)?.handshake_type() != Some(HandshakeType::ClientHello) {
        return Ok(None);
    }
    let hello = HelloMessage::parse(message, HelloKind::Client)?;
    hello
        .find_extension(EXT_ALPN)
        .map(|ext| decode_alpn_payload(ext.data))
        .transpose()
}
