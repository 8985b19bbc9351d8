//! ClientHello / ServerHello layout (RFC 5246 §7.4.1.2, §7.4.1.3)
//!
//! Only the structure is parsed: enough to find the extensions block and
//! re-encode the message with one extension added or removed. Everything in
//! front of the extensions block is carried over untouched.

use bytes::BufMut;

use super::error::CodecError;
use super::extension::{Extension, parse_extensions};
use super::handshake::{HANDSHAKE_HEADER_LEN, HandshakeHeader, HandshakeType};
use super::reader::Reader;
use super::record::ProtocolVersion;

/// Which Hello a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloKind {
    Client,
    Server,
}

impl HelloKind {
    fn handshake_type(self) -> HandshakeType {
        match self {
            HelloKind::Client => HandshakeType::ClientHello,
            HelloKind::Server => HandshakeType::ServerHello,
        }
    }
}

/// A Hello message borrowed from a record payload.
#[derive(Debug, Clone)]
pub struct HelloMessage<'a> {
    pub kind: HelloKind,
    pub version: ProtocolVersion,
    pub random: &'a [u8],
    pub session_id: &'a [u8],
    /// Offered suites (client) or the two bytes of the selected suite (server).
    pub cipher_suites: &'a [u8],
    /// Offered methods (client) or the selected method byte (server).
    pub compression: &'a [u8],
    /// `None` when the message ends without an extensions block.
    pub extensions: Option<Vec<Extension<'a>>>,
    raw: &'a [u8],
    prefix_len: usize,
}

impl<'a> HelloMessage<'a> {
    /// Parse a complete Hello message, header included.
    ///
    /// # Errors
    ///
    /// `Malformed` when the message is not the expected Hello, a field runs
    /// past the declared body, or the extensions block length disagrees with
    /// the bytes that follow it.
    pub fn parse(message: &'a [u8], kind: HelloKind) -> Result<Self, CodecError> {
        let header = HandshakeHeader::parse(message)?;
        if header.msg_type != kind.handshake_type() as u8 {
            return Err(CodecError::malformed(format!(
                "expected {:?}, found handshake type {}",
                kind.handshake_type(),
                header.msg_type
            )));
        }
        let end = HANDSHAKE_HEADER_LEN + header.length;
        if message.len() != end {
            return Err(CodecError::malformed(format!(
                "hello body length {} disagrees with {} available bytes",
                header.length,
                message.len() - HANDSHAKE_HEADER_LEN
            )));
        }
        let raw = message;
        let mut body = Reader::new(&message[HANDSHAKE_HEADER_LEN..]);

        let major = body.u8("hello version")?;
        let minor = body.u8("hello version")?;
        let random = body.take(32, "hello random")?;
        let session_id = body.vec8("session id")?;
        if session_id.len() > 32 {
            return Err(CodecError::malformed("session id longer than 32 bytes"));
        }
        let (cipher_suites, compression) = match kind {
            HelloKind::Client => {
                let suites = body.vec16("cipher suites")?;
                if suites.is_empty() || suites.len() % 2 != 0 {
                    return Err(CodecError::malformed("bad cipher suite list length"));
                }
                (suites, body.vec8("compression methods")?)
            }
            HelloKind::Server => (
                body.take(2, "cipher suite")?,
                body.take(1, "compression method")?,
            ),
        };

        let prefix_len = HANDSHAKE_HEADER_LEN + body.position();
        let extensions = if body.is_empty() {
            None
        } else {
            let block = body.vec16("extensions block")?;
            if !body.is_empty() {
                return Err(CodecError::malformed(format!(
                    "{} bytes after extensions block",
                    body.remaining()
                )));
            }
            Some(parse_extensions(block)?)
        };

        Ok(Self {
            kind,
            version: ProtocolVersion::new(major, minor),
            random,
            session_id,
            cipher_suites,
            compression,
            extensions,
            raw,
            prefix_len,
        })
    }

    /// The full encoded message this view was parsed from.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.raw
    }

    #[must_use]
    pub fn find_extension(&self, ext_type: u16) -> Option<&Extension<'a>> {
        self.extensions
            .as_deref()
            .and_then(|exts| exts.iter().find(|e| e.ext_type == ext_type))
    }

    /// Re-encode with `extension` appended to the end of the extensions list,
    /// creating the block when the message has none.
    ///
    /// # Errors
    ///
    /// `Malformed` when a length field would overflow.
    pub fn with_extension_appended(
        &self,
        extension: &Extension<'_>,
    ) -> Result<Vec<u8>, CodecError> {
        let mut tail = Vec::new();
        for existing in self.extensions.iter().flatten() {
            existing.write_to(&mut tail)?;
        }
        extension.write_to(&mut tail)?;
        self.encode_with_extensions(Some(&tail))
    }

    /// Re-encode without any extension of `ext_type`.
    ///
    /// Returns `None` when no such extension is present. A block left empty is
    /// dropped entirely, which mirrors [`Self::with_extension_appended`] on a
    /// message that had no block.
    ///
    /// # Errors
    ///
    /// `Malformed` when a length field would overflow.
    pub fn without_extension(&self, ext_type: u16) -> Result<Option<Vec<u8>>, CodecError> {
        let Some(extensions) = self.extensions.as_deref() else {
            return Ok(None);
        };
        if !extensions.iter().any(|e| e.ext_type == ext_type) {
            return Ok(None);
        }
        let mut tail = Vec::new();
        for kept in extensions.iter().filter(|e| e.ext_type != ext_type) {
            kept.write_to(&mut tail)?;
        }
        let block = if tail.is_empty() { None } else { Some(tail.as_slice()) };
        self.encode_with_extensions(block).map(Some)
    }

    fn encode_with_extensions(&self, block: Option<&[u8]>) -> Result<Vec<u8>, CodecError> {
        let prefix = &self.raw[HANDSHAKE_HEADER_LEN..self.prefix_len];
        let block_len = match block {
            Some(b) => 2 + b.len(),
            None => 0,
        };
        let body_len = prefix.len() + block_len;
        let mut out = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body_len);
        HandshakeHeader {
            msg_type: self.kind.handshake_type() as u8,
            length: body_len,
        }
        .write_to(&mut out)?;
        out.put_slice(prefix);
        if let Some(b) = block {
            let len = u16::try_from(b.len())
                .map_err(|_| CodecError::malformed("extensions block too long"))?;
            out.put_u16(len);
            out.put_slice(b);
        }
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use bytes::BufMut;

    /// Build a ClientHello handshake message (header included).
    pub fn client_hello(extensions: Option<&[(u16, &[u8])]>) -> Vec<u8> {
        let mut body = Vec::new();
        body.put_slice(&[3, 3]);
        body.put_slice(&[0x11; 32]);
        body.put_u8(0);
        body.put_u16(4);
        body.put_slice(&[0xc0, 0x2f, 0x00, 0x2f]);
        body.put_slice(&[1, 0]);
        append_extensions(&mut body, extensions);
        wrap_message(1, &body)
    }

    /// Build a ServerHello handshake message (header included).
    pub fn server_hello(extensions: Option<&[(u16, &[u8])]>) -> Vec<u8> {
        let mut body = Vec::new();
        body.put_slice(&[3, 3]);
        body.put_slice(&[0x22; 32]);
        body.put_u8(4);
        body.put_slice(&[9, 9, 9, 9]);
        body.put_slice(&[0xc0, 0x2f]);
        body.put_u8(0);
        append_extensions(&mut body, extensions);
        wrap_message(2, &body)
    }

    pub fn record(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![22, 3, 3];
        out.put_u16(u16::try_from(payload.len()).unwrap());
        out.put_slice(payload);
        out
    }

    fn append_extensions(body: &mut Vec<u8>, extensions: Option<&[(u16, &[u8])]>) {
        if let Some(exts) = extensions {
            let mut block = Vec::new();
            for (ty, data) in exts {
                block.put_u16(*ty);
                block.put_u16(u16::try_from(data.len()).unwrap());
                block.put_slice(data);
            }
            body.put_u16(u16::try_from(block.len()).unwrap());
            body.put_slice(&block);
        }
    }

    fn wrap_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![msg_type];
        out.put_uint(body.len() as u64, 3);
        out.put_slice(body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{client_hello, server_hello};
    use super::*;
    use crate::codec::extension::{EXT_ALPN, EXT_RENEGOTIATION_INFO};

    #[test]
    fn parses_client_hello_fields() {
        let msg = client_hello(Some(&[(EXT_RENEGOTIATION_INFO, &[0])]));
        let hello = HelloMessage::parse(&msg, HelloKind::Client).unwrap();
        assert_eq!(hello.version, ProtocolVersion::TLS12);
        assert_eq!(hello.random, &[0x11; 32]);
        assert!(hello.session_id.is_empty());
        assert_eq!(hello.cipher_suites, &[0xc0, 0x2f, 0x00, 0x2f]);
        assert_eq!(hello.compression, &[0]);
        assert_eq!(hello.extensions.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn parses_server_hello_without_extensions() {
        let msg = server_hello(None);
        let hello = HelloMessage::parse(&msg, HelloKind::Server).unwrap();
        assert_eq!(hello.session_id, &[9, 9, 9, 9]);
        assert_eq!(hello.cipher_suites, &[0xc0, 0x2f]);
        assert!(hello.extensions.is_none());
    }

    #[test]
    fn wrong_message_type_is_rejected() {
        let msg = server_hello(None);
        assert!(HelloMessage::parse(&msg, HelloKind::Client).is_err());
    }

    #[test]
    fn inconsistent_extensions_block_is_malformed() {
        let mut msg = client_hello(Some(&[(EXT_RENEGOTIATION_INFO, &[0])]));
        // Bump the extensions block length without adding bytes.
        let block_len_at = msg.len() - 7;
        msg[block_len_at + 1] += 1;
        let err = HelloMessage::parse(&msg, HelloKind::Client).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn append_then_remove_restores_original() {
        for exts in [None, Some(&[(EXT_RENEGOTIATION_INFO, &[0u8][..])][..])] {
            let original = server_hello(exts);
            let hello = HelloMessage::parse(&original, HelloKind::Server).unwrap();
            let alpn = Extension { ext_type: EXT_ALPN, data: b"\x00\x03\x02h2" };
            let grown = hello.with_extension_appended(&alpn).unwrap();

            let reparsed = HelloMessage::parse(&grown, HelloKind::Server).unwrap();
            assert_eq!(reparsed.find_extension(EXT_ALPN), Some(&alpn));
            let shrunk = reparsed.without_extension(EXT_ALPN).unwrap().unwrap();
            assert_eq!(shrunk, original);
        }
    }

    #[test]
    fn removing_absent_extension_is_none() {
        let msg = client_hello(None);
        let hello = HelloMessage::parse(&msg, HelloKind::Client).unwrap();
        assert_eq!(hello.without_extension(EXT_ALPN).unwrap(), None);
    }
}
