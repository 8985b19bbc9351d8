//! Hello extensions and the ALPN protocol-name list (RFC 7301 §3.1)

use bytes::BufMut;

use super::error::CodecError;
use super::reader::Reader;

/// Extension type of `application_layer_protocol_negotiation`.
pub const EXT_ALPN: u16 = 0x0010;

/// Extension type of `renegotiation_info`.
pub const EXT_RENEGOTIATION_INFO: u16 = 0xff01;

/// One extension borrowed from a Hello message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension<'a> {
    pub ext_type: u16,
    pub data: &'a [u8],
}

impl<'a> Extension<'a> {
    /// Encoded length: type (2) + length (2) + payload.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        4 + self.data.len()
    }

    /// # Errors
    ///
    /// `Malformed` when the payload does not fit a 16-bit length.
    pub fn write_to(&self, out: &mut impl BufMut) -> Result<(), CodecError> {
        let len = u16::try_from(self.data.len())
            .map_err(|_| CodecError::malformed("extension payload too long"))?;
        out.put_u16(self.ext_type);
        out.put_u16(len);
        out.put_slice(self.data);
        Ok(())
    }
}

/// Parse an extensions list body (without its 2-byte block length).
///
/// # Errors
///
/// `Malformed` unless the entries tile the block exactly.
pub fn parse_extensions(block: &[u8]) -> Result<Vec<Extension<'_>>, CodecError> {
    let mut reader = Reader::new(block);
    let mut extensions = Vec::new();
    while !reader.is_empty() {
        let ext_type = reader.u16("extension type")?;
        let data = reader.vec16("extension data")?;
        extensions.push(Extension { ext_type, data });
    }
    Ok(extensions)
}

/// Encode an ALPN payload: 2-byte list length, then 1-byte-prefixed names.
///
/// # Errors
///
/// `Malformed` for an empty list, an empty or over-long name, or a list that
/// overflows its 16-bit length.
pub fn encode_alpn_payload<S: AsRef<[u8]>>(protocols: &[S]) -> Result<Vec<u8>, CodecError> {
    if protocols.is_empty() {
        return Err(CodecError::malformed("empty ALPN protocol list"));
    }
    let mut names = Vec::new();
    for protocol in protocols {
        let name = protocol.as_ref();
        let len = u8::try_from(name.len())
            .map_err(|_| CodecError::malformed("ALPN protocol name longer than 255 bytes"))?;
        if len == 0 {
            return Err(CodecError::malformed("empty ALPN protocol name"));
        }
        names.put_u8(len);
        names.put_slice(name);
    }
    let list_len = u16::try_from(names.len())
        .map_err(|_| CodecError::malformed("ALPN protocol list too long"))?;
    let mut out = Vec::with_capacity(2 + names.len());
    out.put_u16(list_len);
    out.put_slice(&names);
    Ok(out)
}

/// Decode an ALPN payload into its protocol names, in wire order.
///
/// # Errors
///
/// `Malformed` when the list length disagrees with the payload, a name is
/// empty, or the list is empty.
pub fn decode_alpn_payload(data: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let mut outer = Reader::new(data);
    let list = outer.vec16("ALPN protocol list")?;
    if !outer.is_empty() {
        return Err(CodecError::malformed("trailing bytes after ALPN protocol list"));
    }
    let mut reader = Reader::new(list);
    let mut protocols = Vec::new();
    while !reader.is_empty() {
        let name = reader.vec8("ALPN protocol name")?;
        if name.is_empty() {
            return Err(CodecError::malformed("empty ALPN protocol name"));
        }
        protocols.push(name.to_vec());
    }
    if protocols.is_empty() {
        return Err(CodecError::malformed("empty ALPN protocol list"));
    }
    Ok(protocols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpn_payload_layout() {
        let payload = encode_alpn_payload(&["h2", "http/1.1"]).unwrap();
        assert_eq!(payload, b"\x00\x0c\x02h2\x08http/1.1".to_vec());
        let decoded = decode_alpn_payload(&payload).unwrap();
        assert_eq!(decoded, vec![b"h2".to_vec(), b"http/1.1".to_vec()]);
    }

    #[test]
    fn rejects_inconsistent_list_length() {
        assert!(decode_alpn_payload(b"\x00\x05\x02h2").is_err());
        assert!(decode_alpn_payload(b"\x00\x03\x02h2\x00").is_err());
        assert!(decode_alpn_payload(b"\x00\x01\x00").is_err());
    }

    #[test]
    fn rejects_unencodable_names() {
        assert!(encode_alpn_payload::<&str>(&[]).is_err());
        assert!(encode_alpn_payload(&[""]).is_err());
        assert!(encode_alpn_payload(&["x".repeat(256)]).is_err());
    }

    #[test]
    fn extension_list_must_tile_block() {
        let block = [0x00, 0x10, 0x00, 0x01, 0xaa, 0xff, 0x01, 0x00, 0x01, 0x00];
        let exts = parse_extensions(&block).unwrap();
        assert_eq!(exts.len(), 2);
        assert_eq!(exts[0].ext_type, EXT_ALPN);
        assert_eq!(exts[1].ext_type, EXT_RENEGOTIATION_INFO);
        assert!(parse_extensions(&block[..block.len() - 1]).is_err());
    }
}
