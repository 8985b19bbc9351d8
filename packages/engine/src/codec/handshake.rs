//! Handshake message framing (RFC 5246 §7.4)

use bytes::BufMut;

use super::error::CodecError;

/// Handshake header length: type (1) + length (3).
pub const HANDSHAKE_HEADER_LEN: usize = 4;

/// Largest value a 24-bit length field can hold.
pub const MAX_HANDSHAKE_LEN: usize = 0x00FF_FFFF;

/// Handshake message types this layer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeType {
    HelloRequest = 0,
    ClientHello = 1,
    ServerHello = 2,
    NewSessionTicket = 4,
    Certificate = 11,
    ServerKeyExchange = 12,
    CertificateRequest = 13,
    ServerHelloDone = 14,
    CertificateVerify = 15,
    ClientKeyExchange = 16,
    Finished = 20,
}

impl HandshakeType {
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::HelloRequest),
            1 => Some(Self::ClientHello),
            2 => Some(Self::ServerHello),
            4 => Some(Self::NewSessionTicket),
            11 => Some(Self::Certificate),
            12 => Some(Self::ServerKeyExchange),
            13 => Some(Self::CertificateRequest),
            14 => Some(Self::ServerHelloDone),
            15 => Some(Self::CertificateVerify),
            16 => Some(Self::ClientKeyExchange),
            20 => Some(Self::Finished),
            _ => None,
        }
    }
}

/// Parsed 4-byte handshake header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub msg_type: u8,
    pub length: usize,
}

impl HandshakeHeader {
    /// # Errors
    ///
    /// `Malformed` when fewer than four bytes are available.
    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < HANDSHAKE_HEADER_LEN {
            return Err(CodecError::malformed("truncated handshake header"));
        }
        Ok(Self {
            msg_type: data[0],
            length: (usize::from(data[1]) << 16)
                | (usize::from(data[2]) << 8)
                | usize::from(data[3]),
        })
    }

    #[must_use]
    pub fn handshake_type(&self) -> Option<HandshakeType> {
        HandshakeType::from_byte(self.msg_type)
    }

    /// # Errors
    ///
    /// `Malformed` when the length does not fit 24 bits.
    pub fn write_to(&self, out: &mut impl BufMut) -> Result<(), CodecError> {
        if self.length > MAX_HANDSHAKE_LEN {
            return Err(CodecError::malformed("handshake length overflow"));
        }
        out.put_u8(self.msg_type);
        out.put_uint(self.length as u64, 3);
        Ok(())
    }
}

/// Split the first complete handshake message off a record payload.
///
/// Returns `(message, rest)` where `message` includes its header.
///
/// # Errors
///
/// `Fragmented` when the declared body continues past the payload, which
/// happens when a message is split across records.
pub fn split_first_message(payload: &[u8]) -> Result<(&[u8], &[u8]), CodecError> {
    let header = HandshakeHeader::parse(payload)?;
    let end = HANDSHAKE_HEADER_LEN + header.length;
    if end > payload.len() {
        return Err(CodecError::Fragmented);
    }
    Ok(payload.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_messages_sharing_a_record() {
        let payload = [2, 0, 0, 2, 0xde, 0xad, 14, 0, 0, 0];
        let (first, rest) = split_first_message(&payload).unwrap();
        assert_eq!(first, &[2, 0, 0, 2, 0xde, 0xad]);
        assert_eq!(rest, &[14, 0, 0, 0]);
        let header = HandshakeHeader::parse(first).unwrap();
        assert_eq!(header.handshake_type(), Some(HandshakeType::ServerHello));
    }

    #[test]
    fn message_running_past_record_is_fragmented() {
        let payload = [1, 0, 1, 0, 0x03, 0x03];
        assert_eq!(split_first_message(&payload).unwrap_err(), CodecError::Fragmented);
    }

    #[test]
    fn writes_24_bit_length() {
        let mut out = Vec::new();
        HandshakeHeader { msg_type: 1, length: 0x01_0203 }.write_to(&mut out).unwrap();
        assert_eq!(out, vec![1, 0x01, 0x02, 0x03]);
    }
}
