//! TLS record layer framing (RFC 5246 §6.2.1)

use bytes::BufMut;

use super::error::CodecError;

/// Record header length: type (1) + version (2) + length (2).
pub const RECORD_HEADER_LEN: usize = 5;

/// Largest plaintext fragment a record may carry (2^14).
pub const MAX_PLAINTEXT_LEN: usize = 16_384;

/// Largest fragment accepted on input; allows for compression and cipher expansion.
pub const MAX_CIPHERTEXT_LEN: usize = MAX_PLAINTEXT_LEN + 2048;

/// TLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            20 => Some(Self::ChangeCipherSpec),
            21 => Some(Self::Alert),
            22 => Some(Self::Handshake),
            23 => Some(Self::ApplicationData),
            _ => None,
        }
    }
}

/// Wire protocol version as (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u8,
    pub minor: u8,
}

impl ProtocolVersion {
    pub const TLS10: Self = Self { major: 3, minor: 1 };
    pub const TLS11: Self = Self { major: 3, minor: 2 };
    pub const TLS12: Self = Self { major: 3, minor: 3 };

    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Versions whose Hello messages carry a plaintext extensions block that
    /// this layer knows how to edit.
    #[must_use]
    pub fn carries_editable_hello(self) -> bool {
        self >= Self::TLS10 && self <= Self::TLS12
    }
}

/// Parsed 5-byte record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub content_type: ContentType,
    pub version: ProtocolVersion,
    pub length: u16,
}

impl RecordHeader {
    /// Decode a record header from the start of `data`.
    ///
    /// # Errors
    ///
    /// `Underflow` when fewer than five bytes are present, `Malformed` for an
    /// unknown content type or an oversized length.
    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < RECORD_HEADER_LEN {
            return Err(CodecError::Underflow {
                needed: RECORD_HEADER_LEN,
                available: data.len(),
            });
        }
        let content_type = ContentType::from_byte(data[0])
            .ok_or_else(|| CodecError::malformed(format!("unknown record type {}", data[0])))?;
        let length = u16::from_be_bytes([data[3], data[4]]);
        if usize::from(length) > MAX_CIPHERTEXT_LEN {
            return Err(CodecError::malformed(format!(
                "record length {length} exceeds maximum"
            )));
        }
        Ok(Self {
            content_type,
            version: ProtocolVersion::new(data[1], data[2]),
            length,
        })
    }

    /// Append the encoded header to `out`.
    pub fn write_to(&self, out: &mut impl BufMut) {
        out.put_u8(self.content_type as u8);
        out.put_u8(self.version.major);
        out.put_u8(self.version.minor);
        out.put_u16(self.length);
    }

    /// Same type and version with a different length.
    ///
    /// # Errors
    ///
    /// `Malformed` when `length` does not fit a record.
    pub fn with_length(&self, length: usize) -> Result<Self, CodecError> {
        if length > MAX_PLAINTEXT_LEN {
            return Err(CodecError::malformed(format!(
                "record length {length} exceeds maximum"
            )));
        }
        Ok(Self {
            length: u16::try_from(length)
                .map_err(|_| CodecError::malformed("record length overflow"))?,
            ..*self
        })
    }
}

/// One complete record borrowed from an I/O buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeRecord<'a> {
    pub header: RecordHeader,
    pub payload: &'a [u8],
}

impl<'a> HandshakeRecord<'a> {
    /// Total encoded length including the header.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_LEN + self.payload.len()
    }

    pub fn write_to(&self, out: &mut impl BufMut) {
        self.header.write_to(out);
        out.put_slice(self.payload);
    }
}

/// Split a buffer holding one or more concatenated records.
///
/// A session-resumption flight can deliver ServerHello, ChangeCipherSpec and
/// Finished in a single read, so every record present is returned in order.
///
/// # Errors
///
/// `Underflow` when any record's header or declared payload runs past the end
/// of `data`; `Malformed` for an unknown type or oversized length.
pub fn extract_records(data: &[u8]) -> Result<Vec<HandshakeRecord<'_>>, CodecError> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let header = RecordHeader::parse(&data[offset..]).map_err(|e| match e {
            CodecError::Underflow { needed, .. } => CodecError::Underflow {
                needed: offset + needed,
                available: data.len(),
            },
            other => other,
        })?;
        let start = offset + RECORD_HEADER_LEN;
        let end = start + usize::from(header.length);
        if end > data.len() {
            return Err(CodecError::Underflow {
                needed: end,
                available: data.len(),
            });
        }
        records.push(HandshakeRecord {
            header,
            payload: &data[start..end],
        });
        offset = end;
    }
    Ok(records)
}
