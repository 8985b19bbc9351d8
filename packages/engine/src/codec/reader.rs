//! Bounds-checked big-endian cursor over a borrowed byte slice

use super::error::CodecError;

/// Cursor over handshake bytes.
///
/// Every read is checked against the end of the slice. Running off the end
/// inside a length-delimited structure means a length field lied, so the
/// cursor reports [`CodecError::Malformed`] naming the field being read.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread tail of the slice.
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::malformed(format!(
                "{field}: need {len} bytes, {} left",
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn u8(&mut self, field: &str) -> Result<u8, CodecError> {
        Ok(self.take(1, field)?[0])
    }

    pub fn u16(&mut self, field: &str) -> Result<u16, CodecError> {
        let b = self.take(2, field)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u24(&mut self, field: &str) -> Result<usize, CodecError> {
        let b = self.take(3, field)?;
        Ok((usize::from(b[0]) << 16) | (usize::from(b[1]) << 8) | usize::from(b[2]))
    }

    /// Vector with a 1-byte length prefix.
    pub fn vec8(&mut self, field: &str) -> Result<&'a [u8], CodecError> {
        let len = usize::from(self.u8(field)?);
        self.take(len, field)
    }

    /// Vector with a 2-byte length prefix.
    pub fn vec16(&mut self, field: &str) -> Result<&'a [u8], CodecError> {
        let len = usize::from(self.u16(field)?);
        self.take(len, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_integers() {
        let mut r = Reader::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(r.u8("a").unwrap(), 0x01);
        assert_eq!(r.u16("b").unwrap(), 0x0203);
        assert_eq!(r.u24("c").unwrap(), 0x04_0506);
        assert!(r.is_empty());
    }

    #[test]
    fn short_read_is_malformed_and_does_not_advance() {
        let mut r = Reader::new(&[0x00, 0x05, 0xaa]);
        let err = r.vec16("list").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(ref m) if m.starts_with("list")));
        assert_eq!(r.position(), 2);
        assert_eq!(r.rest(), &[0xaa]);
    }
}
