//! BER encoding.
//!
//! [`EncodeBuf`] writes back to front: a TLV's content is pushed first, then
//! its length (now known), then its tag. Callers therefore push the fields of
//! a SEQUENCE in reverse order. [`EncodeBuf::finish`] flips the buffer once.

use bytes::Bytes;

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;

/// Reverse-writing BER encoder.
#[derive(Debug, Default)]
pub struct EncodeBuf {
    buf: Vec<u8>,
}

impl EncodeBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Push raw bytes that should appear in forward order in the output.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    pub fn push_length(&mut self, len: usize) {
        let (octets, n) = encode_length(len);
        self.buf.extend_from_slice(&octets[..n]);
    }

    /// Wrap whatever `content` pushes in a TLV with `tag`.
    pub fn push_constructed(&mut self, tag: u8, content: impl FnOnce(&mut Self)) {
        let mark = self.buf.len();
        content(self);
        let len = self.buf.len() - mark;
        self.push_length(len);
        self.push_tag(tag);
    }

    /// [`push_constructed`](Self::push_constructed) with the SEQUENCE tag.
    pub fn push_sequence(&mut self, content: impl FnOnce(&mut Self)) {
        self.push_constructed(tag::universal::SEQUENCE, content);
    }

    /// Primitive TLV with arbitrary content.
    pub fn push_primitive(&mut self, tag: u8, content: &[u8]) {
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// INTEGER in minimal two's complement.
    pub fn push_integer(&mut self, value: i32) {
        self.push_signed(tag::universal::INTEGER, value as i64);
    }

    /// Signed integer with an explicit tag.
    pub fn push_signed(&mut self, tag: u8, value: i64) {
        let bytes = value.to_be_bytes();
        // Strip leading octets that only repeat the sign.
        let mut start = 0;
        while start < 7 {
            let (cur, next) = (bytes[start], bytes[start + 1]);
            let redundant = (cur == 0x00 && next & 0x80 == 0) || (cur == 0xFF && next & 0x80 != 0);
            if !redundant {
                break;
            }
            start += 1;
        }
        self.push_primitive(tag, &bytes[start..]);
    }

    /// Unsigned integer with an explicit tag, e.g. Counter32 or Counter64.
    ///
    /// A leading zero octet is added when the top bit is set so the value
    /// stays positive.
    pub fn push_unsigned(&mut self, tag: u8, value: u64) {
        let mut padded = [0u8; 9];
        padded[1..].copy_from_slice(&value.to_be_bytes());
        let mut start = padded[1..].iter().position(|&b| b != 0).map_or(8, |i| i + 1);
        if padded[start] & 0x80 != 0 {
            start -= 1;
        }
        self.push_primitive(tag, &padded[start..]);
    }

    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_primitive(tag::universal::OCTET_STRING, data);
    }

    pub fn push_null(&mut self) {
        self.push_primitive(tag::universal::NULL, &[]);
    }

    pub fn push_oid(&mut self, oid: &Oid) {
        self.push_primitive(tag::universal::OBJECT_IDENTIFIER, &oid.to_ber());
    }

    pub fn push_ip_address(&mut self, addr: [u8; 4]) {
        self.push_primitive(tag::application::IP_ADDRESS, &addr);
    }

    /// Consume the buffer, yielding the bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn encoded(f: impl FnOnce(&mut EncodeBuf)) -> Vec<u8> {
        let mut buf = EncodeBuf::new();
        f(&mut buf);
        buf.finish().to_vec()
    }

    #[test]
    fn integers_are_minimal() {
        assert_eq!(encoded(|b| b.push_integer(0)), [0x02, 0x01, 0x00]);
        assert_eq!(encoded(|b| b.push_integer(127)), [0x02, 0x01, 0x7F]);
        assert_eq!(encoded(|b| b.push_integer(128)), [0x02, 0x02, 0x00, 0x80]);
        assert_eq!(encoded(|b| b.push_integer(-1)), [0x02, 0x01, 0xFF]);
        assert_eq!(encoded(|b| b.push_integer(-129)), [0x02, 0x02, 0xFF, 0x7F]);
        assert_eq!(
            encoded(|b| b.push_integer(i32::MIN)),
            [0x02, 0x04, 0x80, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn unsigned_gets_sign_padding() {
        assert_eq!(encoded(|b| b.push_unsigned(0x41, 0)), [0x41, 0x01, 0x00]);
        assert_eq!(
            encoded(|b| b.push_unsigned(0x41, 0x80)),
            [0x41, 0x02, 0x00, 0x80]
        );
        assert_eq!(
            encoded(|b| b.push_unsigned(0x41, u32::MAX as u64)),
            [0x41, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        let max = encoded(|b| b.push_unsigned(0x46, u64::MAX));
        assert_eq!(max.len(), 11);
        assert_eq!(&max[..3], &[0x46, 0x09, 0x00]);
    }

    #[test]
    fn sequence_wraps_reverse_pushes() {
        let bytes = encoded(|b| {
            b.push_sequence(|b| {
                b.push_null();
                b.push_oid(&oid!(1, 3, 6, 1));
            })
        });
        assert_eq!(
            bytes,
            [0x30, 0x07, 0x06, 0x03, 0x2b, 0x06, 0x01, 0x05, 0x00]
        );
    }

    #[test]
    fn long_form_lengths() {
        let payload = vec![b'x'; 200];
        let bytes = encoded(|b| b.push_octet_string(&payload));
        assert_eq!(&bytes[..3], &[0x04, 0x81, 200]);
        assert_eq!(bytes.len(), 203);
    }
}
