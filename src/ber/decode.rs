//! BER decoding.
//!
//! [`Decoder`] is a cursor over a shared [`Bytes`] buffer; sub-decoders for
//! constructed values slice the same allocation. Error offsets are absolute
//! positions in the outermost buffer.

use bytes::Bytes;

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

fn fail<T>(offset: usize, kind: DecodeErrorKind) -> Result<T> {
    tracing::debug!(target: "snmp_probe::ber", { snmp.offset = offset, kind = %kind }, "decode failed");
    Err(Error::decode(offset, kind))
}

/// Signed INTEGER content as `i32`.
///
/// Redundant sign octets are tolerated as long as the value fits.
pub fn decode_i32(content: &[u8], offset: usize) -> Result<i32> {
    let value = decode_i64(content, offset)?;
    i32::try_from(value).or_else(|_| fail(offset, DecodeErrorKind::IntegerOverflow))
}

fn decode_i64(content: &[u8], offset: usize) -> Result<i64> {
    let Some(&first) = content.first() else {
        return fail(offset, DecodeErrorKind::ZeroLengthInteger);
    };
    if content.len() > 8 {
        return fail(offset, DecodeErrorKind::IntegerOverflow);
    }
    let seed: i64 = if first & 0x80 != 0 { -1 } else { 0 };
    Ok(content
        .iter()
        .fold(seed, |acc, &b| (acc << 8) | b as i64))
}

/// Unsigned content of an application integer type (Counter32, Gauge32,
/// TimeTicks) as `u32`. One leading zero octet is allowed.
pub fn decode_u32(content: &[u8], offset: usize) -> Result<u32> {
    if content.len() > 5 {
        return fail(offset, DecodeErrorKind::IntegerOverflow);
    }
    let value = decode_u64(content, offset)?;
    u32::try_from(value).or_else(|_| fail(offset, DecodeErrorKind::IntegerOverflow))
}

/// Counter64 content.
pub fn decode_u64(content: &[u8], offset: usize) -> Result<u64> {
    match content {
        [] => fail(offset, DecodeErrorKind::ZeroLengthInteger),
        [lead, ..] if content.len() == 9 && *lead != 0 => {
            fail(offset, DecodeErrorKind::IntegerOverflow)
        }
        _ if content.len() > 9 => fail(
            offset,
            DecodeErrorKind::Integer64TooLong {
                length: content.len(),
            },
        ),
        _ => Ok(content.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)),
    }
}

/// Cursor over BER-encoded bytes.
#[derive(Debug, Clone)]
pub struct Decoder {
    data: Bytes,
    offset: usize,
    base: usize,
}

impl Decoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Copying constructor for borrowed input.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Absolute position of the cursor.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.offset) else {
            return fail(self.offset(), DecodeErrorKind::TruncatedData);
        };
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_tag(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Read length octets and check that the content fits in what is left.
    pub fn read_length(&mut self) -> Result<usize> {
        let at = self.offset();
        let (len, used) = decode_length(&self.data[self.offset..], at)?;
        self.offset += used;
        if len > self.remaining() {
            return fail(
                at,
                DecodeErrorKind::LengthOverflow {
                    length: len,
                    available: self.remaining(),
                },
            );
        }
        Ok(len)
    }

    /// Take `len` bytes without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if len > self.remaining() {
            return fail(
                self.offset(),
                DecodeErrorKind::LengthOverflow {
                    length: len,
                    available: self.remaining(),
                },
            );
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read a tag that must equal `expected`, returning the content length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let at = self.offset();
        let actual = self.read_tag()?;
        if actual != expected {
            return fail(at, DecodeErrorKind::UnexpectedTag { expected, actual });
        }
        self.read_length()
    }

    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        let at = self.offset();
        decode_i32(&self.read_bytes(len)?, at)
    }

    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    pub fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return fail(self.offset(), DecodeErrorKind::InvalidNull);
        }
        Ok(())
    }

    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        let at = self.offset();
        let content = self.read_bytes(len)?;
        Oid::from_ber(&content).map_err(|e| match e {
            Error::Decode { offset, kind } => Error::decode(at + offset, kind),
            other => other,
        })
    }

    /// Enter a SEQUENCE.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Enter a constructed value with a known tag.
    pub fn read_constructed(&mut self, expected: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected)?;
        self.sub_decoder(len)
    }

    /// Decoder over the next `len` bytes, advancing past them.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(Decoder {
            data,
            offset: 0,
            base,
        })
    }

    /// Skip one TLV.
    pub fn skip_tlv(&mut self) -> Result<()> {
        self.read_tag()?;
        let len = self.read_length()?;
        self.offset += len;
        Ok(())
    }

    /// Require that nothing is left.
    pub fn finish(&self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            fail(
                self.offset(),
                DecodeErrorKind::TrailingData {
                    remaining: self.remaining(),
                },
            )
        }
    }
}
