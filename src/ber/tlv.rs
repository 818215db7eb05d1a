//! Generic TLV nodes.
//!
//! The typed decoders in this crate never build a tree; this is the
//! schema-free view used for diagnostics and for checking that a buffer is
//! well-formed BER all the way down.

use bytes::Bytes;

use super::decode::Decoder;
use super::encode::EncodeBuf;
use super::tag::{self, TagClass};
use crate::error::{DecodeErrorKind, Error, Result};

/// One tag-length-value node. `payload.len()` is the encoded length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    pub class: TagClass,
    pub constructed: bool,
    pub number: u8,
    pub payload: Bytes,
}

impl Tlv {
    /// Primitive node.
    pub fn primitive(tag: u8, payload: impl Into<Bytes>) -> Self {
        Self::from_tag(tag, payload.into())
    }

    fn from_tag(tag: u8, payload: Bytes) -> Self {
        Self {
            class: TagClass::of(tag),
            constructed: tag::is_constructed(tag),
            number: tag::tag_number(tag),
            payload,
        }
    }

    /// The identifier octet.
    pub fn tag(&self) -> u8 {
        let constructed = if self.constructed { tag::CONSTRUCTED } else { 0 };
        self.class.bits() | constructed | (self.number & 0x1F)
    }

    /// Declared length.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Nested nodes of a constructed node, in order.
    pub fn children(&self) -> Result<Vec<Tlv>> {
        let mut dec = Decoder::new(self.payload.clone());
        let mut out = Vec::new();
        while !dec.is_empty() {
            out.push(read_node(&mut dec)?);
        }
        Ok(out)
    }
}

fn read_node(dec: &mut Decoder) -> Result<Tlv> {
    let at = dec.offset();
    let tag = dec.read_tag()?;
    if tag::tag_number(tag) == 0x1F {
        return Err(Error::decode(at, DecodeErrorKind::HighTagNumber));
    }
    let len = dec.read_length()?;
    let mut content = dec.sub_decoder(len)?;

    // A constructed payload must be exactly a run of complete TLVs.
    if tag::is_constructed(tag) {
        let mut inner = content.clone();
        while !inner.is_empty() {
            read_node(&mut inner)?;
        }
    }
    let node = Tlv::from_tag(tag, content.read_bytes(len)?);
    Ok(node)
}

/// Parse the TLV starting at `offset` in `bytes`.
///
/// Returns the node and how many bytes it occupies. Fails when the declared
/// length runs past the buffer, when the length octet is the reserved `0xFF`,
/// or when a constructed node's content is not a whole number of TLVs.
pub fn decode_tlv(bytes: &[u8], offset: usize) -> Result<(Tlv, usize)> {
    let Some(rest) = bytes.get(offset..) else {
        return Err(Error::decode(offset, DecodeErrorKind::TruncatedData));
    };
    let mut dec = Decoder::from_slice(rest);
    let node = read_node(&mut dec).map_err(|e| match e {
        Error::Decode { offset: rel, kind } => Error::decode(offset + rel, kind),
        other => other,
    })?;
    Ok((node, dec.offset()))
}

/// Serialize a node. Inverse of [`decode_tlv`].
pub fn encode_tlv(node: &Tlv) -> Bytes {
    let mut buf = EncodeBuf::with_capacity(node.len() + 6);
    buf.push_primitive(node.tag(), &node.payload);
    buf.finish()
}
