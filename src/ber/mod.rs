//! Basic Encoding Rules, restricted to what SNMP uses.
//!
//! - [`tag`]: identifier octets and the [`Asn1Ber`] stringer
//! - [`length`]: definite-length octets
//! - [`EncodeBuf`]: reverse-writing encoder
//! - [`Decoder`]: zero-copy cursor
//! - [`Tlv`], [`decode_tlv`], [`encode_tlv`]: schema-free nodes

mod decode;
mod encode;
pub mod length;
pub mod tag;
mod tlv;

pub use decode::{Decoder, decode_i32, decode_u32, decode_u64};
pub use encode::EncodeBuf;
pub use tag::{Asn1Ber, TagClass};
pub use tlv::{Tlv, decode_tlv, encode_tlv};
