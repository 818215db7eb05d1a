//! SNMP values.
//!
//! [`Value`] is closed over the SMIv2 types plus the three v2c exceptions.
//! Anything else on the wire, or a known tag whose content is malformed,
//! becomes [`Value::Unknown`] so one bad varbind never sinks its siblings.

use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::ber::{self, Asn1Ber, Decoder, EncodeBuf, Tlv, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::format::hex;
use crate::oid::Oid;

/// A varbind value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Value {
    /// Signed 32-bit INTEGER.
    Integer(i32),
    OctetString(Bytes),
    Null,
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    /// Wrapping counter.
    Counter32(u32),
    /// Gauge32, also used for Unsigned32.
    Gauge32(u32),
    /// Hundredths of a second.
    TimeTicks(u32),
    /// Opaque-wrapped BER, left undecoded.
    Opaque(Bytes),
    /// Wrapping 64-bit counter; v2c only.
    Counter64(u64),
    /// The agent knows no such object.
    NoSuchObject,
    /// The object exists but this instance does not.
    NoSuchInstance,
    /// Nothing follows in the agent's MIB view. Ends walks.
    EndOfMibView,
    /// Unrecognized tag, or content that did not decode, kept raw.
    ///
    /// Encoded verbatim. Decoding does not remember that a value was unknown:
    /// if `tag` names a known type and `data` is valid content for it, the
    /// bytes read back as that typed value. `Unknown { tag: 0x41, data: [1, 2] }`
    /// decodes as `Counter32(258)`.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Counter32, Gauge32 and TimeTicks, plus non-negative Integers.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Any unsigned numeric kind widened to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            other => other.as_u32().map(u64::from),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) => Some(b),
            _ => None,
        }
    }

    /// OctetString content when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::OctetString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<Ipv4Addr> {
        match self {
            Value::IpAddress(octets) => Some(Ipv4Addr::from(*octets)),
            _ => None,
        }
    }

    /// NoSuchObject, NoSuchInstance or EndOfMibView.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// The wire tag this value encodes with.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Integer(_) => tag::universal::INTEGER,
            Value::OctetString(_) => tag::universal::OCTET_STRING,
            Value::Null => tag::universal::NULL,
            Value::ObjectIdentifier(_) => tag::universal::OBJECT_IDENTIFIER,
            Value::IpAddress(_) => tag::application::IP_ADDRESS,
            Value::Counter32(_) => tag::application::COUNTER32,
            Value::Gauge32(_) => tag::application::GAUGE32,
            Value::TimeTicks(_) => tag::application::TIMETICKS,
            Value::Opaque(_) => tag::application::OPAQUE,
            Value::Counter64(_) => tag::application::COUNTER64,
            Value::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            Value::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            Value::EndOfMibView => tag::context::END_OF_MIB_VIEW,
            Value::Unknown { tag, .. } => *tag,
        }
    }

    /// Type name for diagnostics, e.g. `"Counter32"`.
    pub fn type_name(&self) -> &'static str {
        Asn1Ber(self.tag()).name()
    }

    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
                buf.push_unsigned(self.tag(), u64::from(*v))
            }
            Value::Counter64(v) => buf.push_unsigned(self.tag(), *v),
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                buf.push_primitive(self.tag(), &[])
            }
            Value::Opaque(data) | Value::Unknown { data, .. } => {
                buf.push_primitive(self.tag(), data)
            }
        }
    }

    /// This value as a generic TLV node.
    pub fn to_tlv(&self) -> Result<Tlv> {
        let mut buf = EncodeBuf::new();
        self.encode(&mut buf);
        ber::decode_tlv(&buf.finish(), 0).map(|(node, _)| node)
    }

    /// Read one value TLV.
    ///
    /// Only framing errors (truncation, bad length) fail; content errors
    /// degrade to [`Value::Unknown`] with a warning.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;
        let offset = decoder.offset();
        let content = decoder.read_bytes(len)?;
        Ok(Self::from_content(tag, content, offset))
    }

    /// Interpret `content` according to `tag`. Never fails.
    ///
    /// `offset` locates the content in its packet for log messages.
    pub fn from_content(tag: u8, content: Bytes, offset: usize) -> Self {
        match Self::parse_content(tag, &content, offset) {
            Ok(Some(value)) => value,
            Ok(None) => Value::Unknown { tag, data: content },
            Err(err) => {
                tracing::warn!(
                    target: "snmp_probe::ber",
                    { snmp.offset = offset, snmp.tag = tag, error = %err },
                    "value did not decode, keeping raw bytes"
                );
                Value::Unknown { tag, data: content }
            }
        }
    }

    fn parse_content(tag: u8, content: &Bytes, offset: usize) -> Result<Option<Self>> {
        let no_content = |v: Value| {
            if content.is_empty() {
                Ok(Some(v))
            } else {
                Err(Error::decode(offset, DecodeErrorKind::InvalidNull))
            }
        };

        match tag {
            tag::universal::INTEGER => Ok(Some(Value::Integer(ber::decode_i32(content, offset)?))),
            tag::universal::OCTET_STRING => Ok(Some(Value::OctetString(content.clone()))),
            tag::universal::OCTET_STRING_CONSTRUCTED => Err(Error::decode(
                offset,
                DecodeErrorKind::ConstructedOctetString,
            )),
            tag::universal::NULL => no_content(Value::Null),
            tag::universal::OBJECT_IDENTIFIER => Oid::from_ber(content)
                .map(|oid| Some(Value::ObjectIdentifier(oid)))
                .map_err(|_| Error::decode(offset, DecodeErrorKind::InvalidOidEncoding)),
            tag::application::IP_ADDRESS => <[u8; 4]>::try_from(content.as_ref())
                .map(|octets| Some(Value::IpAddress(octets)))
                .map_err(|_| {
                    Error::decode(
                        offset,
                        DecodeErrorKind::InvalidIpAddressLength {
                            length: content.len(),
                        },
                    )
                }),
            tag::application::COUNTER32 => {
                Ok(Some(Value::Counter32(ber::decode_u32(content, offset)?)))
            }
            tag::application::GAUGE32 => {
                Ok(Some(Value::Gauge32(ber::decode_u32(content, offset)?)))
            }
            tag::application::TIMETICKS => {
                Ok(Some(Value::TimeTicks(ber::decode_u32(content, offset)?)))
            }
            tag::application::OPAQUE => Ok(Some(Value::Opaque(content.clone()))),
            tag::application::COUNTER64 => {
                Ok(Some(Value::Counter64(ber::decode_u64(content, offset)?)))
            }
            tag::context::NO_SUCH_OBJECT => no_content(Value::NoSuchObject),
            tag::context::NO_SUCH_INSTANCE => no_content(Value::NoSuchInstance),
            tag::context::END_OF_MIB_VIEW => no_content(Value::EndOfMibView),
            _ => Ok(None),
        }
    }
}

fn is_printable(text: &str) -> bool {
    text.chars().all(|c| !c.is_control() || c.is_ascii_whitespace())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(text) if is_printable(text) => f.write_str(text),
                _ => write!(f, "0x{}", hex::Bytes(data)),
            },
            Value::Null => f.write_str("NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Value::IpAddress(octets) => write!(f, "{}", Ipv4Addr::from(*octets)),
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{v}"),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                write!(
                    f,
                    "{}d {}h {}m {}s",
                    secs / 86_400,
                    secs % 86_400 / 3_600,
                    secs % 3_600 / 60,
                    secs % 60
                )
            }
            Value::Opaque(data) => write!(f, "Opaque(0x{})", hex::Bytes(data)),
            Value::Counter64(v) => write!(f, "{v}"),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
            Value::Unknown { tag, data } => {
                write!(f, "Unknown(tag=0x{tag:02X}, data=0x{})", hex::Bytes(data))
            }
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(addr: Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}
