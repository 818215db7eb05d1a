//! Whole SNMP messages.
//!
//! v1 and v2c share one layout:
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu }`.
//! [`decode_packet`] is the only parser for inbound datagrams; the client's
//! receive path and offline decoding both go through it.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::version::Version;

/// A community-based message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: Version,
    pub community: Bytes,
    pub pdu: Pdu,
}

impl Message {
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Community as text, lossy for non-UTF-8 bytes.
    pub fn community_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.community)
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::with_capacity(64 + 32 * self.pdu.varbinds.len());
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
        buf.finish()
    }

    /// Parse a complete datagram. Trailing bytes anywhere are an error.
    pub fn decode(data: Bytes) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::decode(0, DecodeErrorKind::EmptyMessage));
        }
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        decoder.finish()?;

        let version_at = seq.offset();
        let version = Version::decode_field(seq.read_integer()?, version_at)?;
        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;
        seq.finish()?;

        Ok(Self {
            version,
            community,
            pdu,
        })
    }

    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {} community={:?} request_id={} error_status={} error_index={}",
            self.version,
            self.pdu.pdu_type,
            self.community_str(),
            self.pdu.request_id,
            self.pdu.error_status_enum(),
            self.pdu.error_index,
        )?;
        for vb in &self.pdu.varbinds {
            writeln!(f, "  {vb}")?;
        }
        Ok(())
    }
}

/// Parse a captured or received datagram.
pub fn decode_packet(raw: impl Into<Bytes>) -> Result<Message> {
    Message::decode(raw.into())
}

/// Build a request datagram with one NULL binding per OID.
///
/// Fails with [`Error::InvalidOid`] for an OID whose first two arcs cannot
/// be BER-encoded without changing it.
pub fn encode_request(
    pdu_type: PduType,
    request_id: i32,
    oids: &[Oid],
    community: &[u8],
    version: Version,
) -> Result<Bytes> {
    oids.iter().try_for_each(Oid::validate)?;
    let pdu = Pdu::request(pdu_type, request_id, oids);
    Ok(Message::new(version, Bytes::copy_from_slice(community), pdu).encode())
}
