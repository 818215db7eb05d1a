//! PDU bodies.
//!
//! Every PDU this crate handles has the same body:
//! `request-id, error-status, error-index, variable-bindings`.
//! GETBULK reuses the two error fields for non-repeaters and
//! max-repetitions.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU kind, keyed by its context tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = tag::pdu::GET_REQUEST,
    GetNextRequest = tag::pdu::GET_NEXT_REQUEST,
    Response = tag::pdu::RESPONSE,
    SetRequest = tag::pdu::SET_REQUEST,
    GetBulkRequest = tag::pdu::GET_BULK_REQUEST,
    InformRequest = tag::pdu::INFORM_REQUEST,
    TrapV2 = tag::pdu::TRAP_V2,
    Report = tag::pdu::REPORT,
}

impl PduType {
    /// `None` for tags outside the list above, including the v1 Trap.
    pub fn from_tag(tag: u8) -> Option<Self> {
        [
            Self::GetRequest,
            Self::GetNextRequest,
            Self::Response,
            Self::SetRequest,
            Self::GetBulkRequest,
            Self::InformRequest,
            Self::TrapV2,
            Self::Report,
        ]
        .into_iter()
        .find(|t| t.tag() == tag)
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A PDU body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub pdu_type: PduType,
    pub request_id: i32,
    /// Zero in requests; non-repeaters for GETBULK.
    pub error_status: i32,
    /// 1-based varbind index of the failure; max-repetitions for GETBULK.
    pub error_index: i32,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Request of `pdu_type` with one NULL binding per OID.
    pub fn request(pdu_type: PduType, request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(PduType::GetRequest, request_id, oids)
    }

    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::request(PduType::GetNextRequest, request_id, oids)
    }

    pub fn get_bulk_request(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            error_status: non_repeaters,
            error_index: max_repetitions,
            ..Self::request(PduType::GetBulkRequest, request_id, oids)
        }
    }

    /// True when the agent reported an error.
    pub fn is_error(&self) -> bool {
        self.pdu_type != PduType::GetBulkRequest && self.error_status != 0
    }

    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag = decoder.read_tag()?;
        let Some(pdu_type) = PduType::from_tag(tag) else {
            tracing::debug!(target: "snmp_probe::ber", { snmp.offset = at, snmp.tag = tag }, "unknown PDU tag");
            return Err(Error::decode(at, DecodeErrorKind::UnknownPduType(tag)));
        };
        let len = decoder.read_length()?;
        let mut body = decoder.sub_decoder(len)?;

        let request_id = body.read_integer()?;
        let error_status = body.read_integer()?;
        let error_index = body.read_integer()?;
        let varbinds = decode_varbind_list(&mut body)?;
        body.finish()?;

        Ok(Self {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    #[test]
    fn tags() {
        assert_eq!(PduType::from_tag(0xA2), Some(PduType::Response));
        assert_eq!(PduType::from_tag(0xA4), None);
        assert_eq!(PduType::GetBulkRequest.tag(), 0xA5);
        assert_eq!(PduType::GetNextRequest.to_string(), "GetNextRequest");
    }

    #[test]
    fn request_round_trip() {
        let pdu = Pdu::get_next_request(0x1234, &[oid!(1, 3, 6, 1, 2, 1, 2)]);
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let bytes = buf.finish();
        assert_eq!(bytes[0], 0xA1);
        let back = Pdu::decode(&mut Decoder::new(bytes)).unwrap();
        assert_eq!(back, pdu);
        assert_eq!(back.varbinds[0].value, Value::Null);
    }

    #[test]
    fn bulk_fields_reuse_error_slots() {
        let pdu = Pdu::get_bulk_request(9, 1, 25, &[oid!(1, 3, 6, 1)]);
        assert_eq!((pdu.error_status, pdu.error_index), (1, 25));
        assert!(!pdu.is_error());
    }

    #[test]
    fn unknown_tag_is_structural_failure() {
        let err = Pdu::decode(&mut Decoder::from_slice(&[0xA4, 0x00])).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                offset: 0,
                kind: DecodeErrorKind::UnknownPduType(0xA4)
            }
        ));
    }

    #[test]
    fn missing_fields_fail() {
        // Response with only a request-id.
        let err = Pdu::decode(&mut Decoder::from_slice(&[0xA2, 0x03, 0x02, 0x01, 0x07])).unwrap_err();
        assert!(err.is_malformed());
    }
}
