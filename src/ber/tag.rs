//! Tag octets used by SNMP.
//!
//! Only single-octet tags (number 0..=30) occur in SNMP, so a tag is a `u8`:
//! bits 8-7 class, bit 6 constructed, bits 5-1 number.

/// Class bits.
pub mod class {
    pub const UNIVERSAL: u8 = 0x00;
    pub const APPLICATION: u8 = 0x40;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
    pub const PRIVATE: u8 = 0xC0;
}

/// Constructed bit.
pub const CONSTRUCTED: u8 = 0x20;

pub mod universal {
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    /// Rejected when decoding values.
    pub const OCTET_STRING_CONSTRUCTED: u8 = 0x24;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const OBJECT_DESCRIPTOR: u8 = 0x07;
    pub const SEQUENCE: u8 = 0x30;
}

/// SMI application types (RFC 2578).
pub mod application {
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    /// Gauge32 and Unsigned32 share this tag.
    pub const GAUGE32: u8 = 0x42;
    pub const TIMETICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const NSAP_ADDRESS: u8 = 0x45;
    pub const COUNTER64: u8 = 0x46;
    /// RFC 1442 UInteger32, obsolete.
    pub const UINTEGER32: u8 = 0x47;
}

/// v2c exception values, primitive context-specific.
pub mod context {
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// PDU tags, constructed context-specific.
pub mod pdu {
    use super::CONSTRUCTED;
    use super::class::CONTEXT_SPECIFIC;

    pub const GET_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED;
    pub const GET_NEXT_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x01;
    pub const RESPONSE: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x02;
    pub const SET_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x03;
    pub const TRAP_V1: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x04;
    pub const GET_BULK_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x05;
    pub const INFORM_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x06;
    pub const TRAP_V2: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x07;
    pub const REPORT: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x08;
}

#[inline]
pub const fn is_constructed(tag: u8) -> bool {
    tag & CONSTRUCTED != 0
}

#[inline]
pub const fn tag_class(tag: u8) -> u8 {
    tag & 0xC0
}

#[inline]
pub const fn tag_number(tag: u8) -> u8 {
    tag & 0x1F
}

/// The four tag classes as an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl TagClass {
    /// Class of a tag octet.
    pub const fn of(tag: u8) -> Self {
        match tag_class(tag) {
            class::UNIVERSAL => Self::Universal,
            class::APPLICATION => Self::Application,
            class::CONTEXT_SPECIFIC => Self::ContextSpecific,
            _ => Self::Private,
        }
    }

    /// The class bits.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Universal => class::UNIVERSAL,
            Self::Application => class::APPLICATION,
            Self::ContextSpecific => class::CONTEXT_SPECIFIC,
            Self::Private => class::PRIVATE,
        }
    }
}

/// A wire tag viewed as an SNMP data type, for diagnostics.
///
/// Any octet is representable; those outside the SNMP type space render as
/// `"Unknown"`.
///
/// ```
/// use snmp_probe::ber::Asn1Ber;
///
/// assert_eq!(Asn1Ber::INTEGER.to_string(), "Integer");
/// assert_eq!(Asn1Ber(0x00).to_string(), "Unknown");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Asn1Ber(pub u8);

impl Asn1Ber {
    pub const INTEGER: Self = Self(universal::INTEGER);
    pub const BIT_STRING: Self = Self(universal::BIT_STRING);
    pub const OCTET_STRING: Self = Self(universal::OCTET_STRING);
    pub const NULL: Self = Self(universal::NULL);
    pub const OBJECT_IDENTIFIER: Self = Self(universal::OBJECT_IDENTIFIER);
    pub const OBJECT_DESCRIPTION: Self = Self(universal::OBJECT_DESCRIPTOR);
    pub const IP_ADDRESS: Self = Self(application::IP_ADDRESS);
    pub const COUNTER32: Self = Self(application::COUNTER32);
    pub const GAUGE32: Self = Self(application::GAUGE32);
    pub const TIMETICKS: Self = Self(application::TIMETICKS);
    pub const OPAQUE: Self = Self(application::OPAQUE);
    pub const NSAP_ADDRESS: Self = Self(application::NSAP_ADDRESS);
    pub const COUNTER64: Self = Self(application::COUNTER64);
    pub const UINTEGER32: Self = Self(application::UINTEGER32);
    pub const NO_SUCH_OBJECT: Self = Self(context::NO_SUCH_OBJECT);
    pub const NO_SUCH_INSTANCE: Self = Self(context::NO_SUCH_INSTANCE);
    pub const END_OF_MIB_VIEW: Self = Self(context::END_OF_MIB_VIEW);

    /// Human name of the type, `"Unknown"` when unrecognized.
    pub const fn name(self) -> &'static str {
        match self.0 {
            universal::INTEGER => "Integer",
            universal::BIT_STRING => "BitString",
            universal::OCTET_STRING => "OctetString",
            universal::NULL => "Null",
            universal::OBJECT_IDENTIFIER => "ObjectIdentifier",
            universal::OBJECT_DESCRIPTOR => "ObjectDescription",
            application::IP_ADDRESS => "IPAddress",
            application::COUNTER32 => "Counter32",
            application::GAUGE32 => "Gauge32",
            application::TIMETICKS => "TimeTicks",
            application::OPAQUE => "Opaque",
            application::NSAP_ADDRESS => "NsapAddress",
            application::COUNTER64 => "Counter64",
            application::UINTEGER32 => "Uinteger32",
            context::NO_SUCH_OBJECT => "NoSuchObject",
            context::NO_SUCH_INSTANCE => "NoSuchInstance",
            context::END_OF_MIB_VIEW => "EndOfMibView",
            _ => "Unknown",
        }
    }
}

impl From<u8> for Asn1Ber {
    fn from(tag: u8) -> Self {
        Self(tag)
    }
}

impl std::fmt::Display for Asn1Ber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
