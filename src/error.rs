//! Error types for snmp-probe.
//!
//! Every fallible operation returns [`Result`], whose error side is the
//! single [`Error`] enum. The variants fall into five families:
//!
//! | Family | Variant(s) |
//! |---|---|
//! | malformed encoding | [`Error::Decode`] |
//! | connection setup / socket failure | [`Error::Connect`], [`Error::Io`] |
//! | no correlated response | [`Error::Timeout`] |
//! | agent-reported failure | [`Error::Snmp`] |
//! | released handle | [`Error::Closed`] |
//!
//! ```no_run
//! use snmp_probe::{Error, Version, new_client};
//!
//! # async fn example() -> snmp_probe::Result<()> {
//! let client = new_client("192.0.2.1", "public", Version::V2c, 2).await?;
//!
//! match client.get(&"1.3.6.1.2.1.1.1.0".parse()?).await {
//!     Ok(vb) => println!("{vb}"),
//!     Err(Error::Timeout { elapsed, retries, .. }) => {
//!         println!("no answer after {elapsed:?} ({retries} retries)");
//!     }
//!     Err(Error::Snmp { status, index, .. }) => {
//!         println!("agent said {status} for varbind #{index}");
//!     }
//!     Err(e) => println!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::oid::Oid;
use crate::pdu::PduType;
use crate::version::Version;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a BER decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A specific tag was required here.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Input ended in the middle of a TLV.
    TruncatedData,
    /// Declared length runs past the end of the enclosing buffer.
    LengthOverflow { length: usize, available: usize },
    /// Long-form length whose first octet is the reserved value 0xFF.
    ReservedLength,
    /// Indefinite (0x80) length.
    IndefiniteLength,
    /// Long-form length with more octets than we accept.
    LengthTooLong { octets: usize },
    /// Length larger than any SNMP message could be.
    LengthExceedsMax { length: usize, max: usize },
    /// Bytes left over after a container or the whole message.
    TrailingData { remaining: usize },
    /// INTEGER with no content octets.
    ZeroLengthInteger,
    /// INTEGER wider than its target type.
    IntegerOverflow,
    /// Counter64 wider than 9 content octets.
    Integer64TooLong { length: usize },
    /// Bad OBJECT IDENTIFIER content.
    InvalidOidEncoding,
    /// NULL (or an exception value) carrying content.
    InvalidNull,
    /// IpAddress that is not 4 octets.
    InvalidIpAddressLength { length: usize },
    /// Constructed OCTET STRING.
    ConstructedOctetString,
    /// Version field is neither v1 nor v2c.
    UnknownVersion(i32),
    /// Tag does not name a PDU we understand.
    UnknownPduType(u8),
    /// Multi-octet (high tag number) form, never used by SNMP.
    HighTagNumber,
    /// Nothing to decode.
    EmptyMessage,
    /// Response PDU carried no variable bindings.
    EmptyResponse,
    /// A correlated reply that is not a Response PDU.
    UnexpectedPduType(PduType),
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{expected:02X}, found 0x{actual:02X}")
            }
            Self::TruncatedData => f.write_str("truncated TLV"),
            Self::LengthOverflow { length, available } => write!(
                f,
                "declared length {length} exceeds the {available} bytes available"
            ),
            Self::ReservedLength => f.write_str("reserved length octet 0xFF"),
            Self::IndefiniteLength => f.write_str("indefinite length is not allowed"),
            Self::LengthTooLong { octets } => write!(f, "length uses {octets} octets"),
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {length} exceeds limit {max}")
            }
            Self::TrailingData { remaining } => write!(f, "{remaining} trailing bytes"),
            Self::ZeroLengthInteger => f.write_str("empty INTEGER"),
            Self::IntegerOverflow => f.write_str("INTEGER out of range"),
            Self::Integer64TooLong { length } => {
                write!(f, "Counter64 content is {length} bytes")
            }
            Self::InvalidOidEncoding => f.write_str("malformed OBJECT IDENTIFIER"),
            Self::InvalidNull => f.write_str("NULL with content"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IpAddress must be 4 bytes, got {length}")
            }
            Self::ConstructedOctetString => f.write_str("constructed OCTET STRING"),
            Self::UnknownVersion(v) => write!(f, "unsupported SNMP version {v}"),
            Self::UnknownPduType(t) => write!(f, "unknown PDU tag 0x{t:02X}"),
            Self::HighTagNumber => f.write_str("multi-octet tag numbers are not supported"),
            Self::EmptyMessage => f.write_str("empty message"),
            Self::EmptyResponse => f.write_str("response has no variable bindings"),
            Self::UnexpectedPduType(t) => write!(f, "expected a Response PDU, got {t}"),
        }
    }
}

/// Why an OID was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OidErrorKind {
    /// No arcs at all.
    Empty,
    /// A dotted component that is not a u32.
    InvalidArc,
    /// First arc outside 0..=2.
    InvalidFirstArc(u32),
    /// Second arc too large for a first arc of 0 or 1.
    InvalidSecondArc { first: u32, second: u32 },
    /// Fewer than two arcs where BER needs two.
    TooShort,
    /// More arcs than [`MAX_OID_LEN`](crate::oid::MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("empty OID"),
            Self::InvalidArc => f.write_str("arc is not a 32-bit unsigned number"),
            Self::InvalidFirstArc(v) => write!(f, "first arc {v} is not 0, 1 or 2"),
            Self::InvalidSecondArc { first, second } => {
                write!(f, "second arc {second} is too large under {first}")
            }
            Self::TooShort => f.write_str("need at least two arcs"),
            Self::TooManyArcs { count, max } => write!(f, "{count} arcs (limit {max})"),
        }
    }
}

const STATUS_NAMES: [&str; 19] = [
    "noError",
    "tooBig",
    "noSuchName",
    "badValue",
    "readOnly",
    "genErr",
    "noAccess",
    "wrongType",
    "wrongLength",
    "wrongEncoding",
    "wrongValue",
    "noCreation",
    "inconsistentValue",
    "resourceUnavailable",
    "commitFailed",
    "undoFailed",
    "authorizationError",
    "notWritable",
    "inconsistentName",
];

/// The errorStatus field of a response PDU (RFC 1157 / RFC 3416).
///
/// ```
/// use snmp_probe::ErrorStatus;
///
/// assert_eq!(ErrorStatus::from_i32(5), ErrorStatus::GenErr);
/// assert_eq!(ErrorStatus::GenErr.to_string(), "genErr");
/// assert_eq!(ErrorStatus::from_i32(99).as_i32(), 99);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    /// v1 only; v2c agents answer with exception values instead.
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// A code outside the RFC table, kept verbatim.
    Unknown(i32),
}

impl ErrorStatus {
    const KNOWN: [ErrorStatus; 19] = [
        Self::NoError,
        Self::TooBig,
        Self::NoSuchName,
        Self::BadValue,
        Self::ReadOnly,
        Self::GenErr,
        Self::NoAccess,
        Self::WrongType,
        Self::WrongLength,
        Self::WrongEncoding,
        Self::WrongValue,
        Self::NoCreation,
        Self::InconsistentValue,
        Self::ResourceUnavailable,
        Self::CommitFailed,
        Self::UndoFailed,
        Self::AuthorizationError,
        Self::NotWritable,
        Self::InconsistentName,
    ];

    /// Map a wire value to a status.
    pub fn from_i32(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::KNOWN.get(i).copied())
            .unwrap_or(Self::Unknown(value))
    }

    /// The wire value.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Unknown(code) => *code,
            known => Self::KNOWN
                .iter()
                .position(|s| s == known)
                .map_or(-1, |i| i as i32),
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({code})"),
            known => f.write_str(STATUS_NAMES[known.as_i32() as usize]),
        }
    }
}

fn peer(target: &Option<SocketAddr>, prep: &str) -> String {
    target.map(|t| format!(" {prep} {t}")).unwrap_or_default()
}

/// Every error this crate produces.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Target could not be resolved or the socket could not be set up.
    #[error("cannot connect to '{target}': {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket error on an established association.
    #[error("I/O error{}: {source}", peer(target, "talking to"))]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// No correlated response within the retry budget.
    #[error("timed out after {elapsed:?}{} (request_id={request_id}, retries={retries})", peer(target, "waiting for"))]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        request_id: i32,
        retries: u32,
    },

    /// Agent answered with a non-zero errorStatus.
    ///
    /// `index` is the 1-based errorIndex exactly as received; `oid` is the
    /// request OID it designates, when it designates one.
    #[error("agent error{}: {status} at index {index}", peer(target, "from"))]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Operation on a handle after [`Client::close`](crate::Client::close).
    #[error("client is closed")]
    Closed,

    /// Network operation on a handle built without a target.
    #[error("client has no target; only offline decoding is available")]
    NoTarget,

    /// Malformed BER.
    #[error("malformed encoding at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// OID text or arcs could not be used.
    #[error("invalid OID{}: {kind}", input.as_deref().map(|i| format!(" '{i}'")).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// Decoded response carries a different request id.
    #[error("request ID mismatch: expected {expected}, got {actual}")]
    RequestIdMismatch { expected: i32, actual: i32 },

    /// Decoded response carries a different version.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: Version, actual: Version },

    /// Walk received an OID that does not advance, under
    /// [`OidOrdering::Reject`](crate::OidOrdering::Reject).
    #[error("walk received non-increasing OID: {previous} >= {current}")]
    NonIncreasingOid { previous: Oid, current: Oid },

    /// Walk received the same OID twice while tolerating disorder.
    #[error("walk received OID {oid} twice")]
    DuplicateOid { oid: Oid },

    /// GETBULK was requested on an SNMPv1 handle.
    #[error("GETBULK is not supported in SNMPv1")]
    GetBulkNotSupportedInV1,

    /// Invalid builder settings.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for [`Error::Decode`].
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Shorthand for [`Error::InvalidOid`] without input text.
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Shorthand for [`Error::InvalidOid`] carrying the text that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// The peer involved, for errors that have one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } | Self::Timeout { target, .. } | Self::Snmp { target, .. } => {
                *target
            }
            _ => None,
        }
    }

    /// True for structural decode failures.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}
