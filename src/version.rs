//! Protocol versions.

use crate::error::{DecodeErrorKind, Error, Result};

/// Community-based SNMP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// SNMPv1 (RFC 1157), wire value 0.
    V1,
    /// SNMPv2c (RFC 1901), wire value 1.
    #[default]
    V2c,
}

impl Version {
    /// Map the message version field. Anything else, including v3, fails.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::V1),
            1 => Some(Self::V2c),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::V1 => 0,
            Self::V2c => 1,
        }
    }

    pub(crate) fn decode_field(value: i32, offset: usize) -> Result<Self> {
        Self::from_i32(value)
            .ok_or_else(|| Error::decode(offset, DecodeErrorKind::UnknownVersion(value)))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::V1 => "v1",
            Self::V2c => "v2c",
        })
    }
}

impl std::str::FromStr for Version {
    type Err = Error;

    /// Accepts `1`, `v1`, `2c`, `v2c` (any case).
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().trim_start_matches('v') {
            "1" => Ok(Self::V1),
            "2" | "2c" => Ok(Self::V2c),
            _ => Err(Error::Config(format!("unsupported SNMP version '{s}'"))),
        }
    }
}
