//! Definite-length octets (X.690 8.1.3).
//!
//! Short form covers 0..=127 in one octet. Long form is `0x80 | n` followed
//! by `n` big-endian octets. Indefinite form (`0x80`) and the reserved
//! initial octet `0xFF` are rejected.

use crate::error::{DecodeErrorKind, Error, Result};

/// Upper bound on any decoded length. A UDP datagram cannot exceed 64 KiB,
/// so anything past 2 MiB is garbage.
pub const MAX_LENGTH: usize = 0x20_0000;

/// Longest long-form length we accept, in octets after the initial one.
const MAX_LENGTH_OCTETS: usize = 4;

/// Encode `len` as length octets.
///
/// Returns a scratch array holding the octets *back to front* plus the number
/// of octets used, so the reverse-writing encoder can append them as-is.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut out = [0u8; 5];
    if len < 0x80 {
        out[0] = len as u8;
        return (out, 1);
    }

    let mut rest = len;
    let mut n = 0;
    while rest > 0 && n < MAX_LENGTH_OCTETS {
        out[n] = rest as u8;
        rest >>= 8;
        n += 1;
    }
    out[n] = 0x80 | n as u8;
    (out, n + 1)
}

/// Decode length octets at the front of `data`.
///
/// Returns `(length, octets_consumed)`. `base_offset` is the absolute position
/// of `data[0]`, used only for error reporting. Non-minimal long forms such as
/// `82 00 32` are accepted.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    match first {
        0x00..=0x7F => Ok((first as usize, 1)),
        0x80 => Err(Error::decode(base_offset, DecodeErrorKind::IndefiniteLength)),
        0xFF => Err(Error::decode(base_offset, DecodeErrorKind::ReservedLength)),
        _ => {
            let octets = (first & 0x7F) as usize;
            if octets > MAX_LENGTH_OCTETS {
                return Err(Error::decode(
                    base_offset,
                    DecodeErrorKind::LengthTooLong { octets },
                ));
            }
            let Some(body) = data.get(1..=octets) else {
                return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
            };

            let len = body.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
            if len > MAX_LENGTH {
                return Err(Error::decode(
                    base_offset,
                    DecodeErrorKind::LengthExceedsMax {
                        length: len,
                        max: MAX_LENGTH,
                    },
                ));
            }
            Ok((len, octets + 1))
        }
    }
}
