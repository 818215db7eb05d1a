//! Hex helpers for diagnostics and captured-packet input.

use std::fmt;

/// Lowercase hex, no separators.
///
/// ```
/// use snmp_probe::format::hex;
///
/// assert_eq!(hex::encode(&[0x30, 0x82, 0x00]), "308200");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    Bytes(bytes).to_string()
}

/// Why [`decode`] rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("odd number of hex digits")]
    OddLength,
    #[error("invalid hex digit {0:?} at position {1}")]
    InvalidChar(char, usize),
}

/// Parse hex text into bytes.
///
/// ASCII whitespace is skipped so packet dumps split across lines can be
/// pasted as-is; a leading `0x` is also accepted.
///
/// ```
/// use snmp_probe::format::hex;
///
/// assert_eq!(hex::decode("30 0a\n02").unwrap(), [0x30, 0x0a, 0x02]);
/// assert!(hex::decode("abc").is_err());
/// ```
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let text = text.trim_start();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let mut out = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    for (pos, ch) in text.char_indices() {
        if ch.is_ascii_whitespace() {
            continue;
        }
        let nibble = ch
            .to_digit(16)
            .ok_or(DecodeError::InvalidChar(ch, pos))? as u8;
        match high.take() {
            Some(h) => out.push(h << 4 | nibble),
            None => high = Some(nibble),
        }
    }
    if high.is_some() {
        return Err(DecodeError::OddLength);
    }
    Ok(out)
}

/// Formats as hex only when displayed, so disabled log levels cost nothing.
pub struct Bytes<'a>(pub &'a [u8]);

impl fmt::Display for Bytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl fmt::Debug for Bytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
