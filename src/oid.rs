//! Object identifiers.
//!
//! An [`Oid`] is a sequence of `u32` arcs kept inline for up to 16 arcs.
//! Ordering is SNMP's lexicographic order: arcs compare element-wise and a
//! proper prefix sorts first, which is exactly what `Ord` on slices gives.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};

/// Most arcs an OID may have (RFC 2578 section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object identifier.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// The zero-length OID.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from any iterator of arcs.
    ///
    /// ```
    /// use snmp_probe::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1]);
    /// assert_eq!(oid.to_string(), "1.3.6.1");
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse dotted-decimal text.
    ///
    /// A leading dot is allowed (`.1.3.6.1` is the same as `1.3.6.1`), as
    /// are empty components in general. Only numeric arcs are understood.
    ///
    /// ```
    /// use snmp_probe::Oid;
    ///
    /// let a = Oid::parse(".1.3.6.1.2.1.2").unwrap();
    /// let b = Oid::parse("1.3.6.1.2.1.2").unwrap();
    /// assert_eq!(a, b);
    /// assert!(Oid::parse("1.3.six").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let arcs = s
            .trim()
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))
            })
            .collect::<Result<SmallVec<[u32; 16]>>>()?;

        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }
        Ok(Self { arcs })
    }

    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// True when `prefix` is a (not necessarily proper) prefix of `self`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// True when `self` lies strictly below `root`.
    pub fn is_descendant_of(&self, root: &Oid) -> bool {
        self.len() > root.len() && self.starts_with(root)
    }

    /// Drop the last arc.
    pub fn parent(&self) -> Option<Oid> {
        let (_, head) = self.arcs.split_last()?;
        Some(Self::from_slice(head))
    }

    /// Append one arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Self { arcs }
    }

    /// Check the X.690 8.19.4 constraints on the first two arcs.
    pub fn validate(&self) -> Result<()> {
        let Some(&first) = self.arcs.first() else {
            return Err(Error::invalid_oid(OidErrorKind::Empty));
        };
        if first > 2 {
            return Err(Error::invalid_oid(OidErrorKind::InvalidFirstArc(first)));
        }
        match self.arcs.get(1) {
            None => Err(Error::invalid_oid(OidErrorKind::TooShort)),
            Some(&second) if first < 2 && second > 39 => {
                Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                    first,
                    second,
                }))
            }
            Some(_) => Ok(()),
        }
    }

    /// Content octets of the BER encoding.
    ///
    /// The first two arcs fold into one subidentifier `40 * X + Y`. An empty
    /// OID encodes to no octets and a single arc `X` encodes as `40 * X`.
    pub fn to_ber(&self) -> SmallVec<[u8; 64]> {
        let mut out = SmallVec::new();
        let (head, tail) = match self.arcs.as_slice() {
            [] => return out,
            [x] => (*x as u64 * 40, &[][..]),
            [x, y, rest @ ..] => (*x as u64 * 40 + *y as u64, rest),
        };
        push_subidentifier(&mut out, head);
        for &arc in tail {
            push_subidentifier(&mut out, arc as u64);
        }
        out
    }

    /// Parse BER content octets.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        let mut arcs = SmallVec::new();
        let mut pos = 0;

        while pos < data.len() {
            let (sub, used) = read_subidentifier(&data[pos..], pos)?;
            if pos == 0 {
                let (x, y) = match sub {
                    0..40 => (0, sub),
                    40..80 => (1, sub - 40),
                    _ => (2, sub - 80),
                };
                arcs.push(x);
                arcs.push(narrow(y, pos)?);
            } else {
                arcs.push(narrow(sub, pos)?);
            }
            pos += used;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(pos, DecodeErrorKind::InvalidOidEncoding));
            }
        }
        Ok(Self { arcs })
    }
}

fn narrow(value: u64, offset: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::decode(offset, DecodeErrorKind::InvalidOidEncoding))
}

fn push_subidentifier(out: &mut SmallVec<[u8; 64]>, value: u64) {
    let groups = (64 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

/// Read one base-128 subidentifier; at most 5 groups fit after the first-arc fold.
fn read_subidentifier(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, &byte) in data.iter().enumerate().take(5) {
        value = (value << 7) | (byte & 0x7F) as u64;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::decode(offset, DecodeErrorKind::InvalidOidEncoding))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({self})")
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.arcs.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{first}")?;
            for arc in arcs {
                write!(f, ".{arc}")?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::from_slice(&arcs)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_probe::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.len(), 9);
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
