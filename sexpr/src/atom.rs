//! Atoms, the leaf values of an s-expression, and their display hints.
use crate::escape::encode_atom;
use crate::primitives::{ByteOrder, Primitive};
use base64::Engine as _;
use std::fmt::{self, Debug, Display};
use std::io;
use std::str::Utf8Error;

/// Largest atom length representable in either encoding (2^31 - 1).
pub const MAX_ATOM_LEN: u32 = i32::MAX as u32;

/// Error produced when an atom can not be viewed as the requested type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtomError {
    #[error("expected {expected} bytes, atom has {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("offset {offset} is past the end of a {len} byte atom")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("atom is not valid UTF-8")]
    Utf8(#[from] Utf8Error),
    #[error("display hints can not carry display hints")]
    RecursiveHint,
}

/// An immutable byte string with an optional display hint.
///
/// Two atoms are equal when both their bytes and their display hints are equal.
///
/// Construction accepts any length, but writers refuse atoms longer than
/// [`MAX_ATOM_LEN`] bytes.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Atom {
    bytes: Vec<u8>,
    hint: Option<Box<DisplayHint>>,
}

impl Atom {
    /// Creates an atom without a display hint.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            hint: None,
        }
    }

    /// Creates an atom from `length` bytes of `bytes` starting at `offset`.
    pub fn from_slice(bytes: &[u8], offset: usize, length: usize) -> Result<Self, AtomError> {
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= bytes.len())
            .ok_or(AtomError::OffsetOutOfRange {
                offset: offset.saturating_add(length),
                len: bytes.len(),
            })?;
        Ok(Self::new(&bytes[offset..end]))
    }

    /// Creates an atom holding the big-endian encoding of `value`.
    pub fn from_primitive<P: Primitive>(value: P) -> Self {
        Self::from_primitive_with_order(value, ByteOrder::Big)
    }

    /// Creates an atom holding the encoding of `value` in the given byte order.
    pub fn from_primitive_with_order<P: Primitive>(value: P, order: ByteOrder) -> Self {
        Self::new(value.to_bytes(order))
    }

    /// Returns a copy of this atom carrying `hint`, replacing any previous hint.
    pub fn with_hint(&self, hint: impl Into<DisplayHint>) -> Self {
        Self {
            bytes: self.bytes.clone(),
            hint: Some(Box::new(hint.into())),
        }
    }

    pub(crate) fn from_parts(bytes: Vec<u8>, hint: Option<Vec<u8>>) -> Self {
        Self {
            bytes,
            hint: hint.map(|hint| Box::new(DisplayHint::from(hint))),
        }
    }

    /// Returns a copy of this atom without its display hint.
    pub fn without_hint(&self) -> Self {
        Self::new(self.bytes.clone())
    }

    #[inline]
    pub fn display_hint(&self) -> Option<&DisplayHint> {
        self.hint.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes from `offset` to the end of the atom.
    pub fn bytes_from(&self, offset: usize) -> Result<&[u8], AtomError> {
        self.bytes.get(offset..).ok_or(AtomError::OffsetOutOfRange {
            offset,
            len: self.len(),
        })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Interprets the whole atom as a big-endian `P`.
    pub fn primitive<P: Primitive>(&self) -> Result<P, AtomError> {
        self.primitive_at(0, ByteOrder::Big)
    }

    /// Interprets the bytes from `offset` onwards as a `P`.
    ///
    /// The remaining bytes must be exactly as wide as `P`.
    pub fn primitive_at<P: Primitive>(&self, offset: usize, order: ByteOrder) -> Result<P, AtomError> {
        let bytes = self.bytes_from(offset)?;
        P::from_bytes(bytes, order).ok_or(AtomError::LengthMismatch {
            expected: P::WIDTH,
            actual: bytes.len(),
        })
    }

    /// Views the atom as UTF-8 text.
    pub fn to_str(&self) -> Result<&str, AtomError> {
        Ok(std::str::from_utf8(&self.bytes)?)
    }

    /// Views the bytes from `offset` onwards as UTF-8 text.
    pub fn str_from(&self, offset: usize) -> Result<&str, AtomError> {
        Ok(std::str::from_utf8(self.bytes_from(offset)?)?)
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Whether the atom can be written as a bare symbol.
    ///
    /// Bare symbols are non-empty and consist of ASCII letters and digits only.
    pub fn can_be_symbol(&self) -> bool {
        !self.bytes.is_empty() && self.bytes.iter().all(u8::is_ascii_alphanumeric)
    }

    /// Whether the atom can be written as a quoted string.
    ///
    /// This holds when every byte is printable ASCII other than `"`.
    pub fn can_be_quoted_string(&self) -> bool {
        self.bytes
            .iter()
            .all(|b| matches!(b, b' ' | b'!' | b'#'..=b'~'))
    }

    /// Lowercase hexadecimal rendering of the bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Standard, padded base64 rendering of the bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Writes the raw bytes, without any framing, to `out`.
    pub fn write_to<W: io::Write>(&self, mut out: W) -> io::Result<usize> {
        out.write_all(&self.bytes)?;
        Ok(self.bytes.len())
    }
}

impl Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("Atom");
        tuple.field(&format_args!("b\"{}\"", self.bytes.escape_ascii()));
        if let Some(hint) = &self.hint {
            tuple.field(hint);
        }
        tuple.finish()
    }
}

/// Renders the atom as a single advanced-encoding token.
impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = Vec::new();
        if let Some(hint) = &self.hint {
            out.push(b'[');
            encode_atom(hint.atom(), &mut out);
            out.push(b']');
        }
        encode_atom(self, &mut out);
        // Encoded tokens are always ASCII.
        f.write_str(&String::from_utf8_lossy(&out))
    }
}

impl From<Vec<u8>> for Atom {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for Atom {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> From<&[u8; N]> for Atom {
    fn from(value: &[u8; N]) -> Self {
        Self::new(value.as_slice())
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

/// Format annotation attached to an [`Atom`].
///
/// The wrapped atom never carries a hint of its own.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DisplayHint(Atom);

impl DisplayHint {
    /// Wraps `atom` as a hint, rejecting atoms that are themselves hinted.
    pub fn new(atom: Atom) -> Result<Self, AtomError> {
        if atom.hint.is_some() {
            return Err(AtomError::RecursiveHint);
        }
        Ok(Self(atom))
    }

    #[inline]
    pub fn atom(&self) -> &Atom {
        &self.0
    }

    pub fn into_atom(self) -> Atom {
        self.0
    }
}

impl Debug for DisplayHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayHint(b\"{}\")", self.0.bytes.escape_ascii())
    }
}

impl From<&str> for DisplayHint {
    fn from(value: &str) -> Self {
        Self(Atom::from(value))
    }
}

impl From<&[u8]> for DisplayHint {
    fn from(value: &[u8]) -> Self {
        Self(Atom::from(value))
    }
}

impl From<Vec<u8>> for DisplayHint {
    fn from(value: Vec<u8>) -> Self {
        Self(Atom::new(value))
    }
}
