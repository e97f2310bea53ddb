//! Tag and length framing types

use berdl_core::{Asn1Error, Asn1Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag class
///
/// - **Universal**: types defined by X.680 itself (BIT STRING, OCTET STRING, ...)
/// - **Application**: application-wide types
/// - **Context-specific**: meaning depends on the enclosing type
/// - **Private**: implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from bits 8-7 of the identifier byte
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert tag class to bits 8-7 of the identifier byte
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Identifier octets of a TLV
///
/// # Encoding Format
///
/// Low tag number form (number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// High tag number form (number >= 31):
/// ```text
/// First byte:      C C P 1 1 1 1 1
/// Following bytes: 1 T T T T T T T  ... 0 T T T T T T T
/// ```
///
/// # Why This Design?
/// Tags are compared by value everywhere (decoder dispatch, segment
/// checks), so `Tag` is a small `Copy` type and the encoded form is only
/// produced when a header is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
}

/// Low five bits of an identifier byte announcing the high tag number form
const HIGH_TAG_MARKER: u8 = 0x1F;

const CONSTRUCTED_BIT: u8 = 0x20;

impl Tag {
    pub const END_OF_CONTENTS: Tag = Tag::universal(false, 0);
    pub const BIT_STRING: Tag = Tag::universal(false, 3);
    pub const OCTET_STRING: Tag = Tag::universal(false, 4);
    pub const NUMERIC_STRING: Tag = Tag::universal(false, 18);

    /// Create a new tag
    ///
    /// # Arguments
    /// * `class` - Tag class
    /// * `constructed` - Whether the contents are nested TLVs
    /// * `number` - Tag number; numbers from 31 use the high tag form
    pub const fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Universal, constructed, number)
    }

    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Application, constructed, number)
    }

    pub const fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, constructed, number)
    }

    pub const fn private(constructed: bool, number: u32) -> Self {
        Self::new(TagClass::Private, constructed, number)
    }

    pub fn class(&self) -> TagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Same class and number with the given constructed flag
    pub fn with_constructed(self, constructed: bool) -> Self {
        Self {
            constructed,
            ..self
        }
    }

    /// Whether class and number match, ignoring the constructed flag
    /// Same class and number, ignoring the constructed bit
    pub fn matches(&self, other: &Tag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// Number of identifier bytes `encode` produces
    pub fn encoded_len(&self) -> usize {
        if self.number < HIGH_TAG_MARKER as u32 {
            1
        } else {
            1 + base128_len(self.number)
        }
    }

    /// Encode tag to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut result);
        result
    }

    /// Append the identifier bytes to `out`
    ///
    /// # Arguments
    /// * `out` - Buffer the bytes are appended to; existing contents are kept
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let leading = self.class.to_bits() | if self.constructed { CONSTRUCTED_BIT } else { 0 };

        if self.number < HIGH_TAG_MARKER as u32 {
            out.push(leading | self.number as u8);
            return;
        }

        out.push(leading | HIGH_TAG_MARKER);
        let count = base128_len(self.number);
        for i in (0..count).rev() {
            let group = ((self.number >> (7 * i)) & 0x7F) as u8;
            if i > 0 {
                out.push(group | 0x80);
            } else {
                out.push(group);
            }
        }
    }

    /// Decode tag from bytes
    ///
    /// # Arguments
    /// * `data` - Input starting at the identifier octets; trailing bytes
    ///   are ignored
    ///
    /// # Returns
    /// `(Tag, bytes_consumed)`
    ///
    /// # Errors
    /// `MalformedEncoding` if the buffer is empty, the continuation sequence
    /// is truncated, or the number does not fit in 32 bits.
    pub fn decode(data: &[u8]) -> Asn1Result<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(Asn1Error::MalformedEncoding(
                "Empty buffer for tag decoding".to_string(),
            ));
        };

        let class = TagClass::from_bits(first_byte);
        let constructed = (first_byte & CONSTRUCTED_BIT) != 0;
        let tag_bits = first_byte & HIGH_TAG_MARKER;

        if tag_bits != HIGH_TAG_MARKER {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut number = 0u32;
        let mut pos = 1;
        loop {
            let Some(&byte) = data.get(pos) else {
                return Err(Asn1Error::MalformedEncoding(
                    "Incomplete high tag number encoding".to_string(),
                ));
            };
            pos += 1;

            if number > (u32::MAX >> 7) {
                return Err(Asn1Error::MalformedEncoding(
                    "Tag number too large".to_string(),
                ));
            }
            number = (number << 7) | (byte & 0x7F) as u32;

            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, number), pos))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = match self.class {
            TagClass::Universal => "UNIVERSAL",
            TagClass::Application => "APPLICATION",
            TagClass::ContextSpecific => "CONTEXT",
            TagClass::Private => "PRIVATE",
        };
        let form = if self.constructed { "constructed" } else { "primitive" };
        write!(f, "[{} {}] {}", class, self.number, form)
    }
}

fn base128_len(mut value: u32) -> usize {
    let mut count = 1;
    while value >= 0x80 {
        count += 1;
        value >>= 7;
    }
    count
}

/// Length octets of a TLV
///
/// # Encoding Format
///
/// Short form (0-127):
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form:
/// ```text
/// First byte:      1 N N N N N N N  (N = number of length bytes, 1-126)
/// Following bytes: big-endian length value, no leading zero bytes
/// ```
///
/// Indefinite form (BER, constructed values only): the single byte `0x80`,
/// with the contents terminated by two zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Length {
    Definite(usize),
    Indefinite,
}

const INDEFINITE_LENGTH: u8 = 0x80;

impl Length {
    pub fn new(length: usize) -> Self {
        Length::Definite(length)
    }

    /// Definite length value, `None` for the indefinite form
    pub fn definite(&self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(*len),
            Length::Indefinite => None,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, Length::Indefinite)
    }

    /// Number of length bytes `encode` produces
    pub fn encoded_len(&self) -> usize {
        match self {
            Length::Definite(len) => length_field_len(*len),
            Length::Indefinite => 1,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut result);
        result
    }

    /// Append the length bytes to `out`
    ///
    /// # Why This Design?
    /// Definite lengths are always written in their minimal form, so the
    /// same method serves the DER and DL output paths.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match *self {
            Length::Indefinite => out.push(INDEFINITE_LENGTH),
            Length::Definite(len) if len < 0x80 => out.push(len as u8),
            Length::Definite(len) => {
                let num_bytes = length_field_len(len) - 1;
                out.push(0x80 | num_bytes as u8);
                for i in (0..num_bytes).rev() {
                    out.push((len >> (i * 8)) as u8);
                }
            }
        }
    }

    /// Decode length from bytes
    ///
    /// # Arguments
    /// * `data` - Input starting at the length octets
    ///
    /// The decoded value is not checked against the remaining input; the
    /// decoder does that against its own buffer.
    ///
    /// # Returns
    /// `(Length, bytes_consumed)`
    ///
    /// # Errors
    /// `MalformedEncoding` if the buffer is empty or too short for the
    /// announced number of length bytes, if the reserved `0xFF` form is
    /// used, or if the value does not fit in `usize`.
    pub fn decode(data: &[u8]) -> Asn1Result<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(Asn1Error::MalformedEncoding(
                "Empty buffer for length decoding".to_string(),
            ));
        };

        if first_byte & 0x80 == 0 {
            return Ok((Length::Definite(first_byte as usize), 1));
        }
        if first_byte == INDEFINITE_LENGTH {
            return Ok((Length::Indefinite, 1));
        }
        if first_byte == 0xFF {
            return Err(Asn1Error::MalformedEncoding(
                "Reserved length encoding 0xFF".to_string(),
            ));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        let Some(bytes) = data.get(1..1 + num_bytes) else {
            return Err(Asn1Error::MalformedEncoding(format!(
                "Buffer too short for long form length: need {} bytes, got {}",
                1 + num_bytes,
                data.len()
            )));
        };

        let mut length = 0usize;
        for &byte in bytes {
            if length > (usize::MAX >> 8) {
                return Err(Asn1Error::MalformedEncoding(format!(
                    "Length encoding too large: {} bytes",
                    num_bytes
                )));
            }
            length = (length << 8) | byte as usize;
        }

        Ok((Length::Definite(length), 1 + num_bytes))
    }
}

/// Number of bytes in the length field for a definite body of `len` bytes
pub fn length_field_len(len: usize) -> usize {
    if len < 0x80 {
        return 1;
    }
    let significant = (usize::BITS - len.leading_zeros()) as usize;
    1 + significant.div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_short_form() {
        let tag = Tag::BIT_STRING;
        assert_eq!(tag.encode(), vec![0x03]);
        assert_eq!(tag.encoded_len(), 1);
    }

    #[test]
    fn test_tag_constructed() {
        let tag = Tag::application(true, 0);
        assert_eq!(tag.encode(), vec![0x60]);

        let tag = Tag::context_specific(true, 1);
        assert_eq!(tag.encode(), vec![0xA1]);
    }

    #[test]
    fn test_tag_high_form() {
        let tag = Tag::context_specific(false, 31);
        assert_eq!(tag.encode(), vec![0x9F, 0x1F]);

        let tag = Tag::private(true, 200);
        assert_eq!(tag.encode(), vec![0xFF, 0x81, 0x48]);
        assert_eq!(tag.encoded_len(), 3);

        let (decoded, consumed) = Tag::decode(&[0xFF, 0x81, 0x48, 0x00]).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_tag_decode() {
        let (tag, consumed) = Tag::decode(&[0x12]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(tag.class(), TagClass::Universal);
        assert!(!tag.is_constructed());
        assert_eq!(tag.number(), 18);
    }

    #[test]
    fn test_tag_truncated() {
        assert!(Tag::decode(&[]).unwrap_err().is_malformed());
        assert!(Tag::decode(&[0x1F]).unwrap_err().is_malformed());
        assert!(Tag::decode(&[0x1F, 0x81, 0x82]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_tag_number_overflow() {
        let data = [0x1F, 0x8F, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert!(Tag::decode(&data).unwrap_err().is_malformed());

        let (tag, _) = Tag::decode(&[0x1F, 0x8F, 0xFF, 0xFF, 0xFF, 0x7F]).unwrap();
        assert_eq!(tag.number(), u32::MAX);
    }

    #[test]
    fn test_length_short() {
        assert_eq!(Length::new(0).encode(), vec![0x00]);
        assert_eq!(Length::new(127).encode(), vec![0x7F]);
        assert_eq!(length_field_len(127), 1);
    }

    #[test]
    fn test_length_long() {
        assert_eq!(Length::new(128).encode(), vec![0x81, 0x80]);
        assert_eq!(Length::new(256).encode(), vec![0x82, 0x01, 0x00]);
        assert_eq!(Length::new(0x01_00_00).encode(), vec![0x83, 0x01, 0x00, 0x00]);
        assert_eq!(length_field_len(255), 2);
        assert_eq!(length_field_len(256), 3);
    }

    #[test]
    fn test_length_decode() {
        assert_eq!(Length::decode(&[100]).unwrap(), (Length::Definite(100), 1));
        assert_eq!(
            Length::decode(&[0x82, 0x01, 0xF4]).unwrap(),
            (Length::Definite(500), 3)
        );
        assert_eq!(Length::decode(&[0x80]).unwrap(), (Length::Indefinite, 1));
    }

    #[test]
    fn test_length_truncated() {
        assert!(Length::decode(&[]).unwrap_err().is_malformed());
        assert!(Length::decode(&[0x82, 0x01]).unwrap_err().is_malformed());
        assert!(Length::decode(&[0xFF]).unwrap_err().is_malformed());
    }

    #[test]
    fn test_length_overflow() {
        let mut data = vec![0x89];
        data.extend_from_slice(&[0x01; 9]);
        assert!(Length::decode(&data).unwrap_err().is_malformed());
    }
}
