//! NumericString: ASCII digits and space
//!
//! The string is kept as raw octets; equality and hashing use those
//! octets, not a decoded text form.

use crate::ber::encoder::Asn1OutputStream;
use crate::ber::types::{Tag, length_field_len};
use crate::convert::Asn1Convert;
use crate::value::{Asn1Encodable, Asn1Value};
use berdl_core::{Asn1Error, Asn1Result};
use bytes::Bytes;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericString {
    string: Bytes,
}

impl NumericString {
    /// Construct without validation
    ///
    /// Each character is stored as its low byte.
    pub fn new(string: &str) -> Self {
        Self {
            string: string.chars().map(|ch| ch as u8).collect(),
        }
    }

    /// Construct with optional validation
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `validate` is set and `string` holds a
    /// character outside `'0'..='9'` and space.
    pub fn with_validation(string: &str, validate: bool) -> Asn1Result<Self> {
        if validate && !Self::is_numeric_string(string) {
            return Err(Asn1Error::InvalidArgument(
                "string contains illegal characters".to_string(),
            ));
        }
        Ok(Self::new(string))
    }

    /// Construct from raw octets without validation
    pub fn from_bytes(string: impl Into<Bytes>) -> Self {
        Self {
            string: string.into(),
        }
    }

    /// Whether every character is an ASCII digit or a space
    pub fn is_numeric_string(string: &str) -> bool {
        string.chars().all(|ch| ch.is_ascii_digit() || ch == ' ')
    }

    pub(crate) fn is_numeric_bytes(bytes: &[u8]) -> bool {
        bytes.iter().all(|&b| b.is_ascii_digit() || b == b' ')
    }

    /// The octets read as one character each
    pub fn get_string(&self) -> String {
        self.string.iter().map(|&b| b as char).collect()
    }

    pub fn octets(&self) -> &Bytes {
        &self.string
    }
}

impl Asn1Encodable for NumericString {
    fn tag(&self) -> Tag {
        Tag::NUMERIC_STRING
    }

    fn is_constructed(&self) -> bool {
        false
    }

    fn encoded_length(&self) -> usize {
        1 + length_field_len(self.string.len()) + self.string.len()
    }

    fn encode<W: Write>(&self, out: &mut Asn1OutputStream<W>) -> Asn1Result<()> {
        out.write_encoded(Tag::NUMERIC_STRING, &self.string)
    }
}

impl Asn1Convert for NumericString {
    const KIND: &'static str = "NumericString";

    fn is_instance(value: &Asn1Value) -> bool {
        matches!(value, Asn1Value::NumericString(_))
    }

    fn from_value(value: &Asn1Value) -> Option<Self> {
        match value {
            Asn1Value::NumericString(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn from_contents(octets: &[u8]) -> Asn1Result<Self> {
        Ok(Self::from_bytes(Bytes::copy_from_slice(octets)))
    }
}

impl From<NumericString> for Asn1Value {
    fn from(string: NumericString) -> Self {
        Asn1Value::NumericString(string)
    }
}

impl fmt::Display for NumericString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_string())
    }
}
