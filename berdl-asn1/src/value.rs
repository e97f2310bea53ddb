//! The value contract and the closed set of value variants
//!
//! Every concrete type implements [`Asn1Encodable`]: it knows its tag,
//! whether it is constructed, the exact number of bytes its encoding takes,
//! and how to write itself through an [`Asn1OutputStream`].
//! [`Asn1Value`] collects the concrete types into one enum, and
//! [`Asn1Object`] is the loosely-typed input accepted by conversion entry
//! points.

use crate::ber::encoder::{Asn1OutputStream, encode_with};
use crate::ber::types::{Length, Tag};
use crate::types::{DerBitString, DlBitString, NumericString, OctetString, TaggedObject};
use berdl_core::{Asn1Error, Asn1Result, EncodingProfile};
use bytes::Bytes;
use std::hash::{Hash, Hasher};
use std::io::Write;

/// Capabilities shared by every encodable value
pub trait Asn1Encodable {
    /// Identifier this value is written with
    fn tag(&self) -> Tag;

    /// Whether the contents are a concatenation of nested TLVs
    fn is_constructed(&self) -> bool;

    /// Total bytes [`encode`](Self::encode) writes: tag, length field and
    /// contents
    fn encoded_length(&self) -> usize;

    /// Write tag, length and contents
    fn encode<W: Write>(&self, out: &mut Asn1OutputStream<W>) -> Asn1Result<()>;

    /// Encoding of this value in its own form
    fn to_encoded(&self) -> Asn1Result<Vec<u8>> {
        let mut out = Asn1OutputStream::new(Vec::with_capacity(self.encoded_length()));
        self.encode(&mut out)?;
        Ok(out.into_inner())
    }
}

/// Any value the codec can encode or decode
///
/// Equality and hashing follow the logical content: a strict and a lax bit
/// string holding the same bits are equal whichever variant carries them.
#[derive(Debug, Clone)]
pub enum Asn1Value {
    DerBitString(DerBitString),
    DlBitString(DlBitString),
    NumericString(NumericString),
    OctetString(OctetString),
    Tagged(Box<TaggedObject>),
}

impl Asn1Value {
    /// Name of the concrete type
    pub fn kind(&self) -> &'static str {
        match self {
            Asn1Value::DerBitString(_) => "DerBitString",
            Asn1Value::DlBitString(_) => "DlBitString",
            Asn1Value::NumericString(_) => "NumericString",
            Asn1Value::OctetString(_) => "OctetString",
            Asn1Value::Tagged(_) => "TaggedObject",
        }
    }

    /// Same value with every lax component replaced by its DER form
    pub fn to_der_form(&self) -> Asn1Value {
        match self {
            Asn1Value::DlBitString(bits) => Asn1Value::DerBitString(bits.convert()),
            Asn1Value::Tagged(tagged) => Asn1Value::Tagged(Box::new(tagged.to_der_form())),
            other => other.clone(),
        }
    }

    /// Encoding of the DER form of this value
    pub fn to_der_encoded(&self) -> Asn1Result<Vec<u8>> {
        encode_with(self, EncodingProfile::Der)
    }

    /// Contents octets of this value's encoding, without tag and length
    pub fn content_octets(&self) -> Asn1Result<Bytes> {
        match self {
            Asn1Value::OctetString(s) => Ok(s.octets().clone()),
            Asn1Value::NumericString(s) => Ok(s.octets().clone()),
            Asn1Value::DerBitString(bits) => Ok(Bytes::from(bits.contents())),
            Asn1Value::DlBitString(bits) => Ok(Bytes::from(bits.contents())),
            Asn1Value::Tagged(_) => {
                let encoded = self.to_encoded()?;
                Ok(Bytes::from(strip_header(&encoded)?.to_vec()))
            }
        }
    }
}

impl PartialEq for Asn1Value {
    fn eq(&self, other: &Self) -> bool {
        use Asn1Value::*;
        match (self, other) {
            (DerBitString(a), DerBitString(b)) => a == b,
            (DerBitString(a), DlBitString(b)) => a == b,
            (DlBitString(a), DerBitString(b)) => a == b,
            (DlBitString(a), DlBitString(b)) => a == b,
            (NumericString(a), NumericString(b)) => a == b,
            (OctetString(a), OctetString(b)) => a == b,
            (Tagged(a), Tagged(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Asn1Value {}

impl Hash for Asn1Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Both bit string forms share one discriminant
        match self {
            Asn1Value::DerBitString(bits) => {
                0u8.hash(state);
                bits.hash(state);
            }
            Asn1Value::DlBitString(bits) => {
                0u8.hash(state);
                bits.hash(state);
            }
            Asn1Value::NumericString(s) => {
                1u8.hash(state);
                s.hash(state);
            }
            Asn1Value::OctetString(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Asn1Value::Tagged(tagged) => {
                3u8.hash(state);
                tagged.hash(state);
            }
        }
    }
}

/// Contents of a single complete TLV
pub(crate) fn strip_header(encoded: &[u8]) -> Asn1Result<&[u8]> {
    let (_, tag_len) = Tag::decode(encoded)?;
    let (length, len_len) = Length::decode(&encoded[tag_len..])?;
    let start = tag_len + len_len;
    match length.definite() {
        Some(len) if start + len == encoded.len() => Ok(&encoded[start..]),
        _ => Err(Asn1Error::MalformedEncoding(
            "Encoding is not a single definite-length value".to_string(),
        )),
    }
}

impl Asn1Encodable for Asn1Value {
    fn tag(&self) -> Tag {
        match self {
            Asn1Value::DerBitString(v) => v.tag(),
            Asn1Value::DlBitString(v) => v.tag(),
            Asn1Value::NumericString(v) => v.tag(),
            Asn1Value::OctetString(v) => v.tag(),
            Asn1Value::Tagged(v) => v.tag(),
        }
    }

    fn is_constructed(&self) -> bool {
        match self {
            Asn1Value::DerBitString(v) => v.is_constructed(),
            Asn1Value::DlBitString(v) => v.is_constructed(),
            Asn1Value::NumericString(v) => v.is_constructed(),
            Asn1Value::OctetString(v) => v.is_constructed(),
            Asn1Value::Tagged(v) => v.is_constructed(),
        }
    }

    fn encoded_length(&self) -> usize {
        match self {
            Asn1Value::DerBitString(v) => v.encoded_length(),
            Asn1Value::DlBitString(v) => v.encoded_length(),
            Asn1Value::NumericString(v) => v.encoded_length(),
            Asn1Value::OctetString(v) => v.encoded_length(),
            Asn1Value::Tagged(v) => v.encoded_length(),
        }
    }

    fn encode<W: Write>(&self, out: &mut Asn1OutputStream<W>) -> Asn1Result<()> {
        match self {
            Asn1Value::DerBitString(v) => v.encode(out),
            Asn1Value::DlBitString(v) => v.encode(out),
            Asn1Value::NumericString(v) => v.encode(out),
            Asn1Value::OctetString(v) => v.encode(out),
            Asn1Value::Tagged(v) => v.encode(out),
        }
    }
}

/// Loosely-typed input to a conversion entry point
#[derive(Debug, Clone, PartialEq)]
pub enum Asn1Object {
    /// Absent input; conversions return `None`
    Null,
    Value(Asn1Value),
    /// Raw encoding of a single value
    Encoded(Bytes),
    Integer(i64),
    Text(String),
}

impl Asn1Object {
    /// Name of the input's type, as reported in rejection messages
    pub fn kind(&self) -> &'static str {
        match self {
            Asn1Object::Null => "null",
            Asn1Object::Value(value) => value.kind(),
            Asn1Object::Encoded(_) => "Bytes",
            Asn1Object::Integer(_) => "i64",
            Asn1Object::Text(_) => "String",
        }
    }
}

impl From<Asn1Value> for Asn1Object {
    fn from(value: Asn1Value) -> Self {
        Asn1Object::Value(value)
    }
}

impl From<Bytes> for Asn1Object {
    fn from(bytes: Bytes) -> Self {
        Asn1Object::Encoded(bytes)
    }
}

impl From<Vec<u8>> for Asn1Object {
    fn from(bytes: Vec<u8>) -> Self {
        Asn1Object::Encoded(Bytes::from(bytes))
    }
}

impl From<i64> for Asn1Object {
    fn from(value: i64) -> Self {
        Asn1Object::Integer(value)
    }
}

impl From<&str> for Asn1Object {
    fn from(text: &str) -> Self {
        Asn1Object::Text(text.to_string())
    }
}

impl From<String> for Asn1Object {
    fn from(text: String) -> Self {
        Asn1Object::Text(text)
    }
}

impl<T: Into<Asn1Object>> From<Option<T>> for Asn1Object {
    fn from(value: Option<T>) -> Self {
        value.map_or(Asn1Object::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let value = Asn1Value::from(OctetString::new(vec![1]));
        assert_eq!(value.kind(), "OctetString");
        assert_eq!(Asn1Object::from(value).kind(), "OctetString");
        assert_eq!(Asn1Object::from(7i64).kind(), "i64");
        assert_eq!(Asn1Object::from(None::<i64>), Asn1Object::Null);
    }

    #[test]
    fn test_content_octets() {
        let bits = Asn1Value::from(DerBitString::new(vec![0xFF], 4).unwrap());
        assert_eq!(bits.content_octets().unwrap().as_ref(), &[0x04, 0xF0]);

        let tagged = Asn1Value::from(TaggedObject::new(true, 0, OctetString::new(vec![9]).into()));
        assert_eq!(tagged.content_octets().unwrap().as_ref(), &[0x04, 0x01, 0x09]);
    }

    #[test]
    fn test_to_der_form() {
        let lax = Asn1Value::from(DlBitString::new(vec![0xFF], 4).unwrap());
        let tagged = Asn1Value::from(TaggedObject::new(true, 3, lax.clone()));

        assert_eq!(lax.to_der_form().kind(), "DerBitString");
        let Asn1Value::Tagged(inner) = tagged.to_der_form() else {
            panic!("tagged object expected");
        };
        assert_eq!(inner.object().kind(), "DerBitString");
        assert_eq!(
            tagged.to_der_encoded().unwrap(),
            vec![0xA3, 0x04, 0x03, 0x02, 0x04, 0xF0]
        );
    }

    #[test]
    fn test_bit_string_forms_compare_by_content() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(value: &Asn1Value) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let strict = Asn1Value::from(DerBitString::new(vec![0xF0], 4).unwrap());
        let lax = Asn1Value::from(DlBitString::new(vec![0xFF], 4).unwrap());
        assert_eq!(strict, lax);
        assert_eq!(hash_of(&strict), hash_of(&lax));

        let other = Asn1Value::from(DlBitString::new(vec![0xF0], 3).unwrap());
        assert_ne!(strict, other);
        assert_ne!(Asn1Value::from(OctetString::new(vec![0xF0])), strict);

        let tagged_strict = Asn1Value::from(TaggedObject::new(true, 1, strict.clone()));
        let tagged_lax = Asn1Value::from(TaggedObject::new(true, 1, lax));
        assert_eq!(tagged_strict, tagged_lax);
        assert_eq!(hash_of(&tagged_strict), hash_of(&tagged_lax));
    }

    #[test]
    fn test_strip_header() {
        assert_eq!(strip_header(&[0x04, 0x02, 0xAA, 0xBB]).unwrap(), &[0xAA, 0xBB]);
        assert!(strip_header(&[0x04, 0x02, 0xAA]).is_err());
    }
}
