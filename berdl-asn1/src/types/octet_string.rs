use crate::ber::encoder::Asn1OutputStream;
use crate::ber::types::{Tag, length_field_len};
use crate::convert::Asn1Convert;
use crate::value::{Asn1Encodable, Asn1Value};
use berdl_core::Asn1Result;
use bytes::Bytes;
use std::fmt;
use std::io::Write;

/// OCTET STRING
///
/// Also carries the contents of primitive implicitly tagged values read
/// by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OctetString {
    octets: Bytes,
}

impl OctetString {
    pub fn new(octets: impl Into<Bytes>) -> Self {
        Self {
            octets: octets.into(),
        }
    }

    pub fn octets(&self) -> &Bytes {
        &self.octets
    }

    pub fn len(&self) -> usize {
        self.octets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }
}

impl Asn1Encodable for OctetString {
    fn tag(&self) -> Tag {
        Tag::OCTET_STRING
    }

    fn is_constructed(&self) -> bool {
        false
    }

    fn encoded_length(&self) -> usize {
        1 + length_field_len(self.octets.len()) + self.octets.len()
    }

    fn encode<W: Write>(&self, out: &mut Asn1OutputStream<W>) -> Asn1Result<()> {
        out.write_encoded(Tag::OCTET_STRING, &self.octets)
    }
}

impl Asn1Convert for OctetString {
    const KIND: &'static str = "OctetString";

    fn is_instance(value: &Asn1Value) -> bool {
        matches!(value, Asn1Value::OctetString(_))
    }

    fn from_value(value: &Asn1Value) -> Option<Self> {
        match value {
            Asn1Value::OctetString(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn from_contents(octets: &[u8]) -> Asn1Result<Self> {
        Ok(Self::new(Bytes::copy_from_slice(octets)))
    }
}

impl From<OctetString> for Asn1Value {
    fn from(octets: OctetString) -> Self {
        Asn1Value::OctetString(octets)
    }
}

impl fmt::Display for OctetString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("#")?;
        for byte in self.octets.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericString;
    use crate::value::Asn1Object;

    #[test]
    fn test_encode() {
        let octets = OctetString::new(b"Hello".to_vec());
        assert_eq!(octets.to_encoded().unwrap(), b"\x04\x05Hello".to_vec());
        assert_eq!(octets.encoded_length(), 7);
        assert_eq!(octets.len(), 5);
        assert!(OctetString::new(Vec::new()).is_empty());
        assert_eq!(octets.to_string(), "#48656c6c6f");
    }

    #[test]
    fn test_get_instance() {
        let octets = OctetString::new(vec![0xAB]);
        let object = Asn1Object::from(Asn1Value::from(octets.clone()));
        assert_eq!(OctetString::get_instance(&object).unwrap(), Some(octets));

        let object = Asn1Object::from(Asn1Value::from(NumericString::new("1")));
        assert!(OctetString::get_instance(&object).unwrap_err().is_invalid_argument());
    }
}
