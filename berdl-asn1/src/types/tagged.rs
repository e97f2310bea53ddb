//! Tagged objects
//!
//! An explicitly tagged object wraps the complete encoding of its inner
//! value in a constructed TLV. An implicitly tagged object replaces the
//! inner value's tag and keeps only its contents; the inner type has to
//! be known to read it back (see
//! [`Asn1Convert::get_instance_tagged`]).

use crate::ber::encoder::Asn1OutputStream;
use crate::ber::types::{Tag, TagClass, length_field_len};
use crate::convert::Asn1Convert;
use crate::value::{Asn1Encodable, Asn1Value, strip_header};
use berdl_core::{Asn1Error, Asn1Result};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaggedObject {
    class: TagClass,
    tag_number: u32,
    explicit: bool,
    object: Asn1Value,
}

impl TaggedObject {
    /// Context-specific tagged object
    pub fn new(explicit: bool, tag_number: u32, object: Asn1Value) -> Self {
        Self::from_decoded(TagClass::ContextSpecific, explicit, tag_number, object)
    }

    /// Tagged object of any non-universal class
    ///
    /// # Errors
    /// Returns `InvalidArgument` for the universal class.
    pub fn with_class(
        class: TagClass,
        explicit: bool,
        tag_number: u32,
        object: Asn1Value,
    ) -> Asn1Result<Self> {
        if class == TagClass::Universal {
            return Err(Asn1Error::InvalidArgument(
                "universal class is not a tagging class".to_string(),
            ));
        }
        Ok(Self::from_decoded(class, explicit, tag_number, object))
    }

    pub(crate) fn from_decoded(
        class: TagClass,
        explicit: bool,
        tag_number: u32,
        object: Asn1Value,
    ) -> Self {
        Self {
            class,
            tag_number,
            explicit,
            object,
        }
    }

    pub fn tag_number(&self) -> u32 {
        self.tag_number
    }

    pub fn tag_class(&self) -> TagClass {
        self.class
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn object(&self) -> &Asn1Value {
        &self.object
    }

    pub fn into_object(self) -> Asn1Value {
        self.object
    }

    /// Same tagging around the DER form of the inner value
    pub fn to_der_form(&self) -> TaggedObject {
        Self {
            object: self.object.to_der_form(),
            ..self.clone()
        }
    }

    /// Convert the inner value, checking the tag number first
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the tag number differs or the inner
    /// value cannot be converted to `T`.
    pub fn unwrap_as<T: Asn1Convert>(&self, tag_number: u32, explicit: bool) -> Asn1Result<T> {
        if self.tag_number != tag_number {
            return Err(Asn1Error::InvalidArgument(format!(
                "expected tag [{}] for {}, found [{}]",
                tag_number,
                T::KIND,
                self.tag_number
            )));
        }
        T::get_instance_tagged(self, explicit)
    }

    fn inner_encoding<W: Write>(&self, out: &Asn1OutputStream<W>) -> Asn1Result<Vec<u8>> {
        let mut inner = Asn1OutputStream::with_profile(
            Vec::with_capacity(self.object.encoded_length()),
            out.profile(),
        );
        self.object.encode(&mut inner)?;
        Ok(inner.into_inner())
    }
}

impl Asn1Encodable for TaggedObject {
    fn tag(&self) -> Tag {
        Tag::new(self.class, self.is_constructed(), self.tag_number)
    }

    fn is_constructed(&self) -> bool {
        self.explicit || self.object.is_constructed()
    }

    fn encoded_length(&self) -> usize {
        let inner_len = self.object.encoded_length();
        let tag_len = self.tag().encoded_len();
        if self.explicit {
            tag_len + length_field_len(inner_len) + inner_len
        } else {
            inner_len - self.object.tag().encoded_len() + tag_len
        }
    }

    fn encode<W: Write>(&self, out: &mut Asn1OutputStream<W>) -> Asn1Result<()> {
        let inner = self.inner_encoding(out)?;
        if self.explicit {
            out.write_encoded(self.tag(), &inner)
        } else {
            out.write_encoded(self.tag(), strip_header(&inner)?)
        }
    }
}

impl Asn1Convert for TaggedObject {
    const KIND: &'static str = "TaggedObject";

    fn is_instance(value: &Asn1Value) -> bool {
        matches!(value, Asn1Value::Tagged(_))
    }

    fn from_value(value: &Asn1Value) -> Option<Self> {
        match value {
            Asn1Value::Tagged(tagged) => Some(tagged.as_ref().clone()),
            _ => None,
        }
    }

    fn from_contents(_octets: &[u8]) -> Asn1Result<Self> {
        Err(Asn1Error::InvalidArgument(
            "implicitly tagged tagged object".to_string(),
        ))
    }
}

impl From<TaggedObject> for Asn1Value {
    fn from(tagged: TaggedObject) -> Self {
        Asn1Value::Tagged(Box::new(tagged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::decoder;
    use crate::types::{DerBitString, NumericString, OctetString};
    use berdl_core::{DecoderConfig, EncodingProfile};

    #[test]
    fn test_explicit_encoding() {
        let tagged = TaggedObject::new(true, 1, OctetString::new(vec![0xAA]).into());
        let encoded = tagged.to_encoded().unwrap();
        assert_eq!(encoded, vec![0xA1, 0x03, 0x04, 0x01, 0xAA]);
        assert_eq!(tagged.encoded_length(), encoded.len());
    }

    #[test]
    fn test_implicit_encoding() {
        let bits = DerBitString::new(vec![0xF0], 4).unwrap();
        let tagged = TaggedObject::new(false, 1, bits.into());
        let encoded = tagged.to_encoded().unwrap();
        assert_eq!(encoded, vec![0x81, 0x02, 0x04, 0xF0]);
        assert_eq!(tagged.encoded_length(), encoded.len());
        assert!(!tagged.is_constructed());
    }

    #[test]
    fn test_high_tag_number_length() {
        let tagged = TaggedObject::new(false, 200, NumericString::new("12").into());
        let encoded = tagged.to_encoded().unwrap();
        assert_eq!(&encoded[..3], &[0x9F, 0x81, 0x48]);
        assert_eq!(tagged.encoded_length(), encoded.len());
    }

    #[test]
    fn test_nested_explicit_round_trip() {
        let inner = TaggedObject::new(true, 2, DerBitString::from_int(0x80).into());
        let outer = TaggedObject::with_class(TagClass::Application, true, 5, inner.into()).unwrap();
        let encoded = outer.to_encoded().unwrap();
        assert_eq!(encoded[0], 0x65);

        let decoded = decoder::decode_with(&encoded, &DecoderConfig::der()).unwrap();
        assert_eq!(decoded, Asn1Value::from(outer));
    }

    #[test]
    fn test_implicit_round_trip_through_conversion() {
        let bits = DerBitString::new(vec![0xA8], 3).unwrap();
        let tagged = TaggedObject::new(false, 7, bits.clone().into());
        let encoded = Asn1Value::from(tagged)
            .to_der_encoded()
            .unwrap();

        let Asn1Value::Tagged(decoded) = decoder::decode(&encoded).unwrap() else {
            panic!("tagged object expected");
        };
        assert_eq!(decoded.unwrap_as::<DerBitString>(7, false).unwrap(), bits);
        assert!(decoded.unwrap_as::<DerBitString>(8, false).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_der_profile_reaches_inner_value() {
        let lax = crate::types::DlBitString::new(vec![0xFF], 4).unwrap();
        let tagged = Asn1Value::from(TaggedObject::new(false, 0, lax.into()));
        assert_eq!(
            crate::ber::encoder::encode_with(&tagged, EncodingProfile::Der).unwrap(),
            vec![0x80, 0x02, 0x04, 0xF0]
        );
        assert_eq!(
            crate::ber::encoder::encode_with(&tagged, EncodingProfile::Dl).unwrap(),
            vec![0x80, 0x02, 0x04, 0xFF]
        );
    }

    #[test]
    fn test_universal_class_rejected() {
        let err = TaggedObject::with_class(
            TagClass::Universal,
            true,
            1,
            OctetString::new(vec![]).into(),
        )
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_implicit_tagged_object_conversion_rejected() {
        let inner = TaggedObject::new(true, 1, OctetString::new(vec![1]).into());
        let outer = TaggedObject::new(false, 2, inner.into());
        assert!(TaggedObject::get_instance_tagged(&outer, true).is_ok());
        let plain = TaggedObject::new(false, 2, OctetString::new(vec![1]).into());
        assert!(TaggedObject::get_instance_tagged(&plain, false).unwrap_err().is_invalid_argument());
    }
}
