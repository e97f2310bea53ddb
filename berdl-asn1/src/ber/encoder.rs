//! Output framer for TLV encodings
//!
//! # Usage Example
//!
//! ```rust
//! use berdl_asn1::ber::{Asn1OutputStream, Tag};
//!
//! let mut out = Asn1OutputStream::new(Vec::new());
//! out.write_encoded(Tag::OCTET_STRING, b"Hello").unwrap();
//! assert_eq!(out.into_inner(), b"\x04\x05Hello");
//! ```

use crate::ber::types::{Length, Tag};
use crate::value::{Asn1Encodable, Asn1Value};
use berdl_core::{Asn1Result, EncodingProfile};
use std::io::Write;

/// Largest header the framer writes: a five-byte tag number plus a
/// nine-byte length field on 64-bit targets
const MAX_HEADER_LEN: usize = 16;

/// Writes TLV triplets to a byte sink
///
/// Every value reaches the sink through [`write_encoded`](Self::write_encoded),
/// which emits the header and then the body. Under the DER profile,
/// [`write_object`](Self::write_object) first converts the value to its DER
/// form.
pub struct Asn1OutputStream<W: Write> {
    out: W,
    profile: EncodingProfile,
}

impl<W: Write> Asn1OutputStream<W> {
    /// Create a framer that writes values in their own form (DL)
    pub fn new(out: W) -> Self {
        Self::with_profile(out, EncodingProfile::Dl)
    }

    /// Create a framer that converts every value to its DER form
    pub fn der(out: W) -> Self {
        Self::with_profile(out, EncodingProfile::Der)
    }

    pub fn with_profile(out: W, profile: EncodingProfile) -> Self {
        Self { out, profile }
    }

    pub fn profile(&self) -> EncodingProfile {
        self.profile
    }

    /// Encode a TLV (Tag-Length-Value) triplet
    ///
    /// # Encoding Process
    /// 1. Encode tag
    /// 2. Encode definite length of `body`
    /// 3. Write body bytes
    pub fn write_encoded(&mut self, tag: Tag, body: &[u8]) -> Asn1Result<()> {
        let mut header = Vec::with_capacity(MAX_HEADER_LEN);
        tag.encode_into(&mut header);
        Length::new(body.len()).encode_into(&mut header);

        self.out.write_all(&header)?;
        self.out.write_all(body)?;
        Ok(())
    }

    /// Write a complete value
    pub fn write_object(&mut self, value: &Asn1Value) -> Asn1Result<()> {
        if self.profile == EncodingProfile::Der {
            value.to_der_form().encode(self)
        } else {
            value.encode(self)
        }
    }

    pub fn flush(&mut self) -> Asn1Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Encode `value` into a fresh buffer under `profile`
pub fn encode_with(value: &Asn1Value, profile: EncodingProfile) -> Asn1Result<Vec<u8>> {
    let mut out = Asn1OutputStream::with_profile(
        Vec::with_capacity(value.encoded_length()),
        profile,
    );
    out.write_object(value)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DlBitString, OctetString};

    #[test]
    fn test_write_encoded_short() {
        let mut out = Asn1OutputStream::new(Vec::new());
        out.write_encoded(Tag::OCTET_STRING, b"Hello").unwrap();
        let bytes = out.into_inner();
        assert_eq!(bytes[0], 0x04);
        assert_eq!(bytes[1], 5);
        assert_eq!(&bytes[2..], b"Hello");
    }

    #[test]
    fn test_write_encoded_long_form_length() {
        let body = vec![0x55; 300];
        let mut out = Asn1OutputStream::new(Vec::new());
        out.write_encoded(Tag::OCTET_STRING, &body).unwrap();
        let bytes = out.into_inner();
        assert_eq!(&bytes[..4], &[0x04, 0x82, 0x01, 0x2C]);
        assert_eq!(bytes.len(), 4 + 300);
    }

    #[test]
    fn test_write_encoded_high_tag() {
        let mut out = Asn1OutputStream::new(Vec::new());
        out.write_encoded(Tag::context_specific(false, 40), &[0x01])
            .unwrap();
        assert_eq!(out.into_inner(), vec![0x9F, 0x28, 0x01, 0x01]);
    }

    #[test]
    fn test_der_stream_canonicalizes() {
        let value = Asn1Value::from(DlBitString::new(vec![0xFF], 4).unwrap());

        let lax = encode_with(&value, EncodingProfile::Dl).unwrap();
        assert_eq!(lax, vec![0x03, 0x02, 0x04, 0xFF]);

        let strict = encode_with(&value, EncodingProfile::Der).unwrap();
        assert_eq!(strict, vec![0x03, 0x02, 0x04, 0xF0]);
    }

    #[test]
    fn test_write_object_sequence() {
        let mut out = Asn1OutputStream::new(Vec::new());
        out.write_object(&OctetString::new(vec![0x01]).into()).unwrap();
        out.write_object(&OctetString::new(vec![0x02, 0x03]).into())
            .unwrap();
        assert_eq!(
            out.into_inner(),
            vec![0x04, 0x01, 0x01, 0x04, 0x02, 0x02, 0x03]
        );
    }
}
