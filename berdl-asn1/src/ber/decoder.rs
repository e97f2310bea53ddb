//! Decoder for BER, DL and DER input
//!
//! # Usage Example
//!
//! ```rust
//! use berdl_asn1::ber::BerDecoder;
//! use berdl_core::DecoderConfig;
//!
//! let data = [0x03, 0x02, 0x04, 0xF0];
//! let mut decoder = BerDecoder::with_config(&data, DecoderConfig::der());
//! let value = decoder.read_value().unwrap();
//! decoder.finish().unwrap();
//! assert_eq!(value.kind(), "DerBitString");
//! ```
//!
//! # Untrusted Input
//!
//! Every definite length is checked against the configured maximum and
//! against the bytes actually remaining before any slice is taken or any
//! buffer is sized. Nesting of constructed values is bounded by
//! `max_depth`. A failure aborts the value being read; nothing is
//! recovered.

use crate::ber::types::{Length, Tag, TagClass};
use crate::types::bit_string::{self, DerBitString, DlBitString};
use crate::types::{NumericString, OctetString, TaggedObject};
use crate::value::Asn1Value;
use berdl_core::{Asn1Error, Asn1Result, DecoderConfig, EncodingProfile, PadBitPolicy};
use bytes::Bytes;

/// One framed element as read from the input
///
/// For indefinite-length values `contents` excludes the end-of-contents
/// marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    pub tag: Tag,
    pub contents: &'a [u8],
    pub indefinite: bool,
}

/// TLV decoder over an in-memory buffer
///
/// The decoder maintains a position that advances as values are read, so
/// several values can be read in sequence from the same buffer.
pub struct BerDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    config: DecoderConfig,
    depth: usize,
}

impl<'a> BerDecoder<'a> {
    /// Create a decoder with the default (BER) configuration
    pub fn new(buffer: &'a [u8]) -> Self {
        Self::with_config(buffer, DecoderConfig::default())
    }

    /// Create a decoder with an explicit configuration
    ///
    /// # Arguments
    /// * `buffer` - Complete input; values are read from its start
    /// * `config` - Profile, limits and pad bit policy
    pub fn with_config(buffer: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            buffer,
            position: 0,
            config,
            depth: 0,
        }
    }

    fn nested(&self, buffer: &'a [u8]) -> Asn1Result<Self> {
        if self.depth >= self.config.max_depth {
            return Err(Asn1Error::MalformedEncoding(format!(
                "Nesting deeper than {} levels",
                self.config.max_depth
            )));
        }
        Ok(Self {
            buffer,
            position: 0,
            config: self.config.clone(),
            depth: self.depth + 1,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn profile(&self) -> EncodingProfile {
        self.config.profile
    }

    /// Get current position in buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.buffer.len()
    }

    fn rest(&self) -> &'a [u8] {
        let buffer = self.buffer;
        &buffer[self.position..]
    }

    fn read_bytes(&mut self, count: usize) -> Asn1Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(Asn1Error::MalformedEncoding(format!(
                "Buffer exhausted: need {} bytes, have {}",
                count,
                self.remaining()
            )));
        }
        let buffer = self.buffer;
        let start = self.position;
        self.position += count;
        Ok(&buffer[start..start + count])
    }

    /// Read identifier octets
    pub fn read_tag(&mut self) -> Asn1Result<Tag> {
        let (tag, consumed) = Tag::decode(self.rest())?;
        if self.profile().requires_minimal_encoding() && consumed != tag.encoded_len() {
            log::debug!("rejecting non-minimal encoding of {}", tag);
            return Err(Asn1Error::MalformedEncoding(format!(
                "Non-minimal tag encoding for {} under {}",
                tag,
                self.profile()
            )));
        }
        self.position += consumed;
        Ok(tag)
    }

    /// Read length octets
    ///
    /// # Error Handling
    /// Returns `MalformedEncoding` if:
    /// - The indefinite form is used outside the BER profile
    /// - The length form is not minimal under DER
    /// - The length exceeds `max_length` or the remaining input
    pub fn read_length(&mut self) -> Asn1Result<Length> {
        let (length, consumed) = Length::decode(self.rest())?;

        match length {
            Length::Indefinite => {
                if !self.profile().allows_indefinite_length() {
                    return Err(Asn1Error::MalformedEncoding(format!(
                        "Indefinite length encoding not allowed under {}",
                        self.profile()
                    )));
                }
            }
            Length::Definite(len) => {
                if self.profile().requires_minimal_encoding() && consumed != length.encoded_len() {
                    return Err(Asn1Error::MalformedEncoding(format!(
                        "Non-minimal length encoding for {} under {}",
                        len,
                        self.profile()
                    )));
                }
                if len > self.config.max_length {
                    return Err(Asn1Error::MalformedEncoding(format!(
                        "Length {} exceeds configured maximum {}",
                        len, self.config.max_length
                    )));
                }
                let available = self.remaining() - consumed;
                if len > available {
                    return Err(Asn1Error::MalformedEncoding(format!(
                        "Length {} exceeds remaining input {}",
                        len, available
                    )));
                }
            }
        }

        self.position += consumed;
        Ok(length)
    }

    /// Decode a TLV (Tag-Length-Value) triplet without interpreting it
    ///
    /// # Returns
    /// The tag and a borrowed slice of the contents. For the indefinite
    /// form the slice ends before the end-of-contents marker, and the
    /// position moves past the marker.
    pub fn decode_tlv(&mut self) -> Asn1Result<Tlv<'a>> {
        let tag = self.read_tag()?;
        let length = self.read_length()?;

        let (contents, indefinite) = match length {
            Length::Definite(len) => (self.read_bytes(len)?, false),
            Length::Indefinite => {
                if !tag.is_constructed() {
                    return Err(Asn1Error::MalformedEncoding(format!(
                        "Indefinite length used with primitive {}",
                        tag
                    )));
                }
                (self.scan_indefinite()?, true)
            }
        };

        log::trace!("decoded {} with {} content bytes", tag, contents.len());
        Ok(Tlv {
            tag,
            contents,
            indefinite,
        })
    }

    /// Walk nested TLVs up to the end-of-contents marker and return the
    /// bytes in between
    fn scan_indefinite(&mut self) -> Asn1Result<&'a [u8]> {
        let rest = self.rest();
        let mut inner = self.nested(rest)?;

        loop {
            if inner.rest().starts_with(&[0x00, 0x00]) {
                let end = inner.position;
                self.position += end + 2;
                return Ok(&rest[..end]);
            }
            if !inner.has_remaining() {
                return Err(Asn1Error::MalformedEncoding(
                    "Missing end-of-contents marker".to_string(),
                ));
            }
            inner.decode_tlv()?;
        }
    }

    /// Read and interpret the next value
    ///
    /// # Why This Method?
    /// [`decode_tlv`](Self::decode_tlv) only frames; this method maps the
    /// frame onto the closed value set and applies the profile's string and
    /// pad bit rules. On error the position is unspecified and the decoder
    /// should be discarded.
    pub fn read_value(&mut self) -> Asn1Result<Asn1Value> {
        let tlv = self.decode_tlv()?;
        self.value_from_tlv(tlv)
    }

    /// Read values until the input is exhausted
    pub fn read_all(&mut self) -> Asn1Result<Vec<Asn1Value>> {
        let mut values = Vec::new();
        while self.has_remaining() {
            values.push(self.read_value()?);
        }
        Ok(values)
    }

    /// Fail if any input is left unread
    pub fn finish(&self) -> Asn1Result<()> {
        if self.has_remaining() {
            return Err(Asn1Error::MalformedEncoding(format!(
                "Extra data detected in stream: {} bytes",
                self.remaining()
            )));
        }
        Ok(())
    }

    fn value_from_tlv(&self, tlv: Tlv<'a>) -> Asn1Result<Asn1Value> {
        let tag = tlv.tag;
        if tag.class() != TagClass::Universal {
            return self.tagged_object(tlv);
        }

        match tag.number() {
            0 => Err(Asn1Error::MalformedEncoding(
                "Unexpected end-of-contents marker".to_string(),
            )),
            3 => self.bit_string(tlv),
            4 => {
                let octets = if tag.is_constructed() {
                    Bytes::from(self.segments(tlv, Tag::OCTET_STRING)?.concat())
                } else {
                    Bytes::copy_from_slice(tlv.contents)
                };
                Ok(OctetString::new(octets).into())
            }
            18 => {
                if tag.is_constructed() {
                    return Err(Asn1Error::MalformedEncoding(
                        "Constructed NumericString not supported".to_string(),
                    ));
                }
                if self.config.validate_strings && !NumericString::is_numeric_bytes(tlv.contents) {
                    return Err(Asn1Error::MalformedEncoding(
                        "NumericString contains illegal characters".to_string(),
                    ));
                }
                Ok(NumericString::from_bytes(Bytes::copy_from_slice(tlv.contents)).into())
            }
            number => Err(Asn1Error::MalformedEncoding(format!(
                "Unsupported universal tag {}",
                number
            ))),
        }
    }

    /// Collect the primitive segments of a constructed string
    fn segments(&self, tlv: Tlv<'a>, segment_tag: Tag) -> Asn1Result<Vec<&'a [u8]>> {
        if !self.profile().allows_constructed_strings() {
            return Err(Asn1Error::MalformedEncoding(format!(
                "Constructed {} not allowed under {}",
                segment_tag,
                self.profile()
            )));
        }

        let mut inner = self.nested(tlv.contents)?;
        let mut segments = Vec::new();
        while inner.has_remaining() {
            let segment = inner.decode_tlv()?;
            if !segment.tag.matches(&segment_tag) {
                return Err(Asn1Error::MalformedEncoding(format!(
                    "Unexpected {} inside constructed {}",
                    segment.tag, segment_tag
                )));
            }
            if segment.tag.is_constructed() {
                segments.extend(inner.segments(segment, segment_tag)?);
            } else {
                segments.push(segment.contents);
            }
        }
        Ok(segments)
    }

    fn bit_string(&self, tlv: Tlv<'a>) -> Asn1Result<Asn1Value> {
        let (pad_bits, data) = if tlv.tag.is_constructed() {
            let segments = self.segments(tlv, Tag::BIT_STRING)?;
            let mut data = Vec::new();
            let mut pad_bits = 0;
            for (i, segment) in segments.iter().enumerate() {
                let (pad, bits) = bit_string::split_contents(segment)?;
                if pad != 0 && i + 1 < segments.len() {
                    return Err(Asn1Error::MalformedEncoding(
                        "Pad bits in non-final BIT STRING segment".to_string(),
                    ));
                }
                data.extend_from_slice(bits);
                pad_bits = pad;
            }
            (pad_bits, Bytes::from(data))
        } else {
            let (pad, bits) = bit_string::split_contents(tlv.contents)?;
            (pad, Bytes::copy_from_slice(bits))
        };

        let data = if bit_string::has_unused_bits_set(&data, pad_bits) {
            match self.config.pad_bits() {
                PadBitPolicy::Reject => {
                    log::debug!("rejecting BIT STRING with non-zero unused bits");
                    return Err(Asn1Error::MalformedEncoding(format!(
                        "Non-zero unused bits in BIT STRING under {}",
                        self.profile()
                    )));
                }
                PadBitPolicy::Mask => bit_string::der_form(&data, pad_bits),
                PadBitPolicy::Preserve => data,
            }
        } else {
            data
        };

        let value = match self.profile() {
            EncodingProfile::Der => DerBitString::new(data, pad_bits)?.into(),
            EncodingProfile::Ber | EncodingProfile::Dl => DlBitString::new(data, pad_bits)?.into(),
        };
        Ok(value)
    }

    fn tagged_object(&self, tlv: Tlv<'a>) -> Asn1Result<Asn1Value> {
        let tag = tlv.tag;

        if !tag.is_constructed() {
            let octets = OctetString::new(Bytes::copy_from_slice(tlv.contents));
            return Ok(TaggedObject::from_decoded(tag.class(), false, tag.number(), octets.into()).into());
        }

        let mut inner = self.nested(tlv.contents)?;
        if !inner.has_remaining() {
            return Err(Asn1Error::MalformedEncoding(format!(
                "Empty constructed {}",
                tag
            )));
        }
        let object = inner.read_value()?;
        if inner.has_remaining() {
            return Err(Asn1Error::MalformedEncoding(format!(
                "{} holds more than one value",
                tag
            )));
        }
        Ok(TaggedObject::from_decoded(tag.class(), true, tag.number(), object).into())
    }
}

/// Decode exactly one value with the default (BER) configuration
pub fn decode(data: &[u8]) -> Asn1Result<Asn1Value> {
    decode_with(data, &DecoderConfig::default())
}

/// Decode exactly one value; trailing bytes are an error
pub fn decode_with(data: &[u8], config: &DecoderConfig) -> Asn1Result<Asn1Value> {
    let mut decoder = BerDecoder::with_config(data, config.clone());
    let value = decoder.read_value()?;
    decoder.finish()?;
    Ok(value)
}
