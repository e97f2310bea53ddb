//! BIT STRING in its strict (DER) and definite-length (DL) forms
//!
//! A bit string is stored as whole octets plus the number of unused
//! low-order bits of the final octet (`pad_bits`, 0-7).
//!
//! - [`DerBitString`] masks the unused bits to zero whenever it is encoded,
//!   so every logical bit string has exactly one encoding.
//! - [`DlBitString`] emits its octets exactly as given and never
//!   re-canonicalizes.
//!
//! Both forms compare and hash over the logical content (pad bits and
//! masked octets), so a lax value equals its canonical counterpart.
//!
//! # Encoding Format
//! ```text
//! 03 <len> <pad_bits> <octets...>
//! ```

use crate::ber::encoder::Asn1OutputStream;
use crate::ber::types::{Length, Tag, length_field_len};
use crate::convert::Asn1Convert;
use crate::value::{Asn1Encodable, Asn1Value};
use berdl_core::{Asn1Error, Asn1Result};
use bytes::Bytes;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// Canonical-form policy of a bit string
pub trait BitStringForm: sealed::Sealed + Sized + Send + Sync + 'static {
    /// Type name reported by conversions and `Debug`
    const NAME: &'static str;
    /// Whether unused bits are masked before emission
    const CANONICAL: bool;

    #[doc(hidden)]
    fn into_value(bits: BitString<Self>) -> Asn1Value;

    #[doc(hidden)]
    fn is_instance(value: &Asn1Value) -> bool;
}

/// Strict form marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerForm {}

/// Definite-length (lax) form marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DlForm {}

impl sealed::Sealed for DerForm {}
impl sealed::Sealed for DlForm {}

impl BitStringForm for DerForm {
    const NAME: &'static str = "DerBitString";
    const CANONICAL: bool = true;

    fn into_value(bits: BitString<Self>) -> Asn1Value {
        Asn1Value::DerBitString(bits)
    }

    fn is_instance(value: &Asn1Value) -> bool {
        matches!(value, Asn1Value::DerBitString(_))
    }
}

impl BitStringForm for DlForm {
    const NAME: &'static str = "DlBitString";
    const CANONICAL: bool = false;

    fn into_value(bits: BitString<Self>) -> Asn1Value {
        Asn1Value::DlBitString(bits)
    }

    fn is_instance(value: &Asn1Value) -> bool {
        matches!(value, Asn1Value::DlBitString(_))
    }
}

/// BIT STRING with DER encoding
pub type DerBitString = BitString<DerForm>;

/// Definite-length BIT STRING
pub type DlBitString = BitString<DlForm>;

/// Arbitrary string of bits in form `F`
pub struct BitString<F: BitStringForm> {
    data: Bytes,
    pad_bits: u8,
    form: PhantomData<F>,
}

impl<F: BitStringForm> BitString<F> {
    /// Construct a bit string from its octets and pad bit count.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `pad_bits > 7`, or if `data` is empty
    /// and `pad_bits` is not zero.
    pub fn new(data: impl Into<Bytes>, pad_bits: u8) -> Asn1Result<Self> {
        let data = data.into();
        if pad_bits > 7 {
            return Err(Asn1Error::InvalidArgument(format!(
                "pad bits cannot be greater than 7: {}",
                pad_bits
            )));
        }
        if data.is_empty() && pad_bits != 0 {
            return Err(Asn1Error::InvalidArgument(
                "zero length data with non-zero pad bits".to_string(),
            ));
        }
        Ok(Self::from_parts(data, pad_bits))
    }

    fn from_parts(data: Bytes, pad_bits: u8) -> Self {
        Self {
            data,
            pad_bits,
            form: PhantomData,
        }
    }

    /// Octet-aligned bit string
    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self::from_parts(data.into(), 0)
    }

    /// Bit string of a numeric flag set.
    ///
    /// The octets are the minimal little-endian form of `value`; the pad
    /// bits are the trailing zero bits of its most significant non-zero
    /// byte.
    pub fn from_int(value: u32) -> Self {
        Self::from_parts(Bytes::from(bytes_from_int(value)), pad_bits_from_int(value))
    }

    /// Bit string carrying the DER encoding of `value`
    pub fn from_encodable(value: &Asn1Value) -> Asn1Result<Self> {
        Ok(Self::from_parts(Bytes::from(value.to_der_encoded()?), 0))
    }

    /// Parse bit string contents: pad bit count followed by the octets.
    ///
    /// # Errors
    /// Returns `MalformedEncoding` if `bytes` is empty or the pad bit count
    /// is invalid for the octets that follow.
    pub fn from_octet_string(bytes: &[u8]) -> Asn1Result<Self> {
        let (pad_bits, data) = split_contents(bytes)?;
        Ok(Self::from_parts(Bytes::copy_from_slice(data), pad_bits))
    }

    /// The octets as given, including any unused bits
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn pad_bits(&self) -> u8 {
        self.pad_bits
    }

    /// The octets with the unused bits zeroed
    pub fn bytes(&self) -> Bytes {
        der_form(&self.data, self.pad_bits)
    }

    /// The octets of an octet-aligned bit string
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the bit string has pad bits.
    pub fn octets(&self) -> Asn1Result<&Bytes> {
        if self.pad_bits != 0 {
            return Err(Asn1Error::InvalidArgument(
                "attempt to get non-octet aligned data from BIT STRING".to_string(),
            ));
        }
        Ok(&self.data)
    }

    /// Number of significant bits
    pub fn bit_len(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pad_bits as usize)
    }

    /// Inverse of [`from_int`](Self::from_int) over the first four octets
    pub fn int_value(&self) -> u32 {
        self.bytes()
            .iter()
            .take(4)
            .enumerate()
            .fold(0u32, |value, (i, &byte)| value | (byte as u32) << (8 * i))
    }

    /// Get the bit at a specific position (0-based, MSB first)
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `index` is not below [`bit_len`](Self::bit_len).
    pub fn get_bit(&self, index: usize) -> Asn1Result<bool> {
        if index >= self.bit_len() {
            return Err(Asn1Error::InvalidArgument(format!(
                "Bit index {} out of bounds (bit_len: {})",
                index,
                self.bit_len()
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        Ok((self.data[byte_index] >> bit_index) & 1 == 1)
    }

    /// `#` followed by the upper-case hex of this value's encoding
    pub fn get_string(&self) -> String {
        let contents = self.contents();
        let mut encoded = Tag::BIT_STRING.encode();
        Length::new(contents.len()).encode_into(&mut encoded);
        encoded.extend_from_slice(&contents);

        let mut out = String::with_capacity(1 + 2 * encoded.len());
        out.push('#');
        for byte in encoded {
            out.push_str(&format!("{:02X}", byte));
        }
        out
    }

    /// Bit string contents: pad bit count, then the octets in this form
    pub fn contents(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.data.len() + 1);
        body.push(self.pad_bits);
        if F::CANONICAL {
            body.extend_from_slice(&der_form(&self.data, self.pad_bits));
        } else {
            body.extend_from_slice(&self.data);
        }
        body
    }

    /// Same bits in the other form
    pub fn convert<G: BitStringForm>(&self) -> BitString<G> {
        BitString::from_parts(self.data.clone(), self.pad_bits)
    }

    fn masked_last(&self) -> Option<u8> {
        self.data.last().map(|&b| mask_unused(b, self.pad_bits))
    }

    fn logical_prefix(&self) -> &[u8] {
        match self.data.len() {
            0 => &[],
            n => &self.data[..n - 1],
        }
    }
}

impl<F: BitStringForm> Asn1Encodable for BitString<F> {
    fn tag(&self) -> Tag {
        Tag::BIT_STRING
    }

    fn is_constructed(&self) -> bool {
        false
    }

    fn encoded_length(&self) -> usize {
        let n = self.data.len();
        1 + length_field_len(n + 1) + n + 1
    }

    fn encode<W: Write>(&self, out: &mut Asn1OutputStream<W>) -> Asn1Result<()> {
        out.write_encoded(Tag::BIT_STRING, &self.contents())
    }
}

impl<F: BitStringForm> Asn1Convert for BitString<F> {
    const KIND: &'static str = F::NAME;

    fn is_instance(value: &Asn1Value) -> bool {
        F::is_instance(value)
    }

    fn from_value(value: &Asn1Value) -> Option<Self> {
        match value {
            Asn1Value::DerBitString(bits) => Some(bits.convert()),
            Asn1Value::DlBitString(bits) => Some(bits.convert()),
            _ => None,
        }
    }

    fn from_contents(octets: &[u8]) -> Asn1Result<Self> {
        Self::from_octet_string(octets)
    }
}

impl<F: BitStringForm> Clone for BitString<F> {
    fn clone(&self) -> Self {
        Self::from_parts(self.data.clone(), self.pad_bits)
    }
}

impl<F: BitStringForm, G: BitStringForm> PartialEq<BitString<G>> for BitString<F> {
    fn eq(&self, other: &BitString<G>) -> bool {
        self.pad_bits == other.pad_bits
            && self.logical_prefix() == other.logical_prefix()
            && self.masked_last() == other.masked_last()
    }
}

impl<F: BitStringForm> Eq for BitString<F> {}

impl<F: BitStringForm> Hash for BitString<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pad_bits.hash(state);
        self.logical_prefix().hash(state);
        self.masked_last().hash(state);
    }
}

impl<F: BitStringForm> fmt::Debug for BitString<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(F::NAME)
            .field("data", &self.data)
            .field("pad_bits", &self.pad_bits)
            .finish()
    }
}

impl<F: BitStringForm> fmt::Display for BitString<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_string())
    }
}

impl From<DlBitString> for DerBitString {
    fn from(bits: DlBitString) -> Self {
        bits.convert()
    }
}

impl From<DerBitString> for DlBitString {
    fn from(bits: DerBitString) -> Self {
        bits.convert()
    }
}

impl<F: BitStringForm> From<BitString<F>> for Asn1Value {
    fn from(bits: BitString<F>) -> Self {
        F::into_value(bits)
    }
}

/// Zero the `pad_bits` low-order bits of `byte`; eight or more clears it
fn mask_unused(byte: u8, pad_bits: u8) -> u8 {
    byte & 0xFFu8.checked_shl(pad_bits as u32).unwrap_or(0)
}

/// Copy of `data` with the `pad_bits` unused bits of the final octet zeroed
pub fn der_form(data: &[u8], pad_bits: u8) -> Bytes {
    let mut bytes = data.to_vec();
    if let Some(last) = bytes.last_mut() {
        *last = mask_unused(*last, pad_bits);
    }
    Bytes::from(bytes)
}

/// Whether any of the unused bits of the final octet is set
pub fn has_unused_bits_set(data: &[u8], pad_bits: u8) -> bool {
    data.last()
        .is_some_and(|&last| mask_unused(last, pad_bits) != last)
}

/// Split bit string contents into pad bit count and octets
pub(crate) fn split_contents(bytes: &[u8]) -> Asn1Result<(u8, &[u8])> {
    let Some((&pad_bits, data)) = bytes.split_first() else {
        return Err(Asn1Error::MalformedEncoding(
            "truncated BIT STRING detected".to_string(),
        ));
    };
    if pad_bits > 7 {
        return Err(Asn1Error::MalformedEncoding(format!(
            "Invalid pad bits in BIT STRING: {} (must be 0-7)",
            pad_bits
        )));
    }
    if data.is_empty() && pad_bits != 0 {
        return Err(Asn1Error::MalformedEncoding(
            "Empty BIT STRING with non-zero pad bits".to_string(),
        ));
    }
    Ok((pad_bits, data))
}

/// Minimal little-endian octets of `value`, empty for zero
pub fn bytes_from_int(value: u32) -> Vec<u8> {
    let significant = (u32::BITS - value.leading_zeros()) as usize;
    value.to_le_bytes()[..significant.div_ceil(8)].to_vec()
}

/// Trailing zero bits of the most significant non-zero byte of `value`
pub fn pad_bits_from_int(value: u32) -> u8 {
    match bytes_from_int(value).last() {
        Some(&top) => top.trailing_zeros() as u8,
        None => 0,
    }
}
