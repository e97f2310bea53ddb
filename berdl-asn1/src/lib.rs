//! ASN.1 value types and TLV codec
//!
//! This crate provides tag/length framing, the closed set of supported
//! values and the conversion entry points used to normalize loosely-typed
//! input.
//!
//! - [`ber`]: tag and length types, the output framer and the decoder
//! - [`types`]: BIT STRING (DER and DL forms), NumericString, OCTET STRING,
//!   tagged objects
//! - [`value`]: the encodable contract and the [`Asn1Value`] enum
//! - [`convert`]: `get_instance` dispatch

pub mod ber;
pub mod convert;
pub mod types;
pub mod value;

pub use ber::{Asn1OutputStream, BerDecoder, Length, Tag, TagClass, Tlv};
pub use convert::Asn1Convert;
pub use types::{
    BitString, BitStringForm, DerBitString, DerForm, DlBitString, DlForm, NumericString,
    OctetString, TaggedObject,
};
pub use value::{Asn1Encodable, Asn1Object, Asn1Value};
