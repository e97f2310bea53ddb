//! TLV (Tag-Length-Value) framing
//!
//! Each value is written as a TLV triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! - **Class** (2 bits): Universal (00), Application (01), Context-specific (10), Private (11)
//! - **Constructed/Primitive** (1 bit)
//! - **Tag Number**: 0-30 in the low five bits, or `11111` followed by
//!   base-128 continuation bytes
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian length bytes
//! - **Indefinite form** (`0x80`): contents end at `00 00`; accepted on
//!   input under BER only, never produced
//!
//! ## Profiles
//!
//! - **BER**: every form above is accepted
//! - **DL**: definite lengths only; segmented strings are still accepted
//! - **DER**: definite lengths, primitive strings, minimal tag and length
//!   encodings and canonical BIT STRING pad bits

pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::{BerDecoder, Tlv, decode, decode_with};
pub use encoder::{Asn1OutputStream, encode_with};
pub use types::{Length, Tag, TagClass, length_field_len};
