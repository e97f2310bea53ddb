//! berdl - BER/DER/DL codec for a focused set of ASN.1 values
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `berdl-core`: error taxonomy, codec configuration and the
//!   zero-on-flush buffered writer
//! - `berdl-asn1`: tag/length framing, the value types and conversion
//!   dispatch
//!
//! # Usage
//!
//! ```rust
//! use berdl::{Asn1Value, DlBitString, EncodingProfile};
//!
//! let value = Asn1Value::from(DlBitString::new(vec![0xFF], 4).unwrap());
//! assert_eq!(berdl::encode(&value).unwrap(), vec![0x03, 0x02, 0x04, 0xFF]);
//! assert_eq!(berdl::encode_der(&value).unwrap(), vec![0x03, 0x02, 0x04, 0xF0]);
//!
//! let mut sink = Vec::new();
//! berdl::write_value(&mut sink, &value, EncodingProfile::Der).unwrap();
//! assert_eq!(sink, vec![0x03, 0x02, 0x04, 0xF0]);
//! ```

pub use berdl_core::{
    Asn1Error, Asn1Result, BufferingWriter, ByteSink, DecoderConfig, EncodingProfile,
    PadBitPolicy, WriterConfig,
};

pub use berdl_asn1::{
    Asn1Convert, Asn1Encodable, Asn1Object, Asn1OutputStream, Asn1Value, BerDecoder, BitString,
    BitStringForm, DerBitString, DerForm, DlBitString, DlForm, Length, NumericString, OctetString,
    Tag, TagClass, TaggedObject, Tlv,
};

pub mod ber {
    pub use berdl_asn1::ber::*;
}

pub mod io {
    pub use berdl_core::io::*;
}

/// Encode `value` in its own form
pub fn encode(value: &Asn1Value) -> Asn1Result<Vec<u8>> {
    ber::encode_with(value, EncodingProfile::Dl)
}

/// Encode the DER form of `value`
pub fn encode_der(value: &Asn1Value) -> Asn1Result<Vec<u8>> {
    ber::encode_with(value, EncodingProfile::Der)
}

/// Decode exactly one value with the default (BER) configuration
pub fn decode(data: &[u8]) -> Asn1Result<Asn1Value> {
    ber::decode(data)
}

/// Decode exactly one value
pub fn decode_with(data: &[u8], config: &DecoderConfig) -> Asn1Result<Asn1Value> {
    ber::decode_with(data, config)
}

/// Write `value` to `sink` through a zero-on-flush buffer and close it
pub fn write_value<S: ByteSink>(
    sink: S,
    value: &Asn1Value,
    profile: EncodingProfile,
) -> Asn1Result<()> {
    write_value_with(sink, value, profile, &WriterConfig::default())
}

/// Like [`write_value`] with an explicit buffer configuration
///
/// The sink is closed on every exit path, including a rejected
/// `config`; the first error is returned.
///
/// # Arguments
/// * `sink` - Destination of the encoding; closed before returning
/// * `value` - Value to encode
/// * `profile` - `Der` converts the value to its DER form first
/// * `config` - Buffer settings
pub fn write_value_with<S: ByteSink>(
    mut sink: S,
    value: &Asn1Value,
    profile: EncodingProfile,
    config: &WriterConfig,
) -> Asn1Result<()> {
    if let Err(e) = config.validate() {
        if let Err(close_err) = sink.close() {
            log::debug!("closing sink after rejected writer config failed: {}", close_err);
        }
        return Err(e);
    }
    let writer = BufferingWriter::with_config(sink, config)?;
    let mut out = Asn1OutputStream::with_profile(writer, profile);
    let written = out.write_object(value);
    let closed = out.get_mut().close();
    if let Err(e) = &written {
        log::error!("failed to write {}: {}", value.kind(), e);
    }
    written.and(closed.map_err(Asn1Error::from))
}
