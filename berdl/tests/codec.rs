use berdl::{
    Asn1Convert, Asn1Encodable, Asn1Object, Asn1Value, DecoderConfig, DerBitString, DlBitString,
    EncodingProfile, NumericString, OctetString, PadBitPolicy, TagClass, TaggedObject,
};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn random_bits(rng: &mut StdRng) -> (Vec<u8>, u8) {
    let mut data = vec![0u8; rng.gen_range(0..300)];
    rng.fill_bytes(&mut data);
    let pad_bits = if data.is_empty() { 0 } else { rng.gen_range(0..8) };
    (data, pad_bits)
}

#[test]
fn test_der_round_trip_preserves_equality_and_hash() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for _ in 0..200 {
        let (data, pad_bits) = random_bits(&mut rng);
        let bits = DerBitString::new(data, pad_bits).unwrap();
        let value = Asn1Value::from(bits.clone());

        let encoded = berdl::encode_der(&value).unwrap();
        assert_eq!(encoded.len(), value.encoded_length());

        let decoded = berdl::decode_with(&encoded, &DecoderConfig::der()).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(hash_of(&decoded), hash_of(&value));
        assert_eq!(berdl::encode_der(&decoded).unwrap(), encoded);
    }
}

#[test]
fn test_default_decode_round_trips_strict_bit_strings() {
    let value = Asn1Value::from(DerBitString::new(vec![0xF0], 4).unwrap());
    let decoded = berdl::decode(&berdl::encode(&value).unwrap()).unwrap();
    assert_eq!(decoded.kind(), "DlBitString");
    assert_eq!(decoded, value);
    assert_eq!(hash_of(&decoded), hash_of(&value));

    let mut rng = StdRng::seed_from_u64(0xB17);
    for _ in 0..100 {
        let (data, pad_bits) = random_bits(&mut rng);
        let value = Asn1Value::from(DerBitString::new(data, pad_bits).unwrap());
        let decoded = berdl::decode(&berdl::encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(hash_of(&decoded), hash_of(&value));
    }
}

#[test]
fn test_dl_round_trip_is_byte_exact() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let (data, pad_bits) = random_bits(&mut rng);
        let value = Asn1Value::from(DlBitString::new(data, pad_bits).unwrap());

        let encoded = berdl::encode(&value).unwrap();
        let decoded = berdl::decode_with(&encoded, &DecoderConfig::dl()).unwrap();
        assert_eq!(berdl::encode(&decoded).unwrap(), encoded);
    }
}

#[test]
fn test_strict_masking() {
    let strict = Asn1Value::from(DerBitString::new(vec![0xFF], 4).unwrap());
    let lax = Asn1Value::from(DlBitString::new(vec![0xFF], 4).unwrap());

    assert_eq!(berdl::encode(&strict).unwrap(), vec![0x03, 0x02, 0x04, 0xF0]);
    assert_eq!(berdl::encode(&lax).unwrap(), vec![0x03, 0x02, 0x04, 0xFF]);
    assert_eq!(berdl::encode_der(&lax).unwrap(), vec![0x03, 0x02, 0x04, 0xF0]);
}

#[test]
fn test_der_decoding_of_lax_input() {
    let lax = [0x03, 0x02, 0x04, 0xFF];
    assert!(berdl::decode_with(&lax, &DecoderConfig::der()).unwrap_err().is_malformed());

    let masked = berdl::decode_with(
        &lax,
        &DecoderConfig::der().with_pad_bit_policy(PadBitPolicy::Mask),
    )
    .unwrap();
    assert_eq!(berdl::encode(&masked).unwrap(), vec![0x03, 0x02, 0x04, 0xF0]);
}

#[test]
fn test_truncated_bit_string() {
    let err = berdl::decode(&[0x03, 0x00]).unwrap_err();
    assert!(err.is_malformed());
    assert!(DerBitString::from_octet_string(&[]).unwrap_err().is_malformed());
}

#[test]
fn test_numeric_string_alphabet() {
    assert!(NumericString::is_numeric_string("123 456"));
    assert!(!NumericString::is_numeric_string("12a"));
    assert!(NumericString::with_validation("12a", true).unwrap_err().is_invalid_argument());
}

#[test]
fn test_length_consistency() {
    let bits = DerBitString::new(vec![0, 1, 0, 1, 0, 0, 1], 0).unwrap();
    assert_eq!(bits.encoded_length(), 10);
    assert_eq!(berdl::encode(&bits.into()).unwrap().len(), 10);
}

#[test]
fn test_conversion_dispatch() {
    let strict = DerBitString::new(vec![0xA0], 5).unwrap();
    let object = Asn1Object::from(Asn1Value::from(strict.clone()));
    assert_eq!(DerBitString::get_instance(&object).unwrap(), Some(strict.clone()));

    let err = DerBitString::get_instance(&Asn1Object::Integer(1)).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("i64"));

    let encoded = Asn1Object::from(Bytes::from(strict.to_encoded().unwrap()));
    assert_eq!(DlBitString::get_instance(&encoded).unwrap().unwrap(), strict);
    assert_eq!(DerBitString::get_instance(&Asn1Object::Null).unwrap(), None);
}

#[test]
fn test_tagged_round_trip() {
    let bits = DerBitString::from_int(0x0106);
    let implicit = TaggedObject::new(false, 4, bits.clone().into());
    let explicit = TaggedObject::with_class(TagClass::Application, true, 1, implicit.into()).unwrap();

    let encoded = berdl::encode_der(&explicit.clone().into()).unwrap();
    let Asn1Value::Tagged(outer) = berdl::decode_with(&encoded, &DecoderConfig::der()).unwrap()
    else {
        panic!("tagged object expected");
    };
    assert_eq!(outer.tag_class(), TagClass::Application);

    let inner = outer.unwrap_as::<TaggedObject>(1, true).unwrap();
    let decoded = inner.unwrap_as::<DerBitString>(4, false).unwrap();
    assert_eq!(decoded, bits);
    assert_eq!(decoded.int_value(), 0x0106);
}

#[test]
fn test_der_rejects_lax_framing() {
    let indefinite = [0x24, 0x80, 0x04, 0x01, 0xAA, 0x00, 0x00];
    assert!(berdl::decode_with(&indefinite, &DecoderConfig::der()).unwrap_err().is_malformed());

    match berdl::decode(&indefinite).unwrap() {
        Asn1Value::OctetString(s) => assert_eq!(s, OctetString::new(vec![0xAA])),
        other => panic!("unexpected {}", other.kind()),
    }

    let long_length = [0x12, 0x81, 0x01, b'7'];
    assert!(berdl::decode_with(&long_length, &DecoderConfig::der()).unwrap_err().is_malformed());
    assert_eq!(
        berdl::decode(&long_length).unwrap(),
        Asn1Value::from(NumericString::new("7"))
    );
}

#[test]
fn test_length_above_maximum_fails_before_reading() {
    let header_only = [0x04, 0x84, 0x01, 0x00, 0x00, 0x00];
    let config = DecoderConfig::new(EncodingProfile::Ber).with_max_length(1024);
    let err = berdl::decode_with(&header_only, &config).unwrap_err();
    assert!(err.to_string().contains("exceeds configured maximum"));
}
