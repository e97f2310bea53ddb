use berdl::{
    Asn1Value, ByteSink, DlBitString, EncodingProfile, NumericString, OctetString, WriterConfig,
};
use mockall::mock;
use rand::RngCore;
use std::io::{self, Write};

mock! {
    pub Sink {}

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }

    impl ByteSink for Sink {
        fn close(&mut self) -> io::Result<()>;
    }
}

#[test]
fn test_write_value_der() {
    let value = Asn1Value::from(DlBitString::new(vec![0x12, 0xFF], 1).unwrap());
    let mut sink = Vec::new();
    berdl::write_value(&mut sink, &value, EncodingProfile::Der).unwrap();
    assert_eq!(sink, vec![0x03, 0x03, 0x01, 0x12, 0xFE]);
}

#[test]
fn test_write_value_larger_than_buffer() {
    let mut payload = vec![0u8; 10_000];
    rand::thread_rng().fill_bytes(&mut payload);
    let value = Asn1Value::from(OctetString::new(payload.clone()));

    let mut sink = Vec::new();
    let config = WriterConfig::new(64).unwrap();
    berdl::write_value_with(&mut sink, &value, EncodingProfile::Dl, &config).unwrap();

    assert_eq!(&sink[..4], &[0x04, 0x82, 0x27, 0x10]);
    assert_eq!(&sink[4..], payload.as_slice());
}

#[test]
fn test_close_reaches_sink_after_failed_write() {
    let mut sink = MockSink::new();
    sink.expect_write()
        .returning(|_| Err(io::Error::other("disk full")));
    sink.expect_flush().returning(|| Ok(()));
    sink.expect_close().times(1).returning(|| Ok(()));

    let value = Asn1Value::from(NumericString::new("2024"));
    let err = berdl::write_value(sink, &value, EncodingProfile::Der).unwrap_err();
    assert!(err.is_io());
}

#[test]
fn test_close_error_reported() {
    let mut sink = MockSink::new();
    sink.expect_write()
        .withf(|buf| buf == [0x12, 0x01, b'1'])
        .returning(|buf| Ok(buf.len()));
    sink.expect_flush().returning(|| Ok(()));
    sink.expect_close()
        .times(1)
        .returning(|| Err(io::Error::other("close failed")));

    let err = berdl::write_value(sink, &NumericString::new("1").into(), EncodingProfile::Dl)
        .unwrap_err();
    assert!(err.is_io());
    assert!(err.to_string().contains("close failed"));
}

#[test]
fn test_rejected_config_still_closes_sink() {
    let mut sink = MockSink::new();
    sink.expect_write().times(0);
    sink.expect_close().times(1).returning(|| Ok(()));

    let value = Asn1Value::from(OctetString::new(vec![1]));
    let err = berdl::write_value_with(
        sink,
        &value,
        EncodingProfile::Dl,
        &WriterConfig { buffer_size: 0 },
    )
    .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_zero_buffer_rejected() {
    let value = Asn1Value::from(OctetString::new(vec![1]));
    let err = berdl::write_value_with(
        Vec::new(),
        &value,
        EncodingProfile::Dl,
        &WriterConfig { buffer_size: 0 },
    )
    .unwrap_err();
    assert!(err.is_invalid_argument());
}
