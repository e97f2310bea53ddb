use thiserror::Error;

/// Main error type for berdl encoding and decoding
#[derive(Error, Debug)]
pub enum Asn1Error {
    /// Truncated or otherwise invalid wire data, or a form the active
    /// profile does not allow
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Input to a constructor or conversion entry point was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Asn1Error {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Asn1Error::MalformedEncoding(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Asn1Error::InvalidArgument(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Asn1Error::Io(_))
    }
}

/// Result type alias for berdl operations
pub type Asn1Result<T> = Result<T, Asn1Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_conversion() {
        fn fails() -> Asn1Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink gone"))?;
            Ok(())
        }

        let err = fails().unwrap_err();
        assert!(err.is_io());
        assert_eq!(err.to_string(), "I/O error: sink gone");
    }

    #[test]
    fn test_error_messages() {
        let err = Asn1Error::MalformedEncoding("truncated BIT STRING detected".to_string());
        assert!(err.is_malformed());
        assert_eq!(
            err.to_string(),
            "Malformed encoding: truncated BIT STRING detected"
        );

        let err = Asn1Error::InvalidArgument("illegal object in get_instance: i64".to_string());
        assert!(err.is_invalid_argument());
    }
}
