//! Codec configuration
//!
//! Decoding is driven by a [`DecoderConfig`], which selects the encoding
//! profile and the limits applied to untrusted input. Output buffering is
//! sized through [`WriterConfig`]. Both types deserialize with defaults for
//! every missing field, so they can be embedded in an application's own
//! configuration file.

use crate::error::{Asn1Error, Asn1Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default upper bound for a single definite length (16 MiB)
pub const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Default bound for nested constructed values
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default capacity of the secure output buffer
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Encoding rules profile
///
/// - **Ber**: permissive; indefinite lengths and constructed strings allowed
/// - **Dl**: definite lengths only, no canonical minimality enforced
/// - **Der**: definite lengths only, exactly one valid encoding per value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingProfile {
    #[default]
    Ber,
    Dl,
    Der,
}

impl EncodingProfile {
    /// Whether the `0x80` indefinite length form may appear
    pub fn allows_indefinite_length(self) -> bool {
        matches!(self, EncodingProfile::Ber)
    }

    /// Whether constructed (segmented) primitive string types may appear
    ///
    /// DL accepts them with definite lengths; only DER requires the
    /// primitive form.
    pub fn allows_constructed_strings(self) -> bool {
        !matches!(self, EncodingProfile::Der)
    }

    /// Whether tags and lengths must use their shortest encoding
    pub fn requires_minimal_encoding(self) -> bool {
        matches!(self, EncodingProfile::Der)
    }

    /// Pad bit policy used when none is configured explicitly
    pub fn default_pad_bit_policy(self) -> PadBitPolicy {
        match self {
            EncodingProfile::Der => PadBitPolicy::Reject,
            EncodingProfile::Ber | EncodingProfile::Dl => PadBitPolicy::Preserve,
        }
    }
}

impl fmt::Display for EncodingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EncodingProfile::Ber => "BER",
            EncodingProfile::Dl => "DL",
            EncodingProfile::Der => "DER",
        };
        f.write_str(name)
    }
}

/// Treatment of a decoded bit string whose unused bits are not zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadBitPolicy {
    /// Fail with a malformed-encoding error
    Reject,
    /// Accept and zero the unused bits
    Mask,
    /// Accept and keep the bits exactly as read
    Preserve,
}

/// Decoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub profile: EncodingProfile,
    /// Largest definite length accepted for any single value
    pub max_length: usize,
    /// Largest nesting of constructed values
    pub max_depth: usize,
    /// `None` uses the profile's default policy
    pub pad_bit_policy: Option<PadBitPolicy>,
    /// Check restricted-alphabet strings against their alphabet on decode
    pub validate_strings: bool,
}

impl DecoderConfig {
    pub fn new(profile: EncodingProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    pub fn ber() -> Self {
        Self::new(EncodingProfile::Ber)
    }

    pub fn dl() -> Self {
        Self::new(EncodingProfile::Dl)
    }

    pub fn der() -> Self {
        Self::new(EncodingProfile::Der)
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_pad_bit_policy(mut self, policy: PadBitPolicy) -> Self {
        self.pad_bit_policy = Some(policy);
        self
    }

    pub fn with_string_validation(mut self, validate: bool) -> Self {
        self.validate_strings = validate;
        self
    }

    /// Effective pad bit policy
    pub fn pad_bits(&self) -> PadBitPolicy {
        self.pad_bit_policy
            .unwrap_or_else(|| self.profile.default_pad_bit_policy())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            profile: EncodingProfile::default(),
            max_length: DEFAULT_MAX_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            pad_bit_policy: None,
            validate_strings: false,
        }
    }
}

/// Secure writer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub buffer_size: usize,
}

impl WriterConfig {
    pub fn new(buffer_size: usize) -> Asn1Result<Self> {
        let config = Self { buffer_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Asn1Result<()> {
        if self.buffer_size == 0 {
            return Err(Asn1Error::InvalidArgument(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}
