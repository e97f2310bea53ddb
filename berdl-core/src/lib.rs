//! Core types and utilities for berdl
//!
//! This crate provides the error taxonomy, codec configuration and the
//! secure buffered output used throughout the berdl implementation.

pub mod config;
pub mod error;
pub mod io;

pub use config::{DecoderConfig, EncodingProfile, PadBitPolicy, WriterConfig};
pub use error::{Asn1Error, Asn1Result};
pub use io::{BufferingWriter, ByteSink};
