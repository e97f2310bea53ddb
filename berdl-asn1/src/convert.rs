//! Conversion dispatch
//!
//! [`Asn1Convert`] normalizes loosely-typed or tagged input into one
//! concrete type. A type supplies the branches that apply to it and
//! inherits their composition:
//!
//! 1. `Null` short-circuits to `None`
//! 2. a value of the same type is copied
//! 3. a value of a convertible sibling type is copied into this type
//! 4. raw bytes are decoded, codec failures becoming `InvalidArgument`
//! 5. a tagged object is unwrapped by its explicit/implicit tagging
//! 6. anything else is rejected, naming the input's kind
//!
//! Branches 2 and 3 are both served by [`Asn1Convert::from_value`]; a type
//! without siblings only matches itself there.

use crate::ber::decoder;
use crate::types::TaggedObject;
use crate::value::{Asn1Object, Asn1Value};
use berdl_core::{Asn1Error, Asn1Result};

pub trait Asn1Convert: Sized {
    /// Name of the target type
    const KIND: &'static str;

    /// Whether `value` already is the target type
    fn is_instance(value: &Asn1Value) -> bool;

    /// Copy of `value` if it is the target type or a convertible sibling
    fn from_value(value: &Asn1Value) -> Option<Self>;

    /// Rebuild from the contents octets of an implicitly tagged value
    fn from_contents(octets: &[u8]) -> Asn1Result<Self>;

    /// Decode one value from `bytes` and convert it
    fn from_encoded(bytes: &[u8]) -> Asn1Result<Self> {
        let value = decoder::decode(bytes).map_err(|e| {
            Asn1Error::InvalidArgument(format!("encoding error in get_instance: {}", e))
        })?;
        Self::from_value(&value).ok_or_else(|| illegal_object(value.kind()))
    }

    /// Normalize `obj` into the target type
    ///
    /// # Returns
    /// `Ok(None)` for `Asn1Object::Null`.
    ///
    /// # Errors
    /// `InvalidArgument` naming the input's kind if it cannot be converted.
    fn get_instance(obj: &Asn1Object) -> Asn1Result<Option<Self>> {
        match obj {
            Asn1Object::Null => Ok(None),
            Asn1Object::Value(value) => Self::from_value(value)
                .map(Some)
                .ok_or_else(|| illegal_object(value.kind())),
            Asn1Object::Encoded(bytes) => Self::from_encoded(bytes).map(Some),
            other => Err(illegal_object(other.kind())),
        }
    }

    /// Normalize the content of a tagged object
    ///
    /// With explicit tagging, or when the inner value already is the
    /// target type, the inner value is converted directly. Otherwise the
    /// inner value's contents octets are reinterpreted as the contents of
    /// the target type.
    fn get_instance_tagged(obj: &TaggedObject, explicit: bool) -> Asn1Result<Self> {
        let inner = obj.object();
        if explicit || Self::is_instance(inner) {
            return Self::from_value(inner).ok_or_else(|| illegal_object(inner.kind()));
        }
        Self::from_contents(&inner.content_octets()?)
    }
}

fn illegal_object(kind: &str) -> Asn1Error {
    log::debug!("conversion rejected input of kind {}", kind);
    Asn1Error::InvalidArgument(format!("illegal object in get_instance: {}", kind))
}
