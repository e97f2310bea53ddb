//! Concrete value types

pub mod bit_string;
pub mod numeric_string;
pub mod octet_string;
pub mod tagged;

pub use bit_string::{BitString, BitStringForm, DerBitString, DerForm, DlBitString, DlForm};
pub use numeric_string::NumericString;
pub use octet_string::OctetString;
pub use tagged::TaggedObject;
