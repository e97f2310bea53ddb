//! Byte sinks and secure buffered output

pub mod buffering;
pub mod sink;

pub use buffering::BufferingWriter;
pub use sink::ByteSink;
