//! Closable byte sinks

use std::fs::File;
use std::io::{self, Cursor, Write};

/// A byte sink that can be closed
///
/// `std::io::Write` has no notion of closing; writers that own a resource
/// (a file, a socket, another buffering layer) release it in `close`. The
/// default implementation only flushes.
pub trait ByteSink: Write {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl ByteSink for Vec<u8> {}

impl ByteSink for Cursor<Vec<u8>> {}

impl ByteSink for io::Sink {}

impl ByteSink for File {
    fn close(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
