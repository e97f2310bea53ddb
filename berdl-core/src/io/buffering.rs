//! Buffered output that zeroes its buffer on every flush
//!
//! Encoded values frequently carry key material. [`BufferingWriter`] keeps
//! that material in exactly one fixed-size buffer that it owns, and wipes
//! the whole buffer every time its contents leave for the underlying sink,
//! when it is closed, and when it is dropped.
//!
//! # Write Strategy
//!
//! - Input shorter than the remaining capacity is copied into the buffer
//! - Otherwise the gap is filled and the buffer flushed, whole
//!   capacity-sized chunks go straight to the sink, and the remainder
//!   (less than one buffer) is buffered

use crate::config::{DEFAULT_BUFFER_SIZE, WriterConfig};
use crate::error::Asn1Result;
use crate::io::sink::ByteSink;
use std::io::{self, Write};
use std::ptr;
use std::sync::atomic::{self, Ordering};

/// Chunked writer over a [`ByteSink`] with mandatory zeroing on flush
///
/// A writer must be driven by one caller at a time; all operations take
/// `&mut self`.
pub struct BufferingWriter<S: ByteSink> {
    sink: S,
    buf: Box<[u8]>,
    buf_off: usize,
    closed: bool,
}

impl<S: ByteSink> BufferingWriter<S> {
    /// Create a writer with the default buffer size (4096 bytes)
    pub fn new(sink: S) -> Self {
        Self::from_parts(sink, DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer with a specific buffer size
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `capacity` is zero.
    pub fn with_capacity(sink: S, capacity: usize) -> Asn1Result<Self> {
        Self::with_config(sink, &WriterConfig {
            buffer_size: capacity,
        })
    }

    pub fn with_config(sink: S, config: &WriterConfig) -> Asn1Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(sink, config.buffer_size))
    }

    fn from_parts(sink: S, capacity: usize) -> Self {
        Self {
            sink,
            buf: vec![0u8; capacity].into_boxed_slice(),
            buf_off: 0,
            closed: false,
        }
    }

    /// Buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes currently held in the buffer
    pub fn buffered(&self) -> usize {
        self.buf_off
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::other("writer is closed"));
        }
        Ok(())
    }

    fn push(&mut self, bytes: &[u8]) {
        let end = self.buf_off + bytes.len();
        self.buf[self.buf_off..end].copy_from_slice(bytes);
        self.buf_off = end;
    }

    /// Hand the buffered bytes to the sink, then wipe the buffer.
    ///
    /// The buffer is reset and zeroed whether or not the sink accepted the
    /// bytes.
    fn flush_buffer(&mut self) -> io::Result<()> {
        let result = if self.buf_off > 0 {
            log::trace!("flushing {} buffered bytes", self.buf_off);
            self.sink.write_all(&self.buf[..self.buf_off])
        } else {
            Ok(())
        };
        self.buf_off = 0;
        wipe(&mut self.buf);
        result
    }
}

impl<S: ByteSink> Write for BufferingWriter<S> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.ensure_open()?;

        let capacity = self.buf.len();
        let gap = capacity - self.buf_off;
        if bytes.len() < gap {
            self.push(bytes);
            return Ok(bytes.len());
        }

        let (head, mut rest) = bytes.split_at(gap);
        self.push(head);
        self.flush_buffer()?;

        while rest.len() >= capacity {
            let (chunk, tail) = rest.split_at(capacity);
            self.sink.write_all(chunk)?;
            rest = tail;
        }

        if !rest.is_empty() {
            self.push(rest);
        }

        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.flush_buffer()?;
        self.sink.flush()
    }
}

impl<S: ByteSink> ByteSink for BufferingWriter<S> {
    /// Flush, then close the sink.
    ///
    /// The sink is closed even if the flush failed; the first error wins.
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let flushed = self.flush_buffer().and_then(|()| self.sink.flush());
        let closed = self.sink.close();
        if let Err(e) = &flushed {
            log::debug!("flush failed while closing writer: {}", e);
        }
        flushed.and(closed)
    }
}

impl<S: ByteSink> Drop for BufferingWriter<S> {
    fn drop(&mut self) {
        if !self.closed && self.buf_off > 0 {
            log::warn!(
                "buffering writer dropped with {} unflushed bytes; flushing",
                self.buf_off
            );
            if let Err(e) = self.flush_buffer() {
                log::error!("Failed to flush buffering writer on drop: {}", e);
            }
        }
        wipe(&mut self.buf);
    }
}

/// Volatile zeroing of the whole buffer, fenced so the writes are not
/// reordered past later use
fn wipe(buf: &mut [u8]) {
    let base = buf.as_mut_ptr();
    // SAFETY: every offset is below `buf.len()`, so each write stays inside
    // the exclusively borrowed slice.
    unsafe {
        for i in 0..buf.len() {
            ptr::write_volatile(base.add(i), 0);
        }
    }
    atomic::compiler_fence(Ordering::SeqCst);
}
