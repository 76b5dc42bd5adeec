//! Byte streams and exclusive connections.
//!
//! _Requires Cargo feature `std`._

use std::io;

use tracing::{debug, warn};

/// Serial settings required by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Live sampling: short timeout, no flow control.
    Live,
    /// Bulk transfer: long timeout, software flow control.
    Bulk,
}

/// A blocking byte-level link to the device.
///
/// Implementations must report a read timeout as `Ok(None)` rather than an
/// error.
pub trait ByteStream {
    /// Open the link with the settings for `mode`.
    ///
    /// Opening an open link must succeed, reconfiguring it if the mode differs.
    fn open(&mut self, mode: Mode) -> io::Result<()>;
    /// Close the link. Closing a closed link must succeed.
    fn close(&mut self) -> io::Result<()>;
    fn is_open(&self) -> bool;

    /// Read a single byte, blocking up to the configured timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Discard any received but unread bytes.
    fn flush_input(&mut self) -> io::Result<()>;
    /// Block until written bytes are transmitted.
    fn flush_output(&mut self) -> io::Result<()>;
}

/// Exclusive use of a stream for the length of one session.
///
/// The stream is closed when the connection is dropped, whatever the exit path.
#[derive(Debug)]
pub struct Connection<'a, S: ByteStream + ?Sized> {
    stream: &'a mut S,
    mode: Mode,
}

impl<'a, S: ByteStream + ?Sized> Connection<'a, S> {
    /// Take the stream for a session in `mode`, without opening it yet.
    pub fn new(stream: &'a mut S, mode: Mode) -> Self {
        Self { stream, mode }
    }

    /// Open the stream. Opening an open stream only applies the mode.
    pub fn open(&mut self) -> io::Result<()> {
        let reopen = self.stream.is_open();
        self.stream.open(self.mode)?;
        debug!(mode = ?self.mode, reopen, "opened stream");
        Ok(())
    }

    /// Close the stream if it is open.
    pub fn close(&mut self) -> io::Result<()> {
        if self.stream.is_open() {
            self.stream.close()?;
            debug!(mode = ?self.mode, "closed stream");
        }
        Ok(())
    }

    pub fn stream(&mut self) -> &mut S {
        &mut *self.stream
    }

    /// Read a fixed number of bytes, or `None` on a timeout.
    pub fn take<const N: usize>(&mut self) -> io::Result<Option<[u8; N]>> {
        let mut buf = [0; N];
        for b in buf.iter_mut() {
            match self.stream.read_byte()? {
                Some(r) => *b = r,
                None => return Ok(None),
            }
        }
        Ok(Some(buf))
    }
}

impl<S: ByteStream + ?Sized> Drop for Connection<'_, S> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(%err, "failed to close stream");
        }
    }
}
