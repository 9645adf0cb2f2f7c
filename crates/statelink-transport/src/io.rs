use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource};

/// Adapts a `std::io` stream to the byte stream traits.
///
/// The wrapped stream is expected to be in non-blocking mode (or to carry a
/// very short read timeout): `WouldBlock` and `TimedOut` from `read` mean
/// "nothing buffered" and become `Ok(0)`. A zero-length read means the peer
/// closed the stream and is reported as [`TransportError::Closed`].
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
}

impl<T> IoStream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the adapter and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> ByteSource for IoStream<T> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.inner.read(buf) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(0)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Write> ByteSink for IoStream<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}
