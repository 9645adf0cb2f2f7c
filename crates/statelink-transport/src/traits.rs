use crate::error::Result;

/// Receive half of a duplex byte stream.
///
/// `read_available` copies bytes that are already buffered by the underlying
/// device into `buf` and returns how many were copied. It returns `Ok(0)`
/// when nothing is pending and must never wait for more data to arrive.
pub trait ByteSource {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Transmit half of a duplex byte stream.
///
/// Whether `write_bytes` blocks is up to the implementation. A partial
/// write is never reported as success.
pub trait ByteSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects written bytes, e.g. to stage a frame before splitting it up.
impl ByteSink for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_available(buf)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_bytes(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
