use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource};

#[derive(Debug, Default)]
struct Pipe {
    queue: VecDeque<u8>,
    writer_gone: bool,
    reader_gone: bool,
}

type SharedPipe = Arc<Mutex<Pipe>>;

fn lock(pipe: &SharedPipe) -> MutexGuard<'_, Pipe> {
    pipe.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One end of an in-memory duplex link.
///
/// Bytes written on one end become readable on the other, in order, with no
/// loss. Either end may be moved to another thread.
#[derive(Debug)]
pub struct MemoryLink {
    inbound: SharedPipe,
    outbound: SharedPipe,
}

impl MemoryLink {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let a_to_b = SharedPipe::default();
        let b_to_a = SharedPipe::default();
        let a = Self {
            inbound: Arc::clone(&b_to_a),
            outbound: Arc::clone(&a_to_b),
        };
        let b = Self {
            inbound: a_to_b,
            outbound: b_to_a,
        };
        (a, b)
    }

    /// Number of bytes waiting to be read on this end.
    pub fn pending(&self) -> usize {
        lock(&self.inbound).queue.len()
    }
}

impl ByteSource for MemoryLink {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut pipe = lock(&self.inbound);
        if pipe.queue.is_empty() {
            if pipe.writer_gone {
                return Err(TransportError::Closed);
            }
            return Ok(0);
        }

        let n = pipe.queue.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.queue.drain(..n)) {
            *slot = byte;
        }
        trace!(n, "memory link read");
        Ok(n)
    }
}

impl ByteSink for MemoryLink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let mut pipe = lock(&self.outbound);
        if pipe.reader_gone {
            return Err(TransportError::Closed);
        }
        pipe.queue.extend(bytes);
        Ok(())
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        lock(&self.outbound).writer_gone = true;
        lock(&self.inbound).reader_gone = true;
    }
}
