use bytes::BytesMut;
use statelink_transport::ByteSink;
use tracing::trace;

use crate::codec::{encode_frame, find_marker, FRAME_SIZE, MARKER_SIZE};
use crate::error::{FrameError, Result};
use crate::record::Record;

/// Writes records as complete frames to any [`ByteSink`].
///
/// Each [`send`](Self::send) is one write of the full 28-byte frame followed
/// by a flush. Nothing is acknowledged and nothing is retried.
#[derive(Debug)]
pub struct Transmitter {
    buf: BytesMut,
    frames_sent: u64,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(FRAME_SIZE),
            frames_sent: 0,
        }
    }

    /// Encode `record` and write it to `sink`.
    ///
    /// A record whose encoding contains the marker is rejected with
    /// [`FrameError::MarkerCollision`] before any byte is written. Sink
    /// failures are returned as [`FrameError::Transport`].
    pub fn send<S: ByteSink + ?Sized>(&mut self, sink: &mut S, record: &Record) -> Result<()> {
        self.buf.clear();
        encode_frame(record, &mut self.buf);

        if let Some(offset) = find_marker(&self.buf[MARKER_SIZE..]) {
            return Err(FrameError::MarkerCollision { offset });
        }

        sink.write_bytes(&self.buf)?;
        sink.flush()?;

        self.frames_sent += 1;
        trace!(frames = self.frames_sent, "frame sent");
        Ok(())
    }

    /// Number of frames handed to a sink so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }
}
