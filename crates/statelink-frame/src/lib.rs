//! Marker-synchronized framing for a fixed six-field state record.
//!
//! This is the core of statelink. Every frame on the wire is:
//! - A 4-byte synchronization marker (`A5 5A A5 7F`)
//! - Six little-endian IEEE-754 `f32` fields in [`Field`] order
//!
//! The [`Reassembler`] is a poll-driven state machine: each tick drains the
//! bytes already buffered by a [`ByteSource`](statelink_transport::ByteSource)
//! and never blocks. A marker seen anywhere restarts field collection, which
//! is the only integrity mechanism. There is no checksum, and a frame that
//! never completes is dropped silently.

pub mod codec;
pub mod error;
pub mod reassembler;
pub mod record;
pub mod transmitter;

pub use codec::{
    decode_field, decode_field_array, decode_frame, encode_field, encode_frame, find_marker,
    FIELD_SIZE, FRAME_SIZE, MARKER, MARKER_SIZE, PAYLOAD_SIZE,
};
pub use error::{FrameError, Result};
pub use reassembler::{ReassemblerConfig, Reassembler, ReassemblerState, ReassemblerStats};
pub use record::{Field, Record, FIELD_COUNT};
pub use transmitter::Transmitter;
