use statelink_transport::TransportError;

/// Errors that can occur during field/frame encoding, decoding and I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A field or frame buffer has the wrong number of bytes.
    #[error("invalid length ({len} bytes, expected {expected})")]
    InvalidLength { len: usize, expected: usize },

    /// A whole-frame buffer does not start with the marker.
    #[error("invalid frame marker (expected A5 5A A5 7F)")]
    InvalidMarker,

    /// The encoded record contains the marker, so a receiver would
    /// resynchronize inside it.
    #[error("encoded record contains the frame marker at payload offset {offset}")]
    MarkerCollision { offset: usize },

    /// The underlying byte stream failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
