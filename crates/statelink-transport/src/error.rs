use std::path::PathBuf;

/// Errors that can occur on a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device at the specified path.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer end of the stream is gone.
    #[error("stream closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
