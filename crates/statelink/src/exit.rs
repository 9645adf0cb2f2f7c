use std::fmt;
use std::io;

use statelink_frame::FrameError;
use statelink_transport::TransportError;

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { path, source } => {
            io_error(&format!("{context} ({})", path.display()), source)
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::MarkerCollision { .. }
        | FrameError::InvalidLength { .. }
        | FrameError::InvalidMarker => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}
