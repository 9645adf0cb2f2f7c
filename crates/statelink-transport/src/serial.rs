use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, ByteSource};

/// Factory baud rate of HC-05 style modules in data mode.
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// How to open a UART.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: PathBuf,
    /// Line rate. Default: 38400.
    pub baud_rate: u32,
    /// Upper bound for a single blocking write.
    pub write_timeout: Duration,
}

impl SerialConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout: Duration::from_millis(500),
        }
    }
}

/// A UART carrying an already-paired radio link, 8N1, no flow control.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    path: PathBuf,
}

impl SerialLink {
    /// Open the port described by `config` and discard anything the device
    /// had buffered before we attached.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let path_str = config.path.to_string_lossy().into_owned();
        let port = serialport::new(path_str, config.baud_rate)
            .timeout(config.write_timeout)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| TransportError::Open {
                path: config.path.clone(),
                source: std::io::Error::from(e),
            })?;

        if let Err(err) = port.clear(serialport::ClearBuffer::Input) {
            debug!(?err, "could not clear serial input buffer");
        }

        info!(path = ?config.path, baud = config.baud_rate, "opened serial link");

        Ok(Self {
            port,
            path: config.path.clone(),
        })
    }

    /// Device path this link was opened from.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ByteSource for SerialLink {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|e| TransportError::Io(e.into()))? as usize;
        let want = pending.min(buf.len());
        if want == 0 {
            return Ok(0);
        }

        loop {
            match self.port.read(&mut buf[..want]) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl ByteSink for SerialLink {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes).map_err(TransportError::Io)
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush().map_err(TransportError::Io)
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink").field("path", &self.path).finish()
    }
}
