//! Non-blocking duplex byte stream abstraction.
//!
//! The protocol layers above this crate only ever see two capabilities:
//! - [`ByteSource`]: hand over whatever bytes are already buffered, never block
//! - [`ByteSink`]: write a run of bytes
//!
//! Implementations provided here:
//! - [`MemoryLink`]: an in-memory connected pair, for tests and self-checks
//! - [`IoStream`]: any `std::io` stream put into non-blocking mode
//! - `SerialLink`: a UART opened through `serialport` (feature `serial`)
//!
//! Radio pairing and AT-command configuration happen before a stream reaches
//! this crate.

pub mod error;
pub mod io;
pub mod memory;
#[cfg(feature = "serial")]
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use io::IoStream;
pub use memory::MemoryLink;
#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialLink, DEFAULT_BAUD_RATE};
pub use traits::{ByteSink, ByteSource};
