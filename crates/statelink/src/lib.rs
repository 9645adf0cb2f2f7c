//! Poll-driven state record exchange over paired UART radio links.
//!
//! One node periodically sends a six-field [`frame::Record`]; the other
//! rebuilds it from whatever bytes each poll of the link yields.
//!
//! # Crate Structure
//!
//! - [`transport`]: non-blocking byte stream abstraction (memory, `std::io`, serial)
//! - [`frame`]: field codec, record model, reassembler and transmitter
//!
//! ```no_run
//! use statelink::frame::{Reassembler, Record, Transmitter};
//! use statelink::transport::MemoryLink;
//!
//! let (mut tx, mut rx) = MemoryLink::pair();
//! Transmitter::new()
//!     .send(&mut tx, &Record::from_array([1.1, 2.2, 3.3, 4.4, 5.5, 6.6]))
//!     .unwrap();
//!
//! let mut reassembler = Reassembler::new();
//! while !reassembler.is_ready() {
//!     reassembler.tick(&mut rx).unwrap();
//! }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use statelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use statelink_frame::*;
}
