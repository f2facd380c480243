//! Serial Protocol Communication
//!
//! Implements the JQ8400 command/response protocol: checksummed frames
//! exchanged one transaction at a time over a byte-oriented serial link.

pub mod clock;
mod decoder;
mod error;
pub mod frame;
mod link;
pub mod serial;
mod transport;

pub use clock::{Clock, SystemClock};
pub use decoder::{FrameDecoder, Reply};
pub use error::ProtocolError;
pub use frame::{checksum, encode, encode_u16, Frame, FrameBuilder};
pub use link::{SerialChannel, SerialLink};
pub use serial::{clear_buffers, configure_port, open_channel, open_port};
pub use transport::{Transport, TransportConfig};

/// Sentinel byte opening every frame
pub const START_MARKER: u8 = 0xAA;

/// Largest payload the 8-bit length field can describe
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Default baud rate of the module
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Quiet period that ends the pre-send drain, in milliseconds
pub const DRAIN_TIMEOUT_MS: u64 = 10;

/// Wait for the first reply byte, in milliseconds
pub const REPLY_TIMEOUT_MS: u64 = 1000;

/// Wait for each subsequent reply byte, in milliseconds
pub const INTER_BYTE_TIMEOUT_MS: u64 = 150;

/// Upper bound on bytes discarded by a single drain
pub const MAX_DRAIN_BYTES: usize = 1024;
