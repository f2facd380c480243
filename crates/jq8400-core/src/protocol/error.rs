//! Protocol errors

use thiserror::Error;

/// Errors that can occur during a transaction with the module
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// The reply stopped arriving. `received` counts the frame bytes read
    /// before the stall; zero means the module never answered.
    #[error("Reply timeout after {received} byte(s)")]
    Timeout { received: usize },

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Incomplete frame: got {received} of {expected} bytes")]
    IncompleteFrame { received: usize, expected: usize },

    #[error("Payload too large: {0} bytes (max 255)")]
    PayloadTooLarge(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Module not ready after {attempts} reset attempt(s)")]
    NotReady { attempts: u32 },

    #[error("Module returned unexpected status {0:#04x}")]
    UnexpectedStatus(u8),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the module simply did not answer in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProtocolError::Timeout { .. })
    }
}
