//! Serial link abstraction
//!
//! The transaction engine only needs three primitives from the wire: how many
//! bytes are waiting, read one, write one. Anything that can provide them
//! (a hardware port, the emulator, a test double) can carry transactions.

use serialport::SerialPort;
use std::io::{Read, Write};

use super::ProtocolError;

/// Byte-stream link to the module
pub trait SerialLink {
    /// Get number of bytes available to read without blocking
    fn bytes_available(&mut self) -> Result<usize, ProtocolError>;

    /// Read one byte. Only called after `bytes_available` reported data.
    fn read_byte(&mut self) -> Result<u8, ProtocolError>;

    /// Write one byte
    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError>;

    /// Push written bytes onto the wire
    fn flush(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    fn bytes_available(&mut self) -> Result<usize, ProtocolError> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        (**self).flush()
    }
}

impl<T: SerialLink + ?Sized> SerialLink for Box<T> {
    fn bytes_available(&mut self) -> Result<usize, ProtocolError> {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        (**self).flush()
    }
}

/// Serial port wrapper implementing SerialLink
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Port name as reported by the OS, if any
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl SerialLink for SerialChannel {
    fn bytes_available(&mut self) -> Result<usize, ProtocolError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }

    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.port.write_all(&[byte])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        self.port.flush()?;
        Ok(())
    }
}
