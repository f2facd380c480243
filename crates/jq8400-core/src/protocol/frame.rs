//! Frame encoding
//!
//! Every frame, in both directions, has the same layout:
//! - 1 byte: start marker (0xAA)
//! - 1 byte: command code
//! - 1 byte: payload length L
//! - L bytes: payload
//! - 1 byte: checksum (8-bit wrapping sum of all preceding bytes)
//!
//! There is no end delimiter, so the length byte is load-bearing.

use byteorder::{BigEndian, ByteOrder};

use super::{decoder::FrameDecoder, ProtocolError, MAX_PAYLOAD_LEN, START_MARKER};

/// Size of the marker, command and length header
pub const HEADER_LEN: usize = 3;

/// Compute the 8-bit wrapping sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Split a 16-bit argument into its wire form (high byte first)
pub fn encode_u16(value: u16) -> [u8; 2] {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, value);
    bytes
}

/// Read a 16-bit value in wire order from the first two bytes of `bytes`
pub fn decode_u16(bytes: &[u8]) -> u16 {
    match bytes {
        [hi, lo, ..] => BigEndian::read_u16(&[*hi, *lo]),
        [hi] => u16::from(*hi) << 8,
        [] => 0,
    }
}

/// A request or response frame.
///
/// Fields are private so every frame goes through a constructor and the
/// payload always fits the 8-bit length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: u8,
    payload: Vec<u8>,
}

impl Frame {
    /// Create a frame, rejecting payloads that do not fit the 8-bit length field
    pub fn new(command: u8, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLarge(payload.len()));
        }
        Ok(Self { command, payload })
    }

    /// A frame with no arguments
    pub fn empty(command: u8) -> Self {
        Self {
            command,
            payload: Vec::new(),
        }
    }

    /// A frame with a single byte argument
    pub fn with_u8(command: u8, arg: u8) -> Self {
        Self {
            command,
            payload: vec![arg],
        }
    }

    /// A frame with a 16-bit argument, sent big-endian
    pub fn with_u16(command: u8, arg: u16) -> Self {
        Self {
            command,
            payload: encode_u16(arg).to_vec(),
        }
    }

    /// Command code (or its echo in a response)
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Frame payload, at most 255 bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Checksum of the encoded header and payload
    pub fn checksum(&self) -> u8 {
        let header = [START_MARKER, self.command, self.payload.len() as u8];
        checksum(&header).wrapping_add(checksum(&self.payload))
    }

    /// Encode the frame to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.encoded_size());
        bytes.push(START_MARKER);
        bytes.push(self.command);
        bytes.push(self.payload.len() as u8);
        bytes.extend_from_slice(&self.payload);
        bytes.push(self.checksum());
        bytes
    }

    /// Get the total encoded size
    pub fn encoded_size(&self) -> usize {
        HEADER_LEN + self.payload.len() + 1
    }

    /// Decode a complete frame from raw bytes.
    ///
    /// Bytes after the checksum are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ProtocolError> {
        let expected = match data.get(2) {
            Some(len) => HEADER_LEN + *len as usize + 1,
            None => HEADER_LEN + 1,
        };
        if data.len() < expected {
            return Err(ProtocolError::IncompleteFrame {
                received: data.len(),
                expected,
            });
        }

        let mut payload = vec![0u8; expected - HEADER_LEN - 1];
        let mut decoder = FrameDecoder::new(&mut payload);
        let mut outcome = None;
        for byte in &data[..expected] {
            outcome = decoder.push(*byte);
        }
        let reply = match outcome {
            Some(result) => result?,
            None => return Err(decoder.abort()),
        };

        Ok(Self {
            command: reply.command,
            payload,
        })
    }
}

/// Encode a command and payload straight to wire bytes
pub fn encode(command: u8, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    Ok(Frame::new(command, payload.to_vec())?.to_bytes())
}

/// Builder for frames with composite payloads
pub struct FrameBuilder {
    command: u8,
    payload: Vec<u8>,
}

impl FrameBuilder {
    /// Start a frame for `command`
    pub fn new(command: u8) -> Self {
        Self {
            command,
            payload: Vec::new(),
        }
    }

    /// Add a single byte
    pub fn byte(mut self, b: u8) -> Self {
        self.payload.push(b);
        self
    }

    /// Add a 16-bit value (big-endian)
    pub fn u16_be(mut self, value: u16) -> Self {
        self.payload.extend_from_slice(&encode_u16(value));
        self
    }

    /// Add raw bytes
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.payload.extend_from_slice(data);
        self
    }

    /// Build the frame
    pub fn build(self) -> Result<Frame, ProtocolError> {
        Frame::new(self.command, self.payload)
    }
}
