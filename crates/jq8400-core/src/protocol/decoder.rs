//! Incremental response decoding
//!
//! Replies arrive one byte at a time from a link with no end delimiter, so the
//! decoder is a small state machine fed by the transport. The marker and the
//! command echo only contribute to the checksum; payload bytes are copied into
//! a caller-owned buffer while it has room and dropped (but still summed) after
//! that.
//!
//! Whenever a frame fails, the destination buffer is zero-filled before the
//! error is handed back, so a failed reply never leaves stale or partial data.

use tracing::{debug, warn};

use super::{ProtocolError, START_MARKER};

/// Metadata about a successfully validated reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Command echoed by the module
    pub command: u8,
    /// Payload length the module declared
    pub declared_len: usize,
    /// Payload bytes copied into the destination buffer
    pub copied: usize,
}

impl Reply {
    /// Whether the destination was too small for the declared payload
    pub fn is_truncated(&self) -> bool {
        self.copied < self.declared_len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Marker,
    Command,
    Length,
    Payload { remaining: usize },
    Checksum,
    Done,
}

/// Byte-at-a-time decoder for one response frame
pub struct FrameDecoder<'a> {
    dest: &'a mut [u8],
    stage: Stage,
    sum: u8,
    command: u8,
    declared_len: usize,
    offset: usize,
    received: usize,
}

impl<'a> FrameDecoder<'a> {
    /// Create a decoder writing into `dest`, which is zeroed first
    pub fn new(dest: &'a mut [u8]) -> Self {
        dest.fill(0);
        Self {
            dest,
            stage: Stage::Marker,
            sum: 0,
            command: 0,
            declared_len: 0,
            offset: 0,
            received: 0,
        }
    }

    /// Number of frame bytes consumed so far
    pub fn received(&self) -> usize {
        self.received
    }

    /// Whether a full frame has been consumed
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Feed one byte.
    ///
    /// Returns `None` while more bytes are needed, or the frame outcome once
    /// the checksum byte has been consumed. Bytes pushed after that are ignored.
    pub fn push(&mut self, byte: u8) -> Option<Result<Reply, ProtocolError>> {
        if self.stage == Stage::Done {
            return None;
        }
        self.received += 1;

        match self.stage {
            Stage::Marker => {
                if byte != START_MARKER {
                    debug!("reply starts with {:#04x} instead of the marker", byte);
                }
                self.sum = self.sum.wrapping_add(byte);
                self.stage = Stage::Command;
                None
            }
            Stage::Command => {
                self.command = byte;
                self.sum = self.sum.wrapping_add(byte);
                self.stage = Stage::Length;
                None
            }
            Stage::Length => {
                self.declared_len = byte as usize;
                self.sum = self.sum.wrapping_add(byte);
                self.stage = if byte == 0 {
                    Stage::Checksum
                } else {
                    Stage::Payload {
                        remaining: self.declared_len,
                    }
                };
                None
            }
            Stage::Payload { remaining } => {
                if let Some(slot) = self.dest.get_mut(self.offset) {
                    *slot = byte;
                }
                self.offset += 1;
                self.sum = self.sum.wrapping_add(byte);
                self.stage = if remaining > 1 {
                    Stage::Payload {
                        remaining: remaining - 1,
                    }
                } else {
                    Stage::Checksum
                };
                None
            }
            Stage::Checksum => {
                self.stage = Stage::Done;
                Some(self.validate(byte))
            }
            Stage::Done => None,
        }
    }

    fn validate(&mut self, actual: u8) -> Result<Reply, ProtocolError> {
        if actual != self.sum {
            warn!(
                "reply checksum mismatch: computed {:#04x}, received {:#04x}",
                self.sum, actual
            );
            self.dest.fill(0);
            return Err(ProtocolError::ChecksumMismatch {
                expected: self.sum,
                actual,
            });
        }

        let reply = Reply {
            command: self.command,
            declared_len: self.declared_len,
            copied: self.declared_len.min(self.dest.len()),
        };
        if reply.is_truncated() {
            warn!(
                "reply for {:#04x} truncated: {} byte payload, {} byte buffer",
                reply.command,
                reply.declared_len,
                self.dest.len()
            );
        }
        Ok(reply)
    }

    /// Give up on an unfinished frame: zero the destination and report how far
    /// decoding got.
    pub fn abort(self) -> ProtocolError {
        self.dest.fill(0);
        ProtocolError::Timeout {
            received: self.received,
        }
    }

    /// Zero the destination without consuming the decoder
    pub fn clear(&mut self) {
        self.dest.fill(0);
    }
}
