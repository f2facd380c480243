//! Transaction engine
//!
//! Drives one request/response exchange at a time over a [`SerialLink`]:
//! drain stray input, write the encoded frame, then (if a reply is wanted)
//! read and validate the reply with bounded busy-wait polling.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{
    clock::{Clock, SystemClock},
    decoder::{FrameDecoder, Reply},
    frame::{decode_u16, encode_u16, Frame},
    link::SerialLink,
    ProtocolError, DEFAULT_BAUD_RATE, DRAIN_TIMEOUT_MS, INTER_BYTE_TIMEOUT_MS, MAX_DRAIN_BYTES,
    REPLY_TIMEOUT_MS,
};

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Probe used to decide the line is quiet before sending
    pub drain_timeout_ms: u64,
    /// Wait for the first byte of a reply
    pub reply_timeout_ms: u64,
    /// Wait for each following byte; a longer gap ends the reply
    pub inter_byte_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            drain_timeout_ms: DRAIN_TIMEOUT_MS,
            reply_timeout_ms: REPLY_TIMEOUT_MS,
            inter_byte_timeout_ms: INTER_BYTE_TIMEOUT_MS,
        }
    }
}

/// Request/response engine bound to one link.
///
/// Every operation takes `&mut self`, so a second transaction cannot start
/// while a reply is still being read.
pub struct Transport<L, C = SystemClock>
where
    L: SerialLink,
    C: Clock,
{
    link: L,
    clock: C,
    config: TransportConfig,
    tx_bytes: u64,
    rx_bytes: u64,
    tx_frames: u64,
    rx_frames: u64,
}

impl<L: SerialLink> Transport<L, SystemClock> {
    /// Create a transport timed by the system clock
    pub fn with_system_clock(link: L, config: TransportConfig) -> Self {
        Self::new(link, SystemClock::new(), config)
    }
}

impl<L, C> Transport<L, C>
where
    L: SerialLink,
    C: Clock,
{
    /// Create a new transport
    pub fn new(link: L, clock: C, config: TransportConfig) -> Self {
        Self {
            link,
            clock,
            config,
            tx_bytes: 0,
            rx_bytes: 0,
            tx_frames: 0,
            rx_frames: 0,
        }
    }

    /// Get the transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Get cumulative tx/rx bytes and frame counters
    pub fn counters(&self) -> (u64, u64, u64, u64) {
        (self.tx_bytes, self.rx_bytes, self.tx_frames, self.rx_frames)
    }

    /// Access the underlying link
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Give back the link and clock
    pub fn into_inner(self) -> (L, C) {
        (self.link, self.clock)
    }

    /// Block for `ms` milliseconds on the transport's clock
    pub fn delay_ms(&mut self, ms: u64) {
        self.clock.delay_ms(ms);
    }

    /// Busy-poll until at least one byte is readable or `max_wait_ms` has
    /// elapsed. Returns whether data is available.
    pub fn wait_for_byte(&mut self, max_wait_ms: u64) -> Result<bool, ProtocolError> {
        let start = self.clock.now_ms();
        loop {
            if self.link.bytes_available()? > 0 {
                return Ok(true);
            }
            if self.clock.now_ms().saturating_sub(start) >= max_wait_ms {
                return Ok(false);
            }
            std::hint::spin_loop();
        }
    }

    /// Discard anything left on the line by an earlier, unfinished exchange
    fn drain(&mut self) -> Result<usize, ProtocolError> {
        let mut drained = 0usize;
        while drained < MAX_DRAIN_BYTES && self.wait_for_byte(self.config.drain_timeout_ms)? {
            self.link.read_byte()?;
            drained += 1;
        }
        if drained >= MAX_DRAIN_BYTES {
            warn!("line still busy after draining {} bytes", drained);
        } else if drained > 0 {
            debug!("drained {} stray byte(s) before sending", drained);
        }
        self.rx_bytes = self.rx_bytes.saturating_add(drained as u64);
        Ok(drained)
    }

    /// Drain the line, then write the frame byte by byte
    fn write_frame(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        self.drain()?;

        let bytes = frame.to_bytes();
        trace!("tx {:02x?}", bytes);
        for byte in &bytes {
            self.link.write_byte(*byte)?;
        }
        self.link.flush()?;

        self.tx_bytes = self.tx_bytes.saturating_add(bytes.len() as u64);
        self.tx_frames = self.tx_frames.saturating_add(1);
        Ok(())
    }

    /// Read one reply frame into `dest`.
    ///
    /// On any failure `dest` is left fully zeroed.
    fn receive(&mut self, dest: &mut [u8]) -> Result<Reply, ProtocolError> {
        let mut decoder = FrameDecoder::new(dest);
        let mut raw = Vec::new();
        let mut budget = self.config.reply_timeout_ms;

        loop {
            let ready = match self.wait_for_byte(budget) {
                Ok(ready) => ready,
                Err(e) => {
                    decoder.clear();
                    return Err(e);
                }
            };
            if !ready {
                let received = decoder.received();
                if received == 0 {
                    debug!("no reply within {}ms", budget);
                } else {
                    warn!("reply stalled after {} byte(s): {:02x?}", received, raw);
                }
                return Err(decoder.abort());
            }

            let byte = match self.link.read_byte() {
                Ok(byte) => byte,
                Err(e) => {
                    decoder.clear();
                    return Err(e);
                }
            };
            raw.push(byte);
            self.rx_bytes = self.rx_bytes.saturating_add(1);
            budget = self.config.inter_byte_timeout_ms;

            if let Some(outcome) = decoder.push(byte) {
                trace!("rx {:02x?}", raw);
                if outcome.is_ok() {
                    self.rx_frames = self.rx_frames.saturating_add(1);
                }
                return outcome;
            }
        }
    }

    /// Run one transaction.
    ///
    /// With `response: None` the frame is sent and no reply is read; silence
    /// is the normal outcome for commands like play. With `Some(buf)` the
    /// buffer is zeroed, then receives the validated payload. Payloads longer
    /// than the buffer are truncated to it (see [`Reply::is_truncated`]).
    pub fn transact(
        &mut self,
        command: u8,
        payload: &[u8],
        mut response: Option<&mut [u8]>,
    ) -> Result<Option<Reply>, ProtocolError> {
        if let Some(dest) = response.as_deref_mut() {
            dest.fill(0);
        }
        let frame = Frame::new(command, payload.to_vec())?;
        self.write_frame(&frame)?;

        match response {
            None => Ok(None),
            Some(dest) => {
                let reply = self.receive(dest)?;
                if reply.command != command {
                    debug!(
                        "reply echoes {:#04x} for request {:#04x}",
                        reply.command, command
                    );
                }
                Ok(Some(reply))
            }
        }
    }

    /// Send a command and read its reply into `response`
    pub fn query(
        &mut self,
        command: u8,
        payload: &[u8],
        response: &mut [u8],
    ) -> Result<Reply, ProtocolError> {
        match self.transact(command, payload, Some(response))? {
            Some(reply) => Ok(reply),
            None => Err(ProtocolError::Timeout { received: 0 }),
        }
    }

    /// Send a command that takes no reply
    pub fn send(&mut self, command: u8, payload: &[u8]) -> Result<(), ProtocolError> {
        self.transact(command, payload, None).map(|_| ())
    }

    /// Send a command with no arguments
    pub fn send_command(&mut self, command: u8) -> Result<(), ProtocolError> {
        self.send(command, &[])
    }

    /// Send a command with a single byte argument
    pub fn send_u8(&mut self, command: u8, arg: u8) -> Result<(), ProtocolError> {
        self.send(command, &[arg])
    }

    /// Send a command with a 16-bit argument (big-endian on the wire)
    pub fn send_u16(&mut self, command: u8, arg: u16) -> Result<(), ProtocolError> {
        self.send(command, &encode_u16(arg))
    }

    /// Query a single byte value
    pub fn query_u8(&mut self, command: u8) -> Result<u8, ProtocolError> {
        let mut buf = [0u8; 1];
        self.query(command, &[], &mut buf)?;
        Ok(buf[0])
    }

    /// Query a 16-bit value sent high byte first
    pub fn query_u16(&mut self, command: u8) -> Result<u16, ProtocolError> {
        let mut buf = [0u8; 4];
        self.query(command, &[], &mut buf)?;
        Ok(decode_u16(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;

    /// Link fed from a queue; every write is recorded
    #[derive(Default)]
    struct QueueLink {
        incoming: VecDeque<u8>,
        written: Vec<u8>,
    }

    impl SerialLink for QueueLink {
        fn bytes_available(&mut self) -> Result<usize, ProtocolError> {
            Ok(self.incoming.len())
        }

        fn read_byte(&mut self) -> Result<u8, ProtocolError> {
            self.incoming
                .pop_front()
                .ok_or(ProtocolError::Timeout { received: 0 })
        }

        fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
            self.written.push(byte);
            Ok(())
        }
    }

    /// Advances one millisecond per reading
    #[derive(Default)]
    struct StepClock {
        now: u64,
    }

    impl Clock for StepClock {
        fn now_ms(&mut self) -> u64 {
            self.now += 1;
            self.now
        }

        fn delay_ms(&mut self, ms: u64) {
            self.now += ms;
        }
    }

    fn transport(incoming: &[u8]) -> Transport<QueueLink, StepClock> {
        let link = QueueLink {
            incoming: incoming.iter().copied().collect(),
            written: Vec::new(),
        };
        Transport::new(link, StepClock::default(), TransportConfig::default())
    }

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.reply_timeout_ms, 1000);
        assert_eq!(config.inter_byte_timeout_ms, 150);
        assert_eq!(config.drain_timeout_ms, 10);
    }

    #[test]
    fn test_send_without_reply() {
        let mut t = transport(&[]);
        t.send_u16(0x07, 0x0102).unwrap();
        let (link, _) = t.into_inner();
        assert_eq!(link.written, vec![0xAA, 0x07, 0x02, 0x01, 0x02, 0xB6]);
    }

    #[test]
    fn test_stray_bytes_are_drained() {
        let mut t = transport(&[0x13, 0x37]);
        t.send_command(0x02).unwrap();
        assert_eq!(t.counters(), (4, 2, 1, 0));
        assert_eq!(t.link_mut().incoming.len(), 0);
    }

    #[test]
    fn test_wait_for_byte_times_out() {
        let mut t = transport(&[]);
        assert!(!t.wait_for_byte(25).unwrap());
        let (_, clock) = t.into_inner();
        assert!(clock.now >= 25);
        assert!(clock.now < 40);
    }

    #[test]
    fn test_reply_left_before_send_is_drained() {
        let mut t = transport(&[]);
        t.link_mut().incoming.extend([0xAA, 0x01, 0x01, 0x01, 0xAD]);
        // The reply sits on the line before sending, so it gets drained as noise
        assert!(t.query_u8(0x01).unwrap_err().is_timeout());
    }
}
