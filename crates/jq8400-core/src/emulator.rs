//! Emulator - Simulated JQ8400 module for testing
//!
//! Answers frames written to it the way the module does, so the player can be
//! exercised without hardware. Faults can be queued to make the next reply
//! go missing, arrive corrupted, stall half way, or drag noise behind it.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::player::{Command, Sources, Status, MODULE_MAX_VOLUME};
use crate::protocol::{
    frame::{decode_u16, encode_u16, Frame},
    Clock, ProtocolError, SerialLink, START_MARKER,
};

/// Fault applied to the next reply the module sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Send nothing at all
    Silence,
    /// Flip the checksum byte
    CorruptChecksum,
    /// Send only the first `after` bytes of the reply
    Stall { after: usize },
    /// Append stray bytes after the reply
    TrailingNoise(Vec<u8>),
}

/// Simulated module implementing [`SerialLink`]
pub struct SimulatedModule {
    /// Bytes written by the host that do not form a full frame yet
    inbox: Vec<u8>,
    /// Bytes waiting to be read by the host
    outbox: VecDeque<u8>,
    /// Frames received from the host, in order
    received: Vec<Frame>,
    faults: VecDeque<Fault>,
    /// Raw status codes returned before falling back to the real status
    scripted_status: VecDeque<u8>,

    status: Status,
    sources: Sources,
    source: u8,
    file_count: u16,
    file_index: u16,
    volume: u8,
    equalizer: u8,
    loop_mode: u8,
    file_name: String,
    length_secs: u32,
    position_secs: u32,
    reporting_position: bool,
    ab_loop: Option<(u16, u16)>,
    last_path: Vec<u8>,
    /// Source queries answered with an empty bitmask after a reset
    boot_polls: u32,
    booting: u32,
}

impl Default for SimulatedModule {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedModule {
    /// A module with an SD card holding ten files, stopped on the first one
    pub fn new() -> Self {
        Self {
            inbox: Vec::new(),
            outbox: VecDeque::new(),
            received: Vec::new(),
            faults: VecDeque::new(),
            scripted_status: VecDeque::new(),
            status: Status::Stopped,
            sources: Sources(0b010),
            source: 1,
            file_count: 10,
            file_index: 1,
            volume: 20,
            equalizer: 0,
            loop_mode: 2,
            file_name: "00001   MP3".to_string(),
            length_secs: 185,
            position_secs: 0,
            reporting_position: false,
            ab_loop: None,
            last_path: Vec::new(),
            boot_polls: 0,
            booting: 0,
        }
    }

    pub fn with_sources(mut self, sources: Sources) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_file_count(mut self, count: u16) -> Self {
        self.file_count = count;
        self
    }

    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    /// Set the length and playback position of the current file, in seconds
    pub fn with_timing(mut self, length_secs: u32, position_secs: u32) -> Self {
        self.length_secs = length_secs;
        self.position_secs = position_secs;
        self
    }

    /// Answer this many source queries with no sources after each reset
    pub fn with_boot_polls(mut self, polls: u32) -> Self {
        self.boot_polls = polls;
        self
    }

    /// Queue a fault for the next reply
    pub fn inject(&mut self, fault: Fault) {
        self.faults.push_back(fault);
    }

    /// Put stray bytes on the line right now
    pub fn inject_noise(&mut self, bytes: &[u8]) {
        self.outbox.extend(bytes);
    }

    /// Answer the next status queries with these raw codes
    pub fn script_status(&mut self, codes: &[u8]) {
        self.scripted_status.extend(codes);
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Frames received from the host
    pub fn received(&self) -> &[Frame] {
        &self.received
    }

    /// Opcodes received from the host, in order
    pub fn opcodes(&self) -> Vec<u8> {
        self.received.iter().map(|f| f.command()).collect()
    }

    pub fn clear_received(&mut self) {
        self.received.clear();
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn file_index(&self) -> u16 {
        self.file_index
    }

    /// Volume on the module's 0..=30 scale
    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn equalizer(&self) -> u8 {
        self.equalizer
    }

    pub fn loop_mode(&self) -> u8 {
        self.loop_mode
    }

    pub fn position_secs(&self) -> u32 {
        self.position_secs
    }

    pub fn is_reporting_position(&self) -> bool {
        self.reporting_position
    }

    pub fn ab_loop(&self) -> Option<(u16, u16)> {
        self.ab_loop
    }

    /// Path payload of the last folder or playlist command
    pub fn last_path(&self) -> &[u8] {
        &self.last_path
    }

    /// Bytes still waiting to be read by the host
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Try to take a complete frame off the front of the inbox
    fn take_frame(&mut self) {
        loop {
            // Resync on the marker
            let skip = self
                .inbox
                .iter()
                .position(|b| *b == START_MARKER)
                .unwrap_or(self.inbox.len());
            if skip > 0 {
                debug!("emulator skipped {} byte(s) before a marker", skip);
                self.inbox.drain(..skip);
            }

            let frame = match Frame::from_bytes(&self.inbox) {
                Ok(frame) => frame,
                Err(ProtocolError::IncompleteFrame { .. }) => return,
                Err(e) => {
                    warn!("emulator dropped a bad frame: {}", e);
                    self.inbox.clear();
                    return;
                }
            };
            self.inbox.drain(..frame.encoded_size());
            self.handle(frame);
        }
    }

    fn handle(&mut self, frame: Frame) {
        debug!("emulator rx {:#04x} {:02x?}", frame.command(), frame.payload());
        let arg8 = frame.payload().first().copied().unwrap_or(0);
        let arg16 = decode_u16(frame.payload());
        let opcode = frame.command();
        self.received.push(frame.clone());

        let reply: Option<Vec<u8>> = match opcode {
            op if op == Command::Status.opcode() => {
                let code = self
                    .scripted_status
                    .pop_front()
                    .unwrap_or(self.status as u8);
                Some(vec![code])
            }
            op if op == Command::Play.opcode() => {
                self.status = Status::Playing;
                None
            }
            op if op == Command::Pause.opcode() => {
                if self.status == Status::Playing {
                    self.status = Status::Paused;
                }
                None
            }
            op if op == Command::Reset.opcode() => {
                self.status = Status::Stopped;
                self.booting = self.boot_polls;
                None
            }
            op if op == Command::Prev.opcode() => {
                self.file_index = if self.file_index > 1 {
                    self.file_index - 1
                } else {
                    self.file_count
                };
                self.start_file();
                None
            }
            op if op == Command::Next.opcode() => {
                self.file_index = if self.file_index < self.file_count {
                    self.file_index + 1
                } else {
                    1
                };
                self.start_file();
                None
            }
            op if op == Command::PlayIndex.opcode() => {
                self.file_index = arg16;
                self.start_file();
                None
            }
            op if op == Command::PlayFileInFolder.opcode()
                || op == Command::Playlist.opcode() =>
            {
                self.last_path = frame.payload().to_vec();
                self.start_file();
                None
            }
            op if op == Command::GetSources.opcode() => {
                if self.booting > 0 {
                    self.booting -= 1;
                    Some(vec![0])
                } else {
                    Some(vec![self.sources.0])
                }
            }
            op if op == Command::GetSource.opcode() => Some(vec![self.source]),
            op if op == Command::SetSource.opcode() => {
                self.source = arg8;
                self.status = Status::Stopped;
                None
            }
            op if op == Command::CountFiles.opcode() => Some(encode_u16(self.file_count).to_vec()),
            op if op == Command::CurrentFileIndex.opcode() => {
                Some(encode_u16(self.file_index).to_vec())
            }
            op if op == Command::PrevFolder.opcode() || op == Command::NextFolder.opcode() => {
                self.start_file();
                None
            }
            op if op == Command::Stop.opcode() => {
                self.status = Status::Stopped;
                self.position_secs = 0;
                self.ab_loop = None;
                None
            }
            op if op == Command::SetVolume.opcode() => {
                self.volume = arg8.min(MODULE_MAX_VOLUME);
                None
            }
            op if op == Command::VolumeUp.opcode() => {
                self.volume = (self.volume + 1).min(MODULE_MAX_VOLUME);
                None
            }
            op if op == Command::VolumeDown.opcode() => {
                self.volume = self.volume.saturating_sub(1);
                None
            }
            op if op == Command::InsertIndex.opcode() => {
                self.file_index = decode_u16(frame.payload().get(1..).unwrap_or(&[]));
                self.start_file();
                None
            }
            op if op == Command::SetLoopMode.opcode() => {
                self.loop_mode = arg8;
                None
            }
            op if op == Command::SetEqualizer.opcode() => {
                self.equalizer = arg8;
                None
            }
            op if op == Command::CurrentFileName.opcode() => {
                let mut name = self.file_name.clone().into_bytes();
                name.push(0);
                Some(name)
            }
            op if op == Command::SeekIndex.opcode() => {
                self.file_index = arg16;
                self.position_secs = 0;
                None
            }
            op if op == Command::AbLoopPlay.opcode() => {
                if let [sm, ss, em, es] = *frame.payload() {
                    let start = u16::from(sm) * 60 + u16::from(ss);
                    let end = u16::from(em) * 60 + u16::from(es);
                    self.ab_loop = Some((start, end));
                }
                None
            }
            op if op == Command::AbLoopStop.opcode() => {
                self.ab_loop = None;
                None
            }
            op if op == Command::Rewind.opcode() => {
                self.position_secs = self.position_secs.saturating_sub(u32::from(arg16));
                None
            }
            op if op == Command::FastForward.opcode() => {
                self.position_secs = (self.position_secs + u32::from(arg16)).min(self.length_secs);
                None
            }
            op if op == Command::CurrentFileLength.opcode() => Some(hms(self.length_secs).to_vec()),
            op if op == Command::CurrentFilePosition.opcode() => {
                self.reporting_position = true;
                Some(hms(self.position_secs).to_vec())
            }
            op if op == Command::CurrentFilePositionStop.opcode() => {
                self.reporting_position = false;
                None
            }
            other => {
                debug!("emulator ignores opcode {:#04x}", other);
                None
            }
        };

        if let Some(payload) = reply {
            self.queue_reply(opcode, payload);
        }
    }

    fn start_file(&mut self) {
        self.status = Status::Playing;
        self.position_secs = 0;
        self.ab_loop = None;
    }

    fn queue_reply(&mut self, command: u8, payload: Vec<u8>) {
        let mut bytes = match Frame::new(command, payload) {
            Ok(frame) => frame.to_bytes(),
            Err(e) => {
                warn!("emulator cannot encode reply: {}", e);
                return;
            }
        };

        match self.faults.pop_front() {
            None => {}
            Some(Fault::Silence) => {
                debug!("emulator stays silent");
                return;
            }
            Some(Fault::CorruptChecksum) => {
                if let Some(last) = bytes.last_mut() {
                    *last = !*last;
                }
            }
            Some(Fault::Stall { after }) => bytes.truncate(after),
            Some(Fault::TrailingNoise(noise)) => bytes.extend(noise),
        }
        self.outbox.extend(bytes);
    }
}

/// Split seconds into (hours, minutes, seconds)
fn hms(total: u32) -> [u8; 3] {
    [
        (total / 3600).min(255) as u8,
        (total / 60 % 60) as u8,
        (total % 60) as u8,
    ]
}

impl SerialLink for SimulatedModule {
    fn bytes_available(&mut self) -> Result<usize, ProtocolError> {
        Ok(self.outbox.len())
    }

    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        self.outbox
            .pop_front()
            .ok_or_else(|| ProtocolError::SerialError("emulator has no data".to_string()))
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.inbox.push(byte);
        self.take_frame();
        Ok(())
    }
}

/// Clock that advances one millisecond each time it is read.
///
/// Timeouts against the emulator elapse instantly, so a missing reply costs
/// loop iterations rather than a second of wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedClock {
    now: u64,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds elapsed so far
    pub fn elapsed_ms(&self) -> u64 {
        self.now
    }
}

impl Clock for SimulatedClock {
    fn now_ms(&mut self) -> u64 {
        self.now += 1;
        self.now
    }

    fn delay_ms(&mut self, ms: u64) {
        self.now += ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encode;
    use pretty_assertions::assert_eq;

    fn write(module: &mut SimulatedModule, bytes: &[u8]) {
        for b in bytes {
            module.write_byte(*b).unwrap();
        }
    }

    fn read_all(module: &mut SimulatedModule) -> Vec<u8> {
        let mut out = Vec::new();
        while module.bytes_available().unwrap() > 0 {
            out.push(module.read_byte().unwrap());
        }
        out
    }

    #[test]
    fn test_status_query_reply() {
        let mut module = SimulatedModule::new();
        write(&mut module, &encode(0x01, &[]).unwrap());
        assert_eq!(read_all(&mut module), vec![0xAA, 0x01, 0x01, 0x00, 0xAC]);
    }

    #[test]
    fn test_play_index_changes_state() {
        let mut module = SimulatedModule::new();
        write(&mut module, &encode(0x07, &[0x00, 0x05]).unwrap());
        assert_eq!(module.status(), Status::Playing);
        assert_eq!(module.file_index(), 5);
        assert_eq!(module.pending(), 0);
    }

    #[test]
    fn test_resyncs_after_garbage() {
        let mut module = SimulatedModule::new();
        write(&mut module, &[0x13, 0x37]);
        write(&mut module, &encode(0x02, &[]).unwrap());
        assert_eq!(module.opcodes(), vec![0x02]);
    }

    #[test]
    fn test_bad_checksum_is_ignored() {
        let mut module = SimulatedModule::new();
        write(&mut module, &[0xAA, 0x02, 0x00, 0x00]);
        assert!(module.received().is_empty());
        assert_eq!(module.status(), Status::Stopped);
    }

    #[test]
    fn test_faults_apply_to_one_reply() {
        let mut module = SimulatedModule::new();
        module.inject(Fault::Stall { after: 2 });
        write(&mut module, &encode(0x0A, &[]).unwrap());
        assert_eq!(read_all(&mut module), vec![0xAA, 0x0A]);

        write(&mut module, &encode(0x0A, &[]).unwrap());
        assert_eq!(read_all(&mut module).len(), 5);
    }

    #[test]
    fn test_hms() {
        assert_eq!(hms(3725), [1, 2, 5]);
        assert_eq!(hms(59), [0, 0, 59]);
    }
}
