//! High-level player API
//!
//! Thin wrappers that turn playback operations into transactions. None of
//! them frame bytes themselves; everything goes through [`Transport`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    commands::Command,
    path,
    shadow::{to_module_volume, ShadowState},
    types::{Equalizer, LoopMode, Source, Sources, Status},
};
use crate::protocol::{encode_u16, Clock, ProtocolError, SerialLink, SystemClock, Transport};

/// Reply buffer used for the current file name
const FILE_NAME_BUFFER_LEN: usize = 32;

/// Default seek step for fast forward and rewind, in seconds
pub const DEFAULT_SEEK_SECONDS: u16 = 5;

/// How [`Player::reset`] retries.
///
/// The module has no documented reset command; the sequence (stop, the second
/// stop opcode, restore defaults, poll until sources show up) is a best-effort
/// emulation and the numbers here are not specified anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPolicy {
    /// Full reset sequences to try
    pub attempts: u32,
    /// Readiness polls after each sequence
    pub readiness_polls: u32,
    /// Pause between steps, in milliseconds
    pub settle_delay_ms: u64,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            attempts: 6,
            readiness_polls: 9,
            settle_delay_ms: 1,
        }
    }
}

/// Player configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Consecutive status reads that must agree before a status is trusted
    pub status_checks_in_agreement: u8,
    /// Rounds of status reads before giving up on agreement
    pub max_status_rounds: u32,
    pub reset: ResetPolicy,
    /// Settings restored by a reset
    pub defaults: ShadowState,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            status_checks_in_agreement: 1,
            max_status_rounds: 8,
            reset: ResetPolicy::default(),
            defaults: ShadowState::default(),
        }
    }
}

/// JQ8400 player
pub struct Player<L, C = SystemClock>
where
    L: SerialLink,
    C: Clock,
{
    transport: Transport<L, C>,
    shadow: ShadowState,
    config: PlayerConfig,
}

impl<L, C> Player<L, C>
where
    L: SerialLink,
    C: Clock,
{
    /// Create a player; the shadow state starts at the configured defaults
    pub fn new(transport: Transport<L, C>, config: PlayerConfig) -> Self {
        Self {
            transport,
            shadow: config.defaults,
            config,
        }
    }

    /// Get the player configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Settings last sent to the module
    pub fn shadow(&self) -> &ShadowState {
        &self.shadow
    }

    /// Access the transaction engine
    pub fn transport_mut(&mut self) -> &mut Transport<L, C> {
        &mut self.transport
    }

    /// Give back the transaction engine
    pub fn into_transport(self) -> Transport<L, C> {
        self.transport
    }

    fn send(&mut self, command: Command) -> Result<(), ProtocolError> {
        debug!("{:?}", command);
        self.transport.send_command(command.opcode())
    }

    fn send_u8(&mut self, command: Command, arg: u8) -> Result<(), ProtocolError> {
        debug!("{:?}({})", command, arg);
        self.transport.send_u8(command.opcode(), arg)
    }

    fn send_u16(&mut self, command: Command, arg: u16) -> Result<(), ProtocolError> {
        debug!("{:?}({})", command, arg);
        self.transport.send_u16(command.opcode(), arg)
    }

    fn send_payload(&mut self, command: Command, payload: &[u8]) -> Result<(), ProtocolError> {
        debug!("{:?} {:02x?}", command, payload);
        self.transport.send(command.opcode(), payload)
    }

    fn query_u8(&mut self, command: Command) -> Result<u8, ProtocolError> {
        self.transport.query_u8(command.opcode())
    }

    fn query_u16(&mut self, command: Command) -> Result<u16, ProtocolError> {
        self.transport.query_u16(command.opcode())
    }

    /// Query an (hours, minutes, seconds) triple as total seconds
    fn query_hms(&mut self, command: Command) -> Result<u32, ProtocolError> {
        let mut buf = [0u8; 3];
        self.transport.query(command.opcode(), &[], &mut buf)?;
        Ok(u32::from(buf[0]) * 3600 + u32::from(buf[1]) * 60 + u32::from(buf[2]))
    }

    /// Start the current track from the beginning
    pub fn play(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Play)
    }

    /// Restart the current track
    pub fn restart(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Stop)?;
        self.send(Command::Play)
    }

    pub fn pause(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Pause)
    }

    pub fn stop(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Stop)
    }

    pub fn next(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Next)
    }

    pub fn prev(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Prev)
    }

    pub fn next_folder(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::NextFolder)
    }

    pub fn prev_folder(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::PrevFolder)
    }

    /// Play a file by its index in the FAT.
    ///
    /// The index is the order of the directory entries on the medium, which
    /// usually but not necessarily matches copy order.
    pub fn play_file_by_index(&mut self, index: u16) -> Result<(), ProtocolError> {
        self.send_u16(Command::PlayIndex, index)
    }

    /// Select a file by FAT index without starting playback
    pub fn seek_file_by_index(&mut self, index: u16) -> Result<(), ProtocolError> {
        self.send_u16(Command::SeekIndex, index)
    }

    /// Play a file over the current one, then resume the interrupted track
    pub fn interject_file_by_index(&mut self, index: u16) -> Result<(), ProtocolError> {
        let source = self.source_byte()?;
        let [hi, lo] = encode_u16(index);
        self.send_payload(Command::InsertIndex, &[source, hi, lo])
    }

    /// Loop the playing track between two marks, in seconds
    pub fn ab_loop_play(&mut self, start_secs: u16, end_secs: u16) -> Result<(), ProtocolError> {
        let split = |secs: u16| -> Result<[u8; 2], ProtocolError> {
            let minutes = u8::try_from(secs / 60).map_err(|_| {
                ProtocolError::InvalidArgument(format!("A-B mark {}s is too far", secs))
            })?;
            Ok([minutes, (secs % 60) as u8])
        };
        let [start_m, start_s] = split(start_secs)?;
        let [end_m, end_s] = split(end_secs)?;
        self.send_payload(Command::AbLoopPlay, &[start_m, start_s, end_m, end_s])
    }

    /// End an A-B loop and keep playing
    pub fn ab_loop_clear(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::AbLoopStop)
    }

    pub fn fast_forward(&mut self, seconds: u16) -> Result<(), ProtocolError> {
        self.send_u16(Command::FastForward, seconds)
    }

    pub fn rewind(&mut self, seconds: u16) -> Result<(), ProtocolError> {
        self.send_u16(Command::Rewind, seconds)
    }

    /// Play `/FF/NNN.*` on the current source (folder 0..=99, file 0..=999).
    /// Names on the medium must be zero padded: `/03/006.mp3`.
    pub fn play_file_in_folder(&mut self, folder: u16, file: u16) -> Result<(), ProtocolError> {
        // Validate before spending a transaction on the source query
        path::file_in_folder(0, folder, file)?;
        let source = self.source_byte()?;
        let payload = path::file_in_folder(source, folder, file)?;
        self.send_payload(Command::PlayFileInFolder, &payload)
    }

    /// Play the first file in `/FF/` on the current source
    pub fn play_in_folder(&mut self, folder: u16) -> Result<(), ProtocolError> {
        path::folder(0, folder)?;
        let source = self.source_byte()?;
        let payload = path::folder(source, folder)?;
        self.send_payload(Command::PlayFileInFolder, &payload)
    }

    /// Play `/ZH/NN.*` files in the given order
    pub fn play_sequence_by_file_number(&mut self, files: &[u8]) -> Result<(), ProtocolError> {
        let payload = path::playlist_numbers(files)?;
        self.send_payload(Command::Playlist, &payload)
    }

    /// Play `/ZH/XX.*` files, named by two characters, in the given order
    pub fn play_sequence_by_file_name(&mut self, names: &[[u8; 2]]) -> Result<(), ProtocolError> {
        let payload = path::playlist_names(names)?;
        self.send_payload(Command::Playlist, &payload)
    }

    pub fn volume_up(&mut self) -> Result<(), ProtocolError> {
        self.shadow.volume_up();
        self.send(Command::VolumeUp)
    }

    pub fn volume_down(&mut self) -> Result<(), ProtocolError> {
        self.shadow.volume_down();
        self.send(Command::VolumeDown)
    }

    /// Set volume on the 0..=100 scale (clamped); sent as 0..=30
    pub fn set_volume(&mut self, volume: u8) -> Result<(), ProtocolError> {
        let volume = self.shadow.set_volume(volume);
        self.send_u8(Command::SetVolume, to_module_volume(volume))
    }

    pub fn set_equalizer(&mut self, equalizer: Equalizer) -> Result<(), ProtocolError> {
        self.shadow.equalizer = equalizer;
        self.send_u8(Command::SetEqualizer, equalizer.to_byte())
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) -> Result<(), ProtocolError> {
        self.shadow.loop_mode = mode;
        self.send_u8(Command::SetLoopMode, mode.to_byte())
    }

    /// Last volume sent (0..=100)
    pub fn volume(&self) -> u8 {
        self.shadow.volume
    }

    /// Last equalizer preset sent
    pub fn equalizer(&self) -> Equalizer {
        self.shadow.equalizer
    }

    /// Last loop mode sent
    pub fn loop_mode(&self) -> LoopMode {
        self.shadow.loop_mode
    }

    /// Sources currently attached to the module
    pub fn available_sources(&mut self) -> Result<Sources, ProtocolError> {
        self.query_u8(Command::GetSources).map(Sources)
    }

    pub fn set_source(&mut self, source: Source) -> Result<(), ProtocolError> {
        self.send_u8(Command::SetSource, source.to_byte())
    }

    fn source_byte(&mut self) -> Result<u8, ProtocolError> {
        self.query_u8(Command::GetSource)
    }

    /// Source currently selected
    pub fn source(&mut self) -> Result<Source, ProtocolError> {
        let byte = self.source_byte()?;
        Source::try_from(byte)
    }

    /// Playback status.
    ///
    /// With `status_checks_in_agreement` above one, the status is read
    /// repeatedly until that many consecutive reads agree. A stopped read is
    /// trusted immediately.
    pub fn status(&mut self) -> Result<Status, ProtocolError> {
        let checks = self.config.status_checks_in_agreement;
        if checks <= 1 {
            let byte = self.query_u8(Command::Status)?;
            return Status::try_from(byte);
        }

        let mut last = 0u8;
        for round in 0..self.config.max_status_rounds.max(1) {
            let first = self.query_u8(Command::Status)?;
            if first == 0 {
                return Ok(Status::Stopped);
            }
            last = first;

            let mut agreed = true;
            for _ in 1..checks {
                last = self.query_u8(Command::Status)?;
                if last == 0 {
                    return Ok(Status::Stopped);
                }
                if last != first {
                    agreed = false;
                    break;
                }
            }

            if agreed {
                return Status::try_from(first);
            }
            debug!(
                "status reads disagree in round {} ({:#04x} vs {:#04x})",
                round, first, last
            );
        }

        warn!(
            "status reads never agreed in {} rounds",
            self.config.max_status_rounds
        );
        Err(ProtocolError::UnexpectedStatus(last))
    }

    /// Number of files on the current source
    pub fn count_files(&mut self) -> Result<u16, ProtocolError> {
        self.query_u16(Command::CountFiles)
    }

    /// FAT index of the current file
    pub fn current_file_index(&mut self) -> Result<u16, ProtocolError> {
        self.query_u16(Command::CurrentFileIndex)
    }

    /// Playback position of the current file, in seconds.
    ///
    /// The query switches on a once-per-second position report, so a stop
    /// command always follows it.
    pub fn current_file_position_secs(&mut self) -> Result<u32, ProtocolError> {
        let position = self.query_hms(Command::CurrentFilePosition);
        self.send(Command::CurrentFilePositionStop)?;
        position
    }

    /// Length of the current file, in seconds
    pub fn current_file_length_secs(&mut self) -> Result<u32, ProtocolError> {
        self.query_hms(Command::CurrentFileLength)
    }

    /// Short (8.3) name of the current file
    pub fn current_file_name(&mut self) -> Result<String, ProtocolError> {
        let mut buf = [0u8; FILE_NAME_BUFFER_LEN];
        let reply = self
            .transport
            .query(Command::CurrentFileName.opcode(), &[], &mut buf)?;
        let name = &buf[..reply.copied];
        let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
        Ok(String::from_utf8_lossy(&name[..end]).trim_end().to_string())
    }

    /// Put the module to sleep.
    ///
    /// Sends both documented stop opcodes: the module is assumed to power
    /// down on its own once stopped.
    pub fn sleep(&mut self) -> Result<(), ProtocolError> {
        self.send(Command::Sleep)?;
        self.send(Command::Stop)
    }

    /// Reset the module to its defaults and wait until it reports a source.
    ///
    /// There is no real reset opcode. Each attempt stops playback with both
    /// stop opcodes, restores volume, equalizer, loop mode and the first file,
    /// then polls the attached sources. Fails with
    /// [`ProtocolError::NotReady`] if no attempt sees a source.
    pub fn reset(&mut self) -> Result<(), ProtocolError> {
        let policy = self.config.reset;
        let defaults = self.config.defaults;

        for attempt in 1..=policy.attempts {
            self.send(Command::Stop)?;
            self.transport.delay_ms(policy.settle_delay_ms);
            self.send(Command::Reset)?;
            self.transport.delay_ms(policy.settle_delay_ms);

            self.set_volume(defaults.volume)?;
            self.set_equalizer(defaults.equalizer)?;
            self.set_loop_mode(defaults.loop_mode)?;
            self.seek_file_by_index(1)?;
            self.send(Command::Stop)?;

            for _ in 0..policy.readiness_polls {
                match self.available_sources() {
                    Ok(sources) if !sources.is_empty() => {
                        info!("module ready after reset (sources: {})", sources);
                        return Ok(());
                    }
                    Ok(_) => debug!("no sources attached yet"),
                    Err(e @ ProtocolError::Timeout { .. })
                    | Err(e @ ProtocolError::ChecksumMismatch { .. }) => {
                        debug!("readiness poll failed: {}", e)
                    }
                    Err(e) => return Err(e),
                }
                self.transport.delay_ms(policy.settle_delay_ms);
            }
            warn!("module not ready after reset attempt {}", attempt);
        }

        Err(ProtocolError::NotReady {
            attempts: policy.attempts,
        })
    }
}
