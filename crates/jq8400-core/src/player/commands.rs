//! Module commands
//!
//! Opcodes of the JQ8400 instruction set used by the player.

use serde::{Deserialize, Serialize};

/// Commands understood by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Query playback status
    Status,
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Low-power stop. Shares its opcode with [`Command::Reset`]; see
    /// [`Player::sleep`](super::Player::sleep).
    Sleep,
    /// Second documented stop, used as the closest thing to a reset
    Reset,
    /// Previous track
    Prev,
    /// Next track
    Next,
    /// Play by FAT index (16-bit)
    PlayIndex,
    /// Play by folder/file path template
    PlayFileInFolder,
    /// Query attached sources bitmask
    GetSources,
    /// Query active source
    GetSource,
    /// Select active source
    SetSource,
    /// Count files on the active source (16-bit reply)
    CountFiles,
    /// FAT index of the current file (16-bit reply)
    CurrentFileIndex,
    /// Previous folder
    PrevFolder,
    /// Next folder
    NextFolder,
    /// Stop playback
    Stop,
    /// Set volume (0..=30)
    SetVolume,
    /// Volume up one step
    VolumeUp,
    /// Volume down one step
    VolumeDown,
    /// Interject a file by FAT index, then resume
    InsertIndex,
    /// Set loop mode
    SetLoopMode,
    /// Set equalizer preset
    SetEqualizer,
    /// Play a sequence from the "ZH" folder
    Playlist,
    /// Short name of the current file
    CurrentFileName,
    /// Seek to a FAT index without playing
    SeekIndex,
    /// Start A-B loop
    AbLoopPlay,
    /// Stop A-B loop
    AbLoopStop,
    /// Rewind by seconds (16-bit)
    Rewind,
    /// Fast forward by seconds (16-bit)
    FastForward,
    /// Length of the current file (h, m, s)
    CurrentFileLength,
    /// Start reporting the playback position (h, m, s) every second
    CurrentFilePosition,
    /// Stop position reports
    CurrentFilePositionStop,
}

impl Command {
    /// Get the opcode byte sent on the wire
    pub fn opcode(&self) -> u8 {
        match self {
            Command::Status => 0x01,
            Command::Play => 0x02,
            Command::Pause => 0x03,
            Command::Sleep => 0x04,
            Command::Reset => 0x04,
            Command::Prev => 0x05,
            Command::Next => 0x06,
            Command::PlayIndex => 0x07,
            Command::PlayFileInFolder => 0x08,
            Command::GetSources => 0x09,
            Command::GetSource => 0x0A,
            Command::SetSource => 0x0B,
            Command::CountFiles => 0x0C,
            Command::CurrentFileIndex => 0x0D,
            Command::PrevFolder => 0x0E,
            Command::NextFolder => 0x0F,
            Command::Stop => 0x10,
            Command::SetVolume => 0x13,
            Command::VolumeUp => 0x14,
            Command::VolumeDown => 0x15,
            Command::InsertIndex => 0x16,
            Command::SetLoopMode => 0x18,
            Command::SetEqualizer => 0x1A,
            Command::Playlist => 0x1B,
            Command::CurrentFileName => 0x1E,
            Command::SeekIndex => 0x1F,
            Command::AbLoopPlay => 0x20,
            Command::AbLoopStop => 0x21,
            Command::Rewind => 0x22,
            Command::FastForward => 0x23,
            Command::CurrentFileLength => 0x24,
            Command::CurrentFilePosition => 0x25,
            Command::CurrentFilePositionStop => 0x26,
        }
    }

    /// Check if this command expects a response
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            Command::Status
                | Command::GetSources
                | Command::GetSource
                | Command::CountFiles
                | Command::CurrentFileIndex
                | Command::CurrentFileName
                | Command::CurrentFileLength
                | Command::CurrentFilePosition
        )
    }
}
