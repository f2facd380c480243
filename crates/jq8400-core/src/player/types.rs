//! Value types carried in command payloads and replies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::protocol::ProtocolError;

/// Equalizer presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equalizer {
    #[default]
    Normal,
    Pop,
    Rock,
    Jazz,
    Classic,
}

impl Equalizer {
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Equalizer {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Equalizer::Normal),
            1 => Ok(Equalizer::Pop),
            2 => Ok(Equalizer::Rock),
            3 => Ok(Equalizer::Jazz),
            4 => Ok(Equalizer::Classic),
            _ => Err(ProtocolError::InvalidArgument(format!(
                "unknown equalizer preset {}",
                value
            ))),
        }
    }
}

impl FromStr for Equalizer {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Equalizer::Normal),
            "pop" => Ok(Equalizer::Pop),
            "rock" => Ok(Equalizer::Rock),
            "jazz" => Ok(Equalizer::Jazz),
            "classic" => Ok(Equalizer::Classic),
            other => Err(ProtocolError::InvalidArgument(format!(
                "unknown equalizer preset '{}'",
                other
            ))),
        }
    }
}

/// Storage the module plays from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Usb,
    SdCard,
    Flash,
}

impl Source {
    pub fn to_byte(self) -> u8 {
        match self {
            Source::Usb => 0,
            Source::SdCard => 1,
            Source::Flash => 2,
        }
    }
}

impl TryFrom<u8> for Source {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Source::Usb),
            1 => Ok(Source::SdCard),
            2 => Ok(Source::Flash),
            _ => Err(ProtocolError::InvalidArgument(format!(
                "unknown source {}",
                value
            ))),
        }
    }
}

impl FromStr for Source {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usb" => Ok(Source::Usb),
            "sd" | "sdcard" => Ok(Source::SdCard),
            "flash" | "builtin" => Ok(Source::Flash),
            other => Err(ProtocolError::InvalidArgument(format!(
                "unknown source '{}'",
                other
            ))),
        }
    }
}

/// Bitmask of attached sources as reported by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sources(pub u8);

impl Sources {
    pub fn usb(&self) -> bool {
        self.0 & 0b001 != 0
    }

    pub fn sd_card(&self) -> bool {
        self.0 & 0b010 != 0
    }

    pub fn flash(&self) -> bool {
        self.0 & 0b100 != 0
    }

    pub fn contains(&self, source: Source) -> bool {
        self.0 & (1 << source.to_byte()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.usb() {
            names.push("usb");
        }
        if self.sd_card() {
            names.push("sd");
        }
        if self.flash() {
            names.push("flash");
        }
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

/// Loop modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopMode {
    /// Play all files, then start over
    All,
    /// Repeat the current file
    One,
    /// Play the current file once and stop. The power-on default.
    #[default]
    OneStop,
    /// Play all files in random order
    AllRandom,
    /// Repeat the current folder
    Folder,
    /// Play the current folder in random order
    FolderRandom,
    /// Play the current folder once and stop
    FolderStop,
    /// Play all files once and stop
    AllStop,
}

impl LoopMode {
    /// No looping; same code as [`LoopMode::OneStop`]
    pub const NONE: LoopMode = LoopMode::OneStop;

    pub fn to_byte(self) -> u8 {
        match self {
            LoopMode::All => 0,
            LoopMode::One => 1,
            LoopMode::OneStop => 2,
            LoopMode::AllRandom => 3,
            LoopMode::Folder => 4,
            LoopMode::FolderRandom => 5,
            LoopMode::FolderStop => 6,
            LoopMode::AllStop => 7,
        }
    }
}

impl TryFrom<u8> for LoopMode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LoopMode::All),
            1 => Ok(LoopMode::One),
            2 => Ok(LoopMode::OneStop),
            3 => Ok(LoopMode::AllRandom),
            4 => Ok(LoopMode::Folder),
            5 => Ok(LoopMode::FolderRandom),
            6 => Ok(LoopMode::FolderStop),
            7 => Ok(LoopMode::AllStop),
            _ => Err(ProtocolError::InvalidArgument(format!(
                "unknown loop mode {}",
                value
            ))),
        }
    }
}

impl FromStr for LoopMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(LoopMode::All),
            "one" => Ok(LoopMode::One),
            "one-stop" | "none" => Ok(LoopMode::OneStop),
            "all-random" | "random" => Ok(LoopMode::AllRandom),
            "folder" => Ok(LoopMode::Folder),
            "folder-random" => Ok(LoopMode::FolderRandom),
            "folder-stop" => Ok(LoopMode::FolderStop),
            "all-stop" => Ok(LoopMode::AllStop),
            other => Err(ProtocolError::InvalidArgument(format!(
                "unknown loop mode '{}'",
                other
            ))),
        }
    }
}

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Stopped,
    Playing,
    Paused,
}

impl TryFrom<u8> for Status {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Stopped),
            1 => Ok(Status::Playing),
            2 => Ok(Status::Paused),
            other => Err(ProtocolError::UnexpectedStatus(other)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Stopped => "stopped",
            Status::Playing => "playing",
            Status::Paused => "paused",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_mode_codes() {
        for code in 0..8u8 {
            assert_eq!(LoopMode::try_from(code).unwrap().to_byte(), code);
        }
        assert_eq!(LoopMode::NONE.to_byte(), 2);
        assert!(LoopMode::try_from(8).is_err());
    }

    #[test]
    fn test_sources_bitmask() {
        let sources = Sources(0b101);
        assert!(sources.usb());
        assert!(!sources.sd_card());
        assert!(sources.flash());
        assert!(sources.contains(Source::Flash));
        assert_eq!(sources.to_string(), "usb,flash");
        assert_eq!(Sources(0).to_string(), "none");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::try_from(1).unwrap(), Status::Playing);
        assert!(matches!(
            Status::try_from(9),
            Err(ProtocolError::UnexpectedStatus(9))
        ));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Rock".parse::<Equalizer>().unwrap(), Equalizer::Rock);
        assert_eq!("sd".parse::<Source>().unwrap(), Source::SdCard);
        assert_eq!("none".parse::<LoopMode>().unwrap(), LoopMode::OneStop);
        assert!("loud".parse::<Equalizer>().is_err());
    }
}
