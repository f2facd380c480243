//! Driver configuration file
//!
//! One JSON document holds the transport and player settings. Every field has
//! a default, so `{}` is a valid file and a partial file only overrides what
//! it names:
//!
//! ```json
//! {
//!   "transport": { "port_name": "/dev/ttyUSB0", "reply_timeout_ms": 500 },
//!   "player": { "status_checks_in_agreement": 3, "defaults": { "volume": 40 } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::player::{Player, PlayerConfig};
use crate::protocol::{open_channel, ProtocolError, SerialChannel, Transport, TransportConfig};

/// Transport and player settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub transport: TransportConfig,
    pub player: PlayerConfig,
}

impl DriverConfig {
    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self, ProtocolError> {
        let config: DriverConfig =
            serde_json::from_str(content).map_err(|e| ProtocolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string_pretty(self).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Write to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProtocolError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Reject settings the driver cannot work with
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.transport.baud_rate == 0 {
            return Err(ProtocolError::Config("baud_rate must be non-zero".into()));
        }
        if self.transport.reply_timeout_ms == 0 {
            return Err(ProtocolError::Config(
                "reply_timeout_ms must be non-zero".into(),
            ));
        }
        if self.player.status_checks_in_agreement == 0 {
            return Err(ProtocolError::Config(
                "status_checks_in_agreement must be at least 1".into(),
            ));
        }
        if self.player.defaults.volume > crate::player::MAX_VOLUME {
            return Err(ProtocolError::Config(format!(
                "default volume {} exceeds {}",
                self.player.defaults.volume,
                crate::player::MAX_VOLUME
            )));
        }
        Ok(())
    }

    /// Open the configured serial port and wrap it in a player
    pub fn connect(&self) -> Result<Player<SerialChannel>, ProtocolError> {
        if self.transport.port_name.is_empty() {
            return Err(ProtocolError::Config("no port_name configured".into()));
        }
        let channel = open_channel(&self.transport.port_name, Some(self.transport.baud_rate))?;
        let transport = Transport::with_system_clock(channel, self.transport.clone());
        Ok(Player::new(transport, self.player.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Equalizer;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(DriverConfig::from_json("{}").unwrap(), DriverConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = DriverConfig::from_json(
            r#"{"player": {"defaults": {"equalizer": "jazz"}}, "transport": {"baud_rate": 19200}}"#,
        )
        .unwrap();
        assert_eq!(config.transport.baud_rate, 19200);
        assert_eq!(config.transport.reply_timeout_ms, 1000);
        assert_eq!(config.player.defaults.equalizer, Equalizer::Jazz);
        assert_eq!(config.player.defaults.volume, 67);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DriverConfig::from_json(r#"{"transport": {"baud_rate": 0}}"#),
            Err(ProtocolError::Config(_))
        ));
        assert!(DriverConfig::from_json(r#"{"player": {"status_checks_in_agreement": 0}}"#).is_err());
        assert!(DriverConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_connect_requires_port() {
        assert!(matches!(
            DriverConfig::default().connect(),
            Err(ProtocolError::Config(_))
        ));
    }
}
