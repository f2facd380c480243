//! Shadow state for settings the module cannot report
//!
//! The instruction set has setters for volume, equalizer and loop mode but no
//! getters, so the host remembers what it last sent.

use serde::{Deserialize, Serialize};

use super::types::{Equalizer, LoopMode};

/// Highest host-side volume
pub const MAX_VOLUME: u8 = 100;

/// Highest volume step understood by the module
pub const MODULE_MAX_VOLUME: u8 = 30;

/// Host-side copy of write-only module settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowState {
    /// Volume on the 0..=100 scale
    pub volume: u8,
    pub equalizer: Equalizer,
    pub loop_mode: LoopMode,
}

impl Default for ShadowState {
    fn default() -> Self {
        // 67 on the host scale is 20 on the module's 0..=30 scale
        Self {
            volume: 67,
            equalizer: Equalizer::Normal,
            loop_mode: LoopMode::OneStop,
        }
    }
}

impl ShadowState {
    /// Record a new volume, clamped to 0..=100. Returns the stored value.
    pub fn set_volume(&mut self, volume: u8) -> u8 {
        self.volume = volume.min(MAX_VOLUME);
        self.volume
    }

    /// One step up, saturating at 100
    pub fn volume_up(&mut self) -> u8 {
        self.set_volume(self.volume.saturating_add(1))
    }

    /// One step down, saturating at 0
    pub fn volume_down(&mut self) -> u8 {
        self.set_volume(self.volume.saturating_sub(1))
    }

    /// Current volume scaled to the module's 0..=30 range
    pub fn module_volume(&self) -> u8 {
        to_module_volume(self.volume)
    }
}

/// Scale a 0..=100 volume to the module's 0..=30 range (rounding down)
pub fn to_module_volume(volume: u8) -> u8 {
    (u16::from(volume.min(MAX_VOLUME)) * u16::from(MODULE_MAX_VOLUME) / u16::from(MAX_VOLUME)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let shadow = ShadowState::default();
        assert_eq!(shadow.volume, 67);
        assert_eq!(shadow.module_volume(), 20);
        assert_eq!(shadow.loop_mode, LoopMode::OneStop);
    }

    #[test]
    fn test_volume_clamps_and_saturates() {
        let mut shadow = ShadowState::default();
        assert_eq!(shadow.set_volume(250), 100);
        assert_eq!(shadow.volume_up(), 100);
        shadow.set_volume(0);
        assert_eq!(shadow.volume_down(), 0);
        assert_eq!(shadow.volume_up(), 1);
    }

    #[test]
    fn test_module_scale() {
        assert_eq!(to_module_volume(0), 0);
        assert_eq!(to_module_volume(50), 15);
        assert_eq!(to_module_volume(99), 29);
        assert_eq!(to_module_volume(100), 30);
    }
}
