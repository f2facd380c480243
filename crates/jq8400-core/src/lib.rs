//! # JQ8400 Core Library
//!
//! Driver for the JQ8400 family of UART MP3 player modules.
//!
//! This library provides:
//! - Checksummed frame encoding and validated, timeout-bounded replies
//! - A transaction engine over any byte-oriented serial link
//! - The module's command catalog wrapped in a player API
//! - A simulated module for tests and hardware-free runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use jq8400_core::prelude::*;
//!
//! let config = DriverConfig::from_file("jq8400.json")?;
//! let mut player = config.connect()?;
//!
//! player.set_volume(50)?;
//! player.play_file_in_folder(3, 6)?;
//! println!("{}", player.status()?);
//! ```

pub mod config;
pub mod emulator;
pub mod player;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::DriverConfig;
    pub use crate::emulator::{Fault, SimulatedClock, SimulatedModule};
    pub use crate::player::{
        Command, Equalizer, LoopMode, Player, PlayerConfig, ResetPolicy, ShadowState, Source,
        Sources, Status,
    };
    pub use crate::protocol::{
        Clock, Frame, ProtocolError, Reply, SerialChannel, SerialLink, SystemClock, Transport,
        TransportConfig,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
