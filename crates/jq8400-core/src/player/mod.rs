//! JQ8400 player
//!
//! Command catalog, payload layouts and the [`Player`] API built on top of
//! the protocol transport.

pub mod commands;
mod driver;
pub mod path;
pub mod shadow;
pub mod types;

pub use commands::Command;
pub use driver::{Player, PlayerConfig, ResetPolicy, DEFAULT_SEEK_SECONDS};
pub use shadow::{to_module_volume, ShadowState, MAX_VOLUME, MODULE_MAX_VOLUME};
pub use types::{Equalizer, LoopMode, Source, Sources, Status};
