//! Configuration for the fuente SoundFont engine.
//!
//! [`EngineConfig`] is the one knob set the engine is built from: sample
//! rate, voice pool size, voice allocation policy, interpolation, MIDI
//! channel filter, inbox sizing, and the steal declick length. It is stored
//! as TOML.
//!
//! # Example
//!
//! ```rust,no_run
//! use fuente_config::{EngineConfig, Interpolation};
//!
//! let config = EngineConfig::default()
//!     .with_voice_count(64)
//!     .with_interpolation(Interpolation::Cubic);
//! config.save("engine.toml").unwrap();
//!
//! let loaded = EngineConfig::load("engine.toml").unwrap();
//! assert_eq!(loaded, config);
//! ```

mod engine;
mod error;

/// Platform-specific configuration paths.
#[cfg(feature = "std")]
pub mod paths;

pub use engine::{EngineConfig, Interpolation, MAX_DECLICK_MS, MAX_VOICES};
pub use error::ConfigError;
#[cfg(feature = "std")]
pub use paths::{default_engine_config_path, ensure_user_config_dir, find_config, user_config_dir};
