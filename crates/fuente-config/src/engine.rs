//! Engine configuration file format.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Largest voice pool accepted.
pub const MAX_VOICES: usize = 256;

/// Longest steal declick ramp accepted, in milliseconds.
pub const MAX_DECLICK_MS: f32 = 5.0;

/// Sample interpolation used by the voice sample generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Two-point linear interpolation.
    #[default]
    Linear,
    /// Four-point Catmull-Rom interpolation.
    Cubic,
}

/// Settings the synthesis engine is constructed with.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// voice_count = 32
/// one_voice_per_key = false
/// interpolation = "linear"
/// midi_channel = 0        # omit to listen on every channel
/// inbox_capacity = 1024
/// max_events_per_block = 256
/// declick_ms = 2.0
/// ```
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Size of the voice pool (1..=256).
    pub voice_count: usize,
    /// Reuse the voice already playing a key instead of stacking a new one.
    pub one_voice_per_key: bool,
    /// Sample interpolation.
    pub interpolation: Interpolation,
    /// MIDI channel to listen on (0..=15), or `None` for omni.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi_channel: Option<u8>,
    /// Capacity of the control → render event inbox.
    pub inbox_capacity: usize,
    /// Most inbox events applied per render block.
    pub max_events_per_block: usize,
    /// Length of the fade applied to a stolen voice, in milliseconds (0..=5).
    pub declick_ms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            voice_count: 32,
            one_voice_per_key: false,
            interpolation: Interpolation::Linear,
            midi_channel: None,
            inbox_capacity: 1024,
            max_events_per_block: 256,
            declick_ms: 2.0,
        }
    }
}

impl EngineConfig {
    /// Set the output sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the voice pool size.
    pub fn with_voice_count(mut self, voice_count: usize) -> Self {
        self.voice_count = voice_count;
        self
    }

    /// Enable or disable one-voice-per-key.
    pub fn with_one_voice_per_key(mut self, enabled: bool) -> Self {
        self.one_voice_per_key = enabled;
        self
    }

    /// Set the sample interpolation.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Listen on a single MIDI channel, or on all of them with `None`.
    pub fn with_midi_channel(mut self, channel: Option<u8>) -> Self {
        self.midi_channel = channel;
        self
    }

    /// Set the steal declick length in milliseconds.
    pub fn with_declick_ms(mut self, declick_ms: f32) -> Self {
        self.declick_ms = declick_ms;
        self
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("sample_rate", "must be greater than 0"));
        }
        if !(1..=MAX_VOICES).contains(&self.voice_count) {
            return Err(ConfigError::invalid(
                "voice_count",
                format!("must be within 1..={MAX_VOICES}, got {}", self.voice_count),
            ));
        }
        if let Some(channel) = self.midi_channel
            && channel > 15
        {
            return Err(ConfigError::invalid(
                "midi_channel",
                format!("must be within 0..=15, got {channel}"),
            ));
        }
        if self.inbox_capacity == 0 {
            return Err(ConfigError::invalid("inbox_capacity", "must be greater than 0"));
        }
        if self.max_events_per_block == 0 {
            return Err(ConfigError::invalid(
                "max_events_per_block",
                "must be greater than 0",
            ));
        }
        if !(0.0..=MAX_DECLICK_MS).contains(&self.declick_ms) {
            return Err(ConfigError::invalid(
                "declick_ms",
                format!("must be within 0..=5, got {}", self.declick_ms),
            ));
        }
        Ok(())
    }

    /// Copy with every field forced into its accepted range.
    ///
    /// Used by the engine, which never fails on configuration.
    pub fn clamped(&self) -> Self {
        Self {
            sample_rate: self.sample_rate.max(1),
            voice_count: self.voice_count.clamp(1, MAX_VOICES),
            one_voice_per_key: self.one_voice_per_key,
            interpolation: self.interpolation,
            midi_channel: self.midi_channel.map(|c| c.min(15)),
            inbox_capacity: self.inbox_capacity.max(1),
            max_events_per_block: self.max_events_per_block.max(1),
            declick_ms: if self.declick_ms.is_finite() {
                self.declick_ms.clamp(0.0, MAX_DECLICK_MS)
            } else {
                0.0
            },
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }
}
