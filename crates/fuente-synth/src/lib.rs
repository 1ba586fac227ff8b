//! Fuente Synth - SoundFont 2 synthesis engine
//!
//! This crate turns SoundFont 2 data into sound: it validates the preset,
//! instrument and sample records of a font, builds an immutable graph from
//! them, and plays notes on a fixed pool of voices following the SoundFont 2.04
//! synthesis model.
//!
//! # Core Components
//!
//! ## Font data
//!
//! - [`SoundFontData`] - Parsed records of a font (headers, bags, generators, modulators, samples)
//! - [`SoundFontBuilder`] - Assemble font data in memory, mostly for tests and tools
//! - [`SoundFontGraph`] - Validated presets, instruments and samples
//!
//! ## Zones and parameters
//!
//! - [`Zone`] / [`ZoneCollection`] - Key and velocity ranges with their generators and modulators
//! - [`GeneratorIndex`] / [`GeneratorAmount`] - The 61 synthesis parameters
//! - [`Modulator`] - Source, transform and destination of a modulation route
//!
//! ## Voices
//!
//! - [`Voice`] - One sounding note: sample playback, envelopes, LFOs, filter, pan
//! - [`SampleGenerator`] - Interpolated, looping sample playback
//!
//! ## Engine
//!
//! - [`Engine`] - Render-thread half: voice pool, event handling, rendering
//! - [`EngineHandle`] - Control-thread half: event queue, font loading
//!
//! # Example
//!
//! ```rust
//! use fuente_synth::{Engine, EngineConfig, GeneratorIndex, SampleSpec, SoundFontBuilder, ZoneSpec};
//!
//! // A one-cycle square wave looped forever.
//! let cycle: Vec<i16> = (0..100).map(|i| if i < 50 { 12000 } else { -12000 }).collect();
//! let mut builder = SoundFontBuilder::new();
//! let sample = builder.add_sample(
//!     SampleSpec::new("square", &cycle, 44100).original_key(69).loop_points(0, 100),
//! );
//! let instrument = builder.add_instrument(
//!     "square",
//!     vec![ZoneSpec::new().generator(GeneratorIndex::SampleModes, 1).link(sample)],
//! );
//! builder.add_preset("square", 0, 0, vec![ZoneSpec::new().link(instrument)]);
//!
//! let (mut engine, handle) = Engine::new(EngineConfig::default());
//! handle.load(&builder.build()).unwrap();
//! handle.select_preset(0, 0).unwrap();
//! handle.note_on(60, 100).unwrap();
//!
//! let mut left = vec![0.0; 512];
//! let mut right = vec![0.0; 512];
//! engine.render(&mut left, &mut right);
//! assert_eq!(engine.active_voice_count(), 1);
//! assert!(left.iter().any(|&s| s != 0.0));
//! ```

pub mod channel;
pub mod engine;
pub mod error;
pub mod event;
pub mod file;
pub mod generator;
pub mod graph;
pub mod instrument;
pub mod modulator;
pub mod note;
pub mod sample;
pub mod state;
pub mod voice;
pub mod zone;

// Re-export main types at crate root
pub use channel::Channel;
pub use engine::{Engine, EngineHandle};
pub use error::{EngineError, LoadError};
pub use event::{MidiEvent, TimedEvent};
pub use file::{SampleSpec, SoundFontBuilder, SoundFontData, ZoneSpec};
pub use generator::{GeneratorAmount, GeneratorIndex};
pub use graph::{LoadSummary, SoundFontGraph};
pub use instrument::{Instrument, Preset, VoiceConfig};
pub use modulator::{DEFAULT_MODULATORS, Modulator};
pub use note::Note;
pub use sample::{Bounds, SampleGenerator, SampleSource};
pub use state::VoiceState;
pub use voice::{LoopMode, Voice, VoiceStage};
pub use zone::{Zone, ZoneCollection, ZoneRange};

// Re-export configuration types from fuente-config
pub use fuente_config::{EngineConfig, Interpolation};
