//! Fuente Core - DSP primitives for SoundFont rendering
//!
//! This crate provides the building blocks a SoundFont voice is made of,
//! designed for real-time use with zero allocation in the audio path.
//!
//! # Contents
//!
//! ## Conversions
//!
//! - [`Tables`] - Precomputed cents → Hz, attenuation, controller curves, pan, cubic weights
//! - Exact conversions: [`cents_to_hz`], [`hz_to_cents`], [`timecents_to_seconds`],
//!   [`centibels_to_gain`], [`unipolar_to_bipolar`], [`bipolar_to_unipolar`]
//! - [`fast_math::parabolic_sine`] - Cheap sine for control signals
//!
//! ## Signal Generators
//!
//! - [`Envelope`] - Six-stage DAHDSR envelope
//! - [`Lfo`] - Delayed triangle LFO
//!
//! ## Processing
//!
//! - [`DelayBuffer`] - Power-of-two circular buffer with fractional reads
//! - [`Biquad`] / [`VoiceFilter`] - Resonant low-pass
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build without the standard library.
//! [`tables()`] (the shared table instance) requires `std`; without it,
//! build a [`Tables`] yourself and keep it around.
//!
//! ```toml
//! [dependencies]
//! fuente-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod delay;
pub mod envelope;
pub mod fast_math;
pub mod lfo;
pub mod math;
pub mod tables;

pub use biquad::{Biquad, VoiceFilter, lowpass_coefficients};
pub use delay::DelayBuffer;
pub use envelope::{Envelope, EnvelopeParams, EnvelopeStage};
pub use lfo::{Lfo, LfoWaveform};
pub use math::{
    LOWEST_NOTE_FREQUENCY, NOISE_FLOOR, bipolar_to_unipolar, centibels_to_gain, cents_to_hz,
    hz_to_cents, lerp, lfo_cents_to_hz, seconds_to_samples, timecents_to_seconds,
    unipolar_to_bipolar,
};
#[cfg(feature = "std")]
pub use tables::tables;
pub use tables::Tables;
