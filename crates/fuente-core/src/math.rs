//! Unit conversions for SoundFont generator values.
//!
//! SoundFont generators express everything in logarithmic units: pitch in
//! cents, time in timecents, and amplitude in centibels. The functions here
//! convert those to physical values. The `f64` variants are exact and meant
//! for configuration time; the render path uses the tables in
//! [`tables`](crate::tables).
//!
//! # Conversions
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`cents_to_hz`] / [`hz_to_cents`] | absolute cents | Hz |
//! | [`timecents_to_seconds`] | timecents | seconds |
//! | [`centibels_to_gain`] | centibels of attenuation | linear gain |
//! | [`lfo_cents_to_hz`] | absolute cents, clamped | Hz |
//!
//! # Utilities
//!
//! - [`unipolar_to_bipolar`] / [`bipolar_to_unipolar`] - Range mapping
//! - [`lerp`] - Linear interpolation

use libm::{exp2, log2, powf, roundf};

/// Frequency of MIDI note 0 in Hz (the reference for absolute cents).
pub const LOWEST_NOTE_FREQUENCY: f64 = 8.175_798_915_643_707;

/// Amplitude below which a releasing envelope is considered silent (about -134 dB).
pub const NOISE_FLOOR: f32 = 2.0e-7;

/// Lowest frequency, in absolute cents, accepted for an LFO.
pub const LFO_MIN_CENTS: f32 = -16000.0;

/// Highest frequency, in absolute cents, accepted for an LFO.
pub const LFO_MAX_CENTS: f32 = 4500.0;

/// Convert absolute cents to Hz.
///
/// Cent 0 is MIDI note 0 (8.1758 Hz); every 1200 cents doubles the frequency.
///
/// # Example
/// ```rust
/// use fuente_core::cents_to_hz;
///
/// assert!((cents_to_hz(6900.0) - 440.0).abs() < 1e-9);
/// ```
#[inline]
pub fn cents_to_hz(cents: f64) -> f64 {
    LOWEST_NOTE_FREQUENCY * exp2(cents / 1200.0)
}

/// Convert Hz to absolute cents. Inverse of [`cents_to_hz`].
///
/// `hz` must be positive.
#[inline]
pub fn hz_to_cents(hz: f64) -> f64 {
    1200.0 * log2(hz / LOWEST_NOTE_FREQUENCY)
}

/// Convert timecents to seconds: `2^(tc/1200)`.
///
/// -12000 timecents (the SoundFont default for envelope stages) is about 1 ms.
#[inline]
pub fn timecents_to_seconds(timecents: f32) -> f32 {
    libm::exp2f(timecents / 1200.0)
}

/// Convert centibels of attenuation to linear gain: `10^(-cB/200)`.
#[inline]
pub fn centibels_to_gain(centibels: f32) -> f32 {
    powf(10.0, -centibels / 200.0)
}

/// Convert an LFO frequency in absolute cents to Hz, clamped to the
/// SoundFont range of [-16000, 4500] cents (0.0008 Hz .. 100 Hz).
#[inline]
pub fn lfo_cents_to_hz(cents: f32) -> f32 {
    let cents = cents.clamp(LFO_MIN_CENTS, LFO_MAX_CENTS);
    (LOWEST_NOTE_FREQUENCY as f32) * libm::exp2f(cents / 1200.0)
}

/// Map a unipolar value in [0, 1] to bipolar [-1, 1].
#[inline]
pub fn unipolar_to_bipolar(x: f64) -> f64 {
    2.0 * x - 1.0
}

/// Map a bipolar value in [-1, 1] to unipolar [0, 1].
#[inline]
pub fn bipolar_to_unipolar(x: f64) -> f64 {
    0.5 * x + 0.5
}

/// Linear interpolation between `a` and `b` at position `t` in [0, 1).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Number of whole samples covering `seconds` at `sample_rate`.
#[inline]
pub fn seconds_to_samples(seconds: f32, sample_rate: f32) -> u32 {
    roundf(seconds * sample_rate).max(0.0) as u32
}
