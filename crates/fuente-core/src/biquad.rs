//! Biquad low-pass filter for voice rendering.
//!
//! [`Biquad`] is a Direct Form I second-order section with RBJ cookbook
//! coefficients. [`VoiceFilter`] wraps it with the SoundFont parameter
//! mapping: cutoff in absolute cents and resonance in centibels.

use core::f32::consts::{FRAC_1_SQRT_2, PI};
use libm::{cosf, powf, sinf};

use crate::tables::Tables;

/// Lowest cutoff accepted, in absolute cents (about 20 Hz).
pub const MIN_CUTOFF_CENTS: f32 = 1500.0;
/// Highest cutoff accepted, in absolute cents (about 20 kHz).
pub const MAX_CUTOFF_CENTS: f32 = 13500.0;
/// Highest resonance accepted, in centibels.
pub const MAX_RESONANCE_CB: f32 = 960.0;

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the biquad coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample through the biquad filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state (delay lines).
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates low-pass filter coefficients using the RBJ cookbook formula.
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Resonant low-pass driven by SoundFont cutoff cents and resonance centibels.
///
/// Coefficients are only recomputed when the (rounded) cutoff or resonance
/// changes, so calling [`update`](Self::update) every sample is cheap for
/// static settings.
#[derive(Debug, Clone)]
pub struct VoiceFilter {
    biquad: Biquad,
    sample_rate: f32,
    cutoff_cents: f32,
    resonance_cb: f32,
}

impl VoiceFilter {
    /// Create a filter for `sample_rate`. Starts as a passthrough until the first update.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            biquad: Biquad::new(),
            sample_rate,
            cutoff_cents: f32::NAN,
            resonance_cb: f32::NAN,
        }
    }

    /// Set cutoff (absolute cents) and resonance (centibels).
    ///
    /// Cutoff is clamped to [1500, 13500] cents and then to 45% of the sample
    /// rate; resonance to [0, 960] cB, mapped to `Q = 0.7071 · 10^(cB/200)`.
    #[inline]
    pub fn update(&mut self, tables: &Tables, cutoff_cents: f32, resonance_cb: f32) {
        let cutoff = libm::roundf(cutoff_cents.clamp(MIN_CUTOFF_CENTS, MAX_CUTOFF_CENTS));
        let resonance = libm::roundf(resonance_cb.clamp(0.0, MAX_RESONANCE_CB));
        if cutoff == self.cutoff_cents && resonance == self.resonance_cb {
            return;
        }
        self.cutoff_cents = cutoff;
        self.resonance_cb = resonance;

        let frequency = tables.cents_to_hz(cutoff).min(self.sample_rate * 0.45);
        let q = FRAC_1_SQRT_2 * powf(10.0, resonance / 200.0);
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(frequency, q, self.sample_rate);
        self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.biquad.process(input)
    }

    /// Clear state and force coefficients to be recomputed on the next update.
    pub fn reset(&mut self) {
        self.biquad.clear();
        self.cutoff_cents = f32::NAN;
        self.resonance_cb = f32::NAN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();
        for &x in &[1.0, -0.5, 0.25, 0.0] {
            assert_eq!(biquad.process(x), x);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, 48000.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.clear();
        // first output after clear only sees the new input
        let out = biquad.process(0.0);
        assert_eq!(out, 0.0);
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, 48000.0);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        let mut out = 0.0;
        for _ in 0..10000 {
            out = biquad.process(1.0);
        }
        assert!((out - 1.0).abs() < 0.001, "DC gain {out}");
    }

    #[test]
    fn test_voice_filter_open_is_transparent() {
        let tables = Tables::new();
        let mut filter = VoiceFilter::new(48000.0);
        filter.update(&tables, 13500.0, 0.0);
        // 440 Hz sine through a wide-open filter keeps its amplitude
        let mut peak = 0.0f32;
        for n in 0..48000 {
            let x = sinf(2.0 * PI * 440.0 * n as f32 / 48000.0);
            let y = filter.process(x);
            if n > 4800 {
                peak = peak.max(y.abs());
            }
        }
        assert!((peak - 1.0).abs() < 0.005, "peak {peak}");
    }

    #[test]
    fn test_voice_filter_attenuates_above_cutoff() {
        let tables = Tables::new();
        let mut filter = VoiceFilter::new(48000.0);
        // about 261 Hz
        filter.update(&tables, 6000.0, 0.0);
        let mut peak = 0.0f32;
        for n in 0..48000 {
            let x = sinf(2.0 * PI * 8000.0 * n as f32 / 48000.0);
            let y = filter.process(x);
            if n > 4800 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.01, "peak {peak}");
    }
}
