//! Low-frequency oscillator with an initial delay.
//!
//! SoundFont voices carry two of these: the modulation LFO (pitch, filter,
//! volume) and the vibrato LFO (pitch only). Both are triangles; the
//! parabolic sine shape is available for other control signals.

use core::f32::consts::PI;

use crate::fast_math::parabolic_sine;
use crate::math::seconds_to_samples;

/// LFO waveform type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Linear ramps between -1 and 1, starting at -1.
    #[default]
    Triangle,
    /// Sine via [`parabolic_sine`], starting at 0.
    Sine,
}

/// Phase-accumulating LFO that stays at 0 for a delay, then oscillates in [-1, 1].
///
/// # Example
///
/// ```rust
/// use fuente_core::Lfo;
///
/// let mut lfo = Lfo::new(48000.0);
/// lfo.configure(4.0, 0.5); // 4 Hz after half a second
///
/// assert_eq!(lfo.advance(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    /// Samples left before oscillation starts
    delay_remaining: u32,
    sample_rate: f32,
    waveform: LfoWaveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Lfo {
    /// Create a stopped LFO (frequency 0, no delay).
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 0.0,
            delay_remaining: 0,
            sample_rate,
            waveform: LfoWaveform::Triangle,
        }
    }

    /// Set the sample rate. Takes effect at the next [`configure`](Self::configure).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Set the waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Restart at phase 0 with a new frequency (Hz) and delay (seconds).
    pub fn configure(&mut self, frequency: f32, delay: f32) {
        self.phase = 0.0;
        self.phase_inc = (frequency / self.sample_rate).clamp(0.0, 0.5);
        self.delay_remaining = seconds_to_samples(delay, self.sample_rate);
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Current phase in [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// True while the initial delay is still running.
    pub fn is_delayed(&self) -> bool {
        self.delay_remaining > 0
    }

    /// Value at the current phase without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        if self.delay_remaining > 0 {
            return 0.0;
        }
        match self.waveform {
            LfoWaveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            LfoWaveform::Sine => {
                // map [0, 1) onto [-π, π) with 0 at phase 0
                let theta = if self.phase < 0.5 {
                    2.0 * PI * self.phase
                } else {
                    2.0 * PI * (self.phase - 1.0)
                };
                parabolic_sine(theta)
            }
        }
    }

    /// Return the current value and step one sample forward.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.delay_remaining > 0 {
            self.delay_remaining -= 1;
            return 0.0;
        }
        let out = self.value();
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    #[test]
    fn test_delay_holds_zero() {
        let mut lfo = Lfo::new(SR);
        lfo.configure(10.0, 100.0 / SR);
        for _ in 0..100 {
            assert_eq!(lfo.advance(), 0.0);
        }
        assert!(!lfo.is_delayed());
        // oscillation starts at phase 0
        assert_eq!(lfo.advance(), -1.0);
    }

    #[test]
    fn test_triangle_shape() {
        let mut lfo = Lfo::new(SR);
        // period of 8 samples
        lfo.configure(SR / 8.0, 0.0);
        let values: [f32; 8] = core::array::from_fn(|_| lfo.advance());
        assert_eq!(values, [-1.0, -0.5, 0.0, 0.5, 1.0, 0.5, 0.0, -0.5]);
        // and it repeats
        assert_eq!(lfo.advance(), -1.0);
    }

    #[test]
    fn test_output_range() {
        let mut lfo = Lfo::new(SR);
        lfo.configure(7.3, 0.0);
        for _ in 0..20000 {
            let v = lfo.advance();
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_sine_shape() {
        let mut lfo = Lfo::new(SR);
        lfo.set_waveform(LfoWaveform::Sine);
        lfo.configure(SR / 4.0, 0.0);
        let values: [f32; 4] = core::array::from_fn(|_| lfo.advance());
        assert!(values[0].abs() < 1e-6);
        assert!((values[1] - 1.0).abs() < 0.002);
        assert!((values[3] + 1.0).abs() < 0.002);
    }

    #[test]
    fn test_frequency() {
        let mut lfo = Lfo::new(SR);
        lfo.configure(5.0, 0.0);
        assert!((lfo.frequency() - 5.0).abs() < 1e-4);
    }
}
