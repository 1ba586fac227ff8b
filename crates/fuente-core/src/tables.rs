//! Precomputed lookup tables for generator value conversion.
//!
//! The render path converts generator values to physical units every sample
//! (pitch, gain, pan). [`Tables`] holds those conversions as flat arrays,
//! built once and then only read.
//!
//! | Table | Domain | Maps to |
//! |-------|--------|---------|
//! | cents → Hz | [-1500, 13500] cents | `8.176 · 2^(c/1200)` |
//! | attenuation | [0, 1440] cB | `10^(-cB/200)` |
//! | concave / convex | 0..=127 | SoundFont controller curves |
//! | pan | [-500, 500] | constant-power `sin` gains |
//! | cubic weights | 1024 fractional steps | Catmull-Rom coefficients |
//!
//! With the `std` feature, [`tables()`] returns a process-wide instance.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::f64::consts::FRAC_PI_2;
use libm::{floorf, log10, roundf, sin};

use crate::math::{centibels_to_gain, cents_to_hz, lerp};

/// Lowest cent value covered by the cents → Hz table.
pub const CENTS_TABLE_MIN: i32 = -1500;
/// Highest cent value covered by the cents → Hz table.
pub const CENTS_TABLE_MAX: i32 = 13500;
/// Highest attenuation in centibels covered by the gain table.
pub const ATTENUATION_MAX: usize = 1440;
/// Entries in the controller curve tables.
pub const CURVE_SIZE: usize = 128;
/// Pan value of a hard left/right position.
pub const PAN_LIMIT: i32 = 500;
/// Fractional resolution of the cubic interpolation weights.
pub const CUBIC_STEPS: usize = 1024;

/// Read-only conversion tables shared by every voice.
#[derive(Debug, Clone)]
pub struct Tables {
    cents_to_hz: Vec<f32>,
    attenuation: Vec<f32>,
    concave: [f32; CURVE_SIZE],
    convex: [f32; CURVE_SIZE],
    pan: Vec<f32>,
    cubic: Vec<[f32; 4]>,
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    /// Build all tables. Allocates; call once, off the audio thread.
    pub fn new() -> Self {
        let cents_to_hz = (CENTS_TABLE_MIN..=CENTS_TABLE_MAX)
            .map(|c| cents_to_hz(f64::from(c)) as f32)
            .collect();

        let attenuation = (0..=ATTENUATION_MAX)
            .map(|cb| centibels_to_gain(cb as f32))
            .collect();

        let mut concave = [0.0f32; CURVE_SIZE];
        let mut convex = [0.0f32; CURVE_SIZE];
        let last = (CURVE_SIZE - 1) as f64;
        for i in 0..CURVE_SIZE {
            let x = i as f64;
            concave[i] = if i == CURVE_SIZE - 1 {
                1.0
            } else {
                (-40.0 / 96.0 * log10((last - x) / last)) as f32
            };
            convex[i] = if i == 0 {
                0.0
            } else {
                (1.0 + 40.0 / 96.0 * log10(x / last)) as f32
            };
        }

        let pan_steps = (2 * PAN_LIMIT) as usize;
        let pan = (0..=pan_steps)
            .map(|i| sin(i as f64 * FRAC_PI_2 / pan_steps as f64) as f32)
            .collect();

        let cubic = (0..CUBIC_STEPS)
            .map(|i| {
                let t = i as f32 / CUBIC_STEPS as f32;
                let t2 = t * t;
                let t3 = t2 * t;
                [
                    -0.5 * t3 + t2 - 0.5 * t,
                    1.5 * t3 - 2.5 * t2 + 1.0,
                    -1.5 * t3 + 2.0 * t2 + 0.5 * t,
                    0.5 * t3 - 0.5 * t2,
                ]
            })
            .collect();

        Self {
            cents_to_hz,
            attenuation,
            concave,
            convex,
            pan,
            cubic,
        }
    }

    /// Convert absolute cents to Hz, interpolating between integer cents.
    ///
    /// Input is clamped to the table domain.
    #[inline]
    pub fn cents_to_hz(&self, cents: f32) -> f32 {
        let pos = cents.clamp(CENTS_TABLE_MIN as f32, CENTS_TABLE_MAX as f32)
            - CENTS_TABLE_MIN as f32;
        let whole = floorf(pos);
        let index = whole as usize;
        let a = self.cents_to_hz[index];
        match self.cents_to_hz.get(index + 1) {
            Some(&b) => lerp(a, b, pos - whole),
            None => a,
        }
    }

    /// Convert centibels of attenuation to linear gain. Input is clamped to [0, 1440].
    #[inline]
    pub fn attenuation(&self, centibels: f32) -> f32 {
        let index = roundf(centibels.clamp(0.0, ATTENUATION_MAX as f32)) as usize;
        self.attenuation[index]
    }

    /// Concave controller curve at `index` (0..=127).
    #[inline]
    pub fn concave(&self, index: usize) -> f32 {
        self.concave[index.min(CURVE_SIZE - 1)]
    }

    /// Convex controller curve at `index` (0..=127).
    #[inline]
    pub fn convex(&self, index: usize) -> f32 {
        self.convex[index.min(CURVE_SIZE - 1)]
    }

    /// Constant-power `(left, right)` gains for a pan value in [-500, 500].
    ///
    /// -500 is hard left, 0 is center, 500 is hard right.
    #[inline]
    pub fn pan(&self, pan: f32) -> (f32, f32) {
        let p = (roundf(pan) as i32).clamp(-PAN_LIMIT, PAN_LIMIT);
        let left = self.pan[(PAN_LIMIT - p) as usize];
        let right = self.pan[(PAN_LIMIT + p) as usize];
        (left, right)
    }

    /// 4-point Catmull-Rom interpolation between `x1` and `x2`.
    ///
    /// `partial` is the fractional position in [0, 1).
    #[inline]
    pub fn cubic(&self, partial: f32, x0: f32, x1: f32, x2: f32, x3: f32) -> f32 {
        let index = ((partial * CUBIC_STEPS as f32) as usize).min(CUBIC_STEPS - 1);
        let w = &self.cubic[index];
        x0 * w[0] + x1 * w[1] + x2 * w[2] + x3 * w[3]
    }
}

/// Process-wide tables, built on first use.
#[cfg(feature = "std")]
pub fn tables() -> &'static Tables {
    static TABLES: std::sync::OnceLock<Tables> = std::sync::OnceLock::new();
    TABLES.get_or_init(Tables::new)
}
