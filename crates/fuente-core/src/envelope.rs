//! Six-stage DAHDSR envelope generator.
//!
//! Delay, attack, hold, decay, sustain, release. Every timed stage lasts an
//! exact number of samples: the curve of each stage aims at an overshoot
//! target so that it lands on its endpoint at the last sample of the stage.
//!
//! ```text
//!  1.0 |      ____
//!      |     /    \
//!  sus |    /      \________
//!      |   /                \
//!  0.0 |__/                  \___
//!       D  A   H  D    S     R
//! ```
//!
//! The attack rises along a convex curve; decay and release fall
//! exponentially. Note-off moves to release from any stage, starting from the
//! current value.

use libm::powf;

use crate::math::{NOISE_FLOOR, seconds_to_samples};

/// Curvature of the exponential stages (distance of the overshoot target).
const CURVATURE: f32 = 0.01;

/// Envelope stages, in playing order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Wait before the attack begins. Output is 0.
    Delay,
    /// Rise from 0 to 1.
    Attack,
    /// Stay at 1.
    Hold,
    /// Fall from 1 to the sustain level.
    Decay,
    /// Stay at the sustain level until note-off.
    Sustain,
    /// Fall from the current value to 0.
    Release,
    /// Finished or never started. Output is 0.
    #[default]
    Idle,
}

/// Stage durations (seconds) and sustain level for an [`Envelope`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeParams {
    /// Delay stage duration in seconds.
    pub delay: f32,
    /// Attack stage duration in seconds.
    pub attack: f32,
    /// Hold stage duration in seconds.
    pub hold: f32,
    /// Decay stage duration in seconds.
    pub decay: f32,
    /// Sustain level in [0, 1].
    pub sustain: f32,
    /// Release stage duration in seconds.
    pub release: f32,
}

impl Default for EnvelopeParams {
    /// Every stage at the SoundFont default of -12000 timecents (~1 ms), full sustain.
    fn default() -> Self {
        let t = crate::math::timecents_to_seconds(-12000.0);
        Self {
            delay: t,
            attack: t,
            hold: t,
            decay: t,
            sustain: 1.0,
            release: t,
        }
    }
}

/// Per-stage recurrence `value = base + value * coeff`, run for `samples` steps.
#[derive(Clone, Copy, Debug, Default)]
struct Segment {
    samples: u32,
    coeff: f32,
    base: f32,
}

impl Segment {
    fn flat(samples: u32) -> Self {
        Self {
            samples,
            coeff: 1.0,
            base: 0.0,
        }
    }

    /// Exponential segment going from `start` to `end` in `samples` steps,
    /// aiming at a target that overshoots `end` by [`CURVATURE`].
    fn curve(samples: u32, start: f32, end: f32) -> Self {
        if samples == 0 {
            return Self::flat(0);
        }
        let span = end - start;
        if span.abs() < f32::EPSILON {
            return Self::flat(samples);
        }
        let target = end + CURVATURE * span.signum();
        let coeff = powf(CURVATURE / (span.abs() + CURVATURE), 1.0 / samples as f32);
        Self {
            samples,
            coeff,
            base: target * (1.0 - coeff),
        }
    }

    #[inline]
    fn next(&self, value: f32) -> f32 {
        self.base + value * self.coeff
    }
}

/// DAHDSR envelope generator.
///
/// # Example
///
/// ```rust
/// use fuente_core::{Envelope, EnvelopeParams, EnvelopeStage};
///
/// let mut env = Envelope::new(48000.0);
/// env.configure(&EnvelopeParams {
///     delay: 0.0,
///     attack: 0.01,
///     hold: 0.0,
///     decay: 0.1,
///     sustain: 0.5,
///     release: 0.2,
/// });
/// env.gate_on();
/// for _ in 0..48000 {
///     env.advance();
/// }
/// assert_eq!(env.stage(), EnvelopeStage::Sustain);
/// assert_eq!(env.value(), 0.5);
///
/// env.gate_off();
/// assert_eq!(env.stage(), EnvelopeStage::Release);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    sample_rate: f32,
    delay: Segment,
    attack: Segment,
    hold: Segment,
    decay: Segment,
    release: Segment,
    sustain_level: f32,
    stage: EnvelopeStage,
    counter: u32,
    value: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Envelope {
    /// Create an idle envelope with default stage timings.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            sample_rate,
            delay: Segment::default(),
            attack: Segment::default(),
            hold: Segment::default(),
            decay: Segment::default(),
            release: Segment::default(),
            sustain_level: 1.0,
            stage: EnvelopeStage::Idle,
            counter: 0,
            value: 0.0,
        };
        env.configure(&EnvelopeParams::default());
        env
    }

    /// Set the sample rate. Takes effect at the next [`configure`](Self::configure).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Load stage timings. Does not change the current stage or value.
    pub fn configure(&mut self, params: &EnvelopeParams) {
        let sr = self.sample_rate;
        let sustain = params.sustain.clamp(0.0, 1.0);
        self.sustain_level = sustain;
        self.delay = Segment::flat(seconds_to_samples(params.delay, sr));
        self.attack = Segment::curve(seconds_to_samples(params.attack, sr), 0.0, 1.0);
        self.hold = Segment::flat(seconds_to_samples(params.hold, sr));
        self.decay = Segment::curve(seconds_to_samples(params.decay, sr), 1.0, sustain);
        self.release = Segment::curve(seconds_to_samples(params.release, sr), 1.0, 0.0);
    }

    /// Start (or restart) the envelope from the delay stage at value 0.
    pub fn gate_on(&mut self) {
        self.value = 0.0;
        self.enter(EnvelopeStage::Delay);
    }

    /// Note-off: move to release from whatever stage is current.
    pub fn gate_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.enter(EnvelopeStage::Release);
        }
    }

    /// Restart from the delay stage. Same as [`gate_on`](Self::gate_on).
    pub fn retrigger(&mut self) {
        self.gate_on();
    }

    /// Force the envelope to idle with output 0.
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.counter = 0;
        self.value = 0.0;
    }

    /// Current stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current value without advancing.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Sustain level in [0, 1].
    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    /// True until the envelope has finished.
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    /// True while active and not yet releasing (the key is still held).
    pub fn is_gated(&self) -> bool {
        self.is_active() && self.stage != EnvelopeStage::Release
    }

    /// Advance by one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Delay => self.count_down(EnvelopeStage::Attack),
            EnvelopeStage::Attack => {
                self.value = self.attack.next(self.value).min(1.0);
                self.count_down(EnvelopeStage::Hold);
            }
            EnvelopeStage::Hold => self.count_down(EnvelopeStage::Decay),
            EnvelopeStage::Decay => {
                self.value = self.decay.next(self.value);
                if self.value <= self.sustain_level {
                    self.enter(EnvelopeStage::Sustain);
                } else {
                    self.count_down(EnvelopeStage::Sustain);
                }
            }
            EnvelopeStage::Release => {
                self.value = self.release.next(self.value);
                if self.value < NOISE_FLOOR {
                    self.enter(EnvelopeStage::Idle);
                } else {
                    self.count_down(EnvelopeStage::Idle);
                }
            }
            EnvelopeStage::Sustain | EnvelopeStage::Idle => {}
        }
        self.value
    }

    fn count_down(&mut self, next: EnvelopeStage) {
        self.counter = self.counter.saturating_sub(1);
        if self.counter == 0 {
            self.enter(next);
        }
    }

    fn segment(&self, stage: EnvelopeStage) -> Segment {
        match stage {
            EnvelopeStage::Delay => self.delay,
            EnvelopeStage::Attack => self.attack,
            EnvelopeStage::Hold => self.hold,
            EnvelopeStage::Decay => self.decay,
            EnvelopeStage::Release => self.release,
            EnvelopeStage::Sustain | EnvelopeStage::Idle => Segment::flat(0),
        }
    }

    /// Enter `stage`, falling through any stage with zero duration.
    fn enter(&mut self, stage: EnvelopeStage) {
        let mut stage = stage;
        loop {
            match stage {
                EnvelopeStage::Hold => self.value = 1.0,
                EnvelopeStage::Sustain => {
                    self.value = self.sustain_level;
                    self.stage = stage;
                    self.counter = 0;
                    break;
                }
                EnvelopeStage::Idle => {
                    self.value = 0.0;
                    self.stage = stage;
                    self.counter = 0;
                    break;
                }
                _ => {}
            }
            let samples = self.segment(stage).samples;
            if samples > 0 {
                self.stage = stage;
                self.counter = samples;
                break;
            }
            stage = match stage {
                EnvelopeStage::Delay => EnvelopeStage::Attack,
                EnvelopeStage::Attack => {
                    self.value = 1.0;
                    EnvelopeStage::Hold
                }
                EnvelopeStage::Hold => EnvelopeStage::Decay,
                EnvelopeStage::Decay => EnvelopeStage::Sustain,
                EnvelopeStage::Release | EnvelopeStage::Sustain | EnvelopeStage::Idle => {
                    EnvelopeStage::Idle
                }
            };
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = ?self.stage, value = self.value, "envelope stage");
    }
}
