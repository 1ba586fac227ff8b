//! MIDI channel state read by voices during modulation.
//!
//! Every field is an independent atomic. The render thread applies events
//! from the inbox and is the only writer; other threads may read the state
//! through [`EngineHandle::channel`](crate::EngineHandle::channel) for display.

use std::sync::atomic::{AtomicU8, AtomicU16, Ordering};

/// Controller numbers the engine interprets.
pub mod cc {
    /// Modulation wheel.
    pub const MODULATION: u8 = 1;
    /// Data entry, coarse.
    pub const DATA_ENTRY_MSB: u8 = 6;
    /// Channel volume.
    pub const VOLUME: u8 = 7;
    /// Pan.
    pub const PAN: u8 = 10;
    /// Expression.
    pub const EXPRESSION: u8 = 11;
    /// Data entry, fine.
    pub const DATA_ENTRY_LSB: u8 = 38;
    /// Sustain (damper) pedal.
    pub const SUSTAIN: u8 = 64;
    /// Reverb send level.
    pub const REVERB: u8 = 91;
    /// Chorus send level.
    pub const CHORUS: u8 = 93;
    /// Non-registered parameter number, fine.
    pub const NRPN_LSB: u8 = 98;
    /// Non-registered parameter number, coarse.
    pub const NRPN_MSB: u8 = 99;
    /// Registered parameter number, fine.
    pub const RPN_LSB: u8 = 100;
    /// Registered parameter number, coarse.
    pub const RPN_MSB: u8 = 101;
    /// All sound off.
    pub const ALL_SOUND_OFF: u8 = 120;
    /// Reset all controllers.
    pub const RESET_ALL_CONTROLLERS: u8 = 121;
    /// All notes off.
    pub const ALL_NOTES_OFF: u8 = 123;
}

/// Centered pitch wheel value.
pub const PITCH_WHEEL_CENTER: u16 = 8192;

/// Largest pitch wheel value.
pub const PITCH_WHEEL_MAX: u16 = 16383;

/// Default pitch wheel sensitivity in semitones.
pub const DEFAULT_BEND_SEMITONES: u8 = 2;

const RPN_NULL: u8 = 127;

/// Controllers, pitch wheel, pressure, and pitch-wheel sensitivity of one channel.
#[derive(Debug)]
pub struct Channel {
    controllers: [AtomicU8; 128],
    key_pressure: [AtomicU8; 128],
    pitch_wheel: AtomicU16,
    channel_pressure: AtomicU8,
    bend_semitones: AtomicU8,
    bend_cents: AtomicU8,
    rpn_msb: AtomicU8,
    rpn_lsb: AtomicU8,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    /// Create a channel at power-on state: volume and expression full, pan centered,
    /// pitch wheel centered, sensitivity ±2 semitones.
    pub fn new() -> Self {
        let channel = Self {
            controllers: core::array::from_fn(|_| AtomicU8::new(0)),
            key_pressure: core::array::from_fn(|_| AtomicU8::new(0)),
            pitch_wheel: AtomicU16::new(PITCH_WHEEL_CENTER),
            channel_pressure: AtomicU8::new(0),
            bend_semitones: AtomicU8::new(DEFAULT_BEND_SEMITONES),
            bend_cents: AtomicU8::new(0),
            rpn_msb: AtomicU8::new(RPN_NULL),
            rpn_lsb: AtomicU8::new(RPN_NULL),
        };
        channel.reset();
        channel
    }

    /// Restore the power-on state.
    pub fn reset(&self) {
        for c in &self.controllers {
            c.store(0, Ordering::Release);
        }
        self.controllers[usize::from(cc::VOLUME)].store(127, Ordering::Release);
        self.controllers[usize::from(cc::PAN)].store(64, Ordering::Release);
        self.bend_semitones
            .store(DEFAULT_BEND_SEMITONES, Ordering::Release);
        self.bend_cents.store(0, Ordering::Release);
        self.reset_controllers();
    }

    /// Reset controllers (CC121): modulation, expression, pedals, RPN selection,
    /// pitch wheel, and pressures. Volume and pan are kept.
    pub fn reset_controllers(&self) {
        self.controllers[usize::from(cc::MODULATION)].store(0, Ordering::Release);
        self.controllers[usize::from(cc::EXPRESSION)].store(127, Ordering::Release);
        for pedal in cc::SUSTAIN..=67 {
            self.controllers[usize::from(pedal)].store(0, Ordering::Release);
        }
        self.rpn_msb.store(RPN_NULL, Ordering::Release);
        self.rpn_lsb.store(RPN_NULL, Ordering::Release);
        self.pitch_wheel.store(PITCH_WHEEL_CENTER, Ordering::Release);
        self.channel_pressure.store(0, Ordering::Release);
        for p in &self.key_pressure {
            p.store(0, Ordering::Release);
        }
    }

    /// Store a controller value (clamped to 0..=127) and track RPN data entry.
    ///
    /// RPN 0 (pitch-bend sensitivity) is set through CC101/100 followed by CC6
    /// (semitones) and CC38 (cents). Selecting an NRPN deselects the RPN.
    pub fn control_change(&self, controller: u8, value: u8) {
        let controller = controller & 0x7f;
        let value = value.min(127);
        self.controllers[usize::from(controller)].store(value, Ordering::Release);

        match controller {
            cc::RPN_MSB => self.rpn_msb.store(value, Ordering::Release),
            cc::RPN_LSB => self.rpn_lsb.store(value, Ordering::Release),
            cc::NRPN_MSB | cc::NRPN_LSB => {
                self.rpn_msb.store(RPN_NULL, Ordering::Release);
                self.rpn_lsb.store(RPN_NULL, Ordering::Release);
            }
            cc::DATA_ENTRY_MSB if self.is_bend_range_selected() => {
                self.bend_semitones.store(value, Ordering::Release);
            }
            cc::DATA_ENTRY_LSB if self.is_bend_range_selected() => {
                self.bend_cents.store(value.min(99), Ordering::Release);
            }
            _ => {}
        }
    }

    fn is_bend_range_selected(&self) -> bool {
        self.rpn_msb.load(Ordering::Acquire) == 0 && self.rpn_lsb.load(Ordering::Acquire) == 0
    }

    /// Current value of a controller.
    #[inline]
    pub fn controller(&self, controller: u8) -> u8 {
        self.controllers[usize::from(controller & 0x7f)].load(Ordering::Acquire)
    }

    /// True while the sustain pedal is down (CC64 ≥ 64).
    pub fn is_sustain_held(&self) -> bool {
        self.controller(cc::SUSTAIN) >= 64
    }

    /// Set the pitch wheel (clamped to 0..=16383).
    pub fn set_pitch_wheel(&self, value: u16) {
        self.pitch_wheel
            .store(value.min(PITCH_WHEEL_MAX), Ordering::Release);
    }

    /// Current pitch wheel value; 8192 is centered.
    #[inline]
    pub fn pitch_wheel(&self) -> u16 {
        self.pitch_wheel.load(Ordering::Acquire)
    }

    /// Set the channel pressure (clamped to 0..=127).
    pub fn set_channel_pressure(&self, value: u8) {
        self.channel_pressure.store(value.min(127), Ordering::Release);
    }

    /// Current channel pressure.
    #[inline]
    pub fn channel_pressure(&self) -> u8 {
        self.channel_pressure.load(Ordering::Acquire)
    }

    /// Set the polyphonic pressure of one key (both clamped to 0..=127).
    pub fn set_key_pressure(&self, key: u8, value: u8) {
        self.key_pressure[usize::from(key & 0x7f)].store(value.min(127), Ordering::Release);
    }

    /// Current polyphonic pressure of `key`.
    #[inline]
    pub fn key_pressure(&self, key: u8) -> u8 {
        self.key_pressure[usize::from(key & 0x7f)].load(Ordering::Acquire)
    }

    /// Pitch-wheel sensitivity in semitones (fractional part from the cents entry).
    #[inline]
    pub fn pitch_wheel_sensitivity(&self) -> f32 {
        f32::from(self.bend_semitones.load(Ordering::Acquire))
            + f32::from(self.bend_cents.load(Ordering::Acquire)) / 100.0
    }
}
