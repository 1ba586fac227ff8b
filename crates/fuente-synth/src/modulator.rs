//! SoundFont modulators.
//!
//! A modulator turns a controller (velocity, a MIDI CC, the pitch wheel...)
//! into an additive contribution to one generator:
//!
//! ```text
//! value = T(source) × T(amount source) × amount
//! ```
//!
//! where `T` maps the raw controller value through the curve, direction and
//! polarity encoded in the 16-bit source word. A modulator may also feed
//! another modulator (a link) instead of a generator.

use fuente_core::Tables;

use crate::channel::Channel;
use crate::file::ModulatorRecord;
use crate::generator::GeneratorIndex;

/// Shape of the controller response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuity {
    /// Straight line.
    Linear,
    /// Slow start, fast finish.
    Concave,
    /// Fast start, slow finish.
    Convex,
    /// 0 below half scale, 1 at or above.
    Switch,
}

/// Non-CC controllers a source can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralController {
    /// No controller; the modulator contributes nothing.
    None,
    /// Note-on velocity.
    NoteOnVelocity,
    /// Note-on key number.
    NoteOnKey,
    /// Polyphonic pressure of the voice's key.
    PolyPressure,
    /// Channel pressure.
    ChannelPressure,
    /// Pitch wheel (14-bit).
    PitchWheel,
    /// Pitch-wheel sensitivity in semitones.
    PitchWheelSensitivity,
    /// Output of the modulators linked to this one.
    Link,
}

/// Controller reference of a modulator, decoded from its 16-bit source word.
///
/// | Bits | Meaning |
/// |------|---------|
/// | 0-6 | controller index |
/// | 7 | MIDI CC flag |
/// | 8 | direction (1 = max to min) |
/// | 9 | polarity (1 = bipolar) |
/// | 10-15 | continuity |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Source(u16);

impl Source {
    /// Wrap a raw source word.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw source word.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Controller index (bits 0-6).
    pub const fn index(self) -> u8 {
        (self.0 & 0x7f) as u8
    }

    /// True when the index names a MIDI continuous controller.
    pub const fn is_cc(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// True when the value runs from max to min.
    pub const fn is_negative(self) -> bool {
        self.0 & 0x100 != 0
    }

    /// True when the value is mapped to [-1, 1] instead of [0, 1].
    pub const fn is_bipolar(self) -> bool {
        self.0 & 0x200 != 0
    }

    /// Curve type, or `None` for an unknown continuity.
    pub const fn continuity(self) -> Option<Continuity> {
        match self.0 >> 10 {
            0 => Some(Continuity::Linear),
            1 => Some(Continuity::Concave),
            2 => Some(Continuity::Convex),
            3 => Some(Continuity::Switch),
            _ => None,
        }
    }

    /// General controller named by this source, if it is not a CC.
    pub const fn general(self) -> Option<GeneralController> {
        if self.is_cc() {
            return None;
        }
        match self.index() {
            0 => Some(GeneralController::None),
            2 => Some(GeneralController::NoteOnVelocity),
            3 => Some(GeneralController::NoteOnKey),
            10 => Some(GeneralController::PolyPressure),
            13 => Some(GeneralController::ChannelPressure),
            14 => Some(GeneralController::PitchWheel),
            16 => Some(GeneralController::PitchWheelSensitivity),
            127 => Some(GeneralController::Link),
            _ => None,
        }
    }

    /// True when the source names no controller.
    pub const fn is_none(self) -> bool {
        matches!(self.general(), Some(GeneralController::None))
    }

    /// True when the source takes its value from linked modulators.
    pub const fn is_link(self) -> bool {
        matches!(self.general(), Some(GeneralController::Link))
    }

    /// True when the source can be evaluated.
    pub const fn is_valid(self) -> bool {
        if self.continuity().is_none() {
            return false;
        }
        if self.is_cc() {
            !matches!(self.index(), 0 | 6 | 32..=63 | 98..=101 | 120..=127)
        } else {
            self.general().is_some()
        }
    }

    /// Raw controller value and whether it is a 14-bit value.
    ///
    /// `None` for a source naming no controller.
    fn raw_value(self, context: &SourceContext<'_>, linked: f32) -> Option<(f32, bool)> {
        if self.is_cc() {
            return Some((f32::from(context.channel.controller(self.index())), false));
        }
        let value = match self.general()? {
            GeneralController::None => return None,
            GeneralController::NoteOnVelocity => f32::from(context.velocity),
            GeneralController::NoteOnKey => f32::from(context.key),
            GeneralController::PolyPressure => f32::from(context.channel.key_pressure(context.key)),
            GeneralController::ChannelPressure => f32::from(context.channel.channel_pressure()),
            GeneralController::PitchWheel => {
                return Some((f32::from(context.channel.pitch_wheel()), true));
            }
            GeneralController::PitchWheelSensitivity => context.channel.pitch_wheel_sensitivity(),
            GeneralController::Link => linked,
        };
        Some((value, false))
    }

    /// Map a raw controller value through the source's curve, direction and polarity.
    ///
    /// `fourteen_bit` selects a 0..16384 domain (the pitch wheel) instead of 0..128.
    pub fn transform(self, tables: &Tables, raw: f32, fourteen_bit: bool) -> f32 {
        let max = if fourteen_bit { 16384.0 } else { 128.0 };
        let raw = raw.clamp(0.0, max - 1.0);
        let coarse = if fourteen_bit {
            (raw as usize) >> 7
        } else {
            raw as usize
        }
        .min(127);
        let positive = !self.is_negative();

        let unipolar = match self.continuity() {
            Some(Continuity::Linear) | None => {
                let x = raw / max;
                if positive { x } else { 1.0 - x }
            }
            Some(Continuity::Concave) => {
                if positive {
                    tables.concave(coarse)
                } else {
                    tables.concave(127 - coarse)
                }
            }
            Some(Continuity::Convex) => {
                if positive {
                    tables.convex(coarse)
                } else {
                    tables.convex(127 - coarse)
                }
            }
            Some(Continuity::Switch) => {
                let on = raw >= max / 2.0;
                if on == positive { 1.0 } else { 0.0 }
            }
        };

        if self.is_bipolar() {
            2.0 * unipolar - 1.0
        } else {
            unipolar
        }
    }

    /// Evaluate the source. `None` when it names no controller.
    pub fn value(self, tables: &Tables, context: &SourceContext<'_>, linked: f32) -> Option<f32> {
        let (raw, fourteen_bit) = self.raw_value(context, linked)?;
        Some(self.transform(tables, raw, fourteen_bit))
    }
}

/// Everything a source may read: channel state plus the voice's note.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    /// Channel the voice plays on.
    pub channel: &'a Channel,
    /// Key of the voice.
    pub key: u8,
    /// Velocity of the voice.
    pub velocity: u8,
}

/// Where a modulator's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Added to a generator.
    Generator(GeneratorIndex),
    /// Fed to the modulator at this position in the same zone.
    Modulator(u16),
    /// Unknown generator; the modulator is inert.
    Invalid,
}

/// Output transform applied to the modulator value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Value as-is.
    Linear,
    /// Magnitude of the value.
    Absolute,
}

/// One modulator definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modulator {
    source: Source,
    destination: u16,
    amount: i16,
    amount_source: Source,
    transform: u16,
}

const LINK_FLAG: u16 = 0x8000;

impl Modulator {
    /// Build from raw SoundFont fields.
    pub const fn new(source: u16, destination: u16, amount: i16, amount_source: u16, transform: u16) -> Self {
        Self {
            source: Source::from_raw(source),
            destination,
            amount,
            amount_source: Source::from_raw(amount_source),
            transform,
        }
    }

    /// Build from a file record.
    pub fn from_record(record: &ModulatorRecord) -> Self {
        Self::new(
            record.source,
            record.destination,
            record.amount,
            record.amount_source,
            record.transform,
        )
    }

    /// Primary source.
    pub fn source(&self) -> Source {
        self.source
    }

    /// Amount source.
    pub fn amount_source(&self) -> Source {
        self.amount_source
    }

    /// Scale applied to the transformed sources.
    pub fn amount(&self) -> i16 {
        self.amount
    }

    /// Decoded destination.
    pub fn destination(&self) -> Destination {
        if self.destination & LINK_FLAG != 0 {
            return Destination::Modulator(self.destination & !LINK_FLAG);
        }
        match GeneratorIndex::from_raw(self.destination) {
            Some(index) => Destination::Generator(index),
            None => Destination::Invalid,
        }
    }

    /// Decoded output transform, or `None` if unknown.
    pub fn transform(&self) -> Option<Transform> {
        match self.transform {
            0 => Some(Transform::Linear),
            2 => Some(Transform::Absolute),
            _ => None,
        }
    }

    /// Identity used to find duplicates: (source, destination, amount source).
    pub fn identity(&self) -> (u16, u16, u16) {
        (self.source.raw(), self.destination, self.amount_source.raw())
    }

    /// True when the modulator can contribute a value.
    pub fn is_valid(&self) -> bool {
        self.source.is_valid()
            && self.amount_source.is_valid()
            && !self.amount_source.is_link()
            && self.transform().is_some()
            && self.destination() != Destination::Invalid
    }

    /// Current contribution. `linked` is the value of the modulators linked to
    /// this one (only read when the source is a link).
    pub fn value(&self, tables: &Tables, context: &SourceContext<'_>, linked: f32) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        let Some(value) = self.source.value(tables, context, linked) else {
            return 0.0;
        };
        if value == 0.0 {
            return 0.0;
        }
        let scale = self
            .amount_source
            .value(tables, context, 0.0)
            .unwrap_or(1.0);
        let value = value * scale * f32::from(self.amount);
        match self.transform() {
            Some(Transform::Absolute) => value.abs(),
            _ => value,
        }
    }
}

/// The SoundFont 2.04 default modulators every voice starts with.
pub const DEFAULT_MODULATORS: [Modulator; 10] = [
    // velocity → initial attenuation, negative concave
    Modulator::new(0x0502, GeneratorIndex::InitialAttenuation as u16, 960, 0, 0),
    // velocity → filter cutoff, negative linear
    Modulator::new(0x0102, GeneratorIndex::InitialFilterFc as u16, -2400, 0, 0),
    // channel pressure → vibrato LFO pitch depth
    Modulator::new(0x000d, GeneratorIndex::VibLfoToPitch as u16, 50, 0, 0),
    // CC1 modulation wheel → vibrato LFO pitch depth
    Modulator::new(0x0081, GeneratorIndex::VibLfoToPitch as u16, 50, 0, 0),
    // CC7 volume → initial attenuation, negative concave
    Modulator::new(0x0587, GeneratorIndex::InitialAttenuation as u16, 960, 0, 0),
    // CC10 pan → pan, bipolar linear
    Modulator::new(0x028a, GeneratorIndex::Pan as u16, 1000, 0, 0),
    // CC11 expression → initial attenuation, negative concave
    Modulator::new(0x058b, GeneratorIndex::InitialAttenuation as u16, 960, 0, 0),
    // CC91 → reverb send
    Modulator::new(0x00db, GeneratorIndex::ReverbEffectsSend as u16, 200, 0, 0),
    // CC93 → chorus send
    Modulator::new(0x00dd, GeneratorIndex::ChorusEffectsSend as u16, 200, 0, 0),
    // pitch wheel → fine tune, scaled by pitch-wheel sensitivity
    Modulator::new(0x020e, GeneratorIndex::FineTune as u16, 12700, 0x0010, 0),
];
