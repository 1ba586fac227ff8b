//! Per-voice generator values and modulator list.
//!
//! A [`VoiceState`] is rebuilt at every note-on from the zones of a
//! [`VoiceConfig`]:
//!
//! ```text
//! defaults → apply(instrument global) → apply(instrument zone)
//!          → refine(preset global)    → refine(preset zone)
//! ```
//!
//! `apply` overwrites values and replaces modulators with the same identity.
//! `refine` adds a preset adjustment to the values and appends modulators; the
//! preset zone's adjustments and modulators supersede those of the preset
//! global zone instead of stacking on them. The state lives inside a
//! preallocated voice, so everything here is fixed-size.

use fuente_core::Tables;

use crate::channel::Channel;
use crate::generator::GeneratorIndex;
use crate::instrument::VoiceConfig;
use crate::modulator::{DEFAULT_MODULATORS, Destination, Modulator, SourceContext};
use crate::zone::Zone;

/// Modulators a voice can hold; further ones are ignored.
pub const MAX_MODULATORS: usize = 64;

/// Nesting limit when evaluating linked modulators.
const MAX_LINK_DEPTH: usize = 8;

const UNSET: usize = usize::MAX;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    modulator: Modulator,
    /// Slot this modulator feeds when its destination is another modulator.
    link: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Replace,
    Append,
}

/// Generator values, modulators and note of one voice.
#[derive(Debug, Clone)]
pub struct VoiceState {
    values: [i32; GeneratorIndex::COUNT],
    modulated: [f32; GeneratorIndex::COUNT],
    /// Preset-level amount currently added into `values`.
    adjustments: [i32; GeneratorIndex::COUNT],
    slots: [Slot; MAX_MODULATORS],
    len: usize,
    /// First slot appended by a preset zone.
    preset_start: Option<usize>,
    key: u8,
    velocity: u8,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceState {
    /// A state holding the defaults.
    pub fn new() -> Self {
        let mut state = Self {
            values: [0; GeneratorIndex::COUNT],
            modulated: [0.0; GeneratorIndex::COUNT],
            adjustments: [0; GeneratorIndex::COUNT],
            slots: [Slot::default(); MAX_MODULATORS],
            len: 0,
            preset_start: None,
            key: 0,
            velocity: 0,
        };
        state.set_defaults();
        state
    }

    /// Load the default value of every generator and the default modulators.
    pub fn set_defaults(&mut self) {
        for (i, value) in self.values.iter_mut().enumerate() {
            *value = GeneratorIndex::from_raw(i as u16).map_or(0, GeneratorIndex::default_value);
        }
        for (value, &base) in self.modulated.iter_mut().zip(&self.values) {
            *value = base as f32;
        }
        self.adjustments = [0; GeneratorIndex::COUNT];
        self.preset_start = None;
        self.len = 0;
        for modulator in DEFAULT_MODULATORS {
            self.slots[self.len] = Slot {
                modulator,
                link: None,
            };
            self.len += 1;
        }
    }

    /// Build the full state for a note from a voice config.
    ///
    /// `keynum` and `velocity` generators of 0 or more override the note's key and velocity.
    pub fn prepare(&mut self, config: &VoiceConfig<'_>, key: u8, velocity: u8) {
        self.set_defaults();
        if let Some(global) = config.instrument_global {
            self.apply(global);
        }
        self.apply(config.instrument_zone);
        if let Some(global) = config.preset_global {
            self.refine(global);
        }
        self.refine(config.preset_zone);

        let forced_key = self.unmodulated(GeneratorIndex::Keynum);
        let forced_velocity = self.unmodulated(GeneratorIndex::Velocity);
        self.key = if forced_key >= 0 {
            forced_key.min(127) as u8
        } else {
            key.min(127)
        };
        self.velocity = if forced_velocity >= 0 {
            forced_velocity.min(127) as u8
        } else {
            velocity.min(127)
        };
    }

    /// Overwrite values with the zone's generators; its modulators replace matching ones.
    pub fn apply(&mut self, zone: &Zone) {
        for &(index, amount) in zone.generators() {
            self.values[index.index()] = index.convert(amount);
        }
        self.merge(zone.modulators(), Merge::Replace);
    }

    /// Add the zone's generators to the values; its modulators are appended.
    ///
    /// A second preset zone (the local one after the global one) replaces the
    /// first one's amount for each generator it carries, and its modulators
    /// replace earlier preset modulators with the same identity. Generators
    /// preset zones may not carry are left alone.
    pub fn refine(&mut self, zone: &Zone) {
        for &(index, amount) in zone.generators() {
            if index.is_refinable() {
                let slot = index.index();
                let amount = i32::from(amount.signed());
                self.values[slot] += amount - self.adjustments[slot];
                self.adjustments[slot] = amount;
            }
        }
        self.merge(zone.modulators(), Merge::Append);
    }

    fn merge(&mut self, modulators: &[Modulator], mode: Merge) {
        // replacement searches this zone's slots, plus earlier preset slots when appending
        let base = match mode {
            Merge::Replace => self.len,
            Merge::Append => *self.preset_start.get_or_insert(self.len),
        };
        let mut positions = [UNSET; MAX_MODULATORS];

        for (i, modulator) in modulators.iter().enumerate().take(MAX_MODULATORS) {
            let identity = modulator.identity();
            let same = |slot: &Slot| slot.modulator.identity() == identity;
            let existing = self.slots[base..self.len]
                .iter()
                .position(same)
                .map(|p| base + p)
                .or_else(|| match mode {
                    Merge::Replace => self.slots[..base].iter().position(same),
                    Merge::Append => None,
                });
            let position = match existing {
                Some(position) => position,
                None if self.len < MAX_MODULATORS => {
                    self.len += 1;
                    self.len - 1
                }
                None => continue,
            };
            self.slots[position] = Slot {
                modulator: *modulator,
                link: None,
            };
            positions[i] = position;
        }

        for (i, modulator) in modulators.iter().enumerate().take(MAX_MODULATORS) {
            let position = positions[i];
            if position == UNSET {
                continue;
            }
            if let Destination::Modulator(target) = modulator.destination() {
                self.slots[position].link = positions
                    .get(usize::from(target))
                    .copied()
                    .filter(|&p| p != UNSET && p != position);
            }
        }
    }

    /// Re-evaluate every modulator against the channel and store the modulated values.
    pub fn update_modulation(&mut self, channel: &Channel, tables: &Tables) {
        for (value, &base) in self.modulated.iter_mut().zip(&self.values) {
            *value = base as f32;
        }
        let context = SourceContext {
            channel,
            key: self.key,
            velocity: self.velocity,
        };
        for i in 0..self.len {
            if let Destination::Generator(index) = self.slots[i].modulator.destination() {
                let value = self.evaluate(i, &context, tables, 0);
                self.modulated[index.index()] += value;
            }
        }
    }

    fn evaluate(&self, slot: usize, context: &SourceContext<'_>, tables: &Tables, depth: usize) -> f32 {
        let modulator = &self.slots[slot].modulator;
        let linked = if modulator.source().is_link() && depth < MAX_LINK_DEPTH {
            let sum: f32 = (0..self.len)
                .filter(|&j| self.slots[j].link == Some(slot))
                .map(|j| self.evaluate(j, context, tables, depth + 1))
                .sum();
            sum.round().clamp(0.0, 127.0)
        } else {
            0.0
        };
        modulator.value(tables, context, linked)
    }

    /// Value of a generator before modulation.
    #[inline]
    pub fn unmodulated(&self, index: GeneratorIndex) -> i32 {
        self.values[index.index()]
    }

    /// Value of a generator including modulator contributions, as of the last
    /// [`update_modulation`](Self::update_modulation).
    #[inline]
    pub fn modulated(&self, index: GeneratorIndex) -> f32 {
        self.modulated[index.index()]
    }

    /// Set a generator value directly.
    pub fn set(&mut self, index: GeneratorIndex, value: i32) {
        self.values[index.index()] = value;
        self.modulated[index.index()] = value as f32;
    }

    /// Key the voice plays, after any `keynum` override.
    pub fn key(&self) -> u8 {
        self.key
    }

    /// Velocity the voice plays, after any `velocity` override.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Modulators in effect, in merge order.
    pub fn modulators(&self) -> impl Iterator<Item = &Modulator> + '_ {
        self.slots[..self.len].iter().map(|slot| &slot.modulator)
    }

    /// Number of modulators in effect.
    pub fn modulator_count(&self) -> usize {
        self.len
    }
}
