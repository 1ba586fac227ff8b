//! Zones: range-scoped bundles of generators and modulators.
//!
//! A zone either links to a resource (a sample for instrument zones, an
//! instrument for preset zones) or is global. A global zone may only come
//! first in its collection; it supplies defaults to every other zone there.

use tracing::warn;

use crate::file::{GeneratorRecord, ModulatorRecord};
use crate::generator::{GeneratorAmount, GeneratorIndex};
use crate::modulator::Modulator;

/// Inclusive key or velocity range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRange {
    /// Lowest value in the range.
    pub low: u8,
    /// Highest value in the range.
    pub high: u8,
}

impl ZoneRange {
    /// Every MIDI key or velocity.
    pub const FULL: ZoneRange = ZoneRange { low: 0, high: 127 };

    /// `low..=high`, or `None` when `low > high`. `high` is capped at 127.
    pub fn new(low: u8, high: u8) -> Option<Self> {
        let high = high.min(127);
        (low <= high).then_some(Self { low, high })
    }

    /// True when `value` lies in the range.
    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }
}

impl Default for ZoneRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// What a zone links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneKind {
    /// No link; defaults for the other zones of the collection.
    Global,
    /// Instrument zone playing a sample.
    Instrument {
        /// Sample index.
        sample: u16,
    },
    /// Preset zone layering an instrument.
    Preset {
        /// Instrument index.
        instrument: u16,
    },
}

/// One zone of an instrument or preset.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    kind: ZoneKind,
    key_range: ZoneRange,
    velocity_range: ZoneRange,
    generators: Vec<(GeneratorIndex, GeneratorAmount)>,
    modulators: Vec<Modulator>,
}

impl Zone {
    /// Build a zone from its generator and modulator records.
    ///
    /// `terminal` is [`GeneratorIndex::SampleId`] for instrument zones and
    /// [`GeneratorIndex::Instrument`] for preset zones. The zone links to a
    /// resource only when its last generator is the terminal.
    ///
    /// Returns `None` for an empty zone or one whose key or velocity range
    /// has `low > high`. Unknown generators are skipped, as are generators
    /// preset zones may not carry. `keyRange` only counts as the first
    /// generator, `velRange` only as the first or right after `keyRange`.
    pub fn from_records(
        generators: &[GeneratorRecord],
        modulators: &[ModulatorRecord],
        terminal: GeneratorIndex,
    ) -> Option<Zone> {
        if generators.is_empty() && modulators.is_empty() {
            return None;
        }
        let preset = terminal == GeneratorIndex::Instrument;

        let link = generators
            .last()
            .filter(|record| record.index == terminal as u16)
            .map(|record| record.amount.unsigned());
        let body = match link {
            Some(_) => &generators[..generators.len() - 1],
            None => generators,
        };

        let mut key_range = ZoneRange::FULL;
        let mut velocity_range = ZoneRange::FULL;
        let mut kept = Vec::with_capacity(body.len());
        for (position, record) in body.iter().enumerate() {
            let Some(index) = GeneratorIndex::from_raw(record.index) else {
                continue;
            };
            match index {
                GeneratorIndex::KeyRange => {
                    if position == 0 {
                        let (low, high) = record.amount.range();
                        key_range = ZoneRange::new(low, high)?;
                    }
                }
                GeneratorIndex::VelRange => {
                    let first_or_after_keys = position == 0
                        || (position == 1 && body[0].index == GeneratorIndex::KeyRange as u16);
                    if first_or_after_keys {
                        let (low, high) = record.amount.range();
                        velocity_range = ZoneRange::new(low, high)?;
                    }
                }
                GeneratorIndex::SampleId | GeneratorIndex::Instrument | GeneratorIndex::EndOper => {}
                _ if preset && !index.is_available_in_preset() => {}
                _ => kept.push((index, record.amount)),
            }
        }

        let kind = match (link, preset) {
            (None, _) => ZoneKind::Global,
            (Some(instrument), true) => ZoneKind::Preset { instrument },
            (Some(sample), false) => ZoneKind::Instrument { sample },
        };

        Some(Zone {
            kind,
            key_range,
            velocity_range,
            generators: kept,
            modulators: modulators.iter().map(Modulator::from_record).collect(),
        })
    }

    /// Link target of the zone.
    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    /// True for a zone without a link.
    pub fn is_global(&self) -> bool {
        self.kind == ZoneKind::Global
    }

    /// Keys the zone answers to.
    pub fn key_range(&self) -> ZoneRange {
        self.key_range
    }

    /// Velocities the zone answers to.
    pub fn velocity_range(&self) -> ZoneRange {
        self.velocity_range
    }

    /// Generators in file order, without ranges and link.
    pub fn generators(&self) -> &[(GeneratorIndex, GeneratorAmount)] {
        &self.generators
    }

    /// Modulators in file order.
    pub fn modulators(&self) -> &[Modulator] {
        &self.modulators
    }

    /// Amount of `index` if the zone sets it.
    pub fn generator(&self, index: GeneratorIndex) -> Option<GeneratorAmount> {
        self.generators
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, amount)| *amount)
    }

    /// True when both ranges contain the note.
    #[inline]
    pub fn matches(&self, key: u8, velocity: u8) -> bool {
        self.key_range.contains(key) && self.velocity_range.contains(velocity)
    }
}

/// The zones of one instrument or preset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneCollection {
    zones: Vec<Zone>,
    has_global: bool,
}

impl ZoneCollection {
    /// Collect zones in file order. Global zones after the first position are dropped.
    pub fn new(zones: Vec<Zone>) -> Self {
        let mut kept = Vec::with_capacity(zones.len());
        for (position, zone) in zones.into_iter().enumerate() {
            if zone.is_global() && position > 0 {
                warn!(position, "dropping global zone that is not first");
                continue;
            }
            kept.push(zone);
        }
        let has_global = kept.first().is_some_and(Zone::is_global);
        Self {
            zones: kept,
            has_global,
        }
    }

    /// The global zone, if the collection starts with one.
    pub fn global(&self) -> Option<&Zone> {
        if self.has_global {
            self.zones.first()
        } else {
            None
        }
    }

    /// Non-global zones whose ranges contain `(key, velocity)`, in file order.
    pub fn find(&self, key: u8, velocity: u8) -> impl Iterator<Item = &Zone> + '_ {
        self.zones
            .iter()
            .filter(move |zone| !zone.is_global() && zone.matches(key, velocity))
    }

    /// Every zone, global included.
    pub fn iter(&self) -> core::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    /// Number of zones, global included.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True without zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl<'a> IntoIterator for &'a ZoneCollection {
    type Item = &'a Zone;
    type IntoIter = core::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}
