//! In-memory SoundFont records.
//!
//! [`SoundFontData`] holds the lists a RIFF/SF2 parser produces (`phdr`,
//! `pbag`, `pmod`, `pgen`, `inst`, `ibag`, `imod`, `igen`, `shdr`, `smpl`),
//! following the SF2 convention that the preset, instrument and bag lists end
//! with a terminal record. The zones of record `i` are
//! `bags[records[i].first_zone .. records[i + 1].first_zone]`.
//!
//! [`SoundFontBuilder`] writes those lists from a higher-level description.
//!
//! ```rust
//! use fuente_synth::{GeneratorIndex, SampleSpec, SoundFontBuilder, ZoneSpec};
//!
//! let data: Vec<i16> = (0..100).map(|i| ((i as f32 / 100.0 * std::f32::consts::TAU).sin() * 32767.0) as i16).collect();
//!
//! let mut builder = SoundFontBuilder::new();
//! let sample = builder.add_sample(SampleSpec::new("sine", &data, 44000).original_key(69).loop_points(0, 100));
//! let instrument = builder.add_instrument(
//!     "sine",
//!     vec![ZoneSpec::new().generator(GeneratorIndex::SampleModes, 1).link(sample)],
//! );
//! builder.add_preset("sine", 0, 0, vec![ZoneSpec::new().link(instrument)]);
//! let font = builder.build();
//!
//! assert_eq!(font.presets.len(), 2); // one preset plus the terminal record
//! ```

use crate::generator::{GeneratorAmount, GeneratorIndex};

/// Samples of zero padding written after every sample, as SF2 requires.
pub const SAMPLE_PADDING: usize = 46;

/// Preset header (`phdr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetHeader {
    /// Preset name.
    pub name: String,
    /// MIDI program number.
    pub program: u16,
    /// MIDI bank number.
    pub bank: u16,
    /// Index of the first preset bag.
    pub first_zone: u16,
}

/// Instrument header (`inst`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentHeader {
    /// Instrument name.
    pub name: String,
    /// Index of the first instrument bag.
    pub first_zone: u16,
}

/// Zone bag (`pbag` / `ibag`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bag {
    /// Index of the zone's first generator record.
    pub first_generator: u16,
    /// Index of the zone's first modulator record.
    pub first_modulator: u16,
}

/// Generator record (`pgen` / `igen`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorRecord {
    /// Raw generator index; unknown values are ignored.
    pub index: u16,
    /// 16-bit amount.
    pub amount: GeneratorAmount,
}

impl GeneratorRecord {
    /// Record for a known generator.
    pub fn new(index: GeneratorIndex, amount: GeneratorAmount) -> Self {
        Self {
            index: index.raw(),
            amount,
        }
    }
}

/// Modulator record (`pmod` / `imod`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModulatorRecord {
    /// Primary source word.
    pub source: u16,
    /// Destination generator, or a linked modulator with bit 15 set.
    pub destination: u16,
    /// Signed scale.
    pub amount: i16,
    /// Amount source word.
    pub amount_source: u16,
    /// Output transform (0 linear, 2 absolute).
    pub transform: u16,
}

/// Channel role of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SampleKind {
    /// Mono sample.
    #[default]
    Mono,
    /// Right channel of a stereo pair.
    Right,
    /// Left channel of a stereo pair.
    Left,
    /// Linked sample chain.
    Linked,
}

impl SampleKind {
    /// Decode the `sfSampleType` word. ROM samples decode to their base role.
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw & 0x7fff {
            1 => Some(SampleKind::Mono),
            2 => Some(SampleKind::Right),
            4 => Some(SampleKind::Left),
            8 => Some(SampleKind::Linked),
            _ => None,
        }
    }
}

/// Sample header (`shdr`). Positions are absolute offsets into the sample data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleHeader {
    /// Sample name.
    pub name: String,
    /// First sample.
    pub start: u32,
    /// One past the last sample.
    pub end: u32,
    /// First sample of the loop.
    pub loop_start: u32,
    /// One past the last sample of the loop.
    pub loop_end: u32,
    /// Recording rate in Hz.
    pub sample_rate: u32,
    /// MIDI key at which the sample plays at its recorded pitch.
    pub original_key: u8,
    /// Pitch correction in cents.
    pub correction: i8,
    /// Index of the paired sample for stereo samples.
    pub link: u16,
    /// Channel role.
    pub kind: SampleKind,
}

/// The records of a parsed SoundFont.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundFontData {
    /// Preset headers plus the terminal record.
    pub presets: Vec<PresetHeader>,
    /// Preset zones plus the terminal bag.
    pub preset_bags: Vec<Bag>,
    /// Preset zone modulators.
    pub preset_modulators: Vec<ModulatorRecord>,
    /// Preset zone generators.
    pub preset_generators: Vec<GeneratorRecord>,
    /// Instrument headers plus the terminal record.
    pub instruments: Vec<InstrumentHeader>,
    /// Instrument zones plus the terminal bag.
    pub instrument_bags: Vec<Bag>,
    /// Instrument zone modulators.
    pub instrument_modulators: Vec<ModulatorRecord>,
    /// Instrument zone generators.
    pub instrument_generators: Vec<GeneratorRecord>,
    /// Sample headers.
    pub samples: Vec<SampleHeader>,
    /// 16-bit PCM shared by every sample.
    pub sample_data: Vec<i16>,
}

/// A sample to add with [`SoundFontBuilder::add_sample`].
#[derive(Debug, Clone)]
pub struct SampleSpec<'a> {
    name: String,
    data: &'a [i16],
    sample_rate: u32,
    original_key: u8,
    correction: i8,
    loop_points: Option<(u32, u32)>,
}

impl<'a> SampleSpec<'a> {
    /// A mono sample at `sample_rate`, original key 60, no loop.
    pub fn new(name: impl Into<String>, data: &'a [i16], sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            data,
            sample_rate,
            original_key: 60,
            correction: 0,
            loop_points: None,
        }
    }

    /// Key at which the sample plays at its recorded pitch.
    pub fn original_key(mut self, key: u8) -> Self {
        self.original_key = key.min(127);
        self
    }

    /// Pitch correction in cents.
    pub fn correction(mut self, cents: i8) -> Self {
        self.correction = cents;
        self
    }

    /// Loop start and end, relative to the first sample.
    pub fn loop_points(mut self, start: u32, end: u32) -> Self {
        self.loop_points = Some((start, end));
        self
    }
}

/// A zone to add with [`SoundFontBuilder`].
///
/// `key_range` and `velocity_range` are always written first (in that
/// order) and the link (sample or instrument) last, as SF2 requires.
#[derive(Debug, Clone, Default)]
pub struct ZoneSpec {
    key_range: Option<(u8, u8)>,
    velocity_range: Option<(u8, u8)>,
    generators: Vec<GeneratorRecord>,
    modulators: Vec<ModulatorRecord>,
    link: Option<u16>,
}

impl ZoneSpec {
    /// An empty zone. Without a link it is a global zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the zone to keys `low..=high`.
    pub fn key_range(mut self, low: u8, high: u8) -> Self {
        self.key_range = Some((low, high));
        self
    }

    /// Restrict the zone to velocities `low..=high`.
    pub fn velocity_range(mut self, low: u8, high: u8) -> Self {
        self.velocity_range = Some((low, high));
        self
    }

    /// Add a generator with a signed amount.
    pub fn generator(mut self, index: GeneratorIndex, amount: i16) -> Self {
        self.generators
            .push(GeneratorRecord::new(index, GeneratorAmount::from_signed(amount)));
        self
    }

    /// Add a raw generator record, unknown indices included.
    pub fn raw_generator(mut self, record: GeneratorRecord) -> Self {
        self.generators.push(record);
        self
    }

    /// Add a modulator.
    pub fn modulator(mut self, record: ModulatorRecord) -> Self {
        self.modulators.push(record);
        self
    }

    /// Link the zone to a sample (instrument zones) or an instrument (preset zones).
    pub fn link(mut self, index: u16) -> Self {
        self.link = Some(index);
        self
    }

    fn write(&self, terminal: GeneratorIndex, generators: &mut Vec<GeneratorRecord>, modulators: &mut Vec<ModulatorRecord>) {
        if let Some((low, high)) = self.key_range {
            generators.push(GeneratorRecord::new(
                GeneratorIndex::KeyRange,
                GeneratorAmount::from_range(low, high),
            ));
        }
        if let Some((low, high)) = self.velocity_range {
            generators.push(GeneratorRecord::new(
                GeneratorIndex::VelRange,
                GeneratorAmount::from_range(low, high),
            ));
        }
        generators.extend_from_slice(&self.generators);
        if let Some(link) = self.link {
            generators.push(GeneratorRecord::new(terminal, GeneratorAmount::from_raw(link)));
        }
        modulators.extend_from_slice(&self.modulators);
    }
}

/// Builds [`SoundFontData`] programmatically.
#[derive(Debug, Clone, Default)]
pub struct SoundFontBuilder {
    presets: Vec<(String, u16, u16, Vec<ZoneSpec>)>,
    instruments: Vec<(String, Vec<ZoneSpec>)>,
    samples: Vec<SampleHeader>,
    sample_data: Vec<i16>,
}

impl SoundFontBuilder {
    /// An empty font.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample and return its index.
    pub fn add_sample(&mut self, spec: SampleSpec<'_>) -> u16 {
        let start = self.sample_data.len() as u32;
        self.sample_data.extend_from_slice(spec.data);
        let end = self.sample_data.len() as u32;
        self.sample_data
            .extend(core::iter::repeat_n(0, SAMPLE_PADDING));

        let (loop_start, loop_end) = match spec.loop_points {
            Some((s, e)) => (start + s, start + e),
            None => (start, start),
        };
        self.samples.push(SampleHeader {
            name: spec.name,
            start,
            end,
            loop_start,
            loop_end,
            sample_rate: spec.sample_rate,
            original_key: spec.original_key,
            correction: spec.correction,
            link: 0,
            kind: SampleKind::Mono,
        });
        (self.samples.len() - 1) as u16
    }

    /// Append an instrument and return its index. Zones link to samples.
    pub fn add_instrument(&mut self, name: impl Into<String>, zones: Vec<ZoneSpec>) -> u16 {
        self.instruments.push((name.into(), zones));
        (self.instruments.len() - 1) as u16
    }

    /// Append a preset and return its index. Zones link to instruments.
    pub fn add_preset(&mut self, name: impl Into<String>, bank: u16, program: u16, zones: Vec<ZoneSpec>) -> u16 {
        self.presets.push((name.into(), bank, program, zones));
        (self.presets.len() - 1) as u16
    }

    /// Write the record lists, terminal records included.
    pub fn build(&self) -> SoundFontData {
        let mut data = SoundFontData {
            samples: self.samples.clone(),
            sample_data: self.sample_data.clone(),
            ..SoundFontData::default()
        };

        for (name, bank, program, zones) in &self.presets {
            data.presets.push(PresetHeader {
                name: name.clone(),
                program: *program,
                bank: *bank,
                first_zone: data.preset_bags.len() as u16,
            });
            for zone in zones {
                data.preset_bags.push(Bag {
                    first_generator: data.preset_generators.len() as u16,
                    first_modulator: data.preset_modulators.len() as u16,
                });
                zone.write(
                    GeneratorIndex::Instrument,
                    &mut data.preset_generators,
                    &mut data.preset_modulators,
                );
            }
        }
        data.presets.push(PresetHeader {
            name: "EOP".to_string(),
            program: 0,
            bank: 0,
            first_zone: data.preset_bags.len() as u16,
        });
        data.preset_bags.push(Bag {
            first_generator: data.preset_generators.len() as u16,
            first_modulator: data.preset_modulators.len() as u16,
        });

        for (name, zones) in &self.instruments {
            data.instruments.push(InstrumentHeader {
                name: name.clone(),
                first_zone: data.instrument_bags.len() as u16,
            });
            for zone in zones {
                data.instrument_bags.push(Bag {
                    first_generator: data.instrument_generators.len() as u16,
                    first_modulator: data.instrument_modulators.len() as u16,
                });
                zone.write(
                    GeneratorIndex::SampleId,
                    &mut data.instrument_generators,
                    &mut data.instrument_modulators,
                );
            }
        }
        data.instruments.push(InstrumentHeader {
            name: "EOI".to_string(),
            first_zone: data.instrument_bags.len() as u16,
        });
        data.instrument_bags.push(Bag {
            first_generator: data.instrument_generators.len() as u16,
            first_modulator: data.instrument_modulators.len() as u16,
        });

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_kind_decoding() {
        assert_eq!(SampleKind::from_raw(1), Some(SampleKind::Mono));
        assert_eq!(SampleKind::from_raw(0x8004), Some(SampleKind::Left));
        assert_eq!(SampleKind::from_raw(3), None);
    }

    #[test]
    fn test_builder_writes_terminals() {
        let data = SoundFontBuilder::new().build();
        assert_eq!(data.presets.len(), 1);
        assert_eq!(data.presets[0].name, "EOP");
        assert_eq!(data.preset_bags.len(), 1);
        assert_eq!(data.instruments.len(), 1);
        assert_eq!(data.instrument_bags.len(), 1);
    }

    #[test]
    fn test_builder_orders_zone_generators() {
        let samples = [0i16; 10];
        let mut builder = SoundFontBuilder::new();
        let sample = builder.add_sample(SampleSpec::new("s", &samples, 22050));
        builder.add_instrument(
            "i",
            vec![
                ZoneSpec::new()
                    .generator(GeneratorIndex::Pan, -200)
                    .velocity_range(10, 20)
                    .key_range(30, 40)
                    .link(sample),
            ],
        );
        let data = builder.build();
        let indices: Vec<u16> = data.instrument_generators.iter().map(|g| g.index).collect();
        assert_eq!(
            indices,
            vec![
                GeneratorIndex::KeyRange.raw(),
                GeneratorIndex::VelRange.raw(),
                GeneratorIndex::Pan.raw(),
                GeneratorIndex::SampleId.raw(),
            ]
        );
        assert_eq!(data.instrument_generators[0].amount.range(), (30, 40));
    }

    #[test]
    fn test_builder_sample_layout() {
        let a = [1i16; 10];
        let b = [2i16; 5];
        let mut builder = SoundFontBuilder::new();
        builder.add_sample(SampleSpec::new("a", &a, 44100));
        let second = builder.add_sample(SampleSpec::new("b", &b, 44100).loop_points(1, 4));
        let data = builder.build();

        assert_eq!(second, 1);
        let header = &data.samples[1];
        assert_eq!(header.start as usize, 10 + SAMPLE_PADDING);
        assert_eq!(header.end - header.start, 5);
        assert_eq!(header.loop_start - header.start, 1);
        assert_eq!(header.loop_end - header.start, 4);
        assert_eq!(data.sample_data.len(), 15 + 2 * SAMPLE_PADDING);
    }

    #[test]
    fn test_bag_ranges() {
        let mut builder = SoundFontBuilder::new();
        builder.add_instrument("i", vec![ZoneSpec::new(), ZoneSpec::new().generator(GeneratorIndex::Pan, 1)]);
        builder.add_preset("p", 0, 0, vec![ZoneSpec::new().link(0)]);
        let data = builder.build();
        assert_eq!(data.instrument_bags.len(), 3);
        assert_eq!(data.instruments[1].first_zone, 2);
        assert_eq!(data.instrument_bags[2].first_generator, 1);
        assert_eq!(data.preset_generators.len(), 1);
    }
}
