//! Instruments, presets, and the zone resolution that turns a note into voice configs.

use crate::sample::SampleSource;
use crate::zone::{Zone, ZoneCollection, ZoneKind};

/// A layered collection of sample zones.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    name: String,
    zones: ZoneCollection,
}

impl Instrument {
    /// Create an instrument from its zones.
    pub fn new(name: impl Into<String>, zones: ZoneCollection) -> Self {
        Self {
            name: name.into(),
            zones,
        }
    }

    /// Instrument name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zones of the instrument.
    pub fn zones(&self) -> &ZoneCollection {
        &self.zones
    }
}

/// A bank/program addressable entry point composing instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    name: String,
    bank: u16,
    program: u16,
    zones: ZoneCollection,
}

/// Everything a voice needs to start: the four zones that shape it and the sample it plays.
#[derive(Debug, Clone, Copy)]
pub struct VoiceConfig<'a> {
    /// Global zone of the preset, if any.
    pub preset_global: Option<&'a Zone>,
    /// Matching preset zone.
    pub preset_zone: &'a Zone,
    /// Global zone of the instrument, if any.
    pub instrument_global: Option<&'a Zone>,
    /// Matching instrument zone.
    pub instrument_zone: &'a Zone,
    /// Index of the sample in the font.
    pub sample_index: usize,
    /// The sample to play.
    pub sample: &'a SampleSource,
}

impl Preset {
    /// Create a preset from its zones.
    pub fn new(name: impl Into<String>, bank: u16, program: u16, zones: ZoneCollection) -> Self {
        Self {
            name: name.into(),
            bank,
            program,
            zones,
        }
    }

    /// Preset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIDI bank.
    pub fn bank(&self) -> u16 {
        self.bank
    }

    /// MIDI program.
    pub fn program(&self) -> u16 {
        self.program
    }

    /// Zones of the preset.
    pub fn zones(&self) -> &ZoneCollection {
        &self.zones
    }

    /// Call `f` with one [`VoiceConfig`] per matching (preset zone, instrument zone) pair.
    ///
    /// Preset zones are visited in file order and, for each, the matching zones
    /// of its instrument in file order. Both zones of a pair must contain
    /// `(key, velocity)`. Links to missing instruments or samples are skipped.
    /// Does not allocate.
    pub fn for_each_match<'a>(
        &'a self,
        instruments: &'a [Instrument],
        samples: &'a [SampleSource],
        key: u8,
        velocity: u8,
        mut f: impl FnMut(VoiceConfig<'a>),
    ) {
        let preset_global = self.zones.global();
        for preset_zone in self.zones.find(key, velocity) {
            let ZoneKind::Preset { instrument } = preset_zone.kind() else {
                continue;
            };
            let Some(instrument) = instruments.get(usize::from(instrument)) else {
                continue;
            };
            let instrument_global = instrument.zones().global();
            for instrument_zone in instrument.zones().find(key, velocity) {
                let ZoneKind::Instrument { sample } = instrument_zone.kind() else {
                    continue;
                };
                let sample_index = usize::from(sample);
                let Some(sample) = samples.get(sample_index) else {
                    continue;
                };
                f(VoiceConfig {
                    preset_global,
                    preset_zone,
                    instrument_global,
                    instrument_zone,
                    sample_index,
                    sample,
                });
            }
        }
    }

    /// Collect the voice configs for `(key, velocity)`. See [`for_each_match`](Self::for_each_match).
    pub fn find<'a>(
        &'a self,
        instruments: &'a [Instrument],
        samples: &'a [SampleSource],
        key: u8,
        velocity: u8,
    ) -> Vec<VoiceConfig<'a>> {
        let mut configs = Vec::new();
        self.for_each_match(instruments, samples, key, velocity, |config| {
            configs.push(config)
        });
        configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::GeneratorRecord;
    use crate::generator::{GeneratorAmount, GeneratorIndex};

    fn zone(terminal: GeneratorIndex, link: Option<u16>, keys: (u8, u8)) -> Zone {
        let mut gens = vec![GeneratorRecord::new(
            GeneratorIndex::KeyRange,
            GeneratorAmount::from_range(keys.0, keys.1),
        )];
        if let Some(link) = link {
            gens.push(GeneratorRecord::new(terminal, GeneratorAmount::from_raw(link)));
        }
        Zone::from_records(&gens, &[], terminal).unwrap()
    }

    fn fixture() -> (Preset, Vec<Instrument>, Vec<SampleSource>) {
        let samples = (0..3)
            .map(|i| SampleSource::from_normalized(format!("s{i}"), vec![0.0; 8], 44100, 60, None))
            .collect();
        let instruments = vec![
            Instrument::new(
                "low",
                ZoneCollection::new(vec![
                    zone(GeneratorIndex::SampleId, None, (0, 127)),
                    zone(GeneratorIndex::SampleId, Some(0), (0, 59)),
                    zone(GeneratorIndex::SampleId, Some(1), (50, 127)),
                ]),
            ),
            Instrument::new(
                "high",
                ZoneCollection::new(vec![zone(GeneratorIndex::SampleId, Some(2), (0, 127))]),
            ),
        ];
        let preset = Preset::new(
            "layered",
            0,
            0,
            ZoneCollection::new(vec![
                zone(GeneratorIndex::Instrument, Some(0), (0, 127)),
                zone(GeneratorIndex::Instrument, Some(1), (55, 127)),
                zone(GeneratorIndex::Instrument, Some(9), (0, 127)),
            ]),
        );
        (preset, instruments, samples)
    }

    #[test]
    fn test_find_layers_in_file_order() {
        let (preset, instruments, samples) = fixture();

        let configs = preset.find(&instruments, &samples, 56, 100);
        let picked: Vec<usize> = configs.iter().map(|c| c.sample_index).collect();
        assert_eq!(picked, vec![0, 1, 2]);
        assert!(configs[0].instrument_global.is_some());
        assert!(configs[2].instrument_global.is_none());
        assert!(configs.iter().all(|c| c.preset_global.is_none()));

        let picked: Vec<usize> = preset
            .find(&instruments, &samples, 10, 100)
            .iter()
            .map(|c| c.sample_index)
            .collect();
        assert_eq!(picked, vec![0]);
    }

    #[test]
    fn test_global_only_instrument_yields_nothing() {
        let samples = vec![SampleSource::from_normalized("s", vec![0.0; 8], 44100, 60, None)];
        let instruments = vec![Instrument::new(
            "globals",
            ZoneCollection::new(vec![zone(GeneratorIndex::SampleId, None, (0, 127))]),
        )];
        let preset = Preset::new(
            "p",
            0,
            0,
            ZoneCollection::new(vec![zone(GeneratorIndex::Instrument, Some(0), (0, 127))]),
        );
        assert!(preset.find(&instruments, &samples, 60, 100).is_empty());
    }
}
