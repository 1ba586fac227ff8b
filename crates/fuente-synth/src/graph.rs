//! The immutable preset → instrument → sample graph built from a loaded font.
//!
//! A graph is built on the control side, validated completely, and then
//! published to the render thread as an `Arc`. Nothing in it changes after
//! construction; voices hold indices into it.

use tracing::{debug, warn};

use crate::error::LoadError;
use crate::file::{Bag, GeneratorRecord, ModulatorRecord, SoundFontData};
use crate::generator::GeneratorIndex;
use crate::instrument::{Instrument, Preset, VoiceConfig};
use crate::sample::SampleSource;
use crate::zone::{Zone, ZoneCollection, ZoneKind};

/// Counts reported after a successful load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of presets.
    pub presets: usize,
    /// Number of instruments.
    pub instruments: usize,
    /// Number of samples.
    pub samples: usize,
    /// Generation the graph was published as.
    pub generation: u64,
}

/// Presets, instruments and samples of one font.
#[derive(Debug, Clone, Default)]
pub struct SoundFontGraph {
    presets: Vec<Preset>,
    instruments: Vec<Instrument>,
    samples: Vec<SampleSource>,
    generation: u64,
}

impl SoundFontGraph {
    /// A graph without presets. Every note-on on it is silent.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate `data` and build the graph.
    ///
    /// Presets end up sorted by (bank, program). Zones that are empty, have an
    /// inverted range, or are global but not first are dropped.
    ///
    /// # Errors
    ///
    /// [`LoadError::EmptySampleData`] when samples are declared without data,
    /// [`LoadError::MalformedFile`] for missing terminal records or decreasing
    /// zone indices, and [`LoadError::BadIndex`] for indices past the end of
    /// a list.
    pub fn build(data: &SoundFontData) -> Result<Self, LoadError> {
        if !data.samples.is_empty() && data.sample_data.is_empty() {
            return Err(LoadError::EmptySampleData);
        }

        let samples = data
            .samples
            .iter()
            .map(|header| SampleSource::from_header(header, &data.sample_data))
            .collect::<Result<Vec<_>, _>>()?;

        let instrument_zones = header_zones(
            data.instruments.iter().map(|h| h.first_zone),
            &data.instrument_bags,
            &data.instrument_generators,
            &data.instrument_modulators,
            GeneratorIndex::SampleId,
            "instrument",
        )?;
        let mut instruments = Vec::with_capacity(instrument_zones.len());
        for (header, zones) in data.instruments.iter().zip(instrument_zones) {
            for zone in &zones {
                if let ZoneKind::Instrument { sample } = zone.kind() {
                    check_index("sample", usize::from(sample), samples.len())?;
                }
            }
            instruments.push(Instrument::new(header.name.clone(), collect(&header.name, zones)));
        }

        let preset_zones = header_zones(
            data.presets.iter().map(|h| h.first_zone),
            &data.preset_bags,
            &data.preset_generators,
            &data.preset_modulators,
            GeneratorIndex::Instrument,
            "preset",
        )?;
        let mut presets = Vec::with_capacity(preset_zones.len());
        for (header, zones) in data.presets.iter().zip(preset_zones) {
            for zone in &zones {
                if let ZoneKind::Preset { instrument } = zone.kind() {
                    check_index("instrument", usize::from(instrument), instruments.len())?;
                }
            }
            presets.push(Preset::new(
                header.name.clone(),
                header.bank,
                header.program,
                collect(&header.name, zones),
            ));
        }
        presets.sort_by_key(|p| (p.bank(), p.program()));

        debug!(
            presets = presets.len(),
            instruments = instruments.len(),
            samples = samples.len(),
            "built soundfont graph"
        );

        Ok(Self {
            presets,
            instruments,
            samples,
            generation: 0,
        })
    }

    /// Tag the graph with the generation it is published as.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Generation the graph was published as (0 for the initial empty graph).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Presets sorted by (bank, program).
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Instruments in file order.
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Samples in file order.
    pub fn samples(&self) -> &[SampleSource] {
        &self.samples
    }

    /// Sample at `index`.
    pub fn sample(&self, index: usize) -> Option<&SampleSource> {
        self.samples.get(index)
    }

    /// Index of the first preset with `(bank, program)`.
    pub fn find_preset(&self, bank: u16, program: u16) -> Option<usize> {
        let index = self
            .presets
            .partition_point(|p| (p.bank(), p.program()) < (bank, program));
        self.presets
            .get(index)
            .filter(|p| p.bank() == bank && p.program() == program)
            .map(|_| index)
    }

    /// Call `f` for every voice config the preset at `preset` yields for the note.
    pub fn for_each_voice_config<'a>(
        &'a self,
        preset: usize,
        key: u8,
        velocity: u8,
        f: impl FnMut(VoiceConfig<'a>),
    ) {
        if let Some(preset) = self.presets.get(preset) {
            preset.for_each_match(&self.instruments, &self.samples, key, velocity, f);
        }
    }

    /// Counts of the graph.
    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            presets: self.presets.len(),
            instruments: self.instruments.len(),
            samples: self.samples.len(),
            generation: self.generation,
        }
    }
}

fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), LoadError> {
    if index < len {
        Ok(())
    } else {
        Err(LoadError::bad_index(what, index, len))
    }
}

fn collect(owner: &str, zones: Vec<Zone>) -> ZoneCollection {
    let collection = ZoneCollection::new(zones);
    if collection.is_empty() {
        debug!(owner, "no usable zones");
    }
    collection
}

/// Zones of every header except the terminal one.
///
/// Header `i` owns bags `first[i]..first[i + 1]`; bag `j` owns generators and
/// modulators up to the ones of bag `j + 1`.
fn header_zones(
    first_zones: impl Iterator<Item = u16>,
    bags: &[Bag],
    generators: &[GeneratorRecord],
    modulators: &[ModulatorRecord],
    terminal: GeneratorIndex,
    what: &'static str,
) -> Result<Vec<Vec<Zone>>, LoadError> {
    let firsts: Vec<usize> = first_zones.map(usize::from).collect();
    if firsts.is_empty() {
        return Ok(Vec::new());
    }
    if bags.is_empty() {
        return Err(LoadError::malformed(format!("{what} list has no terminal zone")));
    }

    let mut headers = Vec::with_capacity(firsts.len() - 1);
    for pair in firsts.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start > end {
            return Err(LoadError::malformed(format!(
                "{what} zone indices decrease ({start} > {end})"
            )));
        }
        // the bag after the last zone marks its end
        check_index(what, end, bags.len())?;

        let mut zones = Vec::with_capacity(end - start);
        for j in start..end {
            let (gen_start, gen_end) = (usize::from(bags[j].first_generator), usize::from(bags[j + 1].first_generator));
            let (mod_start, mod_end) = (usize::from(bags[j].first_modulator), usize::from(bags[j + 1].first_modulator));
            if gen_start > gen_end || mod_start > mod_end {
                return Err(LoadError::malformed(format!("{what} zone {j} has decreasing record indices")));
            }
            if gen_end > generators.len() {
                return Err(LoadError::bad_index("generator", gen_end, generators.len()));
            }
            if mod_end > modulators.len() {
                return Err(LoadError::bad_index("modulator", mod_end, modulators.len()));
            }

            match Zone::from_records(&generators[gen_start..gen_end], &modulators[mod_start..mod_end], terminal) {
                Some(zone) => zones.push(zone),
                None => warn!(what, zone = j, "skipping empty zone or zone with inverted range"),
            }
        }
        headers.push(zones);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{SampleSpec, SoundFontBuilder, ZoneSpec};

    fn one_sample_font() -> SoundFontBuilder {
        let mut builder = SoundFontBuilder::new();
        let data = [0i16, 1000, 2000, 1000];
        let sample = builder.add_sample(SampleSpec::new("s", &data, 44100));
        let instrument = builder.add_instrument("i", vec![ZoneSpec::new().link(sample)]);
        builder.add_preset("b", 1, 5, vec![ZoneSpec::new().link(instrument)]);
        builder.add_preset("a", 0, 7, vec![ZoneSpec::new().link(instrument)]);
        builder.add_preset("c", 0, 2, vec![ZoneSpec::new().link(instrument)]);
        builder
    }

    #[test]
    fn test_build_sorts_presets() {
        let graph = SoundFontGraph::build(&one_sample_font().build()).unwrap();
        let ids: Vec<(u16, u16)> = graph.presets().iter().map(|p| (p.bank(), p.program())).collect();
        assert_eq!(ids, vec![(0, 2), (0, 7), (1, 5)]);
        assert_eq!(graph.find_preset(0, 7), Some(1));
        assert_eq!(graph.find_preset(1, 5), Some(2));
        assert_eq!(graph.find_preset(3, 0), None);
        assert_eq!(
            graph.summary(),
            LoadSummary {
                presets: 3,
                instruments: 1,
                samples: 1,
                generation: 0
            }
        );
    }

    #[test]
    fn test_empty_data_builds_empty_graph() {
        let graph = SoundFontGraph::build(&SoundFontData::default()).unwrap();
        assert!(graph.presets().is_empty());
        assert!(graph.samples().is_empty());
    }

    #[test]
    fn test_samples_without_data_fail() {
        let mut data = one_sample_font().build();
        data.sample_data.clear();
        assert_eq!(SoundFontGraph::build(&data).unwrap_err(), LoadError::EmptySampleData);
    }

    #[test]
    fn test_dangling_links_fail() {
        let mut builder = SoundFontBuilder::new();
        let data = [0i16; 4];
        builder.add_sample(SampleSpec::new("s", &data, 44100));
        builder.add_instrument("i", vec![ZoneSpec::new().link(4)]);
        let err = SoundFontGraph::build(&builder.build()).unwrap_err();
        assert_eq!(err, LoadError::bad_index("sample", 4, 1));

        let mut builder = SoundFontBuilder::new();
        builder.add_preset("p", 0, 0, vec![ZoneSpec::new().link(0)]);
        let err = SoundFontGraph::build(&builder.build()).unwrap_err();
        assert_eq!(err, LoadError::bad_index("instrument", 0, 0));
    }

    #[test]
    fn test_missing_terminal_bag_fails() {
        let mut data = one_sample_font().build();
        data.preset_bags.pop();
        assert!(matches!(
            SoundFontGraph::build(&data),
            Err(LoadError::BadIndex { what: "preset", .. })
        ));
        data.preset_bags.clear();
        assert!(matches!(
            SoundFontGraph::build(&data),
            Err(LoadError::MalformedFile { .. })
        ));
    }

    #[test]
    fn test_generator_index_past_end_fails() {
        let mut data = one_sample_font().build();
        let last = data.instrument_bags.len() - 1;
        data.instrument_bags[last].first_generator = 500;
        assert!(matches!(
            SoundFontGraph::build(&data),
            Err(LoadError::BadIndex { what: "generator", .. })
        ));
    }

    #[test]
    fn test_voice_configs_for_note() {
        let graph = SoundFontGraph::build(&one_sample_font().build()).unwrap();
        let mut count = 0;
        graph.for_each_voice_config(0, 60, 100, |config| {
            assert_eq!(config.sample_index, 0);
            assert_eq!(config.sample.len(), 4);
            count += 1;
        });
        assert_eq!(count, 1);
        graph.for_each_voice_config(7, 60, 100, |_| count += 1);
        assert_eq!(count, 1);
    }
}
