//! Shared helpers for CLI commands: building a one-preset font and loading config.

use anyhow::{Context, bail};
use clap::Args;
use fuente_config::{EngineConfig, default_engine_config_path};
use fuente_core::hz_to_cents;
use fuente_io::read_wav_mono;
use fuente_synth::{GeneratorIndex, SampleSpec, SoundFontBuilder, SoundFontData, ZoneSpec};
use std::path::PathBuf;
use tracing::{debug, info};

/// Sample rate of the synthetic sine sample.
const SINE_RATE: u32 = 44100;

/// Where the instrument's single sample comes from.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// WAV file to use as the sample (mixed to mono, 16-bit)
    #[arg(long, value_name = "FILE.wav", conflicts_with = "sine")]
    pub sample: Option<PathBuf>,

    /// Synthesize a looped sine at this frequency instead of reading a file
    #[arg(long, value_name = "HZ")]
    pub sine: Option<f32>,

    /// MIDI key the sample plays back unchanged at (default 60 for files,
    /// nearest key for --sine)
    #[arg(long, value_name = "KEY")]
    pub root_key: Option<u8>,

    /// Loop the second half of a WAV sample while the note sounds
    #[arg(long = "loop")]
    pub looped: bool,

    /// Volume envelope release in seconds
    #[arg(long, default_value = "0.3")]
    pub release: f32,
}

impl SourceArgs {
    /// Build a font with one preset (bank 0, program 0) and one instrument zone.
    pub fn build_font(&self) -> anyhow::Result<SoundFontData> {
        let mut builder = SoundFontBuilder::new();
        let (name, sample, looped) = match &self.sample {
            Some(path) => {
                let (pcm, spec) = read_wav_mono(path)
                    .with_context(|| format!("failed to read sample {}", path.display()))?;
                if pcm.len() < 2 {
                    bail!("sample {} has no audio", path.display());
                }
                let name = path
                    .file_stem()
                    .map_or_else(|| "sample".to_string(), |s| s.to_string_lossy().into_owned());
                let mut spec = SampleSpec::new(name.clone(), &pcm, spec.sample_rate)
                    .original_key(self.root_key.unwrap_or(60).min(127));
                if self.looped {
                    spec = spec.loop_points((pcm.len() / 2) as u32, pcm.len() as u32);
                }
                info!(file = %path.display(), frames = pcm.len(), "loaded sample");
                (name, builder.add_sample(spec), self.looped)
            }
            None => {
                let frequency = self.sine.unwrap_or(440.0);
                if !(1.0..=20000.0).contains(&frequency) {
                    bail!("sine frequency must be within 1..=20000 Hz, got {frequency}");
                }
                let (pcm, key, correction) = sine_sample(frequency);
                let key = self.root_key.map_or(key, |k| k.min(127));
                let spec = SampleSpec::new("sine", &pcm, SINE_RATE)
                    .original_key(key)
                    .correction(correction)
                    .loop_points(SINE_RATE, 2 * SINE_RATE);
                ("sine".to_string(), builder.add_sample(spec), true)
            }
        };

        let release = (1200.0 * self.release.max(0.001).log2()).round() as i16;
        let mut zone = ZoneSpec::new().generator(GeneratorIndex::ReleaseVolEnv, release);
        if looped {
            zone = zone.generator(GeneratorIndex::SampleModes, 1);
        }
        let instrument = builder.add_instrument(name.clone(), vec![zone.link(sample)]);
        builder.add_preset(name, 0, 0, vec![ZoneSpec::new().link(instrument)]);
        Ok(builder.build())
    }
}

/// Two seconds of a whole number of sine cycles per second, with the key and
/// pitch correction that describe the synthesized frequency.
fn sine_sample(frequency: f32) -> (Vec<i16>, u8, i8) {
    let cycles = frequency.round().max(1.0);
    let pcm = (0..2 * SINE_RATE)
        .map(|i| {
            let phase = f64::from(i) * f64::from(cycles) / f64::from(SINE_RATE);
            ((phase * std::f64::consts::TAU).sin() * 0.8 * 32767.0).round() as i16
        })
        .collect();

    let cents = hz_to_cents(f64::from(cycles));
    let key = (cents / 100.0).round().clamp(0.0, 127.0);
    let correction = (key * 100.0 - cents).round().clamp(-99.0, 99.0) as i8;
    (pcm, key as u8, correction)
}

/// Load the engine configuration from `path`, else the user config file, else defaults.
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = path {
        return EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let user = default_engine_config_path();
    if user.is_file() {
        debug!(path = %user.display(), "using user config");
        return EngineConfig::load(&user)
            .with_context(|| format!("failed to load config {}", user.display()));
    }
    Ok(EngineConfig::default())
}
