//! Integration tests for fuente-synth.
//!
//! Tests cover rendering through the public engine API: pitch and level of a
//! looped sine, voice allocation and stealing, zone selection, release, and
//! driving the engine from a second thread.

use fuente_synth::{
    Engine, EngineConfig, EngineHandle, GeneratorIndex, SampleSpec, SoundFontBuilder,
    SoundFontData, ZoneSpec,
};
use rustfft::{FftPlanner, num_complex::Complex};

const SR: u32 = 44000;
const BLOCK: usize = 512;

/// One period of a full-scale sine every 100 samples (440 Hz at 44 kHz), looped
/// over the second period and rooted at A4.
fn sine_font() -> SoundFontData {
    let mut builder = SoundFontBuilder::new();
    let sample = builder.add_sample(sine_spec(&sine_data(100, 400)));
    let instrument = builder.add_instrument("sine", vec![looped().link(sample)]);
    builder.add_preset("sine", 0, 0, vec![ZoneSpec::new().link(instrument)]);
    builder.build()
}

fn looped() -> ZoneSpec {
    ZoneSpec::new().generator(GeneratorIndex::SampleModes, 1)
}

fn sine_data(period: usize, len: usize) -> Vec<i16> {
    (0..len)
        .map(|i| {
            let phase = (i % period) as f64 / period as f64 * std::f64::consts::TAU;
            (phase.sin() * 32767.0).round() as i16
        })
        .collect()
}

fn sine_spec(data: &[i16]) -> SampleSpec<'_> {
    SampleSpec::new("sine", data, SR)
        .original_key(69)
        .loop_points(100, 200)
}

fn engine(config: EngineConfig, data: &SoundFontData) -> (Engine, EngineHandle) {
    let (engine, handle) = Engine::new(config.with_sample_rate(SR));
    handle.load(data).unwrap();
    handle.select_preset(0, 0).unwrap();
    (engine, handle)
}

fn render(engine: &mut Engine, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    for (l, r) in left.chunks_mut(BLOCK).zip(right.chunks_mut(BLOCK)) {
        engine.render(l, r);
    }
    (left, right)
}

fn peak_frequency(signal: &[f32]) -> f32 {
    let len = signal.len();
    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(len).process(&mut buffer);
    let bin = buffer[1..len / 2]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
        .map(|(i, _)| i + 1)
        .unwrap();
    bin as f32 * SR as f32 / len as f32
}

fn sorted_keys(engine: &Engine) -> Vec<u8> {
    let mut keys: Vec<u8> = engine.voice_keys().collect();
    keys.sort_unstable();
    keys
}

// ---------------------------------------------------------------------------
// 1. Silence and level
// ---------------------------------------------------------------------------

#[test]
fn empty_engine_renders_silence() {
    let (mut engine, handle) = Engine::new(EngineConfig::default());
    handle.note_on(60, 127).unwrap();
    let (left, right) = render(&mut engine, 4096);
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
}

#[test]
fn looped_sine_plays_at_unity_level() {
    let (mut engine, handle) = engine(EngineConfig::default(), &sine_font());
    handle.note_on(69, 127).unwrap();
    let (left, right) = render(&mut engine, 22000);

    let peak = left[2000..]
        .iter()
        .zip(&right[2000..])
        .map(|(l, r)| (l * l + r * r).sqrt())
        .fold(0.0f32, f32::max);
    assert!((0.99..=1.01).contains(&peak), "peak {peak}");
    assert!(left.iter().all(|s| s.is_finite()));
}

// ---------------------------------------------------------------------------
// 2. Pitch
// ---------------------------------------------------------------------------

#[test]
fn root_key_plays_at_sample_pitch() {
    let (mut engine, handle) = engine(EngineConfig::default(), &sine_font());
    handle.note_on(69, 127).unwrap();
    let (left, _) = render(&mut engine, 2048 + 8192);
    let freq = peak_frequency(&left[2048..]);
    assert!((freq - 440.0).abs() < 6.0, "peak at {freq} Hz");
}

#[test]
fn octave_up_doubles_frequency() {
    let (mut engine, handle) = engine(EngineConfig::default(), &sine_font());
    handle.note_on(81, 127).unwrap();
    let (left, _) = render(&mut engine, 2048 + 8192);
    let freq = peak_frequency(&left[2048..]);
    assert!((freq - 880.0).abs() < 6.0, "peak at {freq} Hz");
}

#[test]
fn pitch_wheel_bends_up_two_semitones() {
    let (mut engine, handle) = engine(EngineConfig::default(), &sine_font());
    handle.pitch_bend(16383).unwrap();
    handle.note_on(69, 127).unwrap();
    let (left, _) = render(&mut engine, 2048 + 8192);
    let freq = peak_frequency(&left[2048..]);
    assert!((freq - 493.4).abs() < 6.0, "peak at {freq} Hz");
}

#[test]
fn coarse_tune_generator_transposes() {
    let mut builder = SoundFontBuilder::new();
    let data = sine_data(100, 400);
    let sample = builder.add_sample(sine_spec(&data));
    let instrument = builder.add_instrument(
        "sine",
        vec![
            looped()
                .generator(GeneratorIndex::CoarseTune, -12)
                .link(sample),
        ],
    );
    builder.add_preset("sine", 0, 0, vec![ZoneSpec::new().link(instrument)]);
    let (mut engine, handle) = engine(EngineConfig::default(), &builder.build());
    handle.note_on(69, 127).unwrap();
    let (left, _) = render(&mut engine, 2048 + 8192);
    let freq = peak_frequency(&left[2048..]);
    assert!((freq - 220.0).abs() < 6.0, "peak at {freq} Hz");
}

// ---------------------------------------------------------------------------
// 3. Voice allocation
// ---------------------------------------------------------------------------

#[test]
fn pool_of_two_steals_oldest() {
    let (mut engine, handle) = engine(EngineConfig::default().with_voice_count(2), &sine_font());
    for key in [60, 62, 64] {
        handle.note_on(key, 100).unwrap();
    }
    render(&mut engine, BLOCK);
    assert_eq!(sorted_keys(&engine), vec![62, 64]);
}

#[test]
fn one_voice_per_key_reuses_voice() {
    let config = EngineConfig::default()
        .with_voice_count(8)
        .with_one_voice_per_key(true);
    let (mut engine, handle) = engine(config, &sine_font());
    handle.note_on(60, 64).unwrap();
    handle.note_on(60, 127).unwrap();
    render(&mut engine, BLOCK);
    assert_eq!(engine.available_voice_count(), 7);
}

#[test]
fn chord_uses_one_voice_per_note() {
    let (mut engine, handle) = engine(EngineConfig::default().with_voice_count(16), &sine_font());
    for key in [60, 64, 67, 72] {
        handle.note_on(key, 100).unwrap();
    }
    render(&mut engine, BLOCK);
    assert_eq!(engine.active_voice_count(), 4);
    assert_eq!(engine.available_voice_count(), 12);
    for key in [60, 64, 67, 72] {
        let index = engine.active_keys()[key as usize].unwrap();
        assert_eq!(engine.voices()[index].key(), key);
    }
}

// ---------------------------------------------------------------------------
// 4. Zone selection and layering
// ---------------------------------------------------------------------------

#[test]
fn key_ranges_pick_the_matching_sample() {
    let mut builder = SoundFontBuilder::new();
    let low = sine_data(100, 400);
    let high = sine_data(50, 400);
    let low = builder.add_sample(sine_spec(&low));
    let high = builder.add_sample(sine_spec(&high));
    let instrument = builder.add_instrument(
        "split",
        vec![
            looped().key_range(0, 63).link(low),
            looped().key_range(64, 127).link(high),
        ],
    );
    builder.add_preset("split", 0, 0, vec![ZoneSpec::new().link(instrument)]);
    let (mut engine, handle) = engine(EngineConfig::default(), &builder.build());

    handle.note_on(60, 100).unwrap();
    handle.note_on(70, 100).unwrap();
    render(&mut engine, BLOCK);
    let samples: Vec<(u8, usize)> = engine
        .voices()
        .iter()
        .filter(|v| v.is_active())
        .map(|v| (v.key(), v.sample_index()))
        .collect();
    assert!(samples.contains(&(60, usize::from(low))));
    assert!(samples.contains(&(70, usize::from(high))));
}

#[test]
fn layered_preset_starts_a_voice_per_zone() {
    let mut builder = SoundFontBuilder::new();
    let data = sine_data(100, 400);
    let sample = builder.add_sample(sine_spec(&data));
    let a = builder.add_instrument("a", vec![looped().link(sample)]);
    let b = builder.add_instrument("b", vec![looped().velocity_range(0, 63).link(sample)]);
    let c = builder.add_instrument("c", vec![looped().link(sample)]);
    builder.add_preset(
        "layers",
        0,
        0,
        vec![
            ZoneSpec::new().link(a),
            ZoneSpec::new().link(b),
            ZoneSpec::new().key_range(0, 10).link(c),
        ],
    );
    let (mut engine, handle) = engine(EngineConfig::default(), &builder.build());

    handle.note_on(60, 100).unwrap();
    render(&mut engine, BLOCK);
    assert_eq!(engine.active_voice_count(), 1);

    handle.note_on(62, 40).unwrap();
    render(&mut engine, BLOCK);
    assert_eq!(engine.active_voice_count(), 3);
}

// ---------------------------------------------------------------------------
// 5. Release and sample end
// ---------------------------------------------------------------------------

#[test]
fn note_off_releases_and_frees_voice() {
    let (mut engine, handle) = engine(EngineConfig::default(), &sine_font());
    handle.note_on(69, 100).unwrap();
    render(&mut engine, 4096);
    assert_eq!(engine.active_voice_count(), 1);

    handle.note_off(69).unwrap();
    render(&mut engine, 4096);
    assert_eq!(engine.active_voice_count(), 0);
    assert_eq!(engine.available_voice_count(), engine.config().voice_count);
    assert!(engine.active_keys()[69].is_none());

    let (left, right) = render(&mut engine, BLOCK);
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
}

#[test]
fn unlooped_sample_finishes_on_its_own() {
    let mut builder = SoundFontBuilder::new();
    let data = sine_data(100, 400);
    let sample = builder.add_sample(SampleSpec::new("once", &data, SR).original_key(69));
    let instrument = builder.add_instrument("once", vec![ZoneSpec::new().link(sample)]);
    builder.add_preset("once", 0, 0, vec![ZoneSpec::new().link(instrument)]);
    let (mut engine, handle) = engine(EngineConfig::default(), &builder.build());

    handle.note_on(69, 100).unwrap();
    render(&mut engine, BLOCK);
    render(&mut engine, BLOCK);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn all_sound_off_silences_immediately() {
    let (mut engine, handle) = engine(EngineConfig::default(), &sine_font());
    for key in [60, 64, 67] {
        handle.note_on(key, 100).unwrap();
    }
    render(&mut engine, BLOCK);
    handle.control_change(120, 0).unwrap();
    let (left, right) = render(&mut engine, BLOCK);
    assert_eq!(engine.active_voice_count(), 0);
    assert!(left.iter().chain(&right).all(|&s| s == 0.0));
}

// ---------------------------------------------------------------------------
// 6. Threads
// ---------------------------------------------------------------------------

#[test]
fn control_thread_drives_render_thread() {
    let (mut engine, handle) = engine(EngineConfig::default().with_voice_count(4), &sine_font());
    render(&mut engine, BLOCK);

    std::thread::scope(|scope| {
        let control = handle.clone();
        scope.spawn(move || {
            for round in 0..50u8 {
                let key = 48 + round % 24;
                while control.note_on(key, 100).is_err() {
                    std::thread::yield_now();
                }
                while control.note_off(key).is_err() {
                    std::thread::yield_now();
                }
            }
        });

        for _ in 0..200 {
            render(&mut engine, 64);
            assert_eq!(engine.active_voice_count() + engine.available_voice_count(), 4);
        }
    });

    render(&mut engine, 8192);
    assert_eq!(engine.active_voice_count(), 0);
}
