//! Property-based tests for the fuente-synth engine.
//!
//! Arbitrary event streams must keep the voice pool consistent and the output
//! finite; generator amounts survive the signed/unsigned views; zone ranges
//! match exactly the keys they contain.

use fuente_synth::{
    Engine, EngineConfig, GeneratorAmount, GeneratorIndex, MidiEvent, SampleSpec,
    SoundFontBuilder, SoundFontData, ZoneRange, ZoneSpec,
};
use proptest::prelude::*;

fn font() -> SoundFontData {
    let data: Vec<i16> = (0..256)
        .map(|i| ((i as f32 / 32.0 * std::f32::consts::TAU).sin() * 20000.0) as i16)
        .collect();
    let mut builder = SoundFontBuilder::new();
    let sample = builder.add_sample(
        SampleSpec::new("sine", &data, 32000)
            .original_key(60)
            .loop_points(32, 224),
    );
    let instrument = builder.add_instrument(
        "sine",
        vec![
            ZoneSpec::new()
                .key_range(0, 80)
                .generator(GeneratorIndex::SampleModes, 1)
                .generator(GeneratorIndex::ExclusiveClass, 0)
                .link(sample),
            ZoneSpec::new()
                .key_range(60, 127)
                .generator(GeneratorIndex::SampleModes, 3)
                .generator(GeneratorIndex::ReleaseVolEnv, -2000)
                .link(sample),
        ],
    );
    builder.add_preset("sine", 0, 0, vec![ZoneSpec::new().link(instrument)]);
    builder.build()
}

fn event() -> impl Strategy<Value = MidiEvent> {
    prop_oneof![
        4 => (0u8..128, 1u8..128).prop_map(|(key, velocity)| MidiEvent::NoteOn { channel: 0, key, velocity }),
        3 => (0u8..128).prop_map(|key| MidiEvent::NoteOff { channel: 0, key }),
        1 => (prop::sample::select(vec![1u8, 7, 10, 11, 64, 120, 121, 123]), 0u8..128)
            .prop_map(|(controller, value)| MidiEvent::ControlChange { channel: 0, controller, value }),
        1 => (0u16..16384).prop_map(|value| MidiEvent::PitchBend { channel: 0, value }),
        1 => (0u8..128).prop_map(|value| MidiEvent::ChannelPressure { channel: 0, value }),
        1 => Just(MidiEvent::Reset),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every voice is either active or on the free stack, and the key map only
    /// points at active voices playing that key.
    #[test]
    fn pool_stays_consistent(
        voices in 1usize..8,
        retrigger in any::<bool>(),
        blocks in prop::collection::vec(prop::collection::vec(event(), 0..6), 1..24),
    ) {
        let config = EngineConfig::default()
            .with_sample_rate(32000)
            .with_voice_count(voices)
            .with_one_voice_per_key(retrigger);
        let (mut engine, handle) = Engine::new(config);
        handle.load(&font()).unwrap();

        let mut left = [0.0f32; 128];
        let mut right = [0.0f32; 128];
        for block in blocks {
            for event in block {
                handle.send(event).unwrap();
            }
            engine.render(&mut left, &mut right);

            prop_assert_eq!(engine.active_voice_count() + engine.available_voice_count(), voices);
            for (key, slot) in engine.active_keys().iter().enumerate() {
                if let Some(index) = *slot {
                    let voice = &engine.voices()[index];
                    prop_assert!(voice.is_active());
                    prop_assert_eq!(usize::from(voice.key()), key);
                }
            }
            prop_assert!(left.iter().chain(&right).all(|s| s.is_finite() && s.abs() < 16.0));
        }
    }

    /// Signed and unsigned views of an amount read back what was stored.
    #[test]
    fn generator_amount_views(value in any::<i16>()) {
        let amount = GeneratorAmount::from_signed(value);
        prop_assert_eq!(amount.signed(), value);
        prop_assert_eq!(amount.unsigned(), value as u16);
    }

    /// A range contains exactly the keys between its bounds.
    #[test]
    fn zone_range_contains(low in 0u8..128, high in 0u8..128, key in 0u8..128) {
        match ZoneRange::new(low, high) {
            Some(range) => {
                prop_assert!(low <= high);
                prop_assert_eq!(range.contains(key), low <= key && key <= high);
            }
            None => prop_assert!(low > high),
        }
    }
}
