//! One sounding note: sample playback shaped by envelopes, LFOs, a filter and pan.
//!
//! # Signal Flow
//!
//! ```text
//!             vibLfo ─┐  modLfo ─┬──────────────┬──────────────┐
//!             modEnv ─┤          │              │              │
//!                     ▼          ▼              ▼              │
//! sample ──► [rate: pitch] ──► [low-pass: fc] ──► [gain: att + volEnv] ──► [pan] ──► (L, R)
//! ```
//!
//! Modulated generator values are refreshed by [`Voice::update`] at span
//! boundaries; envelopes and LFOs advance every sample.

use fuente_config::Interpolation;
use fuente_core::{
    Envelope, EnvelopeParams, Lfo, Tables, VoiceFilter, cents_to_hz, lfo_cents_to_hz, timecents_to_seconds,
};

use crate::channel::Channel;
use crate::generator::GeneratorIndex as G;
use crate::instrument::VoiceConfig;
use crate::sample::{Bounds, SampleGenerator, SampleSource};
use crate::state::VoiceState;

/// Lifecycle of a voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VoiceStage {
    /// In the available pool.
    #[default]
    Idle,
    /// Configured; the first sample has not been rendered yet.
    Starting,
    /// Playing with the key held.
    Sounding,
    /// Key released; envelopes in release.
    Releasing,
    /// Done; waiting to return to the pool.
    Finished,
}

/// How the sample loop is used (`sampleModes`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once (modes 0 and 2).
    #[default]
    None,
    /// Loop until the voice ends (mode 1).
    Continuous,
    /// Loop while the key is held, then play to the end (mode 3).
    DuringKey,
}

impl LoopMode {
    /// Decode a `sampleModes` value.
    pub fn from_generator(value: i32) -> Self {
        match value & 3 {
            1 => LoopMode::Continuous,
            3 => LoopMode::DuringKey,
            _ => LoopMode::None,
        }
    }
}

/// Timecent limits of the envelope and LFO stages.
const MIN_TIMECENTS: f32 = -12000.0;
const MAX_DELAY_TIMECENTS: f32 = 5000.0;
const MAX_TIMECENTS: f32 = 8000.0;

/// A voice of the preallocated pool.
#[derive(Debug, Clone)]
pub struct Voice {
    index: usize,
    stage: VoiceStage,
    state: VoiceState,
    generator: SampleGenerator,
    vol_env: Envelope,
    mod_env: Envelope,
    mod_lfo: Lfo,
    vib_lfo: Lfo,
    filter: VoiceFilter,
    output_rate: f32,

    sample_index: usize,
    sample_rate: f32,
    original_key: u8,
    correction: i8,
    loop_mode: LoopMode,
    exclusive_class: u16,
    note_key: u8,
    start_tick: u64,
    note_serial: u64,
    generation: u64,
    sustained: bool,

    pitch_cents: f32,
    root_hz: f32,
    mod_lfo_to_pitch: f32,
    vib_lfo_to_pitch: f32,
    mod_env_to_pitch: f32,
    filter_fc: f32,
    filter_q: f32,
    mod_lfo_to_filter: f32,
    mod_env_to_filter: f32,
    filter_enabled: bool,
    attenuation: f32,
    mod_lfo_to_volume: f32,
    pan: (f32, f32),
    reverb_send: f32,
    chorus_send: f32,

    last: (f32, f32),
    declick: (f32, f32),
    declick_remaining: u32,
    declick_length: u32,
}

impl Voice {
    /// Create an idle voice.
    pub fn new(index: usize, output_rate: f32, interpolation: Interpolation) -> Self {
        Self {
            index,
            stage: VoiceStage::Idle,
            state: VoiceState::new(),
            generator: SampleGenerator::new(interpolation),
            vol_env: Envelope::new(output_rate),
            mod_env: Envelope::new(output_rate),
            mod_lfo: Lfo::new(output_rate),
            vib_lfo: Lfo::new(output_rate),
            filter: VoiceFilter::new(output_rate),
            output_rate,
            sample_index: 0,
            sample_rate: output_rate,
            original_key: 60,
            correction: 0,
            loop_mode: LoopMode::None,
            exclusive_class: 0,
            note_key: 0,
            start_tick: 0,
            note_serial: 0,
            generation: 0,
            sustained: false,
            pitch_cents: 0.0,
            root_hz: 1.0,
            mod_lfo_to_pitch: 0.0,
            vib_lfo_to_pitch: 0.0,
            mod_env_to_pitch: 0.0,
            filter_fc: 13500.0,
            filter_q: 0.0,
            mod_lfo_to_filter: 0.0,
            mod_env_to_filter: 0.0,
            filter_enabled: false,
            attenuation: 0.0,
            mod_lfo_to_volume: 0.0,
            pan: (0.0, 0.0),
            reverb_send: 0.0,
            chorus_send: 0.0,
            last: (0.0, 0.0),
            declick: (0.0, 0.0),
            declick_remaining: 0,
            declick_length: 0,
        }
    }

    /// Start a note from `config`.
    ///
    /// Builds the state, seeds the envelopes and LFOs from it, positions the
    /// sample generator at the start offset, and marks the voice as starting.
    /// `key` is the key the note was played on; the state may force another
    /// one through the `keynum` generator.
    pub fn configure(&mut self, config: &VoiceConfig<'_>, key: u8, velocity: u8, channel: &Channel, tables: &Tables) {
        self.state.prepare(config, key, velocity);
        self.state.update_modulation(channel, tables);

        let source = config.sample;
        self.sample_index = config.sample_index;
        self.sample_rate = source.sample_rate() as f32;
        self.original_key = source.original_key();
        self.correction = source.correction();
        self.loop_mode = LoopMode::from_generator(self.state.unmodulated(G::SampleModes));
        self.exclusive_class = self.state.unmodulated(G::ExclusiveClass).clamp(0, 127) as u16;
        self.note_key = key;
        self.sustained = false;

        self.generator.configure(Bounds::from_state(source, &self.state));

        let env_key = f32::from(self.state.key());
        self.vol_env.configure(&envelope_params(
            &self.state,
            [G::DelayVolEnv, G::AttackVolEnv, G::HoldVolEnv, G::DecayVolEnv, G::SustainVolEnv, G::ReleaseVolEnv],
            G::KeynumToVolEnvHold,
            G::KeynumToVolEnvDecay,
            env_key,
        ));
        self.mod_env.configure(&envelope_params(
            &self.state,
            [G::DelayModEnv, G::AttackModEnv, G::HoldModEnv, G::DecayModEnv, G::SustainModEnv, G::ReleaseModEnv],
            G::KeynumToModEnvHold,
            G::KeynumToModEnvDecay,
            env_key,
        ));
        self.vol_env.gate_on();
        self.mod_env.gate_on();

        self.mod_lfo.configure(
            lfo_cents_to_hz(self.state.modulated(G::FreqModLfo)),
            lfo_delay(&self.state, G::DelayModLfo),
        );
        self.vib_lfo.configure(
            lfo_cents_to_hz(self.state.modulated(G::FreqVibLfo)),
            lfo_delay(&self.state, G::DelayVibLfo),
        );

        self.filter.reset();
        self.derive(tables);
        self.stage = VoiceStage::Starting;
    }

    /// Refresh modulated parameters from the channel. Called once per span.
    pub fn update(&mut self, channel: &Channel, tables: &Tables) {
        if !self.is_active() {
            return;
        }
        self.state.update_modulation(channel, tables);
        self.derive(tables);
    }

    fn derive(&mut self, tables: &Tables) {
        let state = &self.state;

        let overriding = state.unmodulated(G::OverridingRootKey);
        let root_key = if (0..=127).contains(&overriding) {
            overriding as f32
        } else {
            f32::from(self.original_key)
        };
        let root_pitch = root_key * 100.0 - f32::from(self.correction);
        let key = f32::from(state.key());
        let pitch = state.modulated(G::ScaleTuning) * (key - root_pitch / 100.0) + root_pitch;
        let offsets = state.modulated(G::CoarseTune) * 100.0 + state.modulated(G::FineTune);
        self.pitch_cents = pitch + offsets;
        self.root_hz = (cents_to_hz(f64::from(root_pitch)) * f64::from(self.output_rate) / f64::from(self.sample_rate))
            as f32;

        self.mod_lfo_to_pitch = state.modulated(G::ModLfoToPitch);
        self.vib_lfo_to_pitch = state.modulated(G::VibLfoToPitch);
        self.mod_env_to_pitch = state.modulated(G::ModEnvToPitch);

        self.filter_fc = state.modulated(G::InitialFilterFc);
        self.filter_q = state.modulated(G::InitialFilterQ);
        self.mod_lfo_to_filter = state.modulated(G::ModLfoToFilterFc);
        self.mod_env_to_filter = state.modulated(G::ModEnvToFilterFc);
        self.filter_enabled = self.filter_fc < fuente_core::biquad::MAX_CUTOFF_CENTS
            || self.filter_q > 0.0
            || self.mod_lfo_to_filter != 0.0
            || self.mod_env_to_filter != 0.0;

        self.attenuation = state.modulated(G::InitialAttenuation);
        self.mod_lfo_to_volume = state.modulated(G::ModLfoToVolume);
        self.pan = tables.pan(state.modulated(G::Pan));
        self.reverb_send = (state.modulated(G::ReverbEffectsSend) / 1000.0).clamp(0.0, 1.0);
        self.chorus_send = (state.modulated(G::ChorusEffectsSend) / 1000.0).clamp(0.0, 1.0);
    }

    /// Note-off: both envelopes move to release.
    pub fn release(&mut self) {
        if matches!(self.stage, VoiceStage::Starting | VoiceStage::Sounding) {
            self.vol_env.gate_off();
            self.mod_env.gate_off();
            self.stage = VoiceStage::Releasing;
        }
        self.sustained = false;
    }

    /// Stop abruptly for reuse, fading the last output frame out over `declick_samples`.
    ///
    /// A fade still pending from an earlier steal is carried into the new one.
    pub fn steal(&mut self, declick_samples: u32) {
        if (self.is_active() || self.declick_remaining > 0) && declick_samples > 0 {
            let pending = self.pending_declick();
            self.declick = (self.last.0 + pending.0, self.last.1 + pending.1);
            self.declick_remaining = declick_samples;
            self.declick_length = declick_samples;
        }
        self.kill();
    }

    /// Stop immediately without release.
    pub fn kill(&mut self) {
        if self.stage != VoiceStage::Idle {
            self.stage = VoiceStage::Finished;
        }
        self.vol_env.reset();
        self.mod_env.reset();
        self.generator.stop();
        self.sustained = false;
        self.last = (0.0, 0.0);
    }

    /// Return a finished voice to idle.
    pub fn recycle(&mut self) {
        self.stage = VoiceStage::Idle;
        self.declick_remaining = 0;
    }

    /// Render one stereo frame.
    ///
    /// A finished or idle voice returns `(0, 0)` and does not advance.
    #[inline]
    pub fn render_sample(&mut self, source: &SampleSource, tables: &Tables) -> (f32, f32) {
        let (mut left, mut right) = self.declick_frame();
        if !self.is_active() {
            return (left, right);
        }
        if self.stage == VoiceStage::Starting {
            self.stage = VoiceStage::Sounding;
        }

        let mod_lfo = self.mod_lfo.advance();
        let vib_lfo = self.vib_lfo.advance();
        let mod_env = self.mod_env.advance();
        let vol_env = self.vol_env.advance();

        let pitch = self.pitch_cents
            + mod_env * self.mod_env_to_pitch
            + mod_lfo * self.mod_lfo_to_pitch
            + vib_lfo * self.vib_lfo_to_pitch;
        let increment = tables.cents_to_hz(pitch) / self.root_hz;

        let can_loop = match self.loop_mode {
            LoopMode::None => false,
            LoopMode::Continuous => self.vol_env.is_active(),
            LoopMode::DuringKey => self.vol_env.is_gated(),
        };
        let mut sample = self.generator.generate(source, tables, increment, can_loop);

        if self.filter_enabled {
            let cutoff = self.filter_fc + mod_lfo * self.mod_lfo_to_filter + mod_env * self.mod_env_to_filter;
            self.filter.update(tables, cutoff, self.filter_q);
            sample = self.filter.process(sample);
        }

        let gain = tables.attenuation(self.attenuation + mod_lfo * self.mod_lfo_to_volume) * vol_env;
        let out = (sample * gain * self.pan.0, sample * gain * self.pan.1);
        self.last = out;

        if !self.vol_env.is_active() || self.generator.is_finished() {
            self.stage = VoiceStage::Finished;
            self.last = (0.0, 0.0);
        }

        left += out.0;
        right += out.1;
        (left, right)
    }

    #[inline]
    fn pending_declick(&self) -> (f32, f32) {
        if self.declick_remaining == 0 {
            return (0.0, 0.0);
        }
        let scale = self.declick_remaining as f32 / self.declick_length as f32;
        (self.declick.0 * scale, self.declick.1 * scale)
    }

    #[inline]
    fn declick_frame(&mut self) -> (f32, f32) {
        let frame = self.pending_declick();
        self.declick_remaining = self.declick_remaining.saturating_sub(1);
        frame
    }

    /// Add `left.len()` frames into the buffers. Stops early once the voice finishes.
    pub fn render(&mut self, source: &SampleSource, tables: &Tables, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            if !self.is_active() && self.declick_remaining == 0 {
                break;
            }
            let (vl, vr) = self.render_sample(source, tables);
            *l += vl;
            *r += vr;
        }
    }

    /// True from configuration until the voice finishes.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(
            self.stage,
            VoiceStage::Starting | VoiceStage::Sounding | VoiceStage::Releasing
        )
    }

    /// True while the key is held (not releasing).
    pub fn is_gated(&self) -> bool {
        matches!(self.stage, VoiceStage::Starting | VoiceStage::Sounding)
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> VoiceStage {
        self.stage
    }

    /// Position in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Key the note was played on.
    pub fn key(&self) -> u8 {
        self.note_key
    }

    /// Index of the sample being played.
    pub fn sample_index(&self) -> usize {
        self.sample_index
    }

    /// Loop mode of the note.
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Exclusive class, 0 for none.
    pub fn exclusive_class(&self) -> u16 {
        self.exclusive_class
    }

    /// Tick at which the note started.
    pub fn start_tick(&self) -> u64 {
        self.start_tick
    }

    /// Serial of the note-on that started the voice; voices of one note-on share it.
    pub fn note_serial(&self) -> u64 {
        self.note_serial
    }

    /// Generation of the graph the voice reads from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record start tick, note serial and graph generation.
    pub fn stamp(&mut self, start_tick: u64, note_serial: u64, generation: u64) {
        self.start_tick = start_tick;
        self.note_serial = note_serial;
        self.generation = generation;
    }

    /// True when a note-off arrived while the sustain pedal was held.
    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    /// Defer the note-off until the pedal is lifted.
    pub fn set_sustained(&mut self) {
        if self.is_gated() {
            self.sustained = true;
        }
    }

    /// The voice's generator state.
    pub fn state(&self) -> &VoiceState {
        &self.state
    }

    /// Current volume envelope value.
    pub fn volume_envelope(&self) -> f32 {
        self.vol_env.value()
    }

    /// Reverb send level in [0, 1]. Exposed only; no reverb is rendered.
    pub fn reverb_send(&self) -> f32 {
        self.reverb_send
    }

    /// Chorus send level in [0, 1]. Exposed only; no chorus is rendered.
    pub fn chorus_send(&self) -> f32 {
        self.chorus_send
    }

    /// `(left, right)` pan gains.
    pub fn pan_gains(&self) -> (f32, f32) {
        self.pan
    }

    /// Current sample read position.
    pub fn position(&self) -> f64 {
        self.generator.position()
    }
}

fn envelope_params(
    state: &VoiceState,
    stages: [G; 6],
    key_to_hold: G,
    key_to_decay: G,
    key: f32,
) -> EnvelopeParams {
    let [delay, attack, hold, decay, sustain, release] = stages;
    let time = |timecents: f32, max: f32| timecents_to_seconds(timecents.clamp(MIN_TIMECENTS, max));
    let key_offset = 60.0 - key;
    EnvelopeParams {
        delay: time(state.modulated(delay), MAX_DELAY_TIMECENTS),
        attack: time(state.modulated(attack), MAX_TIMECENTS),
        hold: time(
            state.modulated(hold) + state.modulated(key_to_hold) * key_offset,
            MAX_DELAY_TIMECENTS,
        ),
        decay: time(
            state.modulated(decay) + state.modulated(key_to_decay) * key_offset,
            MAX_TIMECENTS,
        ),
        sustain: (1.0 - state.modulated(sustain) / 1000.0).clamp(0.0, 1.0),
        release: time(state.modulated(release), MAX_TIMECENTS),
    }
}

fn lfo_delay(state: &VoiceState, delay: G) -> f32 {
    timecents_to_seconds(state.modulated(delay).clamp(MIN_TIMECENTS, MAX_DELAY_TIMECENTS))
}
