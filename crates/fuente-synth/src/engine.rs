//! The synthesis engine and its control handle.
//!
//! [`Engine::new`] returns two halves. The [`Engine`] lives on the render
//! thread: it owns the voice pool, drains the event inbox at the start of every
//! block, and renders. The [`EngineHandle`] lives on control threads: it queues
//! events, builds and publishes new graphs, and collects graphs the render
//! thread has retired.
//!
//! # Real-time contract
//!
//! After construction the render path does not allocate, lock, or log. Events
//! arrive through a bounded `crossbeam-channel` queue, graphs through an
//! [`ArcSwap`], and retired graphs leave through a second bounded queue so
//! their memory is freed on the control side.
//!
//! # Example
//!
//! ```rust
//! use fuente_synth::{Engine, EngineConfig};
//!
//! let (mut engine, handle) = Engine::new(EngineConfig::default());
//! handle.note_on(60, 100).unwrap();
//!
//! let mut left = [0.0f32; 64];
//! let mut right = [0.0f32; 64];
//! engine.render(&mut left, &mut right);
//! // No font loaded: the note finds no zones and the output stays silent.
//! assert!(left.iter().all(|&s| s == 0.0));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use fuente_config::EngineConfig;
use fuente_core::{Tables, seconds_to_samples};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::channel::{Channel, cc};
use crate::error::{EngineError, LoadError};
use crate::event::{MidiEvent, TimedEvent};
use crate::file::SoundFontData;
use crate::graph::{LoadSummary, SoundFontGraph};
use crate::instrument::VoiceConfig;
use crate::voice::{Voice, VoiceStage};

/// Retired graphs waiting for the control side to drop them.
const GARBAGE_CAPACITY: usize = 4;

/// State shared by the engine and every handle.
#[derive(Debug)]
struct Shared {
    graph: ArcSwap<SoundFontGraph>,
    generation: AtomicU64,
    load_lock: Mutex<()>,
}

/// Render-thread half of the engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    tables: &'static Tables,
    voices: Vec<Voice>,
    available: Vec<usize>,
    active_keys: [Option<usize>; 128],
    active_preset: usize,
    selected: Option<(u16, u16)>,
    tick: u64,
    note_serial: u64,
    declick_samples: u32,

    channel: Arc<Channel>,
    shared: Arc<Shared>,
    graph: Arc<SoundFontGraph>,
    previous: Option<Arc<SoundFontGraph>>,
    inbox: Receiver<MidiEvent>,
    garbage: Sender<Arc<SoundFontGraph>>,
}

impl Engine {
    /// Create an engine with an empty graph and its control handle.
    ///
    /// Out-of-range configuration values are clamped. The voice pool and both
    /// queues are allocated here and never grow.
    pub fn new(config: EngineConfig) -> (Engine, EngineHandle) {
        let config = config.clamped();
        let sample_rate = config.sample_rate as f32;

        let (events_tx, events_rx) = bounded(config.inbox_capacity);
        let (garbage_tx, garbage_rx) = bounded(GARBAGE_CAPACITY);

        let graph = Arc::new(SoundFontGraph::empty());
        let shared = Arc::new(Shared {
            graph: ArcSwap::new(Arc::clone(&graph)),
            generation: AtomicU64::new(0),
            load_lock: Mutex::new(()),
        });
        let channel = Arc::new(Channel::new());

        let voices = (0..config.voice_count)
            .map(|i| Voice::new(i, sample_rate, config.interpolation))
            .collect();
        let available = (0..config.voice_count).rev().collect();
        let declick_samples = seconds_to_samples(config.declick_ms / 1000.0, sample_rate);

        debug!(
            voices = config.voice_count,
            sample_rate = config.sample_rate,
            "engine created"
        );

        let handle = EngineHandle {
            events: events_tx,
            shared: Arc::clone(&shared),
            garbage: garbage_rx,
            channel: Arc::clone(&channel),
            midi_channel: config.midi_channel.unwrap_or(0),
        };

        let engine = Engine {
            config,
            tables: fuente_core::tables(),
            voices,
            available,
            active_keys: [None; 128],
            active_preset: 0,
            selected: None,
            tick: 0,
            note_serial: 0,
            declick_samples,
            channel,
            shared,
            graph,
            previous: None,
            inbox: events_rx,
            garbage: garbage_tx,
        };
        (engine, handle)
    }

    // ── Rendering ──

    /// Render `left.len()` frames (the shorter of the two buffers) into silence-cleared buffers.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.render_events(left, right, &[]);
    }

    /// Render a block, applying `events` at their frame offsets.
    ///
    /// Events must be sorted by frame. Events at or past the end of the block
    /// are applied after the last frame.
    pub fn render_events(&mut self, left: &mut [f32], right: &mut [f32], events: &[TimedEvent]) {
        left.fill(0.0);
        right.fill(0.0);
        let frames = left.len().min(right.len());

        self.sync_graph();
        self.drain_inbox();

        let mut pending = events.iter().peekable();
        let mut start = 0;
        while start < frames {
            while let Some(timed) = pending.next_if(|e| e.frame <= start) {
                self.handle_event(timed.event);
            }
            let end = pending.peek().map_or(frames, |e| e.frame.min(frames));
            self.render_span(&mut left[start..end], &mut right[start..end]);
            start = end;
        }
        for timed in pending {
            self.handle_event(timed.event);
        }
    }

    fn render_span(&mut self, left: &mut [f32], right: &mut [f32]) {
        let tables = self.tables;
        let graph = &self.graph;
        let previous = self.previous.as_ref();
        let channel = &self.channel;

        for voice in &mut self.voices {
            if voice.stage() == VoiceStage::Idle {
                continue;
            }
            let source = if voice.generation() == graph.generation() {
                graph.sample(voice.sample_index())
            } else {
                previous
                    .filter(|p| p.generation() == voice.generation())
                    .and_then(|p| p.sample(voice.sample_index()))
            };
            let Some(source) = source else {
                voice.kill();
                continue;
            };
            voice.update(channel, tables);
            voice.render(source, tables, left, right);
        }

        self.tick += left.len() as u64;
        self.recycle_finished();
    }

    fn recycle_finished(&mut self) {
        for voice in &mut self.voices {
            if voice.stage() != VoiceStage::Finished {
                continue;
            }
            let index = voice.index();
            voice.recycle();
            self.available.push(index);
            let key = usize::from(voice.key());
            if self.active_keys[key] == Some(index) {
                self.active_keys[key] = None;
            }
        }
    }

    // ── Events ──

    fn drain_inbox(&mut self) {
        for _ in 0..self.config.max_events_per_block {
            match self.inbox.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Apply one event immediately.
    ///
    /// Channel messages on a channel other than the configured one are ignored.
    pub fn handle_event(&mut self, event: MidiEvent) {
        if let (Some(listen), Some(channel)) = (self.config.midi_channel, event.channel())
            && listen != channel
        {
            return;
        }

        match event {
            MidiEvent::NoteOn { key, velocity, .. } => self.note_on(key.min(127), velocity.min(127)),
            MidiEvent::NoteOff { key, .. } => self.note_off(key.min(127)),
            MidiEvent::ControlChange {
                controller, value, ..
            } => self.control_change(controller.min(127), value.min(127)),
            MidiEvent::PitchBend { value, .. } => self.channel.set_pitch_wheel(value),
            MidiEvent::ChannelPressure { value, .. } => self.channel.set_channel_pressure(value),
            MidiEvent::PolyPressure { key, value, .. } => self.channel.set_key_pressure(key.min(127), value),
            MidiEvent::ProgramChange { program, .. } => {
                let bank = u16::from(self.channel.controller(0));
                self.select_preset(bank, u16::from(program));
            }
            MidiEvent::SelectPreset { bank, program } => self.select_preset(bank, program),
            MidiEvent::SelectPresetIndex(index) => {
                self.active_preset = index;
                self.selected = None;
            }
            MidiEvent::Reset => self.reset(),
        }
    }

    fn note_on(&mut self, key: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(key);
            return;
        }
        self.note_serial += 1;

        let graph = Arc::clone(&self.graph);
        let mut first = true;
        graph.for_each_voice_config(self.active_preset, key, velocity, |config| {
            self.start_voice(&config, key, velocity, first);
            first = false;
        });
    }

    fn start_voice(&mut self, config: &VoiceConfig<'_>, key: u8, velocity: u8, first: bool) {
        let index = self.select_voice(key, first);
        let generation = self.graph.generation();
        let voice = &mut self.voices[index];

        let old_key = usize::from(voice.key());
        if voice.is_active() {
            voice.steal(self.declick_samples);
            if self.active_keys[old_key] == Some(index) {
                self.active_keys[old_key] = None;
            }
        }

        voice.configure(config, key, velocity, &self.channel, self.tables);
        voice.stamp(self.tick, self.note_serial, generation);
        self.active_keys[usize::from(key)] = Some(index);

        let class = voice.exclusive_class();
        if class != 0 {
            let serial = self.note_serial;
            for other in &mut self.voices {
                if other.is_active() && other.exclusive_class() == class && other.note_serial() != serial {
                    other.release();
                }
            }
        }
    }

    /// Pick the voice for a new note: the key's current voice when retriggering,
    /// else a free voice, else the oldest releasing voice, else the oldest voice.
    fn select_voice(&mut self, key: u8, first: bool) -> usize {
        if self.config.one_voice_per_key
            && first
            && let Some(index) = self.active_keys[usize::from(key)]
            && self.voices[index].is_active()
        {
            return index;
        }
        if let Some(index) = self.available.pop() {
            return index;
        }
        self.voices
            .iter()
            .filter(|v| v.is_active())
            .min_by_key(|v| (v.stage() != VoiceStage::Releasing, v.start_tick(), v.index()))
            .map_or(0, Voice::index)
    }

    fn note_off(&mut self, key: u8) {
        let sustain = self.channel.is_sustain_held();
        for voice in &mut self.voices {
            if voice.key() == key && voice.is_gated() {
                if sustain {
                    voice.set_sustained();
                } else {
                    voice.release();
                }
            }
        }
    }

    fn control_change(&mut self, controller: u8, value: u8) {
        self.channel.control_change(controller, value);
        match controller {
            cc::SUSTAIN if value < 64 => self.release_sustained(),
            cc::ALL_SOUND_OFF => self.kill_all(),
            cc::RESET_ALL_CONTROLLERS => {
                self.channel.reset_controllers();
                self.release_sustained();
            }
            cc::ALL_NOTES_OFF => self.release_all(),
            _ => {}
        }
    }

    fn release_sustained(&mut self) {
        for voice in &mut self.voices {
            if voice.is_sustained() {
                voice.release();
            }
        }
    }

    fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release();
        }
    }

    fn kill_all(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
        self.recycle_finished();
        self.active_keys = [None; 128];
    }

    fn select_preset(&mut self, bank: u16, program: u16) {
        if let Some(index) = self.graph.find_preset(bank, program) {
            self.active_preset = index;
            self.selected = Some((bank, program));
        }
    }

    fn reset(&mut self) {
        self.kill_all();
        self.channel.reset();
    }

    // ── Graph publication ──

    /// Pick up a newly published graph and retire the previous one once idle.
    fn sync_graph(&mut self) {
        if let Some(previous) = &self.previous {
            let generation = previous.generation();
            if !self.voices.iter().any(|v| v.is_active() && v.generation() == generation) {
                self.retire_previous();
            }
        }

        if self.shared.generation.load(Ordering::Acquire) == self.graph.generation() {
            return;
        }
        let next = self.shared.graph.load_full();
        if next.generation() == self.graph.generation() {
            return;
        }

        // at most one old graph stays alive; its voices are cut
        if let Some(previous) = &self.previous {
            let generation = previous.generation();
            for voice in &mut self.voices {
                if voice.generation() == generation {
                    voice.kill();
                }
            }
            self.recycle_finished();
            self.retire_previous();
            if self.previous.is_some() {
                // garbage queue full; swap at a later block
                return;
            }
        }

        self.release_all();
        let old = std::mem::replace(&mut self.graph, next);
        self.previous = Some(old);

        if let Some((bank, program)) = self.selected {
            match self.graph.find_preset(bank, program) {
                Some(index) => self.active_preset = index,
                None => self.selected = None,
            }
        }
    }

    fn retire_previous(&mut self) {
        let Some(graph) = self.previous.take() else {
            return;
        };
        match self.garbage.try_send(graph) {
            Ok(()) => {}
            Err(TrySendError::Full(graph)) => self.previous = Some(graph),
            // no handle left to free it
            Err(TrySendError::Disconnected(graph)) => drop(graph),
        }
    }

    // ── Inspection ──

    /// Configuration in effect, after clamping.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The voice pool.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Number of voices currently sounding or releasing.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Number of voices on the free stack.
    pub fn available_voice_count(&self) -> usize {
        self.available.len()
    }

    /// Keys of the active voices, in pool order.
    pub fn voice_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices.iter().filter(|v| v.is_active()).map(Voice::key)
    }

    /// Voice most recently started on each key.
    pub fn active_keys(&self) -> &[Option<usize>; 128] {
        &self.active_keys
    }

    /// Index of the active preset in the sorted preset list.
    pub fn active_preset(&self) -> usize {
        self.active_preset
    }

    /// Graph new notes are started from.
    pub fn graph(&self) -> &SoundFontGraph {
        &self.graph
    }

    /// Channel state.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Frames rendered since creation.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// Control-thread half of the engine. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    events: Sender<MidiEvent>,
    shared: Arc<Shared>,
    garbage: Receiver<Arc<SoundFontGraph>>,
    channel: Arc<Channel>,
    midi_channel: u8,
}

impl EngineHandle {
    /// Queue an event for the next render block.
    ///
    /// # Errors
    ///
    /// [`EngineError::InboxFull`] when the inbox is at capacity (the event is
    /// dropped) and [`EngineError::Disconnected`] once the engine is gone.
    pub fn send(&self, event: MidiEvent) -> Result<(), EngineError> {
        self.events.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => EngineError::InboxFull,
            TrySendError::Disconnected(_) => EngineError::Disconnected,
        })
    }

    /// Decode a raw MIDI message and queue it. Undecodable messages are ignored.
    pub fn send_midi(&self, bytes: &[u8]) -> Result<(), EngineError> {
        match MidiEvent::from_bytes(bytes) {
            Some(event) => self.send(event),
            None => Ok(()),
        }
    }

    /// Start a note. Velocity 0 releases it instead.
    pub fn note_on(&self, key: u8, velocity: u8) -> Result<(), EngineError> {
        self.send(MidiEvent::NoteOn {
            channel: self.midi_channel,
            key,
            velocity,
        })
    }

    /// Release a note.
    pub fn note_off(&self, key: u8) -> Result<(), EngineError> {
        self.send(MidiEvent::NoteOff {
            channel: self.midi_channel,
            key,
        })
    }

    /// Send a controller change.
    pub fn control_change(&self, controller: u8, value: u8) -> Result<(), EngineError> {
        self.send(MidiEvent::ControlChange {
            channel: self.midi_channel,
            controller,
            value,
        })
    }

    /// Move the pitch wheel (0..=16383, 8192 centered).
    pub fn pitch_bend(&self, value: u16) -> Result<(), EngineError> {
        self.send(MidiEvent::PitchBend {
            channel: self.midi_channel,
            value,
        })
    }

    /// Set channel pressure.
    pub fn channel_pressure(&self, value: u8) -> Result<(), EngineError> {
        self.send(MidiEvent::ChannelPressure {
            channel: self.midi_channel,
            value,
        })
    }

    /// Set the pressure of one key.
    pub fn poly_pressure(&self, key: u8, value: u8) -> Result<(), EngineError> {
        self.send(MidiEvent::PolyPressure {
            channel: self.midi_channel,
            key,
            value,
        })
    }

    /// Select the preset with `(bank, program)`. Unknown presets leave the selection unchanged.
    pub fn select_preset(&self, bank: u16, program: u16) -> Result<(), EngineError> {
        if self.shared.graph.load().find_preset(bank, program).is_none() {
            warn!(bank, program, "no such preset; selection unchanged");
        } else {
            info!(bank, program, "selecting preset");
        }
        self.send(MidiEvent::SelectPreset { bank, program })
    }

    /// Select a preset by its index in the sorted preset list.
    pub fn select_preset_index(&self, index: usize) -> Result<(), EngineError> {
        self.send(MidiEvent::SelectPresetIndex(index))
    }

    /// Finish every voice and restore the channel to power-on state.
    pub fn reset(&self) -> Result<(), EngineError> {
        self.send(MidiEvent::Reset)
    }

    /// Validate `data`, build its graph, and publish it to the render thread.
    ///
    /// The render thread switches at its next block: voices of the old graph
    /// are released and keep reading from it until they finish. On error the
    /// engine keeps the graph it has.
    ///
    /// # Errors
    ///
    /// Any [`LoadError`] raised by [`SoundFontGraph::build`].
    pub fn load(&self, data: &SoundFontData) -> Result<LoadSummary, LoadError> {
        let _guard = self.shared.load_lock.lock();
        let generation = self.shared.generation.load(Ordering::Acquire) + 1;

        let graph = match SoundFontGraph::build(data) {
            Ok(graph) => graph.with_generation(generation),
            Err(e) => {
                warn!(error = %e, "soundfont load failed; keeping current graph");
                return Err(e);
            }
        };
        let summary = graph.summary();

        self.shared.graph.store(Arc::new(graph));
        self.shared.generation.store(generation, Ordering::Release);
        self.collect_garbage();

        info!(
            presets = summary.presets,
            instruments = summary.instruments,
            samples = summary.samples,
            generation,
            "soundfont loaded"
        );
        Ok(summary)
    }

    /// Latest published graph.
    pub fn graph(&self) -> Arc<SoundFontGraph> {
        self.shared.graph.load_full()
    }

    /// Generation of the latest published graph.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Drop graphs the render thread has retired. Returns how many were freed.
    pub fn collect_garbage(&self) -> usize {
        let freed = self.garbage.try_iter().count();
        if freed > 0 {
            debug!(freed, "dropped retired graphs");
        }
        freed
    }

    /// Channel state as last applied by the render thread.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}
