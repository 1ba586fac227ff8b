//! Sample playback: normalized sources, per-voice bounds, and the sample generator.
//!
//! A [`SampleSource`] is built once per sample header at load time. It holds
//! the header's window of PCM converted to `f32` in [-1, 1], with loop points
//! relative to the window start. Voices never read outside the window.
//!
//! [`Bounds`] applies the address offset generators of one voice to a source.
//! [`SampleGenerator`] walks a source at a fractional rate, wrapping between
//! the loop points while looping is allowed.

use fuente_config::Interpolation;
use fuente_core::{Tables, lerp};

use crate::error::LoadError;
use crate::file::{SampleHeader, SampleKind};
use crate::generator::GeneratorIndex;
use crate::state::VoiceState;

/// Normalized PCM window of one sample header.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSource {
    name: String,
    samples: Vec<f32>,
    loop_start: usize,
    loop_end: usize,
    sample_rate: u32,
    original_key: u8,
    correction: i8,
    kind: SampleKind,
}

impl SampleSource {
    /// Read and normalize the window `header.start..header.end` of `data`.
    ///
    /// Loop points outside the window are clamped into it.
    pub fn from_header(header: &SampleHeader, data: &[i16]) -> Result<Self, LoadError> {
        let start = header.start as usize;
        let end = header.end as usize;
        if start > end {
            return Err(LoadError::malformed(format!(
                "sample '{}' starts after it ends ({start} > {end})",
                header.name
            )));
        }
        if end > data.len() {
            return Err(LoadError::bad_index("sample data", end, data.len()));
        }
        if header.sample_rate == 0 {
            return Err(LoadError::malformed(format!(
                "sample '{}' has a sample rate of 0",
                header.name
            )));
        }

        let samples = data[start..end]
            .iter()
            .map(|&s| f32::from(s) / 32768.0)
            .collect();
        let clamp = |pos: u32| (pos as usize).clamp(start, end) - start;

        Ok(Self {
            name: header.name.clone(),
            samples,
            loop_start: clamp(header.loop_start),
            loop_end: clamp(header.loop_end),
            sample_rate: header.sample_rate,
            original_key: header.original_key.min(127),
            correction: header.correction,
            kind: header.kind,
        })
    }

    /// Build directly from normalized samples (synthetic sources).
    ///
    /// Loop points are clamped into the buffer.
    pub fn from_normalized(
        name: impl Into<String>,
        samples: Vec<f32>,
        sample_rate: u32,
        original_key: u8,
        loop_points: Option<(usize, usize)>,
    ) -> Self {
        let len = samples.len();
        let (loop_start, loop_end) = loop_points.unwrap_or((0, 0));
        Self {
            name: name.into(),
            samples,
            loop_start: loop_start.min(len),
            loop_end: loop_end.min(len),
            sample_rate: sample_rate.max(1),
            original_key: original_key.min(127),
            correction: 0,
            kind: SampleKind::Mono,
        }
    }

    /// Sample name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of samples in the window.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the window is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `index`, or 0 outside the window.
    #[inline]
    pub fn get(&self, index: usize) -> f32 {
        self.samples.get(index).copied().unwrap_or(0.0)
    }

    /// The normalized window.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Loop start relative to the window.
    pub fn loop_start(&self) -> usize {
        self.loop_start
    }

    /// Loop end relative to the window.
    pub fn loop_end(&self) -> usize {
        self.loop_end
    }

    /// Recording rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Key at which the sample plays at its recorded pitch.
    pub fn original_key(&self) -> u8 {
        self.original_key
    }

    /// Pitch correction in cents.
    pub fn correction(&self) -> i8 {
        self.correction
    }

    /// Channel role.
    pub fn kind(&self) -> SampleKind {
        self.kind
    }
}

/// Playback positions of one voice, relative to the source window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    /// First sample played.
    pub start: usize,
    /// One past the last sample played.
    pub end: usize,
    /// First sample of the loop.
    pub start_loop: usize,
    /// One past the last sample of the loop.
    pub end_loop: usize,
}

impl Bounds {
    /// Apply the voice's address offsets (`fine + coarse · 32768`) to the source positions,
    /// clamping every position into the window.
    pub fn from_state(source: &SampleSource, state: &VoiceState) -> Self {
        use GeneratorIndex as G;
        let len = source.len() as i64;
        let offset = |fine: G, coarse: G| {
            i64::from(state.unmodulated(fine)) + i64::from(state.unmodulated(coarse)) * 32768
        };
        let clamp = |pos: i64| pos.clamp(0, len) as usize;

        let start = clamp(offset(G::StartAddrsOffset, G::StartAddrsCoarseOffset));
        let end = clamp(len + offset(G::EndAddrsOffset, G::EndAddrsCoarseOffset)).max(start);
        let start_loop = clamp(
            source.loop_start() as i64 + offset(G::StartloopAddrsOffset, G::StartloopAddrsCoarseOffset),
        );
        let end_loop = clamp(
            source.loop_end() as i64 + offset(G::EndloopAddrsOffset, G::EndloopAddrsCoarseOffset),
        );

        Self {
            start,
            end,
            start_loop,
            end_loop,
        }
    }

    /// Bounds covering the whole source with its own loop points.
    pub fn whole(source: &SampleSource) -> Self {
        Self {
            start: 0,
            end: source.len(),
            start_loop: source.loop_start(),
            end_loop: source.loop_end(),
        }
    }

    /// A loop exists when it lies after the start, is not empty, and ends within the sample.
    pub fn has_loop(&self) -> bool {
        self.start_loop > self.start && self.start_loop < self.end_loop && self.end_loop <= self.end
    }

    /// Loop length in samples (0 without a loop).
    pub fn loop_len(&self) -> usize {
        if self.has_loop() {
            self.end_loop - self.start_loop
        } else {
            0
        }
    }
}

/// Reads a [`SampleSource`] at a fractional rate.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    index: usize,
    partial: f32,
    bounds: Bounds,
    interpolation: Interpolation,
    finished: bool,
}

impl SampleGenerator {
    /// A finished generator using `interpolation`.
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            index: 0,
            partial: 0.0,
            bounds: Bounds::default(),
            interpolation,
            finished: true,
        }
    }

    /// Restart at `bounds.start`.
    pub fn configure(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.index = bounds.start;
        self.partial = 0.0;
        self.finished = bounds.start >= bounds.end;
    }

    /// Stop producing samples.
    pub fn stop(&mut self) {
        self.finished = true;
    }

    /// True once the end of the sample was reached without looping.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current read position.
    pub fn position(&self) -> f64 {
        self.index as f64 + f64::from(self.partial)
    }

    /// Current bounds.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Interpolation in use.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    #[inline]
    fn at(&self, source: &SampleSource, index: usize) -> f32 {
        if index < self.bounds.end {
            source.get(index)
        } else {
            0.0
        }
    }

    #[inline]
    fn next_index(&self, index: usize, looping: bool) -> usize {
        if looping && index + 1 == self.bounds.end_loop {
            self.bounds.start_loop
        } else {
            index + 1
        }
    }

    #[inline]
    fn previous_index(&self, index: usize, looping: bool) -> usize {
        if looping && index == self.bounds.start_loop {
            self.bounds.end_loop - 1
        } else {
            index.saturating_sub(1)
        }
    }

    /// Produce the sample at the current position, then advance by `increment`.
    ///
    /// While `can_loop` is true and the bounds carry a loop, reaching the loop
    /// end wraps back by the loop length. Otherwise reaching the end finishes
    /// the generator; it returns 0 from then on.
    #[inline]
    pub fn generate(&mut self, source: &SampleSource, tables: &Tables, increment: f32, can_loop: bool) -> f32 {
        if self.finished {
            return 0.0;
        }
        let looping = can_loop && self.bounds.has_loop();
        let index = self.index;

        let value = match self.interpolation {
            Interpolation::Linear => {
                let x0 = self.at(source, index);
                let x1 = self.at(source, self.next_index(index, looping));
                lerp(x0, x1, self.partial)
            }
            Interpolation::Cubic => {
                let next = self.next_index(index, looping);
                let x0 = self.at(source, self.previous_index(index, looping));
                let x1 = self.at(source, index);
                let x2 = self.at(source, next);
                let x3 = self.at(source, self.next_index(next, looping));
                tables.cubic(self.partial, x0, x1, x2, x3)
            }
        };

        self.partial += increment.max(0.0);
        let whole = self.partial as usize;
        self.partial -= whole as f32;
        self.index += whole;

        if looping {
            if self.index >= self.bounds.end_loop {
                let len = self.bounds.loop_len();
                self.index = self.bounds.start_loop + (self.index - self.bounds.start_loop) % len;
            }
        } else if self.index >= self.bounds.end {
            self.finished = true;
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_from_header_normalizes_window() {
        let data = [0i16, 16384, -32768, 32767, 5];
        let header = SampleHeader {
            name: "s".into(),
            start: 1,
            end: 4,
            loop_start: 0,
            loop_end: 99,
            sample_rate: 22050,
            original_key: 60,
            correction: -3,
            link: 0,
            kind: SampleKind::Mono,
        };
        let source = SampleSource::from_header(&header, &data).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.get(0), 0.5);
        assert_eq!(source.get(1), -1.0);
        assert_eq!(source.get(3), 0.0);
        // loop points clamped into the window
        assert_eq!(source.loop_start(), 0);
        assert_eq!(source.loop_end(), 3);
        assert_eq!(source.correction(), -3);
    }

    #[test]
    fn test_from_header_rejects_bad_windows() {
        let data = [0i16; 4];
        let mut header = SampleHeader {
            name: "s".into(),
            start: 0,
            end: 10,
            loop_start: 0,
            loop_end: 0,
            sample_rate: 22050,
            original_key: 60,
            correction: 0,
            link: 0,
            kind: SampleKind::Mono,
        };
        assert!(matches!(
            SampleSource::from_header(&header, &data),
            Err(LoadError::BadIndex { .. })
        ));
        header.end = 2;
        header.sample_rate = 0;
        assert!(matches!(
            SampleSource::from_header(&header, &data),
            Err(LoadError::MalformedFile { .. })
        ));
    }

    #[test]
    fn test_has_loop() {
        let mut bounds = Bounds {
            start: 0,
            end: 100,
            start_loop: 10,
            end_loop: 90,
        };
        assert!(bounds.has_loop());
        assert_eq!(bounds.loop_len(), 80);
        bounds.start_loop = 0;
        assert!(!bounds.has_loop());
        bounds.start_loop = 90;
        assert!(!bounds.has_loop());
        bounds.start_loop = 10;
        bounds.end_loop = 101;
        assert!(!bounds.has_loop());
    }

    #[test]
    fn test_bounds_apply_offsets() {
        let source = SampleSource::from_normalized("s", vec![0.0; 100_000], 44100, 60, Some((40_000, 90_000)));
        let mut state = VoiceState::new();
        state.set(GeneratorIndex::StartAddrsOffset, 10);
        state.set(GeneratorIndex::StartAddrsCoarseOffset, 1);
        state.set(GeneratorIndex::EndAddrsOffset, -100);
        state.set(GeneratorIndex::EndloopAddrsOffset, 50_000);
        let bounds = Bounds::from_state(&source, &state);
        assert_eq!(bounds.start, 32778);
        assert_eq!(bounds.end, 99_900);
        assert_eq!(bounds.start_loop, 40_000);
        // clamped to the window
        assert_eq!(bounds.end_loop, 100_000);
        assert!(!bounds.has_loop());
    }

    #[test]
    fn test_unit_rate_plays_samples() {
        let tables = Tables::new();
        let source = SampleSource::from_normalized("ramp", ramp(8), 48000, 60, None);
        let mut generator = SampleGenerator::new(Interpolation::Linear);
        generator.configure(Bounds::whole(&source));
        let out: Vec<f32> = (0..10).map(|_| generator.generate(&source, &tables, 1.0, true)).collect();
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 0.0, 0.0]);
        assert!(generator.is_finished());
    }

    #[test]
    fn test_half_rate_interpolates() {
        let tables = Tables::new();
        let source = SampleSource::from_normalized("ramp", ramp(4), 48000, 60, None);
        let mut generator = SampleGenerator::new(Interpolation::Linear);
        generator.configure(Bounds::whole(&source));
        let out: Vec<f32> = (0..4).map(|_| generator.generate(&source, &tables, 0.5, false)).collect();
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_loop_wraps_and_neighbour_is_loop_start() {
        let tables = Tables::new();
        // loop covers samples 2..5
        let source = SampleSource::from_normalized("ramp", ramp(8), 48000, 60, Some((2, 5)));
        let mut generator = SampleGenerator::new(Interpolation::Linear);
        generator.configure(Bounds::whole(&source));
        let out: Vec<f32> = (0..9).map(|_| generator.generate(&source, &tables, 1.0, true)).collect();
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 4.0, 2.0, 3.0, 4.0, 2.0]);

        // halfway between the last loop sample and the loop start
        generator.configure(Bounds::whole(&source));
        for _ in 0..4 {
            generator.generate(&source, &tables, 1.0, true);
        }
        generator.generate(&source, &tables, 0.5, true);
        assert_eq!(generator.generate(&source, &tables, 0.5, true), 3.0);
    }

    #[test]
    fn test_continuous_loop_over_long_run() {
        let tables = Tables::new();
        let source = SampleSource::from_normalized("ramp", ramp(1000), 48000, 60, Some((400, 800)));
        let mut generator = SampleGenerator::new(Interpolation::Linear);
        generator.configure(Bounds::whole(&source));
        for n in 0..2000usize {
            let expected = if n < 800 { n } else { 400 + (n - 400) % 400 };
            assert_eq!(generator.generate(&source, &tables, 1.0, true), expected as f32, "frame {n}");
        }
        assert!(!generator.is_finished());
    }

    #[test]
    fn test_loop_released_plays_to_end() {
        let tables = Tables::new();
        let source = SampleSource::from_normalized("ramp", ramp(6), 48000, 60, Some((2, 4)));
        let mut generator = SampleGenerator::new(Interpolation::Linear);
        generator.configure(Bounds::whole(&source));
        let mut out = Vec::new();
        for i in 0..10 {
            // key held for the first 6 samples
            out.push(generator.generate(&source, &tables, 1.0, i < 6));
        }
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 2.0, 3.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(generator.is_finished());
    }

    #[test]
    fn test_cubic_reproduces_samples_at_integer_positions() {
        let tables = Tables::new();
        let source = SampleSource::from_normalized("ramp", ramp(6), 48000, 60, None);
        let mut generator = SampleGenerator::new(Interpolation::Cubic);
        generator.configure(Bounds::whole(&source));
        for expected in 0..6 {
            let v = generator.generate(&source, &tables, 1.0, false);
            assert!((v - expected as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_bounds_finish_immediately() {
        let tables = Tables::new();
        let source = SampleSource::from_normalized("empty", Vec::new(), 48000, 60, None);
        let mut generator = SampleGenerator::new(Interpolation::Linear);
        generator.configure(Bounds::whole(&source));
        assert!(generator.is_finished());
        assert_eq!(generator.generate(&source, &tables, 1.0, true), 0.0);
    }
}
