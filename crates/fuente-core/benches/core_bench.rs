//! Criterion benchmarks for fuente-core DSP primitives
//!
//! Run with: cargo bench -p fuente-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fuente_core::{
    DelayBuffer, Envelope, EnvelopeParams, Lfo, Tables, VoiceFilter, fast_math::parabolic_sine,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tables");
    let tables = Tables::new();

    group.bench_function("build", |b| b.iter(|| black_box(Tables::new())));
    group.bench_function("cents_to_hz", |b| {
        b.iter(|| black_box(tables.cents_to_hz(black_box(6912.5))))
    });
    group.bench_function("attenuation", |b| {
        b.iter(|| black_box(tables.attenuation(black_box(433.0))))
    });
    group.bench_function("pan", |b| b.iter(|| black_box(tables.pan(black_box(-120.0)))));
    group.bench_function("parabolic_sine", |b| {
        b.iter(|| black_box(parabolic_sine(black_box(1.234))))
    });

    group.finish();
}

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("advance", block_size),
            &block_size,
            |b, &size| {
                let mut env = Envelope::new(SAMPLE_RATE);
                env.configure(&EnvelopeParams {
                    delay: 0.0,
                    attack: 0.01,
                    hold: 0.0,
                    decay: 0.2,
                    sustain: 0.5,
                    release: 0.3,
                });
                env.gate_on();
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += env.advance();
                    }
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lfo");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("triangle", block_size),
            &block_size,
            |b, &size| {
                let mut lfo = Lfo::new(SAMPLE_RATE);
                lfo.configure(5.0, 0.0);
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += lfo.advance();
                    }
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

fn bench_filter_and_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("Processing");
    let tables = Tables::new();

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);

        group.bench_with_input(
            BenchmarkId::new("voice_filter", block_size),
            &block_size,
            |b, _| {
                let mut filter = VoiceFilter::new(SAMPLE_RATE);
                b.iter(|| {
                    for &sample in &input {
                        filter.update(&tables, 9000.0, 100.0);
                        black_box(filter.process(black_box(sample)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("delay_buffer", block_size),
            &block_size,
            |b, _| {
                let mut delay = DelayBuffer::new(4096.0);
                b.iter(|| {
                    for &sample in &input {
                        delay.write(sample);
                        black_box(delay.read(black_box(1000.5)));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tables, bench_envelope, bench_lfo, bench_filter_and_delay);
criterion_main!(benches);
