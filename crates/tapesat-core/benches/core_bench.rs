//! Criterion benchmarks for tapesat-core DSP primitives
//!
//! Run with: cargo bench -p tapesat-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tapesat_core::{
    AudioBuffer, Biquad, BiquadCoefficients, HalfBandOversampler, RampedGain,
    half_band_coefficients, peaking_eq_coefficients,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_block(size: usize) -> AudioBuffer {
    let samples: Vec<f32> = (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect();
    AudioBuffer::from_channels(&[&samples, &samples])
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");
    let coeffs =
        BiquadCoefficients::from_raw(peaking_eq_coefficients(250.0, 2.0, -1.7, SAMPLE_RATE));

    for &block_size in BLOCK_SIZES {
        let input = generate_test_block(block_size);
        group.bench_with_input(
            BenchmarkId::new("process_slice", block_size),
            &block_size,
            |b, _| {
                let mut biquad = Biquad::with_coefficients(coeffs);
                let mut block = input.clone();
                b.iter(|| {
                    biquad.process_slice(black_box(block.channel_mut(0)));
                });
            },
        );
    }

    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(peaking_eq_coefficients(
                black_box(250.0),
                black_box(2.0),
                black_box(-1.7),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.finish();
}

fn bench_oversampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("HalfBandOversampler");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_block(block_size);
        group.bench_with_input(
            BenchmarkId::new("round_trip", block_size),
            &block_size,
            |b, &size| {
                let mut os = HalfBandOversampler::<8>::default();
                os.prepare(2, size);
                let mut block = input.clone();
                b.iter(|| {
                    os.process_with(black_box(&mut block), |_| {});
                });
            },
        );
    }

    group.bench_function("design", |b| {
        b.iter(|| black_box(half_band_coefficients::<8>(black_box(0.06))));
    });

    group.finish();
}

fn bench_ramped_gain(c: &mut Criterion) {
    let mut group = c.benchmark_group("RampedGain");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_block(block_size);
        group.bench_with_input(
            BenchmarkId::new("apply_ramping", block_size),
            &block_size,
            |b, _| {
                let mut gain = RampedGain::new(1.0);
                let mut block = input.clone();
                let mut toggle = false;
                b.iter(|| {
                    toggle = !toggle;
                    gain.set_target(if toggle { 0.5 } else { 1.0 });
                    gain.apply(black_box(&mut block));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_biquad, bench_oversampler, bench_ramped_gain);
criterion_main!(benches);
