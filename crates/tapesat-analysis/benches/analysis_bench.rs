//! Criterion benchmarks for tapesat-analysis components
//!
//! Run with: cargo bench -p tapesat-analysis

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::f32::consts::PI;
use tapesat_analysis::{FFT_SIZE, Fft, spectrum_feed};

const SAMPLE_RATE: f32 = 48000.0;

fn generate_sine(size: usize, frequency: f32) -> Vec<f32> {
    (0..size)
        .map(|i| (2.0 * PI * frequency * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn bench_fft_magnitudes(c: &mut Criterion) {
    let mut group = c.benchmark_group("FFT_Magnitudes");

    for &size in &[512, 1024, 2048, 4096] {
        let fft = Fft::new(size);
        let mut scratch = fft.make_scratch();
        let mut mags = vec![0.0; fft.num_bins()];
        let signal = generate_sine(size, 1000.0);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                fft.magnitudes_into(black_box(&signal), &mut scratch, &mut mags);
                black_box(mags[0])
            })
        });
    }

    group.finish();
}

fn bench_tap_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpectrumTap");
    let signal = generate_sine(512, 440.0);

    group.bench_function("push_slice_512", |b| {
        let (mut tap, _analyzer) = spectrum_feed(2);
        b.iter(|| {
            tap.push_slice(0, black_box(&signal));
            tap.push_slice(1, black_box(&signal));
        })
    });

    group.finish();
}

fn bench_process_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpectrumAnalyzer");
    let frame = generate_sine(FFT_SIZE, 440.0);

    group.bench_function("process_fft_stereo", |b| {
        let (mut tap, mut analyzer) = spectrum_feed(2);
        b.iter(|| {
            tap.push_slice(0, &frame);
            tap.push_slice(1, &frame);
            black_box(analyzer.process_fft())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fft_magnitudes, bench_tap_push, bench_process_fft);
criterion_main!(benches);
