//! Integration tests for tapesat-analysis.
//!
//! Drive the tap with synthetic signals the way the pipeline does and read
//! the display arrays the way a redraw timer does.

use std::f32::consts::PI;

use tapesat_analysis::{
    FFT_SIZE, Fft, MAX_DB, MIN_DB, SCOPE_SIZE, Window, center_bin, display_level, spectrum_feed,
};

const SAMPLE_RATE: f32 = 48000.0;

fn sine(freq_hz: f32, num_samples: usize, amplitude: f32, phase_offset: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let n = (i + phase_offset) as f32;
            amplitude * (2.0 * PI * freq_hz * n / SAMPLE_RATE).sin()
        })
        .collect()
}

/// Display array that a single frame would produce with no smoothing.
fn raw_display(frame: &[f32]) -> Vec<f32> {
    let fft = Fft::new(FFT_SIZE);
    let mut scratch = fft.make_scratch();
    let mut windowed = frame.to_vec();
    Window::Hann.apply(&mut windowed);
    let mut mags = vec![0.0; fft.num_bins()];
    fft.magnitudes_into(&windowed, &mut scratch, &mut mags);
    (0..SCOPE_SIZE)
        .map(|i| display_level(&mags, i, SCOPE_SIZE, FFT_SIZE))
        .collect()
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap()
}

#[test]
fn constant_sine_converges_to_steady_state() {
    let (mut tap, mut analyzer) = spectrum_feed(1);
    let amplitude = 0.01;
    let freq = 1000.0;

    let first_frame = sine(freq, FFT_SIZE, amplitude, 0);
    tap.push_slice(0, &first_frame);
    assert_eq!(analyzer.process_fft(), 1);

    // First window is the raw, unsmoothed value
    let raw = raw_display(&first_frame);
    assert_eq!(analyzer.scope_data(0), raw.as_slice());

    for window in 1..40 {
        tap.push_slice(0, &sine(freq, FFT_SIZE, amplitude, window * FFT_SIZE));
        assert_eq!(analyzer.process_fft(), 1);
    }

    let scope = analyzer.scope_data(0);
    let peak = argmax(scope);
    let steady = raw_display(&sine(freq, FFT_SIZE, amplitude, 39 * FFT_SIZE));
    assert!(
        (scope[peak] - steady[peak]).abs() < 0.5,
        "scope {} vs steady {}",
        scope[peak],
        steady[peak]
    );

    // The peak sits near the 1 kHz bin
    let bin = center_bin(peak, SCOPE_SIZE, FFT_SIZE);
    let bin_hz = bin as f32 * SAMPLE_RATE / FFT_SIZE as f32;
    assert!((bin_hz - freq).abs() < 6.0 * SAMPLE_RATE / FFT_SIZE as f32, "{bin_hz}");
}

#[test]
fn display_values_stay_in_range() {
    let (mut tap, mut analyzer) = spectrum_feed(2);
    tap.push_slice(0, &sine(440.0, FFT_SIZE, 1.0, 0));
    tap.push_slice(1, &vec![0.0; FFT_SIZE]);
    assert_eq!(analyzer.process_fft(), 2);

    for ch in 0..2 {
        assert!(
            analyzer
                .scope_data(ch)
                .iter()
                .all(|&v| (MIN_DB..=MAX_DB).contains(&v))
        );
    }
    assert!(analyzer.scope_data(1).iter().all(|&v| v == MIN_DB));
}

#[test]
fn tap_moves_across_threads() {
    let (mut tap, mut analyzer) = spectrum_feed(2);
    let handle = std::thread::spawn(move || {
        let block = sine(220.0, FFT_SIZE, 0.1, 0);
        tap.push_slice(0, &block);
        tap.push_slice(1, &block);
        tap
    });
    let tap = handle.join().unwrap();
    assert_eq!(tap.num_channels(), 2);
    assert_eq!(analyzer.process_fft(), 2);
}
