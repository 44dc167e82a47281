//! Spectrum display feed.
//!
//! The feed is split between the two timelines of a running pipeline:
//!
//! - [`SpectrumTap`] lives on the audio thread. It collects output samples
//!   into one ring per channel and, each time a ring fills, hands a snapshot
//!   to the analyzer.
//! - [`SpectrumAnalyzer`] lives on the UI thread. At the redraw cadence it
//!   transforms any pending snapshots into a smoothed, log-skewed dB array
//!   per channel.
//!
//! # Hand-off
//!
//! Each channel owns exactly one frame buffer, which travels between the two
//! sides over a pair of bounded channels:
//!
//! ```text
//!            frames (cap 1)
//! SpectrumTap ───────────────→ SpectrumAnalyzer
//!             ←───────────────
//!            recycle (cap 1)
//! ```
//!
//! When a ring fills and the frame is not back yet, the fill is dropped.
//! There is never more than one pending frame per channel, and the audio
//! side neither blocks nor allocates.

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::fft::{Fft, FftScratch, Window, gain_to_db};

/// FFT order (window length `1 << FFT_ORDER`).
pub const FFT_ORDER: u32 = 11;

/// FFT window length in samples.
pub const FFT_SIZE: usize = 1 << FFT_ORDER;

/// Number of points in each display array.
pub const SCOPE_SIZE: usize = 2048;

/// Channels the display shows.
pub const SCOPE_CHANNELS: usize = 2;

/// Lowest displayed level in dB.
pub const MIN_DB: f32 = -12.0;

/// Highest displayed level in dB.
pub const MAX_DB: f32 = 36.0;

/// Weight of the previous frame in the display smoothing.
pub const SMOOTHING: f32 = 0.7;

/// Bins averaged on either side of the center bin.
pub const NEIGHBORHOOD: usize = 5;

/// Frequency warp exponent.
pub const SKEW: f32 = 0.2;

/// Suggested [`SpectrumAnalyzer::process_fft`] rate in Hz.
pub const REDRAW_HZ: u32 = 60;

/// Normalized frequency (0 to 1 of Nyquist) for display point `index`.
///
/// `1 − exp(ln(1 − i/N) · 0.2)` spreads the low end across most of the
/// display.
#[inline]
pub fn skewed_proportion(index: usize, scope_size: usize) -> f32 {
    let t = (index as f32 / scope_size.max(1) as f32).min(1.0 - f32::EPSILON);
    1.0 - ((1.0 - t).ln() * SKEW).exp()
}

/// FFT bin at the center of display point `index`.
#[inline]
pub fn center_bin(index: usize, scope_size: usize, fft_size: usize) -> usize {
    let half = fft_size / 2;
    ((skewed_proportion(index, scope_size) * half as f32) as usize).min(half)
}

/// Unsmoothed display level for point `index`: the mean magnitude of the
/// center bin and its neighbors, in dB, clamped to the display range.
pub fn display_level(magnitudes: &[f32], index: usize, scope_size: usize, fft_size: usize) -> f32 {
    let Some(last) = magnitudes.len().checked_sub(1) else {
        return MIN_DB;
    };
    let center = center_bin(index, scope_size, fft_size).min(last);

    let mut sum = 0.0;
    let mut count = 0;
    for offset in 0..=2 * NEIGHBORHOOD {
        let bin = (center + offset).saturating_sub(NEIGHBORHOOD).min(last);
        sum += magnitudes[bin];
        count += 1;
    }

    gain_to_db(sum / count as f32, MIN_DB).clamp(MIN_DB, MAX_DB)
}

struct TapChannel {
    ring: Vec<f32>,
    index: usize,
    frames: Sender<Vec<f32>>,
    recycle: Receiver<Vec<f32>>,
    dropped: u64,
}

struct AnalyzerChannel {
    frames: Receiver<Vec<f32>>,
    recycle: Sender<Vec<f32>>,
    scope: Vec<f32>,
    initialized: Vec<bool>,
    frames_processed: u64,
}

/// Creates a connected tap/analyzer pair for `num_channels` channels.
///
/// All frame memory is allocated here.
pub fn spectrum_feed(num_channels: usize) -> (SpectrumTap, SpectrumAnalyzer) {
    let mut taps = Vec::with_capacity(num_channels);
    let mut outs = Vec::with_capacity(num_channels);

    for _ in 0..num_channels {
        let (frame_tx, frame_rx) = bounded(1);
        let (recycle_tx, recycle_rx) = bounded(1);
        // Channels are fresh and have capacity one, so this cannot fail.
        let _ = recycle_tx.try_send(vec![0.0; FFT_SIZE]);

        taps.push(TapChannel {
            ring: vec![0.0; FFT_SIZE],
            index: 0,
            frames: frame_tx,
            recycle: recycle_rx,
            dropped: 0,
        });
        outs.push(AnalyzerChannel {
            frames: frame_rx,
            recycle: recycle_tx,
            scope: vec![0.0; SCOPE_SIZE],
            initialized: vec![false; SCOPE_SIZE],
            frames_processed: 0,
        });
    }

    let fft = Fft::new(FFT_SIZE);
    let scratch = fft.make_scratch();
    let analyzer = SpectrumAnalyzer {
        channels: outs,
        window: Window::Hann.coefficients(FFT_SIZE),
        magnitudes: vec![0.0; fft.num_bins()],
        windowed: vec![0.0; FFT_SIZE],
        fft,
        scratch,
    };

    (SpectrumTap { channels: taps }, analyzer)
}

/// Audio-side half of the spectrum feed.
pub struct SpectrumTap {
    channels: Vec<TapChannel>,
}

impl SpectrumTap {
    /// Number of channels the tap accepts.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Appends one sample to `channel`'s ring. Out-of-range channels are
    /// ignored.
    #[inline]
    pub fn push_sample(&mut self, channel: usize, sample: f32) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };

        ch.ring[ch.index] = sample;
        ch.index += 1;

        if ch.index == ch.ring.len() {
            ch.index = 0;
            match ch.recycle.try_recv() {
                Ok(mut frame) => {
                    frame.copy_from_slice(&ch.ring);
                    if ch.frames.try_send(frame).is_err() {
                        ch.dropped += 1;
                    }
                }
                Err(_) => ch.dropped += 1,
            }
        }
    }

    /// Pushes every sample of `samples` into `channel`.
    pub fn push_slice(&mut self, channel: usize, samples: &[f32]) {
        for &s in samples {
            self.push_sample(channel, s);
        }
    }

    /// Pushes a whole block.
    ///
    /// A mono block is mirrored into every tap channel.
    pub fn push_block(&mut self, block: &tapesat_core::AudioBuffer) {
        if block.num_channels() == 1 {
            let mono = block.channel(0);
            for ch in 0..self.channels.len() {
                self.push_slice(ch, mono);
            }
        } else {
            for (ch, samples) in block.channels().enumerate() {
                self.push_slice(ch, samples);
            }
        }
    }

    /// Ring fills discarded because the previous frame was still pending.
    pub fn dropped_frames(&self, channel: usize) -> u64 {
        self.channels.get(channel).map_or(0, |c| c.dropped)
    }
}

impl std::fmt::Debug for SpectrumTap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumTap")
            .field("num_channels", &self.channels.len())
            .finish()
    }
}

/// UI-side half of the spectrum feed.
pub struct SpectrumAnalyzer {
    channels: Vec<AnalyzerChannel>,
    fft: Fft,
    scratch: FftScratch,
    window: Vec<f32>,
    windowed: Vec<f32>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Number of display channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Transforms every pending frame into its channel's display array.
    ///
    /// Returns the number of channels that were updated.
    pub fn process_fft(&mut self) -> usize {
        let mut updated = 0;

        for ch in &mut self.channels {
            let Ok(frame) = ch.frames.try_recv() else {
                continue;
            };

            for ((dst, &src), &w) in self.windowed.iter_mut().zip(&frame).zip(&self.window) {
                *dst = src * w;
            }
            // The tap may already be gone; the frame is simply dropped then.
            let _ = ch.recycle.try_send(frame);

            self.fft
                .magnitudes_into(&self.windowed, &mut self.scratch, &mut self.magnitudes);

            for (i, (point, seen)) in ch.scope.iter_mut().zip(ch.initialized.iter_mut()).enumerate() {
                let level = display_level(&self.magnitudes, i, SCOPE_SIZE, FFT_SIZE);
                if *seen {
                    *point = SMOOTHING * *point + (1.0 - SMOOTHING) * level;
                } else {
                    *point = level;
                    *seen = true;
                }
            }

            ch.frames_processed += 1;
            updated += 1;
        }

        updated
    }

    /// Display array for `channel`, or an empty slice if out of range.
    pub fn scope_data(&self, channel: usize) -> &[f32] {
        self.channels
            .get(channel)
            .map(|c| c.scope.as_slice())
            .unwrap_or(&[])
    }

    /// Frames consumed so far on `channel`.
    pub fn frames_processed(&self, channel: usize) -> u64 {
        self.channels.get(channel).map_or(0, |c| c.frames_processed)
    }

    /// Magnitudes of the most recent transform.
    pub fn last_magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Forgets all smoothing history.
    pub fn reset(&mut self) {
        for ch in &mut self.channels {
            ch.scope.fill(0.0);
            ch.initialized.fill(false);
        }
    }
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("num_channels", &self.channels.len())
            .field("fft", &self.fft)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn skew_spans_zero_to_near_nyquist() {
        assert_eq!(skewed_proportion(0, SCOPE_SIZE), 0.0);
        let last = skewed_proportion(SCOPE_SIZE - 1, SCOPE_SIZE);
        assert!(last > 0.75 && last < 1.0);
        for i in 1..SCOPE_SIZE {
            assert!(skewed_proportion(i, SCOPE_SIZE) >= skewed_proportion(i - 1, SCOPE_SIZE));
        }
        assert!(center_bin(SCOPE_SIZE - 1, SCOPE_SIZE, FFT_SIZE) <= FFT_SIZE / 2);
    }

    #[test]
    fn display_level_clamps_and_handles_empty() {
        assert_eq!(display_level(&[], 0, SCOPE_SIZE, FFT_SIZE), MIN_DB);
        let loud = vec![1e6; FFT_SIZE / 2 + 1];
        assert_eq!(display_level(&loud, 100, SCOPE_SIZE, FFT_SIZE), MAX_DB);
        let silent = vec![0.0; FFT_SIZE / 2 + 1];
        assert_eq!(display_level(&silent, 100, SCOPE_SIZE, FFT_SIZE), MIN_DB);
    }

    #[test]
    fn frame_ready_only_after_full_window() {
        let (mut tap, mut analyzer) = spectrum_feed(2);
        tap.push_slice(0, &vec![0.5; FFT_SIZE - 1]);
        assert_eq!(analyzer.process_fft(), 0);
        tap.push_sample(0, 0.5);
        assert_eq!(analyzer.process_fft(), 1);
        assert_eq!(analyzer.frames_processed(0), 1);
        assert_eq!(analyzer.frames_processed(1), 0);
    }

    #[test]
    fn unconsumed_frame_drops_next_fill() {
        let (mut tap, mut analyzer) = spectrum_feed(1);
        tap.push_slice(0, &vec![0.1; FFT_SIZE * 3]);
        assert_eq!(tap.dropped_frames(0), 2);

        assert_eq!(analyzer.process_fft(), 1);
        assert_eq!(analyzer.process_fft(), 0);

        tap.push_slice(0, &vec![0.1; FFT_SIZE]);
        assert_eq!(analyzer.process_fft(), 1);
        assert_eq!(tap.dropped_frames(0), 2);
    }

    #[test]
    fn first_frame_is_raw_then_smoothed() {
        let (mut tap, mut analyzer) = spectrum_feed(1);
        let sine: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.05 * (2.0 * PI * 64.0 * i as f32 / FFT_SIZE as f32).sin())
            .collect();

        tap.push_slice(0, &sine);
        analyzer.process_fft();
        let first = analyzer.scope_data(0).to_vec();
        let raw: Vec<f32> = (0..SCOPE_SIZE)
            .map(|i| display_level(analyzer.last_magnitudes(), i, SCOPE_SIZE, FFT_SIZE))
            .collect();
        assert_eq!(first, raw);

        // A quieter frame only moves the display 30% of the way down
        let quiet: Vec<f32> = sine.iter().map(|s| s * 0.1).collect();
        tap.push_slice(0, &quiet);
        analyzer.process_fft();
        let peak = (0..SCOPE_SIZE)
            .max_by(|&a, &b| first[a].total_cmp(&first[b]))
            .unwrap_or(0);
        let raw_quiet = display_level(analyzer.last_magnitudes(), peak, SCOPE_SIZE, FFT_SIZE);
        let expected = SMOOTHING * first[peak] + (1.0 - SMOOTHING) * raw_quiet;
        assert!((analyzer.scope_data(0)[peak] - expected).abs() < 1e-4);
    }

    #[test]
    fn mono_block_is_mirrored() {
        let (mut tap, mut analyzer) = spectrum_feed(2);
        let block = tapesat_core::AudioBuffer::from_channels(&[&vec![0.2; FFT_SIZE]]);
        tap.push_block(&block);
        assert_eq!(analyzer.process_fft(), 2);
        assert_eq!(analyzer.scope_data(0), analyzer.scope_data(1));
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let (mut tap, analyzer) = spectrum_feed(1);
        tap.push_sample(3, 1.0);
        assert!(analyzer.scope_data(3).is_empty());
        assert_eq!(tap.dropped_frames(3), 0);
    }
}
