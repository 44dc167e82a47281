//! Feed-forward compressor running inside the oversampled saturation loop.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Envelope Follower (per channel) → Gain Computer → Gain → Output
//! ```
//!
//! # Fixed settings
//!
//! The saturation stage runs the compressor with [`TAPE_COMPRESSOR`]:
//! threshold -30 dB, attack 30 ms, release 50 ms and a ratio of `1.0`.
//! At 1:1 the gain computer returns exactly 0 dB, so the compressor is
//! currently a bit-exact no-op. That ratio is an open product decision, not
//! an accident of this implementation; it is kept as a named constant so
//! the decision is made in one place.

use tapesat_core::{AudioBuffer, EnvelopeFollower, db_to_linear, linear_to_db};

/// Static compressor configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    /// Level where compression begins, in dB.
    pub threshold_db: f32,
    /// Input/output slope above threshold (`1.0` disables compression).
    pub ratio: f32,
    /// Attack time in milliseconds.
    pub attack_ms: f32,
    /// Release time in milliseconds.
    pub release_ms: f32,
    /// Soft-knee width in dB (`0.0` is a hard knee).
    pub knee_db: f32,
}

/// Settings used by the saturation stage.
pub const TAPE_COMPRESSOR: CompressorSettings = CompressorSettings {
    threshold_db: -30.0,
    ratio: 1.0,
    attack_ms: 30.0,
    release_ms: 50.0,
    knee_db: 0.0,
};

impl Default for CompressorSettings {
    fn default() -> Self {
        TAPE_COMPRESSOR
    }
}

/// Gain computer for calculating the compression curve.
#[derive(Debug, Clone)]
struct GainComputer {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
}

impl GainComputer {
    #[inline]
    fn compute_gain_db(&self, input_db: f32) -> f32 {
        let overshoot = input_db - self.threshold_db;
        let half_knee = self.knee_db / 2.0;
        let slope = 1.0 - 1.0 / self.ratio;

        if overshoot <= -half_knee {
            0.0
        } else if overshoot > half_knee {
            -(overshoot * slope)
        } else {
            let knee_factor = (overshoot + half_knee) / self.knee_db;
            -(knee_factor * knee_factor * overshoot * slope)
        }
    }
}

/// Per-channel (unlinked) dynamics compressor.
///
/// # Example
///
/// ```rust
/// use tapesat_core::AudioBuffer;
/// use tapesat_effects::{Compressor, CompressorSettings};
///
/// let mut comp = Compressor::new(CompressorSettings { ratio: 4.0, ..Default::default() });
/// comp.prepare(96000.0, 2);
///
/// let mut block = AudioBuffer::new(2, 128);
/// comp.process(&mut block);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    envelope: EnvelopeFollower,
    gain_computer: GainComputer,
    settings: CompressorSettings,
    /// Last computed gain reduction in dB (always non-positive).
    last_gain_reduction_db: f32,
}

impl Compressor {
    /// Creates an unprepared compressor.
    pub fn new(settings: CompressorSettings) -> Self {
        let mut comp = Self {
            envelope: EnvelopeFollower::new(48000.0, settings.attack_ms, settings.release_ms),
            gain_computer: GainComputer {
                threshold_db: 0.0,
                ratio: 1.0,
                knee_db: 0.0,
            },
            settings,
            last_gain_reduction_db: 0.0,
        };
        comp.apply_settings(settings);
        comp
    }

    /// Sets the processing rate and allocates per-channel envelopes.
    pub fn prepare(&mut self, sample_rate: f64, num_channels: usize) {
        self.envelope.set_sample_rate(sample_rate);
        self.envelope.prepare(num_channels);
        self.last_gain_reduction_db = 0.0;
    }

    /// Replaces all settings, clamping each to a usable range.
    pub fn apply_settings(&mut self, settings: CompressorSettings) {
        self.gain_computer.threshold_db = settings.threshold_db.clamp(-100.0, 0.0);
        self.gain_computer.ratio = settings.ratio.max(1.0);
        self.gain_computer.knee_db = settings.knee_db.clamp(0.0, 24.0);
        self.envelope.set_attack_ms(settings.attack_ms);
        self.envelope.set_release_ms(settings.release_ms);
        self.settings = settings;
    }

    /// Active settings.
    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Returns the last computed gain reduction in dB (always non-positive).
    pub fn gain_reduction_db(&self) -> f32 {
        self.last_gain_reduction_db
    }

    /// Compresses every channel of `block` in place.
    pub fn process(&mut self, block: &mut AudioBuffer) {
        for (ch, samples) in block.channels_mut().enumerate() {
            for sample in samples.iter_mut() {
                let envelope = self.envelope.process(ch, *sample);
                let gain_db = self.gain_computer.compute_gain_db(linear_to_db(envelope));
                self.last_gain_reduction_db = gain_db;
                *sample *= db_to_linear(gain_db);
            }
        }
    }

    /// Clears envelope state.
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.last_gain_reduction_db = 0.0;
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(TAPE_COMPRESSOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud_block(len: usize) -> AudioBuffer {
        let mut block = AudioBuffer::new(2, len);
        for ch in block.channels_mut() {
            for (i, s) in ch.iter_mut().enumerate() {
                *s = if i % 2 == 0 { 0.9 } else { -0.9 };
            }
        }
        block
    }

    #[test]
    fn unity_ratio_is_bit_exact() {
        let mut comp = Compressor::default();
        comp.prepare(96000.0, 2);
        let original = loud_block(4096);
        let mut block = original.clone();
        comp.process(&mut block);
        assert_eq!(block, original);
        assert_eq!(comp.gain_reduction_db(), 0.0);
    }

    #[test]
    fn ratio_reduces_loud_signal() {
        let mut comp = Compressor::new(CompressorSettings {
            ratio: 4.0,
            ..TAPE_COMPRESSOR
        });
        comp.prepare(96000.0, 2);
        let mut block = loud_block(96000);
        comp.process(&mut block);

        // 0.9 ≈ -0.9 dBFS, 29.1 dB over threshold → about -21.8 dB at 4:1
        let tail = block.channel(0)[90000].abs();
        assert!((linear_to_db(tail) - (-0.92 - 21.8)).abs() < 0.5, "tail {tail}");
        assert!(comp.gain_reduction_db() < -20.0);
    }

    #[test]
    fn below_threshold_untouched() {
        let mut comp = Compressor::new(CompressorSettings {
            ratio: 8.0,
            ..TAPE_COMPRESSOR
        });
        comp.prepare(48000.0, 1);
        let mut block = AudioBuffer::from_channels(&[&[0.01; 256]]);
        comp.process(&mut block);
        assert!(block.channel(0).iter().all(|&s| s == 0.01));
    }

    #[test]
    fn settings_are_clamped() {
        let mut comp = Compressor::default();
        comp.apply_settings(CompressorSettings {
            ratio: 0.2,
            threshold_db: 12.0,
            ..TAPE_COMPRESSOR
        });
        assert_eq!(comp.gain_computer.ratio, 1.0);
        assert_eq!(comp.gain_computer.threshold_db, 0.0);
    }
}
