//! Oversampled tape saturation.
//!
//! # Signal Flow
//!
//! ```text
//! Input → 2x upsample → × (1 + s²) → tanh shaper → Compressor → 2x downsample → Output
//! ```
//!
//! where `s` is the Saturation knob as a fraction (0–1). The quadratic taper
//! concentrates the audible change in the upper half of the knob.
//!
//! # Transfer function
//!
//! ```text
//! y = tanh(x) · 5 / tanh(5)
//! ```
//!
//! The `5 / tanh(5)` factor is ≈ 5.0005, so the shaper is also a fixed
//! ~+14 dB make-up stage in front of the mix. Nothing downstream
//! compensates for it.

use libm::tanhf;
use tapesat_core::{
    AudioBuffer, HalfBandOversampler, OVERSAMPLE_FACTOR, ProcessSpec, Processor,
};

use crate::compressor::{Compressor, TAPE_COMPRESSOR};

/// Saturation value that forces the input scale to exactly `1.0`.
pub const SATURATION_BYPASS_SENTINEL: f32 = 0.01;

/// Shaper output scale, `5 / tanh(5)`.
pub const SHAPER_SCALE: f32 = 5.000_454;

/// Quadratic taper: `(saturation / 100)²`.
#[inline]
pub fn saturation_strength(saturation: f32) -> f32 {
    let s = saturation.clamp(0.0, 100.0) / 100.0;
    s * s
}

/// Pre-shaper scale factor for a Saturation value.
#[inline]
pub fn saturation_level(saturation: f32) -> f32 {
    if saturation == SATURATION_BYPASS_SENTINEL {
        1.0
    } else {
        1.0 + saturation_strength(saturation)
    }
}

/// The waveshaping transfer function.
#[inline]
pub fn tape_shaper(x: f32) -> f32 {
    tanhf(x) * SHAPER_SCALE
}

/// Saturation stage: oversampled waveshaper followed by a compressor.
///
/// ## Parameters
///
/// | Name | Range | Default |
/// |------|-------|---------|
/// | Saturation | 0.0–100.0 % | 0.0 |
#[derive(Debug, Clone)]
pub struct SaturationStage {
    saturation: f32,
    oversampler: HalfBandOversampler,
    compressor: Compressor,
}

impl SaturationStage {
    /// Creates an unprepared stage.
    pub fn new(saturation: f32) -> Self {
        Self {
            saturation: saturation.clamp(0.0, 100.0),
            oversampler: HalfBandOversampler::default(),
            compressor: Compressor::new(TAPE_COMPRESSOR),
        }
    }

    /// Stores the raw Saturation percentage.
    pub fn set_saturation(&mut self, saturation: f32) {
        self.saturation = saturation.clamp(0.0, 100.0);
    }

    /// Raw Saturation percentage.
    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    /// Read access to the compressor.
    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Mutable access to the compressor, for tuning its settings.
    pub fn compressor_mut(&mut self) -> &mut Compressor {
        &mut self.compressor
    }
}

impl Default for SaturationStage {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Processor for SaturationStage {
    fn prepare(&mut self, spec: &ProcessSpec) {
        let os_spec = spec.oversampled(OVERSAMPLE_FACTOR as u32);
        self.oversampler.prepare(spec.channels(), spec.max_block());
        self.compressor.prepare(os_spec.sample_rate, os_spec.channels());
    }

    fn process(&mut self, block: &mut AudioBuffer) {
        if !self.oversampler.is_prepared() {
            return;
        }

        let level = saturation_level(self.saturation);
        let compressor = &mut self.compressor;
        self.oversampler.process_with(block, |upsampled| {
            for channel in upsampled.channels_mut() {
                for sample in channel.iter_mut() {
                    *sample = tape_shaper(*sample * level);
                }
            }
            compressor.process(upsampled);
        });
    }

    fn reset(&mut self) {
        self.oversampler.reset();
        self.compressor.reset();
    }

    fn latency_samples(&self) -> f32 {
        self.oversampler.latency_samples()
    }
}
