//! Tape hiss: additive white noise followed by the tape EQ chain.
//!
//! # Signal Flow
//!
//! ```text
//! Input ──(+)── Tape EQ (8 biquads) → Output
//!          ↑
//!  uniform noise [-0.5, 0.5) × hiss gain
//! ```
//!
//! The EQ shapes the whole signal, not only the noise, so the tape machine's
//! head bump and low cut color the program material too.
//!
//! The hiss gain ramps across a block like every other gain in the pipeline.
//! Noise is uncorrelated from sample to sample, so the ramp only smooths the
//! noise floor level and does not make any guarantee about the noise itself.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tapesat_core::{
    AudioBuffer, Biquad, ProcessSpec, Processor, RampedGain, db_to_linear, map_range,
};

use crate::tape_eq::{TAPE_EQ_BANDS, TapeEqCoefficients, TapeEqPreset, design_tape_eq};

/// Noise level at 0 % hiss, in dB.
pub const HISS_FLOOR_DB: f32 = -60.0;

/// Noise level at 100 % hiss, in dB.
pub const HISS_CEILING_DB: f32 = -12.0;

/// Seed used by [`NoiseStage::new`].
pub const DEFAULT_NOISE_SEED: u64 = 0x7A9E_5A7;

/// Maps a Hiss percentage linearly onto [-60, -12] dB.
#[inline]
pub fn hiss_to_db(percentage: f32) -> f32 {
    map_range(
        percentage.clamp(0.0, 100.0),
        0.0,
        100.0,
        HISS_FLOOR_DB,
        HISS_CEILING_DB,
    )
}

/// Control-side handle for publishing new EQ coefficients.
///
/// The noise stage picks up a published set at the start of its next block.
#[derive(Debug, Clone)]
pub struct TapeEqHandle {
    shared: Arc<ArcSwap<TapeEqCoefficients>>,
}

impl TapeEqHandle {
    /// Replaces the coefficient set.
    pub fn publish(&self, coefficients: TapeEqCoefficients) {
        self.shared.store(Arc::new(coefficients));
    }

    /// Designs `preset` at `sample_rate` and publishes it.
    pub fn publish_preset(&self, preset: &TapeEqPreset, sample_rate: f64) {
        self.publish(design_tape_eq(preset, sample_rate));
    }

    /// The most recently published set.
    pub fn current(&self) -> Arc<TapeEqCoefficients> {
        self.shared.load_full()
    }
}

/// Noise generator and tape EQ.
///
/// ## Parameters
///
/// | Name | Range | Default |
/// |------|-------|---------|
/// | Hiss | 0.0–100.0 % | 0.0 |
#[derive(Debug)]
pub struct NoiseStage {
    hiss: f32,
    gain: RampedGain,
    rng: SmallRng,
    preset: TapeEqPreset,
    shared: Arc<ArcSwap<TapeEqCoefficients>>,
    applied: Arc<TapeEqCoefficients>,
    filters: Vec<[Biquad; TAPE_EQ_BANDS]>,
    sample_rate: Option<f64>,
}

impl NoiseStage {
    /// Creates a stage with the ATR-102 EQ and the default noise seed.
    pub fn new(hiss: f32) -> Self {
        Self::with_seed(hiss, DEFAULT_NOISE_SEED)
    }

    /// Creates a stage whose noise sequence starts from `seed`.
    pub fn with_seed(hiss: f32, seed: u64) -> Self {
        let hiss = hiss.clamp(0.0, 100.0);
        let applied = Arc::new(TapeEqCoefficients::IDENTITY);
        Self {
            hiss,
            gain: RampedGain::new(db_to_linear(hiss_to_db(hiss))),
            rng: SmallRng::seed_from_u64(seed),
            preset: TapeEqPreset::atr102(),
            shared: Arc::new(ArcSwap::new(Arc::clone(&applied))),
            applied,
            filters: Vec::new(),
            sample_rate: None,
        }
    }

    /// Uses `preset` from the next [`prepare`](Processor::prepare) on.
    pub fn with_preset(mut self, preset: TapeEqPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Swaps the EQ preset in place, keeping the noise sequence and gain.
    ///
    /// Once prepared, the new coefficients are published and apply at the
    /// next block.
    pub fn set_preset(&mut self, preset: TapeEqPreset) {
        if let Some(sample_rate) = self.sample_rate {
            self.eq_handle().publish_preset(&preset, sample_rate);
        }
        self.preset = preset;
    }

    /// Sets the hiss level; the next block ramps to it.
    pub fn set_hiss_level(&mut self, percentage: f32) {
        self.hiss = percentage.clamp(0.0, 100.0);
        self.gain.set_target(db_to_linear(hiss_to_db(self.hiss)));
    }

    /// Cached Hiss percentage.
    pub fn hiss_level(&self) -> f32 {
        self.hiss
    }

    /// The `(previous, current)` noise gain pair.
    pub fn gain(&self) -> &RampedGain {
        &self.gain
    }

    /// EQ preset applied at prepare time.
    pub fn preset(&self) -> &TapeEqPreset {
        &self.preset
    }

    /// Handle for swapping coefficients from another thread.
    pub fn eq_handle(&self) -> TapeEqHandle {
        TapeEqHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Coefficients the filters are currently running.
    pub fn coefficients(&self) -> &TapeEqCoefficients {
        &self.applied
    }

    fn install(&mut self, coefficients: Arc<TapeEqCoefficients>) {
        for chain in &mut self.filters {
            for (filter, coefs) in chain.iter_mut().zip(coefficients.bands.iter()) {
                filter.set(*coefs);
            }
        }
        self.applied = coefficients;
    }

    fn sync_coefficients(&mut self) {
        let guard = self.shared.load();
        if !Arc::ptr_eq(&guard, &self.applied) {
            let latest = arc_swap::Guard::into_inner(guard);
            self.install(latest);
        }
    }
}

impl Default for NoiseStage {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Processor for NoiseStage {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.filters.clear();
        self.filters
            .resize_with(spec.channels(), || core::array::from_fn(|_| Biquad::new()));

        self.sample_rate = Some(spec.sample_rate);
        let coefficients = Arc::new(design_tape_eq(&self.preset, spec.sample_rate));
        self.shared.store(Arc::clone(&coefficients));
        self.install(coefficients);

        self.gain.set_immediate(db_to_linear(hiss_to_db(self.hiss)));
    }

    fn process(&mut self, block: &mut AudioBuffer) {
        self.sync_coefficients();

        let n = block.num_samples();
        let gain = self.gain;
        let rng = &mut self.rng;

        for (samples, chain) in block.channels_mut().zip(self.filters.iter_mut()) {
            for (i, sample) in samples.iter_mut().enumerate() {
                let noise: f32 = rng.gen_range(-0.5..0.5);
                let mut y = *sample + noise * gain.gain_at(i, n);
                for filter in chain.iter_mut() {
                    y = filter.process(y);
                }
                *sample = y;
            }
        }

        self.gain.commit();
    }

    fn reset(&mut self) {
        for chain in &mut self.filters {
            for filter in chain.iter_mut() {
                filter.clear();
            }
        }
        self.gain.reset();
    }
}
