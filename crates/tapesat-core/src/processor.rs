//! Block processor trait and the prepare-time stream description it consumes.

use crate::AudioBuffer;

/// Audio stream configuration applied before any block is processed.
///
/// Immutable per [`Processor::prepare`] call. Every stage re-derives its
/// internal buffers and coefficients from it, and the host re-applies it
/// whenever sample rate, maximum block size or channel count change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Largest block the host will deliver.
    pub block_size: u32,
    /// Number of audio channels (1 or 2 in practice).
    pub num_channels: u32,
}

impl ProcessSpec {
    /// Creates a new spec.
    pub fn new(sample_rate: f64, block_size: u32, num_channels: u32) -> Self {
        Self {
            sample_rate,
            block_size,
            num_channels,
        }
    }

    /// Returns true when the spec can drive a pipeline.
    ///
    /// Zero (or non-finite) sample rate, zero block size and zero channels
    /// are precondition violations.
    pub fn is_valid(&self) -> bool {
        self.sample_rate.is_finite()
            && self.sample_rate > 0.0
            && self.block_size > 0
            && self.num_channels > 0
    }

    /// The same stream at `factor` times the rate and block size.
    pub fn oversampled(&self, factor: u32) -> Self {
        Self {
            sample_rate: self.sample_rate * f64::from(factor),
            block_size: self.block_size.saturating_mul(factor),
            num_channels: self.num_channels,
        }
    }

    /// Maximum block size as `usize`.
    #[inline]
    pub fn max_block(&self) -> usize {
        self.block_size as usize
    }

    /// Channel count as `usize`.
    #[inline]
    pub fn channels(&self) -> usize {
        self.num_channels as usize
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::new(48000.0, 512, 2)
    }
}

/// Shared capability of every pipeline stage.
///
/// Stages are prepared once per [`ProcessSpec`] and then driven once per
/// block, mutating the block in place. Implementations must not allocate,
/// lock or block inside [`process`](Processor::process).
///
/// ## Contract
///
/// - `prepare` sizes every internal buffer for `spec.block_size` samples.
/// - `process` receives at most `spec.block_size` samples per channel.
/// - `reset` clears filter and ramp state without touching coefficients.
/// - `latency_samples` reports group delay at the base rate, `0.0` before
///   the first `prepare`.
pub trait Processor {
    /// Re-derive buffers and coefficients for a new stream configuration.
    fn prepare(&mut self, spec: &ProcessSpec);

    /// Process one block in place.
    fn process(&mut self, block: &mut AudioBuffer);

    /// Clear runtime state (filter memories, pending ramps).
    fn reset(&mut self);

    /// Inherent delay introduced by this processor, in base-rate samples.
    fn latency_samples(&self) -> f32 {
        0.0
    }
}
