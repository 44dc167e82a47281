//! Block-granular gain ramping.
//!
//! Control values arrive between blocks. Applying a jump directly produces a
//! step discontinuity ("zipper noise"), so each stage keeps the gain it used
//! for the previous block next to the gain it should reach and interpolates
//! linearly across exactly one block.
//!
//! The ramp for a block of `n` samples is
//!
//! ```text
//! g[i] = previous + (current - previous) * i / n,   i = 0..n
//! ```
//!
//! so the first sample uses exactly `previous` and the last sample lands one
//! step short of `current`. Once the block is done `previous` becomes
//! `current` and later blocks collapse to a flat multiply.

use crate::AudioBuffer;

/// A `(previous, current)` pair of linear gain multipliers.
///
/// ## Invariant
///
/// `previous` only moves to `current` after a whole block has had the ramp
/// applied (or on an explicit [`reset`](Self::reset)). Changing the target
/// several times between blocks only changes the end point of the next ramp.
///
/// ## Example
///
/// ```rust
/// use tapesat_core::RampedGain;
///
/// let mut gain = RampedGain::new(0.0);
/// gain.set_target(1.0);
///
/// let mut samples = [1.0_f32; 4];
/// gain.apply_slice(&mut samples);
///
/// assert_eq!(samples, [0.0, 0.25, 0.5, 0.75]);
/// assert!(!gain.is_ramping());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampedGain {
    previous: f32,
    current: f32,
}

impl RampedGain {
    /// Creates a settled gain (no pending ramp).
    pub fn new(gain: f32) -> Self {
        Self {
            previous: gain,
            current: gain,
        }
    }

    /// Sets the gain the next block ramps toward.
    #[inline]
    pub fn set_target(&mut self, gain: f32) {
        self.current = gain;
    }

    /// Gain used on the first sample of the next block.
    #[inline]
    pub fn previous(&self) -> f32 {
        self.previous
    }

    /// Gain the next block ramps toward.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Returns true if the next block will ramp.
    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.previous != self.current
    }

    /// Drops any pending ramp: the next block applies `current` flat.
    pub fn reset(&mut self) {
        self.previous = self.current;
    }

    /// Forces both ends of the ramp to `gain`.
    pub fn set_immediate(&mut self, gain: f32) {
        self.previous = gain;
        self.current = gain;
    }

    /// Per-sample increment for a block of `num_samples`.
    #[inline]
    pub fn step(&self, num_samples: usize) -> f32 {
        if num_samples == 0 {
            0.0
        } else {
            (self.current - self.previous) / num_samples as f32
        }
    }

    /// Gain at sample `index` of a block of `num_samples`.
    #[inline]
    pub fn gain_at(&self, index: usize, num_samples: usize) -> f32 {
        if self.is_ramping() {
            self.previous + self.step(num_samples) * index as f32
        } else {
            self.current
        }
    }

    /// Ends the block: the ramp is considered fully applied.
    #[inline]
    pub fn commit(&mut self) {
        self.previous = self.current;
    }

    /// Multiplies `samples` by the ramp for a block of `samples.len()`
    /// without committing it.
    ///
    /// Use this for multi-channel blocks, then call [`commit`](Self::commit)
    /// once every channel has been processed.
    pub fn ramp_slice(&self, samples: &mut [f32]) {
        let n = samples.len();
        if self.is_ramping() {
            let step = self.step(n);
            for (i, sample) in samples.iter_mut().enumerate() {
                *sample *= self.previous + step * i as f32;
            }
        } else {
            let gain = self.current;
            for sample in samples.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Applies the ramp to one mono block and commits it.
    pub fn apply_slice(&mut self, samples: &mut [f32]) {
        self.ramp_slice(samples);
        self.commit();
    }

    /// Applies the same ramp shape to every channel of `block`, then commits.
    pub fn apply(&mut self, block: &mut AudioBuffer) {
        for channel in block.channels_mut() {
            self.ramp_slice(channel);
        }
        self.commit();
    }
}

impl Default for RampedGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}
