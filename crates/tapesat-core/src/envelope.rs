//! Peak envelope follower for dynamics processing.
//!
//! Tracks the absolute level of each channel with separate attack and release
//! ballistics. Coefficients use the `2π` time constant convention
//! (`coeff = exp(-2π / (time_s * fs))`), so after one attack time the
//! envelope has covered roughly 99.8% of a step.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::f64::consts::TAU;

/// Multi-channel peak envelope follower.
///
/// # Example
///
/// ```rust
/// use tapesat_core::EnvelopeFollower;
///
/// let mut env = EnvelopeFollower::new(48000.0, 30.0, 50.0);
/// env.prepare(2);
///
/// let level = env.process(0, 0.5);
/// assert!(level > 0.0 && level < 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    state: Vec<f32>,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f64,
    attack_ms: f32,
    release_ms: f32,
}

impl EnvelopeFollower {
    /// Create a follower at `sample_rate` with the given times.
    pub fn new(sample_rate: f64, attack_ms: f32, release_ms: f32) -> Self {
        let mut follower = Self {
            state: Vec::new(),
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms,
            release_ms,
        };
        follower.recalculate_coefficients();
        follower
    }

    /// Allocate state for `num_channels` and zero it.
    pub fn prepare(&mut self, num_channels: usize) {
        self.state.clear();
        self.state.resize(num_channels, 0.0);
    }

    /// Update sample rate and recalculate coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Set the attack time in milliseconds.
    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        self.attack_ms = attack_ms.max(0.0);
        self.recalculate_coefficients();
    }

    /// Set the release time in milliseconds.
    pub fn set_release_ms(&mut self, release_ms: f32) {
        self.release_ms = release_ms.max(0.0);
        self.recalculate_coefficients();
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Feed one sample of `channel` and return its envelope.
    ///
    /// Channels beyond the prepared count return the rectified input.
    #[inline]
    pub fn process(&mut self, channel: usize, input: f32) -> f32 {
        let input_abs = input.abs();
        let Some(state) = self.state.get_mut(channel) else {
            return input_abs;
        };

        let coeff = if input_abs > *state {
            self.attack_coeff
        } else {
            self.release_coeff
        };

        *state = crate::flush_denormal(input_abs + coeff * (*state - input_abs));
        *state
    }

    /// Current envelope of `channel`.
    pub fn level(&self, channel: usize) -> f32 {
        self.state.get(channel).copied().unwrap_or(0.0)
    }

    /// Reset every channel's envelope to zero.
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = time_coefficient(self.attack_ms, self.sample_rate);
        self.release_coeff = time_coefficient(self.release_ms, self.sample_rate);
    }
}

/// One-pole coefficient for a time constant in ms; near-zero times are instant.
fn time_coefficient(time_ms: f32, sample_rate: f64) -> f32 {
    if time_ms < 1.0e-3 || sample_rate <= 0.0 {
        return 0.0;
    }
    libm::exp(-TAU * 1000.0 / (f64::from(time_ms) * sample_rate)) as f32
}
