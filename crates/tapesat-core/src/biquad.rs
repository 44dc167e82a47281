//! Biquad (bi-quadratic) filter structure.
//!
//! Provides a second-order IIR section plus free functions that compute
//! coefficients for the responses the tape EQ is built from: high-pass,
//! low-pass, low shelf, high shelf and peaking.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas. The
//! builders return raw `(b0, b1, b2, a0, a1, a2)` tuples; normalization by
//! `a0` happens once in [`BiquadCoefficients::from_raw`].

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Raw, un-normalized coefficient tuple `(b0, b1, b2, a0, a1, a2)`.
pub type RawCoefficients = (f32, f32, f32, f32, f32, f32);

/// Normalized biquad coefficients (`a0 == 1`).
///
/// `Copy` so that one set can be shared by every channel's filter state and
/// swapped wholesale between blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficients.
    pub b0: f32,
    /// Feedforward coefficient for x[n-1].
    pub b1: f32,
    /// Feedforward coefficient for x[n-2].
    pub b2: f32,
    /// Feedback coefficient for y[n-1].
    pub a1: f32,
    /// Feedback coefficient for y[n-2].
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Coefficients with `y[n] = x[n]`.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Normalizes a raw tuple by `a0`.
    ///
    /// A zero or non-finite `a0` yields [`IDENTITY`](Self::IDENTITY).
    pub fn from_raw((b0, b1, b2, a0, a1, a2): RawCoefficients) -> Self {
        if a0 == 0.0 || !a0.is_finite() {
            return Self::IDENTITY;
        }
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
        }
    }

    /// Returns true if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.b0.is_finite()
            && self.b1.is_finite()
            && self.b2.is_finite()
            && self.a1.is_finite()
            && self.a2.is_finite()
    }

    /// Magnitude response at `frequency` Hz, evaluated analytically.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * core::f64::consts::PI * f64::from(frequency) / f64::from(sample_rate);
        let (c1, s1) = (libm::cos(w), -libm::sin(w));
        let (c2, s2) = (libm::cos(2.0 * w), -libm::sin(2.0 * w));

        let num_re = f64::from(self.b0) + f64::from(self.b1) * c1 + f64::from(self.b2) * c2;
        let num_im = f64::from(self.b1) * s1 + f64::from(self.b2) * s2;
        let den_re = 1.0 + f64::from(self.a1) * c1 + f64::from(self.a2) * c2;
        let den_im = f64::from(self.a1) * s1 + f64::from(self.a2) * s2;

        let num = libm::sqrt(num_re * num_re + num_im * num_im);
        let den = libm::sqrt(den_re * den_re + den_im * den_im).max(1e-20);
        (num / den) as f32
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Second-order IIR filter section.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coefficients: BiquadCoefficients,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a biquad with the given normalized coefficients.
    pub fn with_coefficients(coefficients: BiquadCoefficients) -> Self {
        Self {
            coefficients,
            ..Self::default()
        }
    }

    /// Sets raw coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        self.coefficients = BiquadCoefficients::from_raw((b0, b1, b2, a0, a1, a2));
    }

    /// Replaces the coefficients, keeping the filter memory.
    #[inline]
    pub fn set(&mut self, coefficients: BiquadCoefficients) {
        self.coefficients = coefficients;
    }

    /// Current normalized coefficients.
    pub fn coefficients(&self) -> &BiquadCoefficients {
        &self.coefficients
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coefficients;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::flush_denormal(output);

        output
    }

    /// Processes a slice in place.
    pub fn process_slice(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clears the filter memory without changing coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Angular frequency with the cutoff kept strictly inside (0, Nyquist).
#[inline]
fn omega(frequency: f32, sample_rate: f32) -> f32 {
    let sample_rate = sample_rate.max(1.0);
    let frequency = frequency.clamp(1e-3, sample_rate * 0.499);
    2.0 * PI * frequency / sample_rate
}

/// Calculates low-pass filter coefficients.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (typically 0.707 for Butterworth response)
/// * `sample_rate` - Sample rate in Hz
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> RawCoefficients {
    let omega = omega(frequency, sample_rate);
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q.max(1e-3));

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates high-pass filter coefficients.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (typically 0.707 for Butterworth response)
/// * `sample_rate` - Sample rate in Hz
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> RawCoefficients {
    let omega = omega(frequency, sample_rate);
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q.max(1e-3));

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates peaking EQ coefficients.
///
/// Boosts or cuts around a center frequency with bandwidth `frequency / q`.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `q` - Q factor
/// * `gain_db` - Gain in decibels (positive = boost, negative = cut)
/// * `sample_rate` - Sample rate in Hz
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> RawCoefficients {
    let a = powf(10.0, gain_db / 40.0); // sqrt(10^(dB/20))
    let omega = omega(frequency, sample_rate);
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q.max(1e-3));

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates low shelf coefficients.
///
/// Frequencies well below `frequency` are scaled by `gain_db`; `q` controls
/// the steepness of the transition.
pub fn low_shelf_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> RawCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = omega(frequency, sample_rate);
    let cos_omega = cosf(omega);
    let beta = sinf(omega) * sqrtf(a) / q.max(1e-3);
    let a_minus = a - 1.0;
    let a_plus = a + 1.0;

    let b0 = a * (a_plus - a_minus * cos_omega + beta);
    let b1 = 2.0 * a * (a_minus - a_plus * cos_omega);
    let b2 = a * (a_plus - a_minus * cos_omega - beta);
    let a0 = a_plus + a_minus * cos_omega + beta;
    let a1 = -2.0 * (a_minus + a_plus * cos_omega);
    let a2 = a_plus + a_minus * cos_omega - beta;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates high shelf coefficients.
///
/// Frequencies well above `frequency` are scaled by `gain_db`.
pub fn high_shelf_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> RawCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = omega(frequency, sample_rate);
    let cos_omega = cosf(omega);
    let beta = sinf(omega) * sqrtf(a) / q.max(1e-3);
    let a_minus = a - 1.0;
    let a_plus = a + 1.0;

    let b0 = a * (a_plus + a_minus * cos_omega + beta);
    let b1 = -2.0 * a * (a_minus + a_plus * cos_omega);
    let b2 = a * (a_plus + a_minus * cos_omega - beta);
    let a0 = a_plus - a_minus * cos_omega + beta;
    let a1 = 2.0 * (a_minus - a_plus * cos_omega);
    let a2 = a_plus - a_minus * cos_omega - beta;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn db(linear: f32) -> f32 {
        20.0 * linear.log10()
    }

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-6);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = Biquad::with_coefficients(BiquadCoefficients::from_raw(
            lowpass_coefficients(1000.0, 0.707, SR),
        ));
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.clear();

        assert_eq!(biquad.x1, 0.0);
        assert_eq!(biquad.x2, 0.0);
        assert_eq!(biquad.y1, 0.0);
        assert_eq!(biquad.y2, 0.0);
    }

    #[test]
    fn test_zero_a0_normalizes_to_identity() {
        let coeffs = BiquadCoefficients::from_raw((1.0, 2.0, 3.0, 0.0, 1.0, 1.0));
        assert_eq!(coeffs, BiquadCoefficients::IDENTITY);
    }

    #[test]
    fn test_lowpass_dc_pass() {
        let mut biquad = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, SR);
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mut output = 0.0;
        for _ in 0..2000 {
            output = biquad.process(1.0);
        }
        assert!((output - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let coeffs = BiquadCoefficients::from_raw(highpass_coefficients(30.0, 0.707, SR));
        assert!(coeffs.magnitude_at(1.0, SR) < 0.01);
        assert!((coeffs.magnitude_at(5000.0, SR) - 1.0).abs() < 0.01);

        let coeffs = BiquadCoefficients::from_raw(highpass_coefficients(1000.0, 0.707_107, SR));
        assert!((db(coeffs.magnitude_at(1000.0, SR)) + 3.01).abs() < 0.05);
    }

    #[test]
    fn test_peaking_gain_at_center() {
        for gain_db in [-3.2, 2.0, 6.0] {
            let coeffs = BiquadCoefficients::from_raw(peaking_eq_coefficients(250.0, 2.0, gain_db, SR));
            let measured = db(coeffs.magnitude_at(250.0, SR));
            assert!((measured - gain_db).abs() < 0.05, "expected {gain_db}, got {measured}");
        }
    }

    #[test]
    fn test_peaking_unity_at_zero_gain() {
        let coeffs = BiquadCoefficients::from_raw(peaking_eq_coefficients(1000.0, 1.0, 0.0, SR));
        for f in [20.0, 1000.0, 15000.0] {
            assert!((coeffs.magnitude_at(f, SR) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_low_shelf_plateaus() {
        let coeffs = BiquadCoefficients::from_raw(low_shelf_coefficients(75.5, 1.0, -2.3, SR));
        assert!((db(coeffs.magnitude_at(2.0, SR)) + 2.3).abs() < 0.05);
        assert!(db(coeffs.magnitude_at(10000.0, SR)).abs() < 0.05);
    }

    #[test]
    fn test_high_shelf_plateaus() {
        let coeffs = BiquadCoefficients::from_raw(high_shelf_coefficients(3000.0, 0.707, 4.0, SR));
        assert!(db(coeffs.magnitude_at(20.0, SR)).abs() < 0.05);
        assert!((db(coeffs.magnitude_at(20000.0, SR)) - 4.0).abs() < 0.2);
    }

    #[test]
    fn test_degenerate_frequency_stays_finite() {
        for f in [0.0, -10.0, 1.0e9] {
            assert!(BiquadCoefficients::from_raw(lowpass_coefficients(f, 0.707, SR)).is_finite());
            assert!(BiquadCoefficients::from_raw(highpass_coefficients(f, 0.707, SR)).is_finite());
            assert!(
                BiquadCoefficients::from_raw(low_shelf_coefficients(f, 1.0, 3.0, SR)).is_finite()
            );
        }
    }
}
