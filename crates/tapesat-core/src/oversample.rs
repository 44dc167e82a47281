//! 2x polyphase half-band IIR oversampling.
//!
//! Nonlinear stages generate harmonics that can exceed Nyquist and alias
//! back into the audible range. Running the nonlinearity at twice the sample
//! rate keeps the first octave of new harmonics representable, and the
//! half-band decimator removes them before returning to the base rate.
//!
//! ## Structure
//!
//! The half-band filter is split into two parallel chains of first-order
//! allpass sections (in `z^-2`), one per polyphase branch:
//!
//! ```text
//!                ┌─ A0(z²) ─ even output ─┐
//! x[n] ──────────┤                        ├── interleave → 2x stream
//!                └─ A1(z²) ─ odd output ──┘
//! ```
//!
//! Each section computes `y = c * (x - y[n-1]) + x[n-1]`. Even coefficient
//! indices feed branch 0 and odd indices feed branch 1. Decimation runs the
//! same two chains on the odd/even phases of the 2x stream and averages them.
//!
//! Compared to an FIR half-band of similar rejection this costs a fraction of
//! the multiplies, at the price of a frequency-dependent (non-linear) phase.
//!
//! ## Coefficient design
//!
//! [`half_band_coefficients`] derives the allpass coefficients from the
//! number of sections and the normalized transition bandwidth using the
//! elliptic-function design for half-band filters. More sections or a wider
//! transition band both raise stopband rejection.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use core::f64::consts::PI;

use crate::AudioBuffer;

/// Oversampling factor used by the saturation stage.
pub const OVERSAMPLE_FACTOR: usize = 2;

/// Number of allpass sections in the default design.
pub const DEFAULT_HALF_BAND_COEFS: usize = 8;

/// Default transition bandwidth, relative to the base sample rate.
///
/// The passband extends to `(0.5 - transition) * fs`.
pub const DEFAULT_TRANSITION_BAND: f64 = 0.06;

/// Series terms below this magnitude end the theta-function sums.
const SERIES_EPSILON: f64 = 1e-100;

/// Designs `N` allpass coefficients for a half-band filter.
///
/// `transition` is the normalized transition bandwidth in `(0, 0.5)`; values
/// outside are clamped. The result is strictly increasing and within `(0, 1)`.
///
/// # Example
///
/// ```rust
/// use tapesat_core::half_band_coefficients;
///
/// let coefs = half_band_coefficients::<8>(0.06);
/// assert!(coefs.windows(2).all(|w| w[0] < w[1]));
/// ```
pub fn half_band_coefficients<const N: usize>(transition: f64) -> [f64; N] {
    let transition = transition.clamp(1e-4, 0.5 - 1e-4);
    let (k, q) = transition_param(transition);
    let order = (N * 2 + 1) as f64;

    let mut coefs = [0.0; N];
    for (index, coef) in coefs.iter_mut().enumerate() {
        *coef = coefficient(index, k, q, order);
    }
    coefs
}

/// Group delay at DC of a 2x up/down round trip, in base-rate samples.
///
/// Each first-order allpass section in `z^-1` (base rate) with coefficient
/// `c` delays DC by `(1 - c) / (1 + c)` samples.
pub fn half_band_latency(coefs: &[f64]) -> f64 {
    coefs.iter().map(|&c| (1.0 - c) / (1.0 + c)).sum()
}

fn transition_param(transition: f64) -> (f64, f64) {
    let mut k = libm::tan((1.0 - transition * 2.0) * PI / 4.0);
    k *= k;
    let kksqrt = libm::pow(1.0 - k * k, 0.25);
    let e = 0.5 * (1.0 - kksqrt) / (1.0 + kksqrt);
    let e2 = e * e;
    let e4 = e2 * e2;
    let q = e * (1.0 + e4 * (2.0 + e4 * (15.0 + 150.0 * e4)));
    (k, q)
}

fn coefficient(index: usize, k: f64, q: f64, order: f64) -> f64 {
    let c = (index + 1) as f64;
    let num = numerator_sum(q, order, c) * libm::pow(q, 0.25);
    let den = denominator_sum(q, order, c) + 0.5;
    let ww = num / den;
    let wwsq = ww * ww;

    let x = libm::sqrt((1.0 - wwsq * k) * (1.0 - wwsq / k)) / (1.0 + wwsq);
    (1.0 - x) / (1.0 + x)
}

fn numerator_sum(q: f64, order: f64, c: f64) -> f64 {
    let mut acc = 0.0;
    let mut sign = 1.0;
    for i in 0..512_i32 {
        let term = libm::pow(q, f64::from(i * (i + 1)))
            * libm::sin(f64::from(i * 2 + 1) * c * PI / order)
            * sign;
        acc += term;
        sign = -sign;
        if term.abs() <= SERIES_EPSILON {
            break;
        }
    }
    acc
}

fn denominator_sum(q: f64, order: f64, c: f64) -> f64 {
    let mut acc = 0.0;
    let mut sign = -1.0;
    for i in 1..512_i32 {
        let term = libm::pow(q, f64::from(i * i)) * libm::cos(f64::from(i * 2) * c * PI / order) * sign;
        acc += term;
        sign = -sign;
        if term.abs() <= SERIES_EPSILON {
            break;
        }
    }
    acc
}

/// Filter memory for both polyphase branches of one channel.
#[derive(Debug, Clone, Copy)]
struct AllpassPair<const N: usize> {
    x: [f32; N],
    y: [f32; N],
}

impl<const N: usize> AllpassPair<N> {
    const ZERO: Self = Self {
        x: [0.0; N],
        y: [0.0; N],
    };

    /// Runs one sample through each branch.
    #[inline]
    fn process(&mut self, coefs: &[f32; N], mut branch0: f32, mut branch1: f32) -> (f32, f32) {
        for i in 0..N {
            let input = if i % 2 == 0 { branch0 } else { branch1 };
            let output = crate::flush_denormal((input - self.y[i]) * coefs[i] + self.x[i]);
            self.x[i] = input;
            self.y[i] = output;
            if i % 2 == 0 {
                branch0 = output;
            } else {
                branch1 = output;
            }
        }
        (branch0, branch1)
    }
}

/// Multi-channel 2x half-band oversampler.
///
/// Owns the oversampled scratch block so the upsample → process → downsample
/// cycle never allocates once [`prepare`](Self::prepare) has run.
///
/// # Example
///
/// ```rust
/// use tapesat_core::{AudioBuffer, HalfBandOversampler};
///
/// let mut os = HalfBandOversampler::<8>::default();
/// os.prepare(2, 256);
///
/// let mut block = AudioBuffer::new(2, 256);
/// os.process_with(&mut block, |up| {
///     assert_eq!(up.num_samples(), 512);
/// });
/// assert!(os.latency_samples() > 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct HalfBandOversampler<const N: usize = DEFAULT_HALF_BAND_COEFS> {
    coefs: [f32; N],
    latency: f32,
    up: Vec<AllpassPair<N>>,
    down: Vec<AllpassPair<N>>,
    buffer: AudioBuffer,
    prepared: bool,
}

impl<const N: usize> HalfBandOversampler<N> {
    /// Creates an unprepared oversampler for the given transition bandwidth.
    pub fn new(transition: f64) -> Self {
        let design = half_band_coefficients::<N>(transition);
        let mut coefs = [0.0_f32; N];
        for (dst, src) in coefs.iter_mut().zip(design.iter()) {
            *dst = *src as f32;
        }

        Self {
            coefs,
            latency: half_band_latency(&design) as f32,
            up: Vec::new(),
            down: Vec::new(),
            buffer: AudioBuffer::default(),
            prepared: false,
        }
    }

    /// Allocates filter state and the 2x scratch block.
    pub fn prepare(&mut self, num_channels: usize, max_block: usize) {
        self.up.clear();
        self.up.resize(num_channels, AllpassPair::ZERO);
        self.down.clear();
        self.down.resize(num_channels, AllpassPair::ZERO);
        self.buffer.allocate(num_channels, max_block * OVERSAMPLE_FACTOR);
        self.prepared = true;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "oversampler_prepare: {num_channels} ch, {max_block} max block, latency {:.3}",
            self.latency
        );
    }

    /// Returns true once [`prepare`](Self::prepare) has run.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Clears filter memories.
    pub fn reset(&mut self) {
        self.up.fill(AllpassPair::ZERO);
        self.down.fill(AllpassPair::ZERO);
        self.buffer.clear();
    }

    /// Allpass coefficients in use.
    pub fn coefficients(&self) -> &[f32; N] {
        &self.coefs
    }

    /// Round-trip group delay in base-rate samples, `0.0` until prepared.
    pub fn latency_samples(&self) -> f32 {
        if self.prepared { self.latency } else { 0.0 }
    }

    /// Largest base-rate block the scratch buffer holds.
    pub fn max_block(&self) -> usize {
        self.buffer.capacity() / OVERSAMPLE_FACTOR
    }

    /// Upsamples `input` into the internal 2x block and returns it.
    ///
    /// Channels beyond the prepared count and samples beyond the prepared
    /// block size are ignored.
    pub fn process_up(&mut self, input: &AudioBuffer) -> &mut AudioBuffer {
        let channels = input.num_channels().min(self.up.len());
        let samples = input.num_samples().min(self.max_block());
        self.buffer.set_size(channels, samples * OVERSAMPLE_FACTOR);

        for ch in 0..channels {
            let state = &mut self.up[ch];
            let src = &input.channel(ch)[..samples];
            let dst = self.buffer.channel_mut(ch);
            for (pair, &x) in dst.chunks_exact_mut(OVERSAMPLE_FACTOR).zip(src) {
                let (even, odd) = state.process(&self.coefs, x, x);
                pair[0] = even;
                pair[1] = odd;
            }
        }

        &mut self.buffer
    }

    /// Downsamples the internal 2x block into `output`.
    pub fn process_down(&mut self, output: &mut AudioBuffer) {
        let channels = output.num_channels().min(self.buffer.num_channels());
        for ch in 0..channels {
            let state = &mut self.down[ch];
            let src = self.buffer.channel(ch);
            let dst = output.channel_mut(ch);
            for (y, pair) in dst.iter_mut().zip(src.chunks_exact(OVERSAMPLE_FACTOR)) {
                let (a, b) = state.process(&self.coefs, pair[1], pair[0]);
                *y = 0.5 * (a + b);
            }
        }
    }

    /// Upsamples `block`, lets `f` process the 2x block, then downsamples
    /// back into `block`.
    pub fn process_with<F>(&mut self, block: &mut AudioBuffer, f: F)
    where
        F: FnOnce(&mut AudioBuffer),
    {
        f(self.process_up(block));
        self.process_down(block);
    }
}

impl<const N: usize> Default for HalfBandOversampler<N> {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION_BAND)
    }
}
