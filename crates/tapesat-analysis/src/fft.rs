//! FFT wrapper with windowing functions

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hann window (raised cosine)
    Hann,
}

impl Window {
    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                    *sample *= w;
                }
            }
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// Forward FFT producing unnormalized magnitudes.
///
/// Scratch space is owned by the caller through [`FftScratch`], so repeated
/// transforms of the same size do not allocate.
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of non-negative frequency bins, `size / 2 + 1`.
    pub fn num_bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Allocates scratch buffers sized for this transform.
    pub fn make_scratch(&self) -> FftScratch {
        FftScratch {
            buffer: vec![Complex::new(0.0, 0.0); self.size],
            scratch: vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()],
        }
    }

    /// Writes `|X[k]|` for `k = 0..=size/2` into `magnitudes`.
    ///
    /// `input` is zero-padded or truncated to the FFT size. `magnitudes`
    /// receives at most `num_bins()` values.
    pub fn magnitudes_into(&self, input: &[f32], scratch: &mut FftScratch, magnitudes: &mut [f32]) {
        let FftScratch { buffer, scratch } = scratch;
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = Complex::new(input.get(i).copied().unwrap_or(0.0), 0.0);
        }

        self.fft.process_with_scratch(buffer, scratch);

        for (m, c) in magnitudes.iter_mut().zip(buffer.iter().take(self.num_bins())) {
            *m = c.norm();
        }
    }
}

impl std::fmt::Debug for Fft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("size", &self.size).finish()
    }
}

/// Reusable working memory for [`Fft::magnitudes_into`].
#[derive(Debug, Clone)]
pub struct FftScratch {
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

/// Linear gain to dB, with non-positive gains mapped to `floor_db`.
pub fn gain_to_db(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 {
        (20.0 * gain.log10()).max(floor_db)
    } else {
        floor_db
    }
}
