//! Tapesat Analysis - Spectrum display feed
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`scope`] - Audio-side [`SpectrumTap`] and UI-side [`SpectrumAnalyzer`]
//!
//! ## Example
//!
//! ```rust
//! use tapesat_analysis::{FFT_SIZE, spectrum_feed};
//!
//! let (mut tap, mut analyzer) = spectrum_feed(2);
//!
//! // Audio thread
//! for i in 0..FFT_SIZE {
//!     let s = (i as f32 * 0.05).sin();
//!     tap.push_sample(0, s);
//!     tap.push_sample(1, s);
//! }
//!
//! // UI thread, at the redraw cadence
//! assert_eq!(analyzer.process_fft(), 2);
//! assert_eq!(analyzer.scope_data(0).len(), 2048);
//! ```

pub mod fft;
pub mod scope;

pub use fft::{Fft, FftScratch, Window, gain_to_db};
pub use scope::{
    FFT_ORDER, FFT_SIZE, MAX_DB, MIN_DB, NEIGHBORHOOD, REDRAW_HZ, SCOPE_CHANNELS, SCOPE_SIZE,
    SKEW, SMOOTHING, SpectrumAnalyzer, SpectrumTap, center_bin, display_level, skewed_proportion,
    spectrum_feed,
};
