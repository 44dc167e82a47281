//! Offline audio I/O for the tapesat pipeline.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] move whole files in and
//!   out of channel-major [`AudioBuffer`](tapesat_core::AudioBuffer)s
//! - **Offline rendering**: [`OfflineRenderer`] drives a
//!   [`TapePipeline`](tapesat_effects::TapePipeline) over a file's worth of
//!   audio in host-sized blocks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tapesat_effects::TapePipeline;
//! use tapesat_io::{OfflineRenderer, read_wav, write_wav};
//!
//! let (input, spec) = read_wav("input.wav")?;
//!
//! let mut renderer = OfflineRenderer::new(TapePipeline::new(), 512);
//! let output = renderer.render(&input, spec.sample_rate, |_| {});
//!
//! write_wav("output.wav", &output, spec)?;
//! ```

mod render;
mod wav;

pub use render::{OfflineRenderer, RenderProgress};
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
