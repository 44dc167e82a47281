//! Tapesat Effects - Tape saturation pipeline
//!
//! This crate provides the stages of the tape pipeline, built on tapesat-core:
//!
//! - [`GainStage`] - Drive pre-gain, 0 to +12 dB with block ramping
//! - [`SaturationStage`] - 2x oversampled tanh waveshaper followed by a [`Compressor`]
//! - [`NoiseStage`] - Additive hiss shaped through the 8-band tape EQ ([`TapeEqPreset`])
//! - [`MixStage`] - Equal-power dry/wet blend
//! - [`TapePipeline`] - Fixed-order chain of the above plus the spectrum tap
//!
//! Control parameters live in a [`ParamStore`] on the control timeline; the
//! pipeline subscribes to it with [`TapePipeline::connect`].
//!
//! ## Example
//!
//! ```rust
//! use tapesat_core::{AudioBuffer, ProcessSpec};
//! use tapesat_effects::{ParamId, TapePipeline};
//!
//! let mut pipeline = TapePipeline::new();
//! pipeline.prepare(&ProcessSpec::new(44100.0, 512, 2));
//! pipeline.on_parameter_changed(ParamId::Drive, 6.0);
//! pipeline.on_parameter_changed(ParamId::Mix, 100.0);
//!
//! let mut block = AudioBuffer::new(2, 512);
//! pipeline.process_block(&mut block);
//! ```

pub mod compressor;
pub mod drive;
pub mod hiss;
pub mod mix;
pub mod params;
pub mod pipeline;
pub mod saturation;
pub mod stage;
pub mod tape_eq;

// Re-export main types at crate root
pub use compressor::{Compressor, CompressorSettings, TAPE_COMPRESSOR};
pub use drive::{GainStage, MAX_DRIVE, MAX_DRIVE_DB, drive_to_db};
pub use hiss::{HISS_CEILING_DB, HISS_FLOOR_DB, NoiseStage, TapeEqHandle, hiss_to_db};
pub use mix::MixStage;
pub use params::{
    DISPLAY_SKEW, ListenerId, ParamError, ParamId, ParamReceiver, ParamStore, ParameterSnapshot,
};
pub use pipeline::TapePipeline;
pub use saturation::{
    SATURATION_BYPASS_SENTINEL, SaturationStage, saturation_level, saturation_strength,
    tape_shaper,
};
pub use stage::Stage;
pub use tape_eq::{EqBand, TAPE_EQ_BANDS, TapeEqCoefficients, TapeEqPreset, design_tape_eq};
