//! Tapesat Core - DSP primitives for the tape saturation pipeline
//!
//! This crate provides the building blocks every pipeline stage is made of,
//! designed for real-time block processing with zero allocation once a
//! [`ProcessSpec`] has been applied.
//!
//! # Core Abstractions
//!
//! ## Block Processing
//!
//! - [`ProcessSpec`] - Sample rate, maximum block size and channel count
//! - [`AudioBuffer`] - Channel-major sample block that resizes without reallocating
//! - [`Processor`] - Prepare / process / reset / latency contract shared by all stages
//!
//! ## Gain Ramping
//!
//! - [`RampedGain`] - Previous/current gain pair, linearly interpolated across a block
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR section (Direct Form I)
//! - [`BiquadCoefficients`] - Normalized coefficient set that can be shared between channels
//! - Coefficient builders: [`highpass_coefficients`], [`lowpass_coefficients`],
//!   [`low_shelf_coefficients`], [`high_shelf_coefficients`], [`peaking_eq_coefficients`]
//!
//! ## Anti-Aliasing
//!
//! - [`HalfBandOversampler`] - 2x polyphase allpass IIR up/down sampler
//! - [`half_band_coefficients`] - Pure coefficient design for the allpass pairs
//!
//! ## Dynamics
//!
//! - [`EnvelopeFollower`] - Per-channel peak ballistics with attack/release
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`map_range`], [`equal_power_gains`]
//! - Parameter metadata: [`ParamDescriptor`], [`ParamScale`]
//!
//! # no_std Support
//!
//! The crate builds without `std` (it needs `alloc` for block buffers):
//!
//! ```toml
//! [dependencies]
//! tapesat-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use tapesat_core::{AudioBuffer, RampedGain};
//!
//! let mut block = AudioBuffer::new(2, 64);
//! block.channel_mut(0).fill(1.0);
//!
//! let mut gain = RampedGain::new(1.0);
//! gain.set_target(0.5);
//! gain.apply(&mut block);
//!
//! assert_eq!(block.channel(0)[0], 1.0);
//! assert!(!gain.is_ramping());
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations or locks in block processing paths
//! - **Sample-accurate**: Gain changes ramp across exactly one block
//! - **Pure coefficient math**: Filter design is free functions of preset + sample rate

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod buffer;
pub mod envelope;
pub mod math;
pub mod oversample;
pub mod param;
pub mod param_info;
pub mod processor;

// Re-export main types at crate root
pub use biquad::{
    Biquad, BiquadCoefficients, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, lowpass_coefficients, peaking_eq_coefficients,
};
pub use buffer::AudioBuffer;
pub use envelope::EnvelopeFollower;
pub use math::{db_to_linear, equal_power_gains, flush_denormal, linear_to_db, map_range};
pub use oversample::{
    DEFAULT_HALF_BAND_COEFS, DEFAULT_TRANSITION_BAND, HalfBandOversampler, OVERSAMPLE_FACTOR,
    half_band_coefficients, half_band_latency,
};
pub use param::RampedGain;
pub use param_info::{ParamDescriptor, ParamScale, ParamUnit};
pub use processor::{ProcessSpec, Processor};
