//! Mathematical utility functions for DSP.
//!
//! Provides the level conversions and control-value mappings the pipeline
//! stages share. All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Control Mappings
//!
//! - [`map_range`] - Linear remap from one interval to another
//! - [`equal_power_gains`] - Dry/wet gain pair for a constant-power crossfade
//!
//! # Numerics
//!
//! - [`flush_denormal`] - Zero out values heading into the subnormal range

use core::f32::consts::FRAC_PI_2;
use libm::{cosf, expf, logf, sinf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use tapesat_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Input is floored at `1e-10` (-200 dB) so silence maps to a finite value.
///
/// # Example
/// ```rust
/// use tapesat_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Linearly remap `value` from `[source_min, source_max]` to
/// `[target_min, target_max]`.
///
/// No clamping is applied. A degenerate source interval maps everything to
/// `target_min`.
///
/// # Example
/// ```rust
/// use tapesat_core::map_range;
///
/// assert_eq!(map_range(50.0, 0.0, 100.0, -60.0, -12.0), -36.0);
/// ```
#[inline]
pub fn map_range(
    value: f32,
    source_min: f32,
    source_max: f32,
    target_min: f32,
    target_max: f32,
) -> f32 {
    let span = source_max - source_min;
    if span.abs() < f32::EPSILON {
        return target_min;
    }
    target_min + (target_max - target_min) * (value - source_min) / span
}

/// Dry and wet gains for an equal-power crossfade.
///
/// `mix` is the wet proportion in \[0.0, 1.0\] (clamped). The squares of the
/// returned gains always sum to one, so the midpoint sits at -3.01 dB on
/// each side instead of the -6 dB dip of a linear blend. The endpoints are
/// exact: `mix = 0` gives `(1.0, 0.0)` and `mix = 1` gives `(0.0, 1.0)`.
///
/// # Returns
/// `(dry_gain, wet_gain)`
#[inline]
pub fn equal_power_gains(mix: f32) -> (f32, f32) {
    let mix = mix.clamp(0.0, 1.0);
    if mix <= 0.0 {
        return (1.0, 0.0);
    }
    if mix >= 1.0 {
        return (0.0, 1.0);
    }
    let angle = mix * FRAC_PI_2;
    (cosf(angle), sinf(angle))
}

/// Flush subnormal floats to zero.
///
/// Replaces values below 1e-20 with zero, well before the IEEE 754
/// subnormal range. Use in recursive filter state.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
