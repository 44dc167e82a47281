//! Parameter metadata: ranges, defaults and display normalization.
//!
//! A [`ParamDescriptor`] is everything a control surface needs to present a
//! parameter: its plain-value range, default, unit, and the curve used to map
//! between plain values and the normalized \[0.0, 1.0\] position of a knob.
//!
//! The curve is display-only. Processing code always works with clamped plain
//! values; the skew never leaks into gain or filter math.

/// Scaling curve for parameter normalization.
///
/// # Normalization Formulas
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
///
/// A host "skew factor" `s` (normalized = linear^s) corresponds to
/// `Power(1.0 / s)`; see [`ParamScale::skew`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Equal resolution across the range.
    #[default]
    Linear,
    /// Power curve. `exp > 1.0` gives more knob travel to the low end.
    Power(f32),
}

impl ParamScale {
    /// Builds a power curve from a skew factor (`normalized = linear^skew`).
    ///
    /// Non-positive skews fall back to [`Linear`](Self::Linear).
    pub fn skew(skew: f32) -> Self {
        if skew <= 0.0 || skew == 1.0 {
            Self::Linear
        } else {
            Self::Power(1.0 / skew)
        }
    }
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Percentage (%).
    Percent,
    /// No unit.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use tapesat_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Percent.suffix(), "%");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Percent => "%",
            ParamUnit::None => "",
        }
    }
}

/// Describes one named float parameter.
///
/// # Example
///
/// ```rust
/// use tapesat_core::{ParamDescriptor, ParamScale, ParamUnit};
///
/// let mix = ParamDescriptor::new("Mix", ParamUnit::Percent, 0.0, 100.0, 0.0)
///     .with_scale(ParamScale::skew(0.25));
///
/// assert_eq!(mix.clamp(140.0), 100.0);
/// assert_eq!(mix.normalize(100.0), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Parameter name, also its stable key in presets and notifications.
    pub name: &'static str,
    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Value on initialization.
    pub default: f32,
    /// Recommended step increment for encoder-based control.
    pub step: f32,
    /// Normalization curve for display.
    pub scale: ParamScale,
}

impl ParamDescriptor {
    /// Creates a linear descriptor with a step of `1.0`.
    pub const fn new(name: &'static str, unit: ParamUnit, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            unit,
            min,
            max,
            default,
            step: 1.0,
            scale: ParamScale::Linear,
        }
    }

    /// Sets the display curve.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the encoder step.
    pub const fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Clamps a value to the declared range.
    ///
    /// NaN clamps to the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Converts a plain value to the normalized range (0.0 to 1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        let linear = ((self.clamp(value) - self.min) / range).clamp(0.0, 1.0);
        match self.scale {
            ParamScale::Linear => linear,
            ParamScale::Power(exp) => libm::powf(linear, 1.0 / exp),
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the plain range.
    ///
    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);
        let curved = match self.scale {
            ParamScale::Linear => normalized,
            ParamScale::Power(exp) => libm::powf(normalized, exp),
        };
        self.min + curved * (self.max - self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_nan_and_bounds() {
        let desc = ParamDescriptor::new("Drive", ParamUnit::None, 0.0, 10.0, 1.0);
        assert_eq!(desc.clamp(-1.0), 0.0);
        assert_eq!(desc.clamp(11.0), 10.0);
        assert_eq!(desc.clamp(f32::NAN), 1.0);
        assert_eq!(desc.clamp(4.5), 4.5);
    }

    #[test]
    fn skew_quarter_favours_low_end() {
        let desc = ParamDescriptor::new("Hiss", ParamUnit::Percent, 0.0, 100.0, 0.0)
            .with_scale(ParamScale::skew(0.25));
        // 1% of the range sits at 1/sqrt(10) of the knob travel
        assert!((desc.normalize(1.0) - 0.316_227_8).abs() < 1e-4);
        assert!((desc.denormalize(0.5) - 6.25).abs() < 1e-3);
    }

    #[test]
    fn normalize_roundtrip() {
        let desc = ParamDescriptor::new("Saturation", ParamUnit::Percent, 0.0, 100.0, 0.0)
            .with_scale(ParamScale::skew(0.25));
        for v in [0.0, 3.0, 25.0, 77.0, 100.0] {
            let back = desc.denormalize(desc.normalize(v));
            assert!((back - v).abs() < 1e-3, "{v} -> {back}");
        }
    }

    #[test]
    fn unit_skew_is_linear() {
        assert_eq!(ParamScale::skew(1.0), ParamScale::Linear);
        assert_eq!(ParamScale::skew(0.0), ParamScale::Linear);
        assert_eq!(ParamScale::skew(0.5), ParamScale::Power(2.0));
    }
}
