//! Tape-machine frequency response as a fixed 8-band biquad chain.
//!
//! Band order is fixed:
//!
//! ```text
//! low cut (HP) → low shelf → peak 1 → peak 2 → peak 3 → peak 4 → high shelf → high cut (LP)
//! ```
//!
//! Coefficients are a pure function of a [`TapeEqPreset`] and the sample rate;
//! [`design_tape_eq`] owns no state and is called only at prepare time.

use core::f32::consts::FRAC_1_SQRT_2;

use tapesat_core::{
    BiquadCoefficients, high_shelf_coefficients, highpass_coefficients, low_shelf_coefficients,
    lowpass_coefficients, peaking_eq_coefficients,
};

/// Number of filter stages in the chain.
pub const TAPE_EQ_BANDS: usize = 8;

/// Frequency, Q and gain for one band.
///
/// A band with a non-positive frequency is disabled and becomes an identity
/// stage. `gain_db` is ignored by the pass filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    /// Corner or center frequency in Hz.
    pub frequency: f32,
    /// Quality factor.
    pub q: f32,
    /// Boost/cut in dB.
    pub gain_db: f32,
}

impl EqBand {
    /// Creates a band.
    pub const fn new(frequency: f32, q: f32, gain_db: f32) -> Self {
        Self {
            frequency,
            q,
            gain_db,
        }
    }

    /// A disabled band.
    pub const OFF: Self = Self::new(0.0, FRAC_1_SQRT_2, 0.0);

    /// Returns true if the band contributes to the response.
    pub fn is_enabled(&self) -> bool {
        self.frequency > 0.0 && self.frequency.is_finite()
    }
}

/// Physical-model preset: one entry per stage of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeEqPreset {
    /// Low-cut high-pass.
    pub low_cut: EqBand,
    /// Low shelf.
    pub low_shelf: EqBand,
    /// Four peaking bands, low to high.
    pub peaks: [EqBand; 4],
    /// High shelf.
    pub high_shelf: EqBand,
    /// High-cut low-pass.
    pub high_cut: EqBand,
}

impl TapeEqPreset {
    /// Ampex ATR-102, half-inch two-track at 30 IPS.
    ///
    /// High shelf and high cut are disabled in this model.
    pub const fn atr102() -> Self {
        Self {
            low_cut: EqBand::new(30.0, FRAC_1_SQRT_2, 0.0),
            low_shelf: EqBand::new(75.5, 1.0, -2.3),
            peaks: [
                EqBand::new(50.0, 3.6, -3.2),
                EqBand::new(85.0, 3.2, 2.0),
                EqBand::new(250.0, 2.0, -1.7),
                EqBand::new(5000.0, 1.8, -0.5),
            ],
            high_shelf: EqBand::new(0.0, 1.3, 0.0),
            high_cut: EqBand::OFF,
        }
    }

    /// A preset with every band disabled.
    pub const fn flat() -> Self {
        Self {
            low_cut: EqBand::OFF,
            low_shelf: EqBand::OFF,
            peaks: [EqBand::OFF; 4],
            high_shelf: EqBand::OFF,
            high_cut: EqBand::OFF,
        }
    }
}

impl Default for TapeEqPreset {
    fn default() -> Self {
        Self::atr102()
    }
}

/// Coefficients for the whole chain at one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeEqCoefficients {
    /// Stage coefficients in processing order.
    pub bands: [BiquadCoefficients; TAPE_EQ_BANDS],
}

impl TapeEqCoefficients {
    /// All stages pass the signal unchanged.
    pub const IDENTITY: Self = Self {
        bands: [BiquadCoefficients::IDENTITY; TAPE_EQ_BANDS],
    };

    /// Combined magnitude of the chain at `frequency`.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        self.bands
            .iter()
            .map(|c| c.magnitude_at(frequency, sample_rate))
            .product()
    }
}

impl Default for TapeEqCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn design_band(
    band: &EqBand,
    sample_rate: f32,
    build: impl FnOnce(&EqBand, f32) -> tapesat_core::biquad::RawCoefficients,
) -> BiquadCoefficients {
    if band.is_enabled() && sample_rate > 0.0 {
        BiquadCoefficients::from_raw(build(band, sample_rate))
    } else {
        BiquadCoefficients::IDENTITY
    }
}

/// Computes the chain coefficients for `preset` at `sample_rate`.
pub fn design_tape_eq(preset: &TapeEqPreset, sample_rate: f64) -> TapeEqCoefficients {
    let sr = sample_rate as f32;
    let peak = |b: &EqBand, sr| peaking_eq_coefficients(b.frequency, b.q, b.gain_db, sr);

    TapeEqCoefficients {
        bands: [
            design_band(&preset.low_cut, sr, |b, sr| {
                highpass_coefficients(b.frequency, b.q, sr)
            }),
            design_band(&preset.low_shelf, sr, |b, sr| {
                low_shelf_coefficients(b.frequency, b.q, b.gain_db, sr)
            }),
            design_band(&preset.peaks[0], sr, peak),
            design_band(&preset.peaks[1], sr, peak),
            design_band(&preset.peaks[2], sr, peak),
            design_band(&preset.peaks[3], sr, peak),
            design_band(&preset.high_shelf, sr, |b, sr| {
                high_shelf_coefficients(b.frequency, b.q, b.gain_db, sr)
            }),
            design_band(&preset.high_cut, sr, |b, sr| {
                lowpass_coefficients(b.frequency, b.q, sr)
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapesat_core::linear_to_db;

    fn response_db(coefs: &TapeEqCoefficients, freq: f32) -> f32 {
        linear_to_db(coefs.magnitude_at(freq, 48000.0))
    }

    #[test]
    fn disabled_bands_are_identity() {
        let coefs = design_tape_eq(&TapeEqPreset::atr102(), 48000.0);
        assert_eq!(coefs.bands[6], BiquadCoefficients::IDENTITY);
        assert_eq!(coefs.bands[7], BiquadCoefficients::IDENTITY);
        assert_ne!(coefs.bands[0], BiquadCoefficients::IDENTITY);
    }

    #[test]
    fn flat_preset_is_flat() {
        let coefs = design_tape_eq(&TapeEqPreset::flat(), 44100.0);
        assert_eq!(coefs, TapeEqCoefficients::IDENTITY);
    }

    #[test]
    fn atr102_shape() {
        let coefs = design_tape_eq(&TapeEqPreset::atr102(), 48000.0);

        // Rumble is removed by the low cut
        assert!(response_db(&coefs, 10.0) < -12.0);
        // Head bump
        assert!(response_db(&coefs, 85.0) > response_db(&coefs, 50.0));
        // Mid band stays close to flat
        assert!(response_db(&coefs, 1000.0).abs() < 0.5);
        assert!(response_db(&coefs, 15000.0).abs() < 0.5);
    }

    #[test]
    fn all_coefficients_finite_at_common_rates() {
        for &sr in &[22050.0, 44100.0, 48000.0, 96000.0, 192000.0] {
            let coefs = design_tape_eq(&TapeEqPreset::atr102(), sr);
            assert!(coefs.bands.iter().all(BiquadCoefficients::is_finite), "{sr}");
        }
    }

    #[test]
    fn zero_sample_rate_gives_identity() {
        let coefs = design_tape_eq(&TapeEqPreset::atr102(), 0.0);
        assert_eq!(coefs, TapeEqCoefficients::IDENTITY);
    }
}
