//! Argument groups and helpers shared by several commands.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tapesat_config::resolve_preset;
use tapesat_core::linear_to_db;
use tapesat_effects::{ParamId, ParameterSnapshot};

/// Pipeline parameters: an optional preset plus per-parameter overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Preset to start from: factory name, user preset name, or TOML path
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Saturation, 0 to 100 %
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Drive, 0 to 10 (0 to +12 dB)
    #[arg(long)]
    pub drive: Option<f32>,

    /// Dry/wet mix, 0 to 100 %
    #[arg(long)]
    pub mix: Option<f32>,

    /// Hiss level, 0 to 100 %
    #[arg(long)]
    pub hiss: Option<f32>,
}

impl ParamArgs {
    /// Preset values (or defaults) with command-line flags applied on top.
    pub fn resolve(&self) -> anyhow::Result<ParameterSnapshot> {
        let mut snapshot = match &self.preset {
            Some(name) => resolve_preset(name)?.snapshot()?,
            None => ParameterSnapshot::default(),
        };
        for (id, value) in self.overrides() {
            snapshot.set(id, value);
        }
        Ok(snapshot)
    }

    fn overrides(&self) -> impl Iterator<Item = (ParamId, f32)> {
        [
            (ParamId::Saturation, self.saturation),
            (ParamId::Drive, self.drive),
            (ParamId::Mix, self.mix),
            (ParamId::Hiss, self.hiss),
        ]
        .into_iter()
        .filter_map(|(id, value)| value.map(|v| (id, v)))
    }
}

/// One-line summary of a parameter snapshot.
pub fn describe(snapshot: &ParameterSnapshot) -> String {
    snapshot
        .iter()
        .map(|(id, value)| format!("{}={value:.1}{}", id, id.descriptor().unit.suffix()))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Progress bar in the CLI's house style.
pub fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

/// RMS and peak of every channel together, in dB.
pub fn levels_db<'a>(channels: impl Iterator<Item = &'a [f32]>) -> (f32, f32) {
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    let mut peak = 0.0_f32;
    for channel in channels {
        for &s in channel {
            sum += f64::from(s * s);
            peak = peak.max(s.abs());
        }
        count += channel.len();
    }
    let rms = if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt() as f32
    };
    (linear_to_db(rms), linear_to_db(peak))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = ParamArgs {
            drive: Some(4.0),
            mix: Some(250.0),
            ..ParamArgs::default()
        };
        let snapshot = args.resolve().unwrap();
        assert_eq!(snapshot.drive, 4.0);
        assert_eq!(snapshot.mix, 100.0);
        assert_eq!(snapshot.saturation, 0.0);
    }

    #[test]
    fn flags_override_preset() {
        let args = ParamArgs {
            preset: Some("warm".into()),
            hiss: Some(0.0),
            ..ParamArgs::default()
        };
        let snapshot = args.resolve().unwrap();
        assert_eq!(snapshot.saturation, 35.0);
        assert_eq!(snapshot.hiss, 0.0);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let args = ParamArgs {
            preset: Some("no-such-preset-anywhere".into()),
            ..ParamArgs::default()
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn levels_of_full_scale_square() {
        let (rms_db, peak_db) = levels_db([[1.0_f32, -1.0, 1.0, -1.0].as_slice()].into_iter());
        assert!(rms_db.abs() < 1e-4);
        assert!(peak_db.abs() < 1e-4);
    }

    #[test]
    fn silence_sits_at_the_floor() {
        let (rms_db, peak_db) = levels_db(std::iter::empty());
        assert!(rms_db < -190.0);
        assert!(peak_db < -190.0);
    }
}
