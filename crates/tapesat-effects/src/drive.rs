//! Drive-dependent pre-gain.
//!
//! Maps the Drive knob (0–10) linearly onto 0 to +12 dB and applies it with a
//! one-block linear ramp whenever it changes.
//!
//! # Zero-drive sentinel
//!
//! When the cached drive is exactly `0.0` at [`prepare`](GainStage::prepare)
//! time the target gain is forced to `0.0` (silence) rather than the unity
//! gain that `set_drive(0.0)` produces. The two paths are intentionally
//! asymmetric and covered by tests; see `DESIGN.md` before changing either.

use tapesat_core::{AudioBuffer, ProcessSpec, Processor, RampedGain, db_to_linear};

/// Gain in dB at full drive.
pub const MAX_DRIVE_DB: f32 = 12.0;

/// Top of the Drive knob range.
pub const MAX_DRIVE: f32 = 10.0;

/// Maps a drive value to decibels: `12 * d / 10`.
#[inline]
pub fn drive_to_db(drive: f32) -> f32 {
    MAX_DRIVE_DB * drive.clamp(0.0, MAX_DRIVE) / MAX_DRIVE
}

/// Drive-controlled gain stage.
///
/// ## Parameters
///
/// | Name | Range | Default |
/// |------|-------|---------|
/// | Drive | 0.0–10.0 | 1.0 |
#[derive(Debug, Clone)]
pub struct GainStage {
    drive: f32,
    gain: RampedGain,
}

impl GainStage {
    /// Creates a stage at `drive` with no pending ramp.
    pub fn new(drive: f32) -> Self {
        let drive = drive.clamp(0.0, MAX_DRIVE);
        Self {
            drive,
            gain: RampedGain::new(db_to_linear(drive_to_db(drive))),
        }
    }

    /// Sets the drive; the next block ramps to the new gain.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.clamp(0.0, MAX_DRIVE);
        self.gain.set_target(db_to_linear(drive_to_db(self.drive)));
    }

    /// Cached drive value.
    pub fn drive(&self) -> f32 {
        self.drive
    }

    /// The `(previous, current)` gain pair.
    pub fn gain(&self) -> &RampedGain {
        &self.gain
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Processor for GainStage {
    fn prepare(&mut self, _spec: &ProcessSpec) {
        self.gain.reset();
        if self.drive == 0.0 {
            self.gain.set_target(0.0);
        }
    }

    fn process(&mut self, block: &mut AudioBuffer) {
        self.gain.apply(block);
    }

    fn reset(&mut self) {
        self.gain.reset();
    }
}
