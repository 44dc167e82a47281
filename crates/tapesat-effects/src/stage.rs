//! The closed set of pipeline stages.

use tapesat_core::{AudioBuffer, ProcessSpec, Processor};

use crate::drive::GainStage;
use crate::hiss::NoiseStage;
use crate::mix::MixStage;
use crate::params::ParamId;
use crate::saturation::SaturationStage;

/// One stage of the tape pipeline.
///
/// The set is fixed, so stages are an enum rather than trait objects.
#[derive(Debug)]
pub enum Stage {
    /// Drive pre-gain.
    Gain(GainStage),
    /// Oversampled waveshaper and compressor.
    Saturation(SaturationStage),
    /// Hiss and tape EQ.
    Noise(NoiseStage),
    /// Dry/wet blend.
    Mix(MixStage),
}

impl Stage {
    /// Short name for logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Gain(_) => "gain",
            Stage::Saturation(_) => "saturation",
            Stage::Noise(_) => "noise",
            Stage::Mix(_) => "mix",
        }
    }

    /// Parameter this stage owns.
    pub fn param(&self) -> ParamId {
        match self {
            Stage::Gain(_) => ParamId::Drive,
            Stage::Saturation(_) => ParamId::Saturation,
            Stage::Noise(_) => ParamId::Hiss,
            Stage::Mix(_) => ParamId::Mix,
        }
    }

    /// Sees the untouched input before any stage processes the block.
    pub fn pre_process(&mut self, input: &AudioBuffer) {
        if let Stage::Mix(mix) = self {
            mix.capture_dry(input);
        }
    }

    /// Applies a (clamped) parameter change if this stage owns `id`.
    ///
    /// Returns `true` if the change was consumed.
    pub fn on_parameter_changed(&mut self, id: ParamId, value: f32) -> bool {
        if id != self.param() {
            return false;
        }
        let value = id.clamp(value);
        match self {
            Stage::Gain(s) => s.set_drive(value),
            Stage::Saturation(s) => s.set_saturation(value),
            Stage::Noise(s) => s.set_hiss_level(value),
            Stage::Mix(s) => s.set_mix(value),
        }
        true
    }
}

impl Processor for Stage {
    fn prepare(&mut self, spec: &ProcessSpec) {
        match self {
            Stage::Gain(s) => s.prepare(spec),
            Stage::Saturation(s) => s.prepare(spec),
            Stage::Noise(s) => s.prepare(spec),
            Stage::Mix(s) => s.prepare(spec),
        }
    }

    fn process(&mut self, block: &mut AudioBuffer) {
        match self {
            Stage::Gain(s) => s.process(block),
            Stage::Saturation(s) => s.process(block),
            Stage::Noise(s) => s.process(block),
            Stage::Mix(s) => s.process(block),
        }
    }

    fn reset(&mut self) {
        match self {
            Stage::Gain(s) => s.reset(),
            Stage::Saturation(s) => s.reset(),
            Stage::Noise(s) => s.reset(),
            Stage::Mix(s) => s.reset(),
        }
    }

    fn latency_samples(&self) -> f32 {
        match self {
            Stage::Gain(s) => s.latency_samples(),
            Stage::Saturation(s) => s.latency_samples(),
            Stage::Noise(s) => s.latency_samples(),
            Stage::Mix(s) => s.latency_samples(),
        }
    }
}

impl From<GainStage> for Stage {
    fn from(stage: GainStage) -> Self {
        Stage::Gain(stage)
    }
}

impl From<SaturationStage> for Stage {
    fn from(stage: SaturationStage) -> Self {
        Stage::Saturation(stage)
    }
}

impl From<NoiseStage> for Stage {
    fn from(stage: NoiseStage) -> Self {
        Stage::Noise(stage)
    }
}

impl From<MixStage> for Stage {
    fn from(stage: MixStage) -> Self {
        Stage::Mix(stage)
    }
}
