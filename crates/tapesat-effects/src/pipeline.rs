//! The fixed-order tape pipeline.
//!
//! ```text
//! Input ─┬─► Gain ─► Saturation ─► Noise ─► Mix ─► Output ─► SpectrumTap
//!        │                                   ▲
//!        └──────────── dry copy ─────────────┘
//! ```
//!
//! A block runs to completion through every stage before the next begins.
//! Parameter changes are applied between blocks, never inside one.

use tapesat_analysis::{SCOPE_CHANNELS, SpectrumAnalyzer, SpectrumTap, spectrum_feed};
use tapesat_core::{AudioBuffer, ProcessSpec, Processor};

use crate::drive::GainStage;
use crate::hiss::{NoiseStage, TapeEqHandle};
use crate::mix::MixStage;
use crate::params::{ParamId, ParamReceiver, ParamStore, ParameterSnapshot};
use crate::saturation::SaturationStage;
use crate::stage::Stage;
use crate::tape_eq::TapeEqPreset;

const NUM_STAGES: usize = 4;

/// Gain → Saturation → Noise → Mix, plus an optional spectrum tap.
///
/// # Example
///
/// ```rust
/// use tapesat_core::{AudioBuffer, ProcessSpec};
/// use tapesat_effects::{ParamId, ParamStore, TapePipeline};
///
/// let store = ParamStore::new();
/// let mut pipeline = TapePipeline::new();
/// pipeline.connect(&store);
/// pipeline.prepare(&ProcessSpec::new(48000.0, 256, 2));
///
/// store.set(ParamId::Saturation, 60.0);
///
/// let mut block = AudioBuffer::new(2, 256);
/// pipeline.process_block(&mut block);
/// assert_eq!(pipeline.parameters().saturation, 60.0);
/// ```
#[derive(Debug)]
pub struct TapePipeline {
    stages: [Stage; NUM_STAGES],
    params: ParameterSnapshot,
    spec: Option<ProcessSpec>,
    receivers: Vec<ParamReceiver>,
    spectrum: Option<SpectrumTap>,
    scratch: AudioBuffer,
}

impl TapePipeline {
    /// Creates an unprepared pipeline at the default parameter values.
    pub fn new() -> Self {
        Self::with_parameters(&ParameterSnapshot::default())
    }

    /// Creates an unprepared pipeline at `params` (clamped).
    pub fn with_parameters(params: &ParameterSnapshot) -> Self {
        let params = params.clamped();
        Self {
            stages: [
                Stage::Gain(GainStage::new(params.drive)),
                Stage::Saturation(SaturationStage::new(params.saturation)),
                Stage::Noise(NoiseStage::new(params.hiss)),
                Stage::Mix(MixStage::new(params.mix)),
            ],
            params,
            spec: None,
            receivers: Vec::new(),
            spectrum: None,
            scratch: AudioBuffer::default(),
        }
    }

    /// Replaces the noise stage's EQ preset. Takes effect at the next
    /// [`prepare`](Self::prepare).
    pub fn with_eq_preset(mut self, preset: TapeEqPreset) -> Self {
        for stage in &mut self.stages {
            if let Stage::Noise(noise) = stage {
                noise.set_preset(preset);
            }
        }
        self
    }

    /// Re-seeds the noise generator.
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        for stage in &mut self.stages {
            if let Stage::Noise(noise) = stage {
                let preset = *noise.preset();
                *noise = NoiseStage::with_seed(noise.hiss_level(), seed).with_preset(preset);
            }
        }
        self
    }

    /// Subscribes to every parameter in `store`.
    ///
    /// From the next block on, changes written to the store are picked up
    /// at block start. The store's current values apply on the first block.
    /// Reconnecting releases the previous subscriptions.
    pub fn connect(&mut self, store: &ParamStore) {
        self.receivers = ParamId::ALL.iter().map(|&id| store.connect(id)).collect();
    }

    /// Creates a spectrum feed and installs its audio side.
    ///
    /// Replaces any previously attached tap.
    pub fn attach_spectrum(&mut self) -> SpectrumAnalyzer {
        let (tap, analyzer) = spectrum_feed(SCOPE_CHANNELS);
        self.spectrum = Some(tap);
        analyzer
    }

    /// Removes the spectrum tap.
    pub fn detach_spectrum(&mut self) -> Option<SpectrumTap> {
        self.spectrum.take()
    }

    /// Prepares every stage for `spec`.
    ///
    /// A spec with a zero sample rate, block size or channel count is a
    /// precondition violation: debug builds panic, release builds leave the
    /// pipeline unprepared so that it renders silence.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        if !spec.is_valid() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "pipeline_prepare: rejected sample rate {}, block size {}, {} channels",
                spec.sample_rate,
                spec.block_size,
                spec.num_channels
            );
            debug_assert!(spec.is_valid(), "invalid ProcessSpec: {spec:?}");
            self.spec = None;
            return;
        }

        for stage in &mut self.stages {
            stage.prepare(spec);
        }
        self.scratch.allocate(spec.channels(), spec.max_block());
        self.spec = Some(*spec);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "pipeline_prepare: {} Hz, {} block, {} ch, latency {:.3}",
            spec.sample_rate,
            spec.block_size,
            spec.num_channels,
            self.latency_samples()
        );
    }

    /// Returns true once a valid spec has been applied.
    pub fn is_prepared(&self) -> bool {
        self.spec.is_some()
    }

    /// Active stream configuration.
    pub fn spec(&self) -> Option<&ProcessSpec> {
        self.spec.as_ref()
    }

    /// Routes a parameter change to the stage that owns it.
    ///
    /// Values are clamped to the parameter's range.
    pub fn on_parameter_changed(&mut self, id: ParamId, value: f32) {
        let value = id.clamp(value);
        self.params.set(id, value);
        for stage in &mut self.stages {
            if stage.on_parameter_changed(id, value) {
                break;
            }
        }
    }

    /// String-addressed [`on_parameter_changed`](Self::on_parameter_changed).
    pub fn on_parameter_changed_by_name(
        &mut self,
        name: &str,
        value: f32,
    ) -> Result<(), crate::ParamError> {
        self.on_parameter_changed(name.parse()?, value);
        Ok(())
    }

    /// Parameter values the stages currently hold.
    pub fn parameters(&self) -> &ParameterSnapshot {
        &self.params
    }

    /// Handle for publishing tape EQ coefficients from another thread.
    pub fn eq_handle(&self) -> Option<TapeEqHandle> {
        self.stages.iter().find_map(|s| match s {
            Stage::Noise(noise) => Some(noise.eq_handle()),
            _ => None,
        })
    }

    /// The stages in processing order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Processes one block in place.
    ///
    /// Blocks longer than the prepared size are split into prepared-size
    /// pieces. An unprepared pipeline outputs silence.
    pub fn process_block(&mut self, block: &mut AudioBuffer) {
        self.poll_parameters();

        let Some(spec) = self.spec else {
            block.clear();
            return;
        };

        let max_block = spec.max_block();
        if block.num_samples() <= max_block {
            self.render(block);
            return;
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        let total = block.num_samples();
        let mut start = 0;
        while start < total {
            let len = (total - start).min(max_block);
            scratch.set_size(block.num_channels(), len);
            for (dst, src) in scratch.channels_mut().zip(block.channels()) {
                dst.copy_from_slice(&src[start..start + len]);
            }
            self.render(&mut scratch);
            for (ch, src) in scratch.channels().enumerate() {
                block.channel_mut(ch)[start..start + len].copy_from_slice(src);
            }
            start += len;
        }
        self.scratch = scratch;
    }

    fn poll_parameters(&mut self) {
        for i in 0..self.receivers.len() {
            let receiver = &mut self.receivers[i];
            if let Some(value) = receiver.poll() {
                let id = receiver.id();
                self.on_parameter_changed(id, value);
            }
        }
    }

    fn render(&mut self, block: &mut AudioBuffer) {
        for stage in &mut self.stages {
            stage.pre_process(block);
        }
        for stage in &mut self.stages {
            stage.process(block);
        }
        if let Some(tap) = &mut self.spectrum {
            tap.push_block(block);
        }
    }

    /// Clears filter, envelope and ramp state in every stage.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Total group delay in samples, for host delay compensation.
    pub fn latency_samples(&self) -> f32 {
        self.stages.iter().map(Processor::latency_samples).sum()
    }

    /// Seconds of output that continue after the input stops.
    pub fn tail_seconds(&self) -> f64 {
        0.0
    }
}

impl Default for TapePipeline {
    fn default() -> Self {
        Self::new()
    }
}
