//! Equal-power dry/wet blend.
//!
//! The dry copy is taken before any other stage touches the block and lives
//! for exactly one block. Both gains ramp across a block when Mix changes.

use tapesat_core::{AudioBuffer, ProcessSpec, Processor, RampedGain, equal_power_gains};

/// Dry/wet mixer.
///
/// ## Parameters
///
/// | Name | Range | Default |
/// |------|-------|---------|
/// | Mix | 0.0–100.0 % (wet) | 0.0 |
///
/// # Example
///
/// ```rust
/// use tapesat_core::{AudioBuffer, ProcessSpec, Processor};
/// use tapesat_effects::MixStage;
///
/// let mut mix = MixStage::new(100.0);
/// mix.prepare(&ProcessSpec::new(48000.0, 4, 1));
///
/// let mut block = AudioBuffer::from_channels(&[&[1.0, 1.0, 1.0, 1.0]]);
/// mix.capture_dry(&block);
/// block.apply_gain(0.5);
/// mix.process(&mut block);
///
/// assert_eq!(block.channel(0), &[0.5, 0.5, 0.5, 0.5]);
/// ```
#[derive(Debug, Clone)]
pub struct MixStage {
    mix: f32,
    dry: AudioBuffer,
    dry_gain: RampedGain,
    wet_gain: RampedGain,
}

impl MixStage {
    /// Creates a mixer at `percentage` wet.
    pub fn new(percentage: f32) -> Self {
        let mix = percentage.clamp(0.0, 100.0) / 100.0;
        let (dry, wet) = equal_power_gains(mix);
        Self {
            mix,
            dry: AudioBuffer::default(),
            dry_gain: RampedGain::new(dry),
            wet_gain: RampedGain::new(wet),
        }
    }

    /// Sets the wet proportion as a percentage.
    pub fn set_mix(&mut self, percentage: f32) {
        self.mix = percentage.clamp(0.0, 100.0) / 100.0;
        let (dry, wet) = equal_power_gains(self.mix);
        self.dry_gain.set_target(dry);
        self.wet_gain.set_target(wet);
    }

    /// Wet proportion in [0, 1].
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Copies the untouched input.
    ///
    /// Must run before any other stage mutates the block.
    pub fn capture_dry(&mut self, input: &AudioBuffer) {
        self.dry.copy_from(input);
    }

    /// The dry copy from the current block.
    pub fn dry(&self) -> &AudioBuffer {
        &self.dry
    }

    /// The `(dry, wet)` gain pairs.
    pub fn gains(&self) -> (&RampedGain, &RampedGain) {
        (&self.dry_gain, &self.wet_gain)
    }
}

impl Default for MixStage {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Processor for MixStage {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.dry.allocate(spec.channels(), spec.max_block());
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBuffer) {
        let n = block.num_samples();
        let dry_gain = self.dry_gain;
        let wet_gain = self.wet_gain;

        for (wet, dry) in block.channels_mut().zip(self.dry.channels()) {
            for (i, (w, &d)) in wet.iter_mut().zip(dry).enumerate() {
                *w = *w * wet_gain.gain_at(i, n) + d * dry_gain.gain_at(i, n);
            }
        }

        self.dry_gain.commit();
        self.wet_gain.commit();
    }

    fn reset(&mut self) {
        self.dry_gain.reset();
        self.wet_gain.reset();
    }
}
