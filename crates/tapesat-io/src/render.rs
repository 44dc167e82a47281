//! Offline rendering of whole buffers through the tape pipeline.

use tapesat_core::{AudioBuffer, ProcessSpec};
use tapesat_effects::TapePipeline;

/// Progress reported after each rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    /// Output frames written so far.
    pub frames_done: usize,
    /// Output frames in the whole render.
    pub total_frames: usize,
}

impl RenderProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.total_frames == 0 {
            1.0
        } else {
            self.frames_done as f32 / self.total_frames as f32
        }
    }
}

/// Drives a [`TapePipeline`] over a file's worth of audio in fixed-size blocks,
/// the way a host would.
///
/// The renderer owns the pipeline; parameter stores connected to it before
/// construction keep working during the render.
#[derive(Debug)]
pub struct OfflineRenderer {
    pipeline: TapePipeline,
    block_size: u32,
    block: AudioBuffer,
    compensate_latency: bool,
}

impl OfflineRenderer {
    /// Create a renderer delivering blocks of at most `block_size` frames.
    pub fn new(pipeline: TapePipeline, block_size: u32) -> Self {
        Self {
            pipeline,
            block_size: block_size.max(1),
            block: AudioBuffer::default(),
            compensate_latency: false,
        }
    }

    /// Shift the output earlier by the pipeline's (rounded) latency so it
    /// lines up with the input.
    pub fn with_latency_compensation(mut self, enabled: bool) -> Self {
        self.compensate_latency = enabled;
        self
    }

    /// Block size handed to the pipeline.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// The pipeline being driven.
    pub fn pipeline(&self) -> &TapePipeline {
        &self.pipeline
    }

    /// Mutable access to the pipeline, e.g. to attach a spectrum feed.
    pub fn pipeline_mut(&mut self) -> &mut TapePipeline {
        &mut self.pipeline
    }

    /// Give the pipeline back.
    pub fn into_pipeline(self) -> TapePipeline {
        self.pipeline
    }

    /// Render `input` at `sample_rate`, returning a buffer of the same shape.
    ///
    /// The pipeline is re-prepared for the input's channel count first. A zero
    /// sample rate renders silence.
    /// `on_block` runs after every block on the calling thread.
    pub fn render(
        &mut self,
        input: &AudioBuffer,
        sample_rate: u32,
        mut on_block: impl FnMut(RenderProgress),
    ) -> AudioBuffer {
        let channels = input.num_channels();
        let frames = input.num_samples();
        let mut output = AudioBuffer::new(channels, frames);
        if input.is_empty() {
            return output;
        }

        let spec = ProcessSpec::new(f64::from(sample_rate), self.block_size, channels as u32);
        if !spec.is_valid() {
            tracing::warn!(sample_rate, channels, "offline_render: unusable stream, output is silent");
            return output;
        }
        self.pipeline.prepare(&spec);
        self.block.allocate(channels, spec.max_block());

        let offset = if self.compensate_latency {
            self.pipeline.latency_samples().round() as usize
        } else {
            0
        };
        tracing::debug!(
            sample_rate,
            block_size = self.block_size,
            channels,
            frames,
            offset,
            "offline_render"
        );

        let total_in = frames + offset;
        let mut position = 0;
        while position < total_in {
            let len = spec.max_block().min(total_in - position);
            self.block.set_size(channels, len);

            for (ch, dst) in self.block.channels_mut().enumerate() {
                let src = input.channel(ch);
                for (j, s) in dst.iter_mut().enumerate() {
                    *s = src.get(position + j).copied().unwrap_or(0.0);
                }
            }

            self.pipeline.process_block(&mut self.block);

            for (ch, src) in self.block.channels().enumerate() {
                let dst = output.channel_mut(ch);
                for (j, &s) in src.iter().enumerate() {
                    if let Some(out_index) = (position + j).checked_sub(offset) {
                        dst[out_index] = s;
                    }
                }
            }

            position += len;
            on_block(RenderProgress {
                frames_done: position.saturating_sub(offset),
                total_frames: frames,
            });
        }

        output
    }
}
