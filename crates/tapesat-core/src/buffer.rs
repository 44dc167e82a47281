//! Channel-major audio block storage.
//!
//! [`AudioBuffer`] owns one contiguous allocation laid out as
//! `channel 0 | channel 1 | ...`, each channel occupying `stride` slots of
//! which the first `num_samples` are active. Shrinking the active size (or
//! growing it back up to the allocated stride) never touches the allocator,
//! which is what lets the dry-signal cache and the oversampling scratch be
//! resized every block on the audio thread.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// A block of channel-major `f32` samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    data: Vec<f32>,
    num_channels: usize,
    num_samples: usize,
    stride: usize,
}

impl AudioBuffer {
    /// Creates a zeroed buffer with the given shape.
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            data: vec![0.0; num_channels * num_samples],
            num_channels,
            num_samples,
            stride: num_samples,
        }
    }

    /// Creates a buffer by copying per-channel slices.
    ///
    /// Every channel is truncated to the length of the shortest slice.
    pub fn from_channels(channels: &[&[f32]]) -> Self {
        let len = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        let mut buffer = Self::new(channels.len(), len);
        for (dst, src) in buffer.channels_mut().zip(channels) {
            dst.copy_from_slice(&src[..len]);
        }
        buffer
    }

    /// Number of active channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of active samples per channel.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Returns true if there are no active samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_channels == 0 || self.num_samples == 0
    }

    /// Samples per channel that fit without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.stride
    }

    /// Channels that fit without reallocating.
    #[inline]
    pub fn channel_capacity(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /// Changes the active shape.
    ///
    /// Returns `true` if the backing storage had to be reallocated. When the
    /// new shape fits inside the current allocation only the bookkeeping
    /// changes; sample contents are left as they were.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) -> bool {
        if num_channels <= self.channel_capacity() && num_samples <= self.stride {
            self.num_channels = num_channels;
            self.num_samples = num_samples;
            return false;
        }

        *self = Self::new(num_channels, num_samples);
        true
    }

    /// Reserves storage for at least the given shape and sets it active.
    ///
    /// Existing samples are discarded.
    pub fn allocate(&mut self, num_channels: usize, max_samples: usize) {
        *self = Self::new(num_channels, max_samples);
    }

    /// Read access to one channel's active samples.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels()`.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[f32] {
        assert!(channel < self.num_channels, "channel index out of range");
        let start = channel * self.stride;
        &self.data[start..start + self.num_samples]
    }

    /// Write access to one channel's active samples.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels()`.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        assert!(channel < self.num_channels, "channel index out of range");
        let start = channel * self.stride;
        &mut self.data[start..start + self.num_samples]
    }

    /// Iterates over active channels.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        let n = self.num_samples;
        self.data
            .chunks_exact(self.stride.max(1))
            .take(self.num_channels)
            .map(move |c| &c[..n])
    }

    /// Iterates mutably over active channels.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        let n = self.num_samples;
        self.data
            .chunks_exact_mut(self.stride.max(1))
            .take(self.num_channels)
            .map(move |c| &mut c[..n])
    }

    /// Fills the active region with zeros.
    pub fn clear(&mut self) {
        for channel in self.channels_mut() {
            channel.fill(0.0);
        }
    }

    /// Copies another buffer into this one, adopting its shape.
    ///
    /// Does not reallocate when the source shape fits in the current storage.
    pub fn copy_from(&mut self, other: &AudioBuffer) {
        self.set_size(other.num_channels, other.num_samples);
        for (dst, src) in self.channels_mut().zip(other.channels()) {
            dst.copy_from_slice(src);
        }
    }

    /// Multiplies every active sample by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for channel in self.channels_mut() {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Peak absolute value across all active samples.
    pub fn peak(&self) -> f32 {
        self.channels()
            .flat_map(|c| c.iter())
            .fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}
