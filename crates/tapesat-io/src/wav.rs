//! WAV file reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;
use tapesat_core::AudioBuffer;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV file specification.
///
/// 32-bit files are written as IEEE float, everything else as integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

fn pcm_full_scale(bits: u16) -> Result<f32> {
    match bits {
        8 | 16 | 24 | 32 => Ok((1_i64 << (bits - 1)) as f32),
        _ => Err(Error::UnsupportedFormat(format!("{bits}-bit PCM"))),
    }
}

/// Read a WAV file into a channel-major buffer, one channel per file channel.
///
/// Integer samples are scaled to `[-1.0, 1.0)`.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(AudioBuffer, WavSpec)> {
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);
    let channels = usize::from(spec.channels);
    if channels == 0 {
        return Err(Error::UnsupportedFormat("zero channels".into()));
    }

    let interleaved: Vec<f32> = match hound_spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let full_scale = pcm_full_scale(spec.bits_per_sample)?;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut buffer = AudioBuffer::new(channels, frames);
    for (ch, dst) in buffer.channels_mut().enumerate() {
        for (i, sample) in dst.iter_mut().enumerate() {
            *sample = interleaved[i * channels + ch];
        }
    }

    tracing::debug!(
        channels,
        frames,
        sample_rate = spec.sample_rate,
        "read_wav"
    );
    Ok((buffer, spec))
}

/// Write a channel-major buffer to a WAV file.
///
/// The channel count is taken from `buffer`; `spec.channels` is ignored.
/// Integer formats clip to full scale.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer, spec: WavSpec) -> Result<()> {
    let channels = u16::try_from(buffer.num_channels())
        .map_err(|_| Error::UnsupportedFormat(format!("{} channels", buffer.num_channels())))?;
    if channels == 0 {
        return Err(Error::UnsupportedFormat("zero channels".into()));
    }
    let spec = WavSpec { channels, ..spec };
    let full_scale = if spec.bits_per_sample == 32 {
        None
    } else {
        Some(pcm_full_scale(spec.bits_per_sample)?)
    };

    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
    for i in 0..buffer.num_samples() {
        for channel in buffer.channels() {
            let sample = channel[i];
            match full_scale {
                None => writer.write_sample(sample)?,
                Some(max_val) => {
                    let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                    writer.write_sample(int_sample)?;
                }
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn ramp(channels: usize, frames: usize) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(channels, frames);
        for (ch, data) in buffer.channels_mut().enumerate() {
            for (i, s) in data.iter_mut().enumerate() {
                *s = ((i as f32 / frames as f32) - 0.5) * if ch == 0 { 1.0 } else { -1.0 };
            }
        }
        buffer
    }

    #[test]
    fn test_roundtrip_f32_stereo() {
        let buffer = ramp(2, 1000);
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &buffer, WavSpec::default()).unwrap();

        let (loaded, spec) = read_wav(file.path()).unwrap();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn test_roundtrip_i16_mono() {
        let buffer = ramp(1, 1000);
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &buffer, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        for (a, b) in buffer.channel(0).iter().zip(loaded.channel(0)) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_channel_count_follows_buffer() {
        let buffer = ramp(1, 64);
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &buffer, WavSpec::default()).unwrap();
        assert_eq!(read_wav_info(file.path()).unwrap().channels, 1);
    }

    #[test]
    fn test_integer_output_clips() {
        let buffer = AudioBuffer::from_channels(&[&[2.0, -2.0]]);
        let spec = WavSpec {
            channels: 1,
            bits_per_sample: 16,
            ..WavSpec::default()
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &buffer, spec).unwrap();

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert!(loaded.channel(0)[0] < 1.0 && loaded.channel(0)[0] > 0.999);
        assert_eq!(loaded.channel(0)[1], -1.0);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let buffer = ramp(1, 8);
        let spec = WavSpec {
            bits_per_sample: 12,
            ..WavSpec::default()
        };
        let file = NamedTempFile::new().unwrap();
        let err = write_wav(file.path(), &buffer, spec).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_info_reports_duration() {
        let buffer = AudioBuffer::new(2, 24000);
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &buffer, WavSpec::default()).unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.num_frames, 24000);
        assert!((info.duration_secs - 0.5).abs() < 1e-9);
        assert_eq!(info.format, WavFormat::IeeeFloat);
    }
}
