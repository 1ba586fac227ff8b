//! WAV file reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32; 32 is written as float).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
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

/// Read a WAV file as 16-bit mono PCM.
///
/// Multi-channel files are mixed down by averaging channels. Integer files of
/// other depths are rescaled to 16 bits; float files are scaled by 32767 and
/// clamped.
///
/// # Example
/// ```ignore
/// let (pcm, spec) = read_wav_mono("sample.wav")?;
/// println!("Loaded {} frames at {} Hz", pcm.len(), spec.sample_rate);
/// ```
pub fn read_wav_mono<P: AsRef<Path>>(path: P) -> Result<(Vec<i16>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match (hound_spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let max_val = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        (format, bits) => {
            return Err(Error::UnsupportedFormat(format!("{format:?} at {bits} bits")));
        }
    };

    let pcm = samples
        .chunks(channels)
        .map(|frame| {
            let mono = frame.iter().sum::<f32>() / frame.len() as f32;
            (mono * 32767.0).round().clamp(-32768.0, 32767.0) as i16
        })
        .collect::<Vec<_>>();

    debug!(frames = pcm.len(), sample_rate = spec.sample_rate, channels, "read wav");
    Ok((pcm, spec))
}

/// Write left/right buffers to a stereo WAV file.
///
/// `spec.channels` is ignored; the file always has two channels. Frames past
/// the shorter buffer are dropped.
///
/// # Example
/// ```ignore
/// let left = vec![0.0f32; 48000];
/// let right = vec![0.0f32; 48000];
/// write_wav_stereo("output.wav", &left, &right, WavSpec::default())?;
/// ```
pub fn write_wav_stereo<P: AsRef<Path>>(
    path: P,
    left: &[f32],
    right: &[f32],
    spec: WavSpec,
) -> Result<()> {
    let stereo_spec = WavSpec { channels: 2, ..spec };
    if !matches!(stereo_spec.bits_per_sample, 16 | 24 | 32) {
        return Err(Error::UnsupportedFormat(format!(
            "{} bits per sample",
            stereo_spec.bits_per_sample
        )));
    }

    let file = File::create(path)?;
    let mut writer = WavWriter::new(BufWriter::new(file), hound::WavSpec::from(stereo_spec))?;

    if stereo_spec.bits_per_sample == 32 {
        for (l, r) in left.iter().zip(right) {
            writer.write_sample(*l)?;
            writer.write_sample(*r)?;
        }
    } else {
        let max_val = (1i32 << (stereo_spec.bits_per_sample - 1)) as f32;
        for (l, r) in left.iter().zip(right) {
            let int_l = (*l * max_val).clamp(-max_val, max_val - 1.0) as i32;
            let int_r = (*r * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_l)?;
            writer.write_sample(int_r)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_stereo_roundtrip_i16_mixes_to_mono() {
        let left: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0).sin() * 0.9).collect();
        let right: Vec<f32> = left.iter().map(|s| s * 0.5).collect();
        let spec = WavSpec {
            sample_rate: 44100,
            ..WavSpec::default()
        };

        let file = NamedTempFile::new().unwrap();
        write_wav_stereo(file.path(), &left, &right, spec).unwrap();

        let (pcm, loaded_spec) = read_wav_mono(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(pcm.len(), left.len());
        for ((l, r), p) in left.iter().zip(&right).zip(&pcm) {
            let expected = (l + r) / 2.0 * 32767.0;
            assert!((expected - f32::from(*p)).abs() < 3.0);
        }
    }

    #[test]
    fn test_float_files_are_scaled() {
        let left = vec![0.5f32, -1.0, 2.0];
        let spec = WavSpec {
            bits_per_sample: 32,
            ..WavSpec::default()
        };

        let file = NamedTempFile::new().unwrap();
        write_wav_stereo(file.path(), &left, &left, spec).unwrap();

        let (pcm, loaded_spec) = read_wav_mono(file.path()).unwrap();
        assert_eq!(loaded_spec.bits_per_sample, 32);
        assert_eq!(pcm, vec![16384, -32767, 32767]);
    }

    #[test]
    fn test_shorter_buffer_sets_length() {
        let file = NamedTempFile::new().unwrap();
        write_wav_stereo(file.path(), &[0.1; 10], &[0.1; 4], WavSpec::default()).unwrap();
        let (pcm, _) = read_wav_mono(file.path()).unwrap();
        assert_eq!(pcm.len(), 4);
    }

    #[test]
    fn test_unsupported_depth() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 12,
            ..WavSpec::default()
        };
        let err = write_wav_stereo(file.path(), &[0.0], &[0.0], spec).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_wav_mono(dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err, Error::Wav(_)));

        let err = write_wav_stereo(dir.path().join("no/such/dir.wav"), &[0.0], &[0.0], WavSpec::default())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
