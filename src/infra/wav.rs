// ============================================================
// Layer 6 - WAV Decoding
// ============================================================
// Reads a WAV file into mono f32 samples in [-1, 1].
// Multi-channel audio is averaged per frame.
//
// Decoding failures surface as FeatureExtraction errors
// carrying the offending path; the core never retries them.

use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::domain::error::{PipelineError, Result};

/// Decoded clip: mono samples plus the file's sample rate.
#[derive(Debug, Clone)]
pub struct MonoAudio {
    pub samples:     Vec<f32>,
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

pub fn read_mono(path: impl AsRef<Path>) -> Result<MonoAudio> {
    let path    = path.as_ref();
    let display = path.display().to_string();

    let reader = WavReader::open(path).map_err(|e| PipelineError::extraction(&display, e))?;
    let spec   = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::extraction(&display, e))?,
        SampleFormat::Int => {
            let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PipelineError::extraction(&display, e))?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(MonoAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Write mono f32 samples as a 16-bit PCM WAV. Used to build
/// fixtures for the featurizer tests.
#[cfg(test)]
pub fn write_mono_i16(path: impl AsRef<Path>, samples: &[f32], sample_rate: u32) -> hound::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

/// Sine tone fixture at `freq` Hz.
#[cfg(test)]
pub fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
    let n = (sample_rate as f32 * seconds) as usize;
    (0..n)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_back_written_clip() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_mono_i16(&path, &sine(440.0, 16000, 0.5), 16000).unwrap();

        let audio = read_mono(&path).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.samples.len(), 8000);
        assert!((audio.duration_secs() - 0.5).abs() < 1e-9);
        assert!(audio.samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_stereo_is_averaged() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut w = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            w.write_sample(0.5f32).unwrap();
            w.write_sample(-0.1f32).unwrap();
        }
        w.finalize().unwrap();

        let audio = read_mono(&path).unwrap();
        assert_eq!(audio.samples.len(), 4);
        assert!((audio.samples[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_extraction_error() {
        let err = read_mono("/definitely/not/here.wav").unwrap_err();
        assert!(matches!(err, PipelineError::FeatureExtraction { .. }));
    }
}
