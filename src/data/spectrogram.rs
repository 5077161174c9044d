// ============================================================
// Layer 4 - Log Power Spectrogram Featurizer
// ============================================================
// Turns a WAV clip into a (time x frequency) matrix:
//
//   1. decode to mono, check max_freq <= Nyquist and step <= window
//   2. hop = step_ms * rate / 1000, fft = window_ms * rate / 1000
//   3. frame with a symmetric Hann window, dropping the tail
//   4. one-sided |FFT|^2, scaled by the window energy and rate
//      (interior bins doubled to account for the folded half)
//   5. keep bins whose centre frequency is <= max_freq
//   6. ln(p + 1e-14), one row per frame
//
// Reference: rustfft crate documentation

use rustfft::{num_complex::Complex, FftPlanner};

use crate::data::config::{spectrogram_dim, GeneratorConfig};
use crate::data::framer::Framer;
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::{FeatureMatrix, Featurizer};
use crate::infra::wav::{read_mono, MonoAudio};

const LOG_EPS: f64 = 1e-14;

#[derive(Debug, Clone)]
pub struct SpectrogramFeaturizer {
    step_ms:   u32,
    window_ms: u32,
    max_freq:  u32,
}

impl SpectrogramFeaturizer {
    pub fn new(step_ms: u32, window_ms: u32, max_freq: u32) -> Self {
        Self { step_ms, window_ms, max_freq }
    }

    pub fn from_config(cfg: &GeneratorConfig) -> Self {
        Self::new(cfg.step_ms, cfg.window_ms, cfg.max_freq)
    }

    /// Spectrogram of already-decoded audio. `path` is only used
    /// to label errors.
    pub fn compute(&self, audio: &MonoAudio, path: &str) -> Result<FeatureMatrix> {
        let rate = audio.sample_rate as f64;

        if self.max_freq as f64 > rate / 2.0 {
            return Err(PipelineError::extraction(
                path,
                format!("max_freq {} exceeds half the sample rate {}", self.max_freq, rate),
            ));
        }
        if self.step_ms > self.window_ms {
            return Err(PipelineError::extraction(
                path,
                "step size must not be greater than window size",
            ));
        }

        let hop_length = (0.001 * self.step_ms as f64 * rate) as usize;
        let fft_length = (0.001 * self.window_ms as f64 * rate) as usize;
        if hop_length == 0 || fft_length == 0 {
            return Err(PipelineError::extraction(
                path,
                format!("sample rate {rate} too low for a {} ms window", self.window_ms),
            ));
        }

        let framer = Framer::new(fft_length, hop_length);
        let frames = framer.frames(&audio.samples);
        if frames.is_empty() {
            return Err(PipelineError::extraction(
                path,
                format!(
                    "clip lasts {:.3} s, shorter than one {} ms window",
                    audio.duration_secs(),
                    self.window_ms
                ),
            ));
        }

        let window = hann_symmetric(fft_length);
        let scale  = window.iter().map(|w| w * w).sum::<f64>() * rate;

        // Bins 0..kept have centre frequency <= max_freq
        let num_bins = fft_length / 2 + 1;
        let kept = (0..num_bins)
            .take_while(|&k| k as f64 * rate / fft_length as f64 <= self.max_freq as f64)
            .count();

        let mut planner = FftPlanner::<f64>::new();
        let fft         = planner.plan_fft_forward(fft_length);
        let mut buffer  = vec![Complex::new(0.0, 0.0); fft_length];

        let mut out = FeatureMatrix::zeros((frames.len(), kept));
        for (t, frame) in frames.iter().enumerate() {
            for (slot, (&s, &w)) in buffer.iter_mut().zip(frame.iter().zip(&window)) {
                *slot = Complex::new(s as f64 * w, 0.0);
            }
            fft.process(&mut buffer);

            for k in 0..kept {
                let mut power = buffer[k].norm_sqr();
                if k == 0 || k == num_bins - 1 {
                    power /= scale;
                } else {
                    power *= 2.0 / scale;
                }
                out[[t, k]] = (power + LOG_EPS).ln() as f32;
            }
        }

        Ok(out)
    }
}

impl Featurizer for SpectrogramFeaturizer {
    fn extract(&self, audio_path: &str) -> Result<FeatureMatrix> {
        let audio = read_mono(audio_path)?;
        self.compute(&audio, audio_path)
    }

    fn feature_dim(&self) -> usize {
        spectrogram_dim(self.window_ms, self.max_freq)
    }
}

/// Symmetric Hann window (endpoints are zero).
fn hann_symmetric(length: usize) -> Vec<f64> {
    if length == 1 {
        return vec![1.0];
    }
    (0..length)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / (length - 1) as f64;
            0.5 - 0.5 * phase.cos()
        })
        .collect()
}
