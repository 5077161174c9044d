// ============================================================
// Layer 4 - MFCC Featurizer
// ============================================================
// Mel-frequency cepstral coefficients, one row per 10 ms frame:
//
//   pre-emphasis (0.97)
//     -> 25 ms rectangular frames, zero-padded tail
//     -> 512-point power spectrum, |X|^2 / NFFT
//     -> 26 triangular mel filters, log energies
//     -> orthonormal DCT-II, first `num_ceps` coefficients
//     -> sinusoidal lifter (L = 22)
//     -> coefficient 0 replaced by log frame energy
//
// Reference: Davis & Mermelstein (1980)

use rustfft::{num_complex::Complex, FftPlanner};

use crate::data::framer::Framer;
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::{FeatureMatrix, Featurizer};
use crate::infra::wav::{read_mono, MonoAudio};

const WIN_LEN_SECS: f64 = 0.025;
const WIN_STEP_SECS: f64 = 0.01;
const NUM_FILTERS: usize = 26;
const NFFT: usize = 512;
const PREEMPHASIS: f32 = 0.97;
const CEP_LIFTER: f64 = 22.0;

#[derive(Debug, Clone)]
pub struct MfccFeaturizer {
    num_ceps: usize,
}

impl MfccFeaturizer {
    pub fn new(num_ceps: usize) -> Self {
        Self { num_ceps }
    }

    pub fn compute(&self, audio: &MonoAudio, path: &str) -> Result<FeatureMatrix> {
        if self.num_ceps > NUM_FILTERS {
            return Err(PipelineError::extraction(
                path,
                format!("cannot keep {} coefficients from {NUM_FILTERS} filters", self.num_ceps),
            ));
        }
        let rate = audio.sample_rate as f64;
        let frame_len  = (WIN_LEN_SECS * rate).round() as usize;
        let frame_step = (WIN_STEP_SECS * rate).round() as usize;
        if frame_len == 0 || frame_step == 0 {
            return Err(PipelineError::extraction(
                path,
                format!("sample rate {rate} too low for MFCC framing"),
            ));
        }

        let emphasized = preemphasis(&audio.samples, PREEMPHASIS);
        let frames     = Framer::new(frame_len, frame_step).padded_frames(&emphasized);
        let filters    = mel_filterbank(NUM_FILTERS, NFFT, rate);

        let mut planner = FftPlanner::<f64>::new();
        let fft         = planner.plan_fft_forward(NFFT);
        let num_bins    = NFFT / 2 + 1;

        let mut out = FeatureMatrix::zeros((frames.len(), self.num_ceps));
        let mut buffer = vec![Complex::new(0.0, 0.0); NFFT];

        for (t, frame) in frames.iter().enumerate() {
            // Frames longer than NFFT are truncated, shorter ones zero-padded
            buffer.fill(Complex::new(0.0, 0.0));
            for (slot, &s) in buffer.iter_mut().zip(frame.iter()) {
                *slot = Complex::new(s as f64, 0.0);
            }
            fft.process(&mut buffer);

            let power: Vec<f64> = buffer[..num_bins]
                .iter()
                .map(|c| c.norm_sqr() / NFFT as f64)
                .collect();

            let energy = floor_eps(power.iter().sum());

            let log_energies: Vec<f64> = filters
                .iter()
                .map(|filter| {
                    let e: f64 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                    floor_eps(e).ln()
                })
                .collect();

            let ceps = dct2_ortho(&log_energies, self.num_ceps);
            for (n, c) in ceps.into_iter().enumerate() {
                let lift = 1.0 + (CEP_LIFTER / 2.0) * (std::f64::consts::PI * n as f64 / CEP_LIFTER).sin();
                out[[t, n]] = (c * lift) as f32;
            }
            if self.num_ceps > 0 {
                out[[t, 0]] = energy.ln() as f32;
            }
        }

        Ok(out)
    }
}

impl Featurizer for MfccFeaturizer {
    fn extract(&self, audio_path: &str) -> Result<FeatureMatrix> {
        let audio = read_mono(audio_path)?;
        self.compute(&audio, audio_path)
    }

    fn feature_dim(&self) -> usize {
        self.num_ceps
    }
}

fn floor_eps(x: f64) -> f64 {
    if x == 0.0 { f64::EPSILON } else { x }
}

fn preemphasis(samples: &[f32], coef: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len());
    if let Some(&first) = samples.first() {
        out.push(first);
    }
    out.extend(samples.windows(2).map(|w| w[1] - coef * w[0]));
    out
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular filters between 0 Hz and Nyquist, each with
/// `nfft / 2 + 1` weights.
fn mel_filterbank(num_filters: usize, nfft: usize, sample_rate: f64) -> Vec<Vec<f64>> {
    let num_bins = nfft / 2 + 1;
    let low      = hz_to_mel(0.0);
    let high     = hz_to_mel(sample_rate / 2.0);

    let bins: Vec<usize> = (0..num_filters + 2)
        .map(|i| {
            let mel = low + (high - low) * i as f64 / (num_filters + 1) as f64;
            ((nfft + 1) as f64 * mel_to_hz(mel) / sample_rate).floor() as usize
        })
        .collect();

    (0..num_filters)
        .map(|j| {
            let (left, centre, right) = (bins[j], bins[j + 1], bins[j + 2]);
            let mut filter = vec![0.0; num_bins];
            for (i, w) in filter.iter_mut().enumerate() {
                if i >= left && i < centre {
                    *w = (i - left) as f64 / (centre - left) as f64;
                } else if i >= centre && i < right {
                    *w = (right - i) as f64 / (right - centre) as f64;
                }
            }
            filter
        })
        .collect()
}

/// Orthonormal DCT-II, first `keep` outputs.
fn dct2_ortho(input: &[f64], keep: usize) -> Vec<f64> {
    let n = input.len() as f64;
    (0..keep)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, x)| x * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
                .sum();
            let norm = if k == 0 { (1.0 / (4.0 * n)).sqrt() } else { (1.0 / (2.0 * n)).sqrt() };
            2.0 * norm * sum
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::wav::{sine, write_mono_i16};

    #[test]
    fn test_frame_count_and_width() {
        let audio = MonoAudio { samples: sine(440.0, 16000, 1.0), sample_rate: 16000 };
        let out   = MfccFeaturizer::new(13).compute(&audio, "tone").unwrap();
        // frame 400, step 160: 1 + ceil((16000 - 400) / 160) = 99
        assert_eq!(out.dim(), (99, 13));
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_short_clip_gives_one_frame() {
        let audio = MonoAudio { samples: vec![0.1; 50], sample_rate: 16000 };
        let out   = MfccFeaturizer::new(13).compute(&audio, "blip").unwrap();
        assert_eq!(out.nrows(), 1);
    }

    #[test]
    fn test_too_many_coefficients() {
        let audio = MonoAudio { samples: vec![0.1; 800], sample_rate: 16000 };
        assert!(MfccFeaturizer::new(40).compute(&audio, "x").is_err());
    }

    #[test]
    fn test_dct_of_constant_is_dc_only() {
        let out = dct2_ortho(&[1.0; 8], 4);
        assert!((out[0] - 8f64.sqrt()).abs() < 1e-9);
        assert!(out[1..].iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_filters_are_triangular() {
        let bank = mel_filterbank(26, 512, 16000.0);
        assert_eq!(bank.len(), 26);
        for filter in &bank {
            assert!(filter.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn test_extract_reads_wav() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_mono_i16(&path, &sine(200.0, 16000, 0.3), 16000).unwrap();

        let feat = MfccFeaturizer::new(13);
        let out  = feat.extract(path.to_str().unwrap()).unwrap();
        assert_eq!(out.ncols(), feat.feature_dim());
    }
}
