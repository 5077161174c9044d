// ============================================================
// Layer 4 - Generator Configuration
// ============================================================
// Every knob the batch generator reads. Serialisable so the
// feature setup used to fit normalisation statistics can be
// written next to them and reloaded by later runs.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

/// Which acoustic features a generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeatureMode {
    /// Log power spectrogram, one column per FFT bin up to max_freq
    Spectrogram,
    /// Mel-frequency cepstral coefficients
    Mfcc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Hop between analysis windows in milliseconds (spectrogram only)
    pub step_ms:            u32,
    /// FFT window length in milliseconds (spectrogram only)
    pub window_ms:          u32,
    /// Highest frequency bin kept, in Hz (spectrogram only)
    pub max_freq:           u32,
    /// Number of cepstral coefficients (MFCC only)
    pub mfcc_dim:           usize,
    pub minimum_batch_size: usize,
    pub feature_mode:       FeatureMode,
    /// Clips longer than this (seconds) are dropped at load time
    pub max_duration:       f64,
    /// Stored for the caller; batch assembly never sorts on its own
    pub sort_by_duration:   bool,
    /// Seed for the generator's shuffle / sampling RNG
    pub seed:               u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            step_ms:            10,
            window_ms:          20,
            max_freq:           8000,
            mfcc_dim:           13,
            minimum_batch_size: 20,
            feature_mode:       FeatureMode::Spectrogram,
            max_duration:       10.0,
            sort_by_duration:   false,
            seed:               123,
        }
    }
}

impl GeneratorConfig {
    /// Per-frame feature width for the active mode.
    pub fn feature_dim(&self) -> usize {
        match self.feature_mode {
            FeatureMode::Spectrogram => spectrogram_dim(self.window_ms, self.max_freq),
            FeatureMode::Mfcc        => self.mfcc_dim,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.minimum_batch_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "minimum_batch_size must be at least 1".into(),
            ));
        }
        if self.step_ms == 0 || self.window_ms == 0 {
            return Err(PipelineError::InvalidConfig(
                "step_ms and window_ms must be positive".into(),
            ));
        }
        if self.step_ms > self.window_ms {
            return Err(PipelineError::InvalidConfig(format!(
                "step ({} ms) must not be greater than window ({} ms)",
                self.step_ms, self.window_ms
            )));
        }
        if self.mfcc_dim == 0 {
            return Err(PipelineError::InvalidConfig("mfcc_dim must be positive".into()));
        }
        if !(self.max_duration > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_duration must be positive, got {}",
                self.max_duration
            )));
        }
        Ok(())
    }
}

/// Number of spectrogram bins between 0 Hz and `max_freq` for a
/// window of `window_ms` milliseconds.
pub fn spectrogram_dim(window_ms: u32, max_freq: u32) -> usize {
    (0.001 * window_ms as f64 * max_freq as f64) as usize + 1
}
