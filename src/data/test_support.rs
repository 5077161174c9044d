// ============================================================
// Layer 4 - Test Support
// ============================================================
// Fake collaborators shared by the data-layer tests.
//
// Why fakes instead of WAV fixtures?
//   The generator's invariants (padding, lengths, cursors,
//   shuffles) do not depend on real audio. A featurizer whose
//   output length is encoded in the clip name makes every
//   expected shape readable straight from the test:
//
//     "clip_4"  → 4 rows, row r filled with r + 1
//     "bad"     → FeatureExtraction error (FailingFeaturizer)
//
// Real WAV decoding is covered in infra::wav and the
// featurizer modules.

use crate::data::config::{FeatureMode, GeneratorConfig};
use crate::domain::error::{PipelineError, Result};
use crate::domain::partition::{PartitionData, Utterance};
use crate::domain::traits::{FeatureMatrix, Featurizer};

/// Spectrogram-mode config whose feature_dim is 3
/// (20 ms window up to 100 Hz).
pub fn test_config() -> GeneratorConfig {
    GeneratorConfig {
        step_ms:            10,
        window_ms:          20,
        max_freq:           100,
        mfcc_dim:           5,
        minimum_batch_size: 3,
        feature_mode:       FeatureMode::Spectrogram,
        max_duration:       10.0,
        sort_by_duration:   false,
        seed:               123,
    }
}

pub fn corpus(clips: &[(&str, f64, &str)]) -> PartitionData {
    clips
        .iter()
        .map(|&(path, duration, text)| Utterance::new(path, duration, text))
        .collect()
}

/// Reads the frame count from the clip name: "clip_<N>" yields
/// N rows, row r filled with r + 1.
pub struct FakeFeaturizer {
    dim: usize,
}

impl FakeFeaturizer {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Featurizer for FakeFeaturizer {
    fn extract(&self, audio_path: &str) -> Result<FeatureMatrix> {
        let rows: usize = audio_path
            .strip_prefix("clip_")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| PipelineError::extraction(audio_path, "no such fake clip"))?;
        Ok(FeatureMatrix::from_shape_fn((rows, self.dim), |(r, _)| r as f32 + 1.0))
    }

    fn feature_dim(&self) -> usize {
        self.dim
    }
}

/// Fails on every clip named "bad", otherwise behaves like FakeFeaturizer.
pub struct FailingFeaturizer {
    inner: FakeFeaturizer,
}

impl FailingFeaturizer {
    pub fn new(dim: usize) -> Self {
        Self { inner: FakeFeaturizer::new(dim) }
    }
}

impl Featurizer for FailingFeaturizer {
    fn extract(&self, audio_path: &str) -> Result<FeatureMatrix> {
        if audio_path == "bad" {
            return Err(PipelineError::extraction(audio_path, "corrupt header"));
        }
        self.inner.extract(audio_path)
    }

    fn feature_dim(&self) -> usize {
        self.inner.feature_dim()
    }
}
