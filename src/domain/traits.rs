// ============================================================
// Layer 3 - Collaborator Traits
// ============================================================
// The batch generator only talks to three outside components,
// and only through these traits:
//
//   Featurizer    audio path  -> time x feature matrix
//   LabelEncoder  transcript  -> integer label ids
//   CorpusIndex   desc file   -> parallel (path, duration, text)
//
// Concrete versions live in the data layer (spectrogram, MFCC,
// character map, JSON-lines loader). Tests swap in fakes.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use ndarray::Array2;

use crate::domain::error::Result;
use crate::domain::partition::PartitionData;

/// Time-steps x feature-dimension, one row per frame.
pub type FeatureMatrix = Array2<f32>;

// ─── Featurizer ───────────────────────────────────────────────────────────────
pub trait Featurizer {
    /// Compute the feature matrix for one clip.
    ///
    /// Fails with `PipelineError::FeatureExtraction` on unreadable
    /// or corrupt audio.
    fn extract(&self, audio_path: &str) -> Result<FeatureMatrix>;

    /// Width of every matrix this featurizer produces
    fn feature_dim(&self) -> usize;
}

// ─── LabelEncoder ─────────────────────────────────────────────────────────────
pub trait LabelEncoder {
    /// Map each character of `text` to its integer code.
    ///
    /// Fails with `PipelineError::UnknownSymbol` on characters
    /// outside the vocabulary.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Number of real (non-blank) symbols
    fn vocab_size(&self) -> usize;

    /// Padding id: one past the last real symbol code.
    fn blank_id(&self) -> u32 {
        self.vocab_size() as u32
    }
}

// ─── CorpusIndex ──────────────────────────────────────────────────────────────
pub trait CorpusIndex {
    /// Read a description file into the three parallel columns.
    fn load(&self, description_path: &Path) -> Result<PartitionData>;
}
