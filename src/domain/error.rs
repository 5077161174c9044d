// ============================================================
// Layer 3 - Pipeline Error Taxonomy
// ============================================================
// Every failure the batching core can report. Collaborator
// errors (decode failures, unknown characters) pass through
// unchanged; nothing in the core retries or swallows them.
//
// The application and CLI layers wrap these in anyhow with
// extra context, so this enum stays small and matchable.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)

use std::path::PathBuf;

/// Result alias used by the domain and data layers.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Unknown partition name, or an operation the partition does not allow
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The featurizer could not turn a clip into a feature matrix
    #[error("feature extraction failed for '{path}': {reason}")]
    FeatureExtraction { path: String, reason: String },

    /// A transcript contains a character outside the vocabulary
    #[error("unknown symbol {symbol:?} in transcript {text:?}")]
    UnknownSymbol { symbol: char, text: String },

    /// A feature matrix or statistics vector has the wrong width
    #[error("feature dimension mismatch: expected {expected}, found {found}")]
    FeatureDimMismatch { expected: usize, found: usize },

    /// The batch window runs past the end of the partition
    #[error(
        "batch window [{cursor}, {cursor} + {batch_size}) is out of range \
         for partition '{partition}' with {len} examples"
    )]
    WindowOutOfRange {
        partition:  String,
        cursor:     usize,
        batch_size: usize,
        len:        usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Statistics were requested over a corpus with nothing in it
    #[error("empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Wrap a decoder message as a feature extraction failure for `path`.
    pub fn extraction(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::FeatureExtraction {
            path:   path.into(),
            reason: reason.to_string(),
        }
    }
}
