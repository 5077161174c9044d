// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from a description file to a padded CTC batch.
//
//   description .json lines
//       │
//       ▼
//   JsonLinesCorpus      → parallel (path, duration, text) columns
//       │
//       ▼
//   BatchGenerator       → picks a window of examples per partition
//       │
//       ├── Spectrogram / Mfcc featurizer  (Framer + FFT)
//       ├── Normalizer                     (corpus mean / std)
//       └── CharMap                        (text → label ids)
//       │
//       ▼
//   CtcBatch             → zero / blank padded arrays + lengths
//       │
//       ▼
//   CtcTensorBatch       → burn tensors on the model device
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Generator configuration and feature mode
pub mod config;

/// Reads JSON-lines corpus descriptions
pub mod loader;

/// Character vocabulary for CTC labels
pub mod encoder;

/// Overlapping analysis windows over a sample buffer
pub mod framer;

/// Log power spectrogram featurizer
pub mod spectrogram;

/// MFCC featurizer
pub mod mfcc;

/// Corpus-level feature normalisation
pub mod normalizer;

/// Padded batch assembly
pub mod batch;

/// Duration sort and seeded shuffle over parallel columns
pub mod shuffle;

/// The batch generator: partitions, cursors, featurise + pad
pub mod generator;

/// Single-pass iterator over one partition
pub mod iterator;

/// ndarray batch → burn tensors
pub mod batcher;

#[cfg(test)]
pub(crate) mod test_support;
