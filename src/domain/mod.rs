// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits that define the core concepts:
// what a partition is, what an utterance is, what can go
// wrong, and which collaborators the batch generator needs.
//
// Rules for this layer:
//   - NO burn types here
//   - NO file I/O or audio decoding
//   - Only structs, enums and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Error taxonomy shared by the domain and data layers
pub mod error;

/// Partition selector and the parallel example columns
pub mod partition;

/// Featurizer, LabelEncoder and CorpusIndex abstractions
pub mod traits;
