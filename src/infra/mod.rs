// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File-system concerns that the data pipeline uses but should
// not own:
//
//   wav.rs          - WAV decoding to mono f32 via hound
//
//   stats_store.rs  - Normalisation stats + generator config
//                     persisted as JSON, so a later run uses
//                     exactly the statistics fitted earlier
//
//   metrics.rs      - Per-batch CSV report (shapes, padding)
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// WAV decoding
pub mod wav;

/// Normalisation statistics and config persistence
pub mod stats_store;

/// Batch report CSV logger
pub mod metrics;
