// ============================================================
// Layer 2 - FitStatsUseCase
// ============================================================
// Estimates feature normalisation statistics from the training
// corpus and stores them for later batching runs:
//
//   Step 1: Validate config and build the generator  (Layer 4)
//   Step 2: Load the training description file       (Layer 4)
//   Step 3: Featurize a random sample of clips, fit  (Layer 4)
//   Step 4: Save stats + config as JSON              (Layer 6)

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::data::{config::GeneratorConfig, generator::BatchGenerator, loader::JsonLinesCorpus};
use crate::domain::partition::Partition;
use crate::infra::stats_store::StatsStore;

#[derive(Debug, Clone)]
pub struct FitStatsRequest {
    pub train_desc: PathBuf,
    pub out_dir:    PathBuf,
    pub k_samples:  usize,
    pub generator:  GeneratorConfig,
}

/// What a run produced, for the CLI to report.
#[derive(Debug, Clone)]
pub struct FitStatsSummary {
    pub train_clips:   usize,
    pub sampled_clips: usize,
    pub feature_dim:   usize,
}

pub struct FitStatsUseCase {
    request: FitStatsRequest,
}

impl FitStatsUseCase {
    pub fn new(request: FitStatsRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<FitStatsSummary> {
        let req = &self.request;

        // ── Step 1: Generator ─────────────────────────────────────────────────
        let mut generator = BatchGenerator::new(req.generator.clone())
            .context("Invalid generator configuration")?;

        // ── Step 2: Training corpus ───────────────────────────────────────────
        let corpus      = JsonLinesCorpus::new(req.generator.max_duration);
        let train_clips = generator
            .load_partition(Partition::Train, &corpus, &req.train_desc)
            .with_context(|| format!("Cannot load '{}'", req.train_desc.display()))?;

        // ── Step 3: Fit ───────────────────────────────────────────────────────
        let sampled_clips = generator
            .fit_normalizer(req.k_samples)
            .context("Failed to fit normalisation statistics")?;

        // ── Step 4: Persist ───────────────────────────────────────────────────
        let store = StatsStore::new(&req.out_dir);
        store.save_stats(&generator.normalizer().to_stats())?;
        store.save_config(generator.config())?;

        tracing::info!(
            "Saved {}-dim statistics from {} of {} clips to '{}'",
            generator.feature_dim(),
            sampled_clips,
            train_clips,
            store.dir().display()
        );

        Ok(FitStatsSummary {
            train_clips,
            sampled_clips,
            feature_dim: generator.feature_dim(),
        })
    }
}
