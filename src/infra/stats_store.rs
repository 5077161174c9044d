// ============================================================
// Layer 6 - Statistics Store
// ============================================================
// Saves and restores the normalisation statistics together
// with the generator config they were computed under.
//
// Directory layout:
//   stats/
//     norm_stats.json        ← per-dimension mean and std
//     generator_config.json  ← feature setup used to fit them
//
// Stats only make sense for the feature setup they were fitted
// with, so `load_stats` is usually paired with `load_config`
// and a width check in BatchGenerator::set_normalizer.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::config::GeneratorConfig;
use crate::data::normalizer::NormStats;

const STATS_FILE: &str = "norm_stats.json";
const CONFIG_FILE: &str = "generator_config.json";

pub struct StatsStore {
    dir: PathBuf,
}

impl StatsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn has_stats(&self) -> bool {
        self.dir.join(STATS_FILE).exists()
    }

    pub fn save_stats(&self, stats: &NormStats) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(STATS_FILE);
        fs::write(&path, serde_json::to_string_pretty(stats)?)
            .with_context(|| format!("Cannot write stats to '{}'", path.display()))?;

        tracing::debug!("Saved normalisation stats to '{}'", path.display());
        Ok(())
    }

    pub fn load_stats(&self) -> Result<NormStats> {
        let path = self.dir.join(STATS_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read stats from '{}'. Have you run 'fit-stats' first?",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed stats file '{}'", path.display()))
    }

    pub fn save_config(&self, cfg: &GeneratorConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved generator config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<GeneratorConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config file '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path().join("nested"));
        assert!(!store.has_stats());

        let stats = NormStats { mean: vec![0.5, -1.0], std: vec![2.0, 0.25] };
        store.save_stats(&stats).unwrap();

        assert!(store.has_stats());
        assert_eq!(store.load_stats().unwrap(), stats);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path());
        let cfg   = GeneratorConfig { minimum_batch_size: 7, ..GeneratorConfig::default() };

        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_missing_stats_mentions_fit_stats() {
        let dir = tempfile::tempdir().unwrap();
        let err = StatsStore::new(dir.path()).load_stats().unwrap_err();
        assert!(err.to_string().contains("fit-stats"));
    }
}
