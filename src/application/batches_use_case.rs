// ============================================================
// Layer 2 - BatchesUseCase
// ============================================================
// Drives the batch pipeline end to end, the way a CTC training
// loop would consume it, without a model attached:
//
//   Step 1: Build generator, load description files (Layer 4)
//   Step 2: Restore normalisation stats if present  (Layer 6)
//   Step 3: Optionally sort train by duration       (Layer 4)
//   Step 4: For each epoch, iterate full batches    (Layer 4)
//           convert to burn tensors, report shapes  (Layer 4/6)
//   Step 5: Reshuffle train/valid between epochs    (Layer 4)
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{Context, Result};
use burn::backend::NdArray;
use std::path::PathBuf;

use crate::data::{
    batcher::CtcBatcher,
    config::GeneratorConfig,
    encoder::CharMap,
    generator::BatchGenerator,
    loader::JsonLinesCorpus,
    normalizer::Normalizer,
};
use crate::domain::partition::Partition;
use crate::infra::{
    metrics::{BatchRecord, BatchReportLogger},
    stats_store::StatsStore,
};

type CpuBackend = NdArray;

#[derive(Debug, Clone)]
pub struct BatchesRequest {
    pub train_desc:  PathBuf,
    pub valid_desc:  Option<PathBuf>,
    pub test_desc:   Option<PathBuf>,
    pub stats_dir:   PathBuf,
    pub partition:   Partition,
    pub epochs:      usize,
    /// Stop each epoch after this many batches
    pub max_batches: Option<usize>,
    pub generator:   GeneratorConfig,
}

#[derive(Debug, Clone, Default)]
pub struct BatchesSummary {
    pub epochs_run:    usize,
    pub total_batches: usize,
    pub total_clips:   usize,
}

pub struct BatchesUseCase {
    request: BatchesRequest,
}

impl BatchesUseCase {
    pub fn new(request: BatchesRequest) -> Self {
        Self { request }
    }

    pub fn execute(&self) -> Result<BatchesSummary> {
        let req = &self.request;

        // ── Step 1: Generator and corpora ─────────────────────────────────────
        let mut generator = BatchGenerator::new(req.generator.clone())
            .context("Invalid generator configuration")?;
        let corpus = JsonLinesCorpus::new(req.generator.max_duration);

        let descs = [
            (Partition::Train, Some(&req.train_desc)),
            (Partition::Valid, req.valid_desc.as_ref()),
            (Partition::Test,  req.test_desc.as_ref()),
        ];
        for (partition, desc) in descs {
            if let Some(path) = desc {
                let n = generator
                    .load_partition(partition, &corpus, path)
                    .with_context(|| format!("Cannot load '{}'", path.display()))?;
                tracing::info!("{} partition: {} clips", partition, n);
            }
        }

        let partition = req.partition;
        if generator.partition(partition).is_empty() {
            anyhow::bail!("No clips loaded for the {} partition", partition);
        }

        // ── Step 2: Normalisation stats ───────────────────────────────────────
        let store = StatsStore::new(&req.stats_dir);
        if store.has_stats() {
            let normalizer = Normalizer::from_stats(store.load_stats()?)?;
            generator
                .set_normalizer(normalizer)
                .context("Stored statistics do not match the feature setup")?;
            tracing::info!("Loaded normalisation stats from '{}'", store.dir().display());

            if let Ok(fitted) = store.load_config() {
                if fitted.feature_mode != req.generator.feature_mode
                    || fitted.feature_dim() != req.generator.feature_dim()
                {
                    tracing::warn!(
                        "Stats were fitted for {:?} ({} dims), running {:?} ({} dims)",
                        fitted.feature_mode,
                        fitted.feature_dim(),
                        req.generator.feature_mode,
                        req.generator.feature_dim()
                    );
                }
            }
        } else {
            tracing::warn!(
                "No stats in '{}', features will not be normalised",
                store.dir().display()
            );
        }

        // ── Step 3: Duration sort ─────────────────────────────────────────────
        if req.generator.sort_by_duration {
            generator.sort_data_by_duration(Partition::Train)?;
            tracing::info!("Sorted train partition by duration for the first epoch");
        }

        // ── Step 4/5: Epoch loop ──────────────────────────────────────────────
        let report  = BatchReportLogger::new(&req.stats_dir)?;
        let batcher = CtcBatcher::<CpuBackend>::new(
            Default::default(),
            generator.feature_dim(),
            generator.blank_id(),
        );
        let chars   = CharMap::new();
        let mut summary = BatchesSummary::default();

        for epoch in 1..=req.epochs {
            let mut iter  = generator.batches(partition);
            let mut count = 0usize;

            while req.max_batches.map_or(true, |m| count < m) {
                let cursor = iter.cursor();
                let Some(batch) = iter
                    .next_batch()
                    .with_context(|| format!("Batch at {} {} failed", partition, cursor))?
                else {
                    break;
                };

                let tensors = batcher.tensors(&batch);
                tracing::info!(
                    "Epoch {} | {} batch {} | features {:?} | labels {:?} | padding {:.1}%",
                    epoch,
                    partition,
                    count + 1,
                    tensors.features.dims(),
                    tensors.labels.dims(),
                    batch.padding_ratio() * 100.0,
                );

                if let Some(first) = batch.inputs.labels.outer_iter().next() {
                    tracing::debug!("First transcript: {:?}", chars.decode(&first.to_vec()));
                }

                report.log(&BatchRecord::from_batch(epoch, partition, cursor, &batch))?;
                summary.total_clips += batch.batch_size();
                count += 1;
            }

            if count == 0 {
                tracing::warn!(
                    "{} partition has {} clips, fewer than one batch of {}",
                    partition,
                    generator.partition(partition).len(),
                    generator.batch_size()
                );
            }
            summary.total_batches += count;
            summary.epochs_run     = epoch;

            if epoch < req.epochs && partition.is_reorderable() {
                generator.shuffle_data_by_partition(partition)?;
            }
        }

        tracing::info!(
            "Done: {} batches ({} clips) over {} epoch(s), report at '{}'",
            summary.total_batches,
            summary.total_clips,
            summary.epochs_run,
            report.csv_path().display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::wav::{sine, write_mono_i16};
    use std::io::Write;
    use std::path::Path;

    fn write_corpus(dir: &Path, name: &str, clips: &[(f32, &str)]) -> PathBuf {
        let desc  = dir.join(name);
        let mut f = std::fs::File::create(&desc).unwrap();
        for (i, (secs, text)) in clips.iter().enumerate() {
            let wav = dir.join(format!("{name}_{i}.wav"));
            write_mono_i16(&wav, &sine(440.0, 16000, *secs), 16000).unwrap();
            writeln!(
                f,
                r#"{{"key": "{}", "duration": {}, "text": "{}"}}"#,
                wav.display(),
                secs,
                text
            )
            .unwrap();
        }
        desc
    }

    fn request(dir: &Path, train_desc: PathBuf) -> BatchesRequest {
        BatchesRequest {
            train_desc,
            valid_desc:  None,
            test_desc:   None,
            stats_dir:   dir.join("stats"),
            partition:   Partition::Train,
            epochs:      2,
            max_batches: None,
            generator:   GeneratorConfig { minimum_batch_size: 2, ..GeneratorConfig::default() },
        }
    }

    #[test]
    fn test_runs_full_batches_over_epochs() {
        let dir  = tempfile::tempdir().unwrap();
        let desc = write_corpus(
            dir.path(),
            "train.json",
            &[(0.2, "one"), (0.3, "two"), (0.25, "three"), (0.1, "four"), (0.15, "five")],
        );

        let summary = BatchesUseCase::new(request(dir.path(), desc)).execute().unwrap();
        assert_eq!(summary.epochs_run, 2);
        assert_eq!(summary.total_batches, 4);
        assert_eq!(summary.total_clips, 8);

        let csv = std::fs::read_to_string(dir.path().join("stats/batch_report.csv")).unwrap();
        assert_eq!(csv.lines().count(), 5);
    }

    #[test]
    fn test_max_batches_caps_each_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let desc = write_corpus(
            dir.path(),
            "train.json",
            &[(0.2, "a"), (0.2, "b"), (0.2, "c"), (0.2, "d")],
        );
        let req = BatchesRequest { max_batches: Some(1), ..request(dir.path(), desc) };

        let summary = BatchesUseCase::new(req).execute().unwrap();
        assert_eq!(summary.total_batches, 2);
    }

    #[test]
    fn test_missing_partition_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let desc = write_corpus(dir.path(), "train.json", &[(0.2, "a"), (0.2, "b")]);
        let req  = BatchesRequest { partition: Partition::Valid, ..request(dir.path(), desc) };

        assert!(BatchesUseCase::new(req).execute().is_err());
    }

    #[test]
    fn test_mismatched_stats_are_rejected() {
        let dir  = tempfile::tempdir().unwrap();
        let desc = write_corpus(dir.path(), "train.json", &[(0.2, "a"), (0.2, "b")]);
        let req  = request(dir.path(), desc);

        StatsStore::new(&req.stats_dir)
            .save_stats(&crate::data::normalizer::NormStats {
                mean: vec![0.0; 13],
                std:  vec![1.0; 13],
            })
            .unwrap();

        let err = BatchesUseCase::new(req).execute().unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }
}
