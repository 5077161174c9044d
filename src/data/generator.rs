// ============================================================
// Layer 4 - Batch Generator
// ============================================================
// Owns the three partitions, their cursors, the normalisation
// statistics and a seeded RNG, and turns a window of examples
// into a padded CTC batch.
//
// get_batch(partition) at cursor c with batch size N:
//
//   1. for i in c..c+N
//        features_i = normalize(featurize(audio_path_i))
//        labels_i   = encode(text_i)
//   2. max_time  = max rows,  max_label = max label length
//   3. zero-filled [N, max_time, F], blank-filled [N, max_label]
//   4. copy each example into the prefix of its row, record lengths
//
// Why does get_batch never move a cursor?
//   A batch is a pure function of (partition order, cursor,
//   statistics), so the same window can be rebuilt for
//   debugging or evaluation. Cursor movement lives in three
//   explicit places instead:
//
//     cursor / set_cursor   caller-managed position
//     next_batch            advance; at the end wrap to 0 and
//                           reshuffle train / valid
//     batches               BatchIterator, one pass, own cursor
//
// Why one seeded RNG per generator?
//   Shuffles and the normaliser's clip sample both draw from
//   `rng`, seeded from GeneratorConfig::seed. Two generators
//   built from the same config produce identical epoch orders,
//   and nothing depends on process-wide random state.
//
// Why check feature widths here?
//   Featurizers are trait objects, so their output width is
//   only known at run time. Every matrix is checked against
//   feature_dim before it is normalised or padded, and a
//   mismatch fails the whole batch.

use std::path::Path;

use rand::{rngs::StdRng, SeedableRng};

use crate::data::{
    batch::{CtcBatch, EncodedExample},
    config::{FeatureMode, GeneratorConfig},
    encoder::CharMap,
    iterator::BatchIterator,
    mfcc::MfccFeaturizer,
    normalizer::Normalizer,
    shuffle::{shuffle_data, sort_data},
    spectrogram::SpectrogramFeaturizer,
};
use crate::domain::{
    error::{PipelineError, Result},
    partition::{Partition, PartitionData},
    traits::{CorpusIndex, FeatureMatrix, Featurizer, LabelEncoder},
};

pub struct BatchGenerator {
    config:      GeneratorConfig,
    feature_dim: usize,
    spectrogram: Box<dyn Featurizer>,
    cepstral:    Box<dyn Featurizer>,
    encoder:     Box<dyn LabelEncoder>,
    normalizer:  Normalizer,
    /// Indexed by Partition::index()
    partitions:  [PartitionData; 3],
    cursors:     [usize; 3],
    rng:         StdRng,
}

impl BatchGenerator {
    /// Generator backed by the WAV spectrogram / MFCC featurizers
    /// and the character map.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let spectrogram = SpectrogramFeaturizer::from_config(&config);
        let cepstral    = MfccFeaturizer::new(config.mfcc_dim);
        Self::with_collaborators(
            config,
            Box::new(spectrogram),
            Box::new(cepstral),
            Box::new(CharMap::new()),
        )
    }

    pub fn with_collaborators(
        config:      GeneratorConfig,
        spectrogram: Box<dyn Featurizer>,
        cepstral:    Box<dyn Featurizer>,
        encoder:     Box<dyn LabelEncoder>,
    ) -> Result<Self> {
        config.validate()?;
        let feature_dim = config.feature_dim();

        let active = match config.feature_mode {
            FeatureMode::Spectrogram => &spectrogram,
            FeatureMode::Mfcc        => &cepstral,
        };
        if active.feature_dim() != feature_dim {
            return Err(PipelineError::FeatureDimMismatch {
                expected: feature_dim,
                found:    active.feature_dim(),
            });
        }

        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            feature_dim,
            spectrogram,
            cepstral,
            encoder,
            normalizer: Normalizer::neutral(feature_dim),
            partitions: Default::default(),
            cursors:    [0; 3],
            rng,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    pub fn batch_size(&self) -> usize {
        self.config.minimum_batch_size
    }

    pub fn blank_id(&self) -> u32 {
        self.encoder.blank_id()
    }

    // ─── Partition state ──────────────────────────────────────────────────────

    pub fn partition(&self, partition: Partition) -> &PartitionData {
        &self.partitions[partition.index()]
    }

    /// Replace a partition's examples and rewind its cursor.
    pub fn set_partition(&mut self, partition: Partition, data: PartitionData) {
        self.partitions[partition.index()] = data;
        self.cursors[partition.index()] = 0;
    }

    /// Load a description file into `partition`. Returns the number
    /// of clips kept.
    pub fn load_partition(
        &mut self,
        partition: Partition,
        index:     &dyn CorpusIndex,
        path:      &Path,
    ) -> Result<usize> {
        let data = index.load(path)?;
        let len  = data.len();
        self.set_partition(partition, data);
        Ok(len)
    }

    pub fn cursor(&self, partition: Partition) -> usize {
        self.cursors[partition.index()]
    }

    pub fn set_cursor(&mut self, partition: Partition, cursor: usize) {
        self.cursors[partition.index()] = cursor;
    }

    // ─── Normalisation ────────────────────────────────────────────────────────

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn set_normalizer(&mut self, normalizer: Normalizer) -> Result<()> {
        if normalizer.dim() != self.feature_dim {
            return Err(PipelineError::FeatureDimMismatch {
                expected: self.feature_dim,
                found:    normalizer.dim(),
            });
        }
        self.normalizer = normalizer;
        Ok(())
    }

    /// Estimate mean/std from up to `k_samples` training clips drawn
    /// without replacement. Returns how many clips were used.
    pub fn fit_normalizer(&mut self, k_samples: usize) -> Result<usize> {
        let len = self.partition(Partition::Train).len();
        let k   = k_samples.min(len);
        if k == 0 {
            return Err(PipelineError::EmptyCorpus(
                "cannot fit statistics without training clips".into(),
            ));
        }

        let picks = rand::seq::index::sample(&mut self.rng, len, k);
        let train = &self.partitions[Partition::Train.index()];
        let features = picks
            .iter()
            .map(|i| self.featurize_checked(&train.audio_paths()[i]))
            .collect::<Result<Vec<_>>>()?;

        self.normalizer = Normalizer::fit(&features)?;
        tracing::info!("Fitted normalisation statistics on {} training clips", k);
        Ok(k)
    }

    // ─── Featurisation ────────────────────────────────────────────────────────

    /// Raw features for one clip, from whichever featurizer the
    /// configured mode selects. Errors pass through untouched.
    pub fn featurize(&self, audio_path: &str) -> Result<FeatureMatrix> {
        match self.config.feature_mode {
            FeatureMode::Spectrogram => self.spectrogram.extract(audio_path),
            FeatureMode::Mfcc        => self.cepstral.extract(audio_path),
        }
    }

    /// Apply the current statistics. A matrix whose width differs
    /// from the generator's feature dimension is rejected, never
    /// broadcast.
    pub fn normalize(&self, feature: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.normalizer.normalize(feature)
    }

    fn featurize_checked(&self, audio_path: &str) -> Result<FeatureMatrix> {
        let features = self.featurize(audio_path)?;
        if features.ncols() != self.feature_dim {
            return Err(PipelineError::FeatureDimMismatch {
                expected: self.feature_dim,
                found:    features.ncols(),
            });
        }
        Ok(features)
    }

    // ─── Batches ──────────────────────────────────────────────────────────────

    /// Batch starting at the partition's stored cursor.
    pub fn get_batch(&self, partition: Partition) -> Result<CtcBatch> {
        self.get_batch_at(partition, self.cursor(partition))
    }

    /// Batch covering `[cursor, cursor + batch_size)`.
    pub fn get_batch_at(&self, partition: Partition, cursor: usize) -> Result<CtcBatch> {
        let data       = self.partition(partition);
        let batch_size = self.batch_size();

        let end = cursor
            .checked_add(batch_size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| PipelineError::WindowOutOfRange {
                partition: partition.to_string(),
                cursor,
                batch_size,
                len: data.len(),
            })?;

        let examples = (cursor..end)
            .map(|i| {
                let features = self.normalize(&self.featurize_checked(&data.audio_paths()[i])?)?;
                let labels   = self.encoder.encode(&data.texts()[i])?;
                Ok(EncodedExample { features, labels })
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = CtcBatch::assemble(&examples, self.feature_dim, self.blank_id())?;
        tracing::debug!(
            "{} batch at {}: features {:?}, labels {:?}",
            partition,
            cursor,
            batch.inputs.features.shape(),
            batch.inputs.labels.shape()
        );
        Ok(batch)
    }

    /// Batch at the stored cursor, then advance it. When no further
    /// full window fits, the cursor wraps to 0 and train / valid
    /// are reshuffled for the next epoch.
    pub fn next_batch(&mut self, partition: Partition) -> Result<CtcBatch> {
        let batch = self.get_batch(partition)?;

        let len  = self.partition(partition).len();
        let next = self.cursor(partition) + self.batch_size();
        if next + self.batch_size() > len {
            self.set_cursor(partition, 0);
            if partition.is_reorderable() {
                self.shuffle_data_by_partition(partition)?;
            }
        } else {
            self.set_cursor(partition, next);
        }
        Ok(batch)
    }

    /// Single pass over `partition`, starting at its stored cursor.
    pub fn batches(&self, partition: Partition) -> BatchIterator<'_> {
        BatchIterator::new(self, partition)
    }

    // ─── Reordering ───────────────────────────────────────────────────────────

    /// Apply one fresh random permutation to train or valid.
    pub fn shuffle_data_by_partition(&mut self, partition: Partition) -> Result<()> {
        ensure_reorderable(partition, "shuffle")?;
        shuffle_data(&mut self.partitions[partition.index()], &mut self.rng)?;
        tracing::debug!("Shuffled {} partition", partition);
        Ok(())
    }

    /// Stable ascending sort of train or valid by clip duration.
    pub fn sort_data_by_duration(&mut self, partition: Partition) -> Result<()> {
        ensure_reorderable(partition, "sort")?;
        sort_data(&mut self.partitions[partition.index()])?;
        tracing::debug!("Sorted {} partition by duration", partition);
        Ok(())
    }
}

fn ensure_reorderable(partition: Partition, action: &str) -> Result<()> {
    if partition.is_reorderable() {
        Ok(())
    } else {
        Err(PipelineError::InvalidArgument(format!(
            "cannot {action} partition '{partition}', must be train or valid"
        )))
    }
}
