// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Two subcommands: `fit-stats` and `batches`. Both share the
// feature flags in FeatureArgs so a batching run can reproduce
// the setup its statistics were fitted under.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::data::config::{FeatureMode, GeneratorConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit per-dimension normalisation stats on training clips
    FitStats(FitStatsArgs),

    /// Assemble CTC batches for a partition and report their shapes
    Batches(BatchesArgs),
}

/// Feature extraction and batching flags shared by both commands.
#[derive(Args, Debug, Clone)]
pub struct FeatureArgs {
    /// Hop between spectrogram windows, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub step: u32,

    /// Spectrogram FFT window, in milliseconds
    #[arg(long, default_value_t = 20)]
    pub window: u32,

    /// Highest spectrogram frequency kept, in Hz
    #[arg(long, default_value_t = 8000)]
    pub max_freq: u32,

    /// Number of cepstral coefficients in MFCC mode
    #[arg(long, default_value_t = 13)]
    pub mfcc_dim: usize,

    /// Clips per batch
    #[arg(long, default_value_t = 20)]
    pub batch_size: usize,

    #[arg(long, value_enum, default_value_t = FeatureMode::Spectrogram)]
    pub features: FeatureMode,

    /// Drop clips longer than this many seconds
    #[arg(long, default_value_t = 10.0)]
    pub max_duration: f64,

    /// Sort the training partition by duration before the first epoch
    #[arg(long)]
    pub sort_by_duration: bool,

    /// Seed for shuffling and stats sampling
    #[arg(long, default_value_t = 123)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<FeatureArgs> for GeneratorConfig {
    fn from(a: FeatureArgs) -> Self {
        GeneratorConfig {
            step_ms:            a.step,
            window_ms:          a.window,
            max_freq:           a.max_freq,
            mfcc_dim:           a.mfcc_dim,
            minimum_batch_size: a.batch_size,
            feature_mode:       a.features,
            max_duration:       a.max_duration,
            sort_by_duration:   a.sort_by_duration,
            seed:               a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct FitStatsArgs {
    /// JSON-lines description file of the training clips
    #[arg(long)]
    pub train_desc: PathBuf,

    /// Where norm_stats.json and generator_config.json are written
    #[arg(long, default_value = "stats")]
    pub out_dir: PathBuf,

    /// Number of training clips sampled for the estimate
    #[arg(long, default_value_t = 100)]
    pub k_samples: usize,

    #[command(flatten)]
    pub feature: FeatureArgs,
}

#[derive(Args, Debug)]
pub struct BatchesArgs {
    #[arg(long)]
    pub train_desc: PathBuf,

    #[arg(long)]
    pub valid_desc: Option<PathBuf>,

    #[arg(long)]
    pub test_desc: Option<PathBuf>,

    /// Directory holding stats from `fit-stats`; the batch report goes here too
    #[arg(long, default_value = "stats")]
    pub stats_dir: PathBuf,

    /// train, valid or test
    #[arg(long, default_value = "train")]
    pub partition: String,

    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// Stop each epoch after this many batches
    #[arg(long)]
    pub max_batches: Option<usize>,

    #[command(flatten)]
    pub feature: FeatureArgs,
}
