// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes to Layer 2. Only this
// layer prints to stdout.
//
//   1. `fit-stats` - fit normalisation stats on training clips
//   2. `batches`   - run epochs of CTC batches over a partition
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BatchesArgs, Commands, FitStatsArgs};

use crate::domain::partition::Partition;

#[derive(Parser, Debug)]
#[command(
    name = "speech-ctc-batcher",
    version = "0.1.0",
    about = "Featurize speech clips and assemble padded CTC training batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::FitStats(args) => run_fit_stats(args),
            Commands::Batches(args)  => run_batches(args),
        }
    }
}

fn run_fit_stats(args: FitStatsArgs) -> Result<()> {
    use crate::application::fit_stats_use_case::{FitStatsRequest, FitStatsUseCase};

    tracing::info!("Fitting stats on: {}", args.train_desc.display());

    let out_dir  = args.out_dir.clone();
    let use_case = FitStatsUseCase::new(FitStatsRequest {
        train_desc: args.train_desc,
        out_dir:    args.out_dir,
        k_samples:  args.k_samples,
        generator:  args.feature.into(),
    });
    let summary = use_case.execute()?;

    println!(
        "Fitted {}-dim stats on {} of {} training clips. Saved to {}",
        summary.feature_dim,
        summary.sampled_clips,
        summary.train_clips,
        out_dir.display()
    );
    Ok(())
}

fn run_batches(args: BatchesArgs) -> Result<()> {
    use crate::application::batches_use_case::{BatchesRequest, BatchesUseCase};

    let partition: Partition = args.partition.parse()?;

    let use_case = BatchesUseCase::new(BatchesRequest {
        train_desc:  args.train_desc,
        valid_desc:  args.valid_desc,
        test_desc:   args.test_desc,
        stats_dir:   args.stats_dir,
        partition,
        epochs:      args.epochs,
        max_batches: args.max_batches,
        generator:   args.feature.into(),
    });
    let summary = use_case.execute()?;

    println!(
        "{} batches ({} clips) from the {} partition over {} epoch(s).",
        summary.total_batches, summary.total_clips, partition, summary.epochs_run
    );
    Ok(())
}
