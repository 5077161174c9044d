// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Coordinates the data pipeline (Layer 4) and storage (Layer 6)
// for the two CLI workflows. No feature math lives here and no
// output is printed; the CLI layer reports results.
//
//   fit_stats_use_case  fit normalisation stats on train clips
//   batches_use_case    run epochs of CTC batches and report them

pub mod fit_stats_use_case;

pub mod batches_use_case;
