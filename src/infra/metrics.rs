// ============================================================
// Layer 6 - Batch Report Logger
// ============================================================
// Appends one CSV row per assembled batch so padding overhead
// can be inspected after a run.
//
// Output file: <dir>/batch_report.csv
//
//   epoch,partition,cursor,batch_size,max_time,max_label,padding_ratio
//   1,train,0,20,812,143,0.412300
//   1,train,20,20,655,120,0.287100
//
// A high padding_ratio means clips of very different lengths
// share a batch; sorting by duration usually brings it down.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::data::batch::CtcBatch;
use crate::domain::partition::Partition;

/// One row of the batch report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub epoch:         usize,
    pub partition:     Partition,
    pub cursor:        usize,
    pub batch_size:    usize,
    pub max_time:      usize,
    pub max_label:     usize,
    pub padding_ratio: f64,
}

impl BatchRecord {
    pub fn from_batch(epoch: usize, partition: Partition, cursor: usize, batch: &CtcBatch) -> Self {
        Self {
            epoch,
            partition,
            cursor,
            batch_size:    batch.batch_size(),
            max_time:      batch.max_time(),
            max_label:     batch.max_label(),
            padding_ratio: batch.padding_ratio(),
        }
    }
}

pub struct BatchReportLogger {
    csv_path: PathBuf,
}

impl BatchReportLogger {
    /// Writes the CSV header if the file does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("batch_report.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,partition,cursor,batch_size,max_time,max_label,padding_ratio")?;
            tracing::debug!("Created batch report: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, r: &BatchRecord) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{},{},{},{},{:.6}",
            r.epoch, r.partition, r.cursor, r.batch_size, r.max_time, r.max_label, r.padding_ratio,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batch::EncodedExample;
    use crate::domain::traits::FeatureMatrix;

    #[test]
    fn test_appends_rows_after_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = BatchReportLogger::new(dir.path()).unwrap();

        let batch = CtcBatch::assemble(
            &[
                EncodedExample { features: FeatureMatrix::zeros((1, 2)), labels: vec![1, 2] },
                EncodedExample { features: FeatureMatrix::zeros((3, 2)), labels: vec![1] },
            ],
            2,
            28,
        )
        .unwrap();
        logger.log(&BatchRecord::from_batch(1, Partition::Train, 0, &batch)).unwrap();
        logger.log(&BatchRecord::from_batch(1, Partition::Train, 2, &batch)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,partition"));
        assert_eq!(lines[1], "1,train,0,2,3,2,0.333333");
    }

    #[test]
    fn test_reopening_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        BatchReportLogger::new(dir.path()).unwrap();
        let logger = BatchReportLogger::new(dir.path()).unwrap();
        let text   = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
