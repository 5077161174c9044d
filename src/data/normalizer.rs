// ============================================================
// Layer 4 - Feature Normalizer
// ============================================================
// Centres and scales every feature column with corpus-level
// statistics:
//
//   normalized = (feature - mean) / (std + 1e-14)
//
// The epsilon keeps a column with zero spread finite. Stats
// start neutral (mean 0, std 1) and are replaced either by
// fitting on a sample of training clips or by loading a
// previously saved NormStats file.

use ndarray::{concatenate, Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::FeatureMatrix;

pub const NORM_EPS: f32 = 1e-14;

/// Serialisable form of the statistics, one entry per feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormStats {
    pub mean: Vec<f32>,
    pub std:  Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    mean: Array1<f32>,
    std:  Array1<f32>,
}

impl Normalizer {
    /// Zero mean, unit std: normalisation is the identity (up to eps).
    pub fn neutral(dim: usize) -> Self {
        Self {
            mean: Array1::zeros(dim),
            std:  Array1::ones(dim),
        }
    }

    pub fn from_stats(stats: NormStats) -> Result<Self> {
        if stats.mean.len() != stats.std.len() {
            return Err(PipelineError::FeatureDimMismatch {
                expected: stats.mean.len(),
                found:    stats.std.len(),
            });
        }
        Ok(Self {
            mean: Array1::from(stats.mean),
            std:  Array1::from(stats.std),
        })
    }

    /// Per-column mean and population std over all rows of all
    /// `features`.
    pub fn fit(features: &[FeatureMatrix]) -> Result<Self> {
        let first = features
            .first()
            .ok_or_else(|| PipelineError::EmptyCorpus("no feature matrices to fit".into()))?;
        let dim = first.ncols();

        if let Some(bad) = features.iter().find(|f| f.ncols() != dim) {
            return Err(PipelineError::FeatureDimMismatch {
                expected: dim,
                found:    bad.ncols(),
            });
        }

        let views: Vec<ArrayView2<f32>> = features.iter().map(|f| f.view()).collect();
        let stacked = concatenate(Axis(0), &views).map_err(|e| {
            PipelineError::InvalidArgument(format!("cannot stack feature matrices: {e}"))
        })?;

        let mean = stacked
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::EmptyCorpus("feature matrices have no rows".into()))?;
        let std = stacked.std_axis(Axis(0), 0.0);

        tracing::debug!(
            "Fitted normalizer on {} frames x {} dims",
            stacked.nrows(),
            dim
        );

        Ok(Self { mean, std })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f32> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f32> {
        &self.std
    }

    pub fn to_stats(&self) -> NormStats {
        NormStats {
            mean: self.mean.to_vec(),
            std:  self.std.to_vec(),
        }
    }

    /// Elementwise `(feature - mean) / (std + eps)`, broadcast
    /// across rows. The matrix must have exactly `dim()` columns;
    /// a single column is rejected too, not broadcast.
    pub fn normalize(&self, feature: &FeatureMatrix) -> Result<FeatureMatrix> {
        if feature.ncols() != self.dim() {
            return Err(PipelineError::FeatureDimMismatch {
                expected: self.dim(),
                found:    feature.ncols(),
            });
        }
        let denom = self.std.mapv(|s| s + NORM_EPS);
        Ok((feature - &self.mean) / &denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_neutral_is_identity() {
        let n = Normalizer::neutral(2);
        let x = array![[1.0f32, -2.0], [0.5, 3.0]];
        let y = n.normalize(&x).unwrap();
        for (a, b) in x.iter().zip(y.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fit_then_normalize_is_standardised() {
        let a = array![[1.0f32, 10.0], [3.0, 10.0]];
        let b = array![[5.0f32, 10.0]];
        let n = Normalizer::fit(&[a.clone(), b.clone()]).unwrap();

        assert!((n.mean()[0] - 3.0).abs() < 1e-6);
        assert!((n.mean()[1] - 10.0).abs() < 1e-6);
        // column 1 is constant -> std 0, eps keeps the result finite
        assert_eq!(n.std()[1], 0.0);

        let out = n.normalize(&a).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
        assert!((out[[0, 0]] + 1.224_744_9).abs() < 1e-4);
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn test_renormalizing_with_neutral_stats_is_stable() {
        let raw = array![[2.0f32, 4.0], [6.0, 8.0], [4.0, 0.0]];
        let fitted = Normalizer::fit(&[raw.clone()]).unwrap();
        let once = fitted.normalize(&raw).unwrap();

        // `once` already has mean 0 / std 1 per column
        let twice = Normalizer::neutral(2).normalize(&once).unwrap();
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_fit_rejects_empty() {
        assert!(matches!(Normalizer::fit(&[]), Err(PipelineError::EmptyCorpus(_))));
    }

    #[test]
    fn test_fit_rejects_mixed_widths() {
        let a = FeatureMatrix::zeros((2, 3));
        let b = FeatureMatrix::zeros((2, 4));
        assert!(matches!(
            Normalizer::fit(&[a, b]),
            Err(PipelineError::FeatureDimMismatch { expected: 3, found: 4 })
        ));
    }

    #[test]
    fn test_normalize_rejects_wrong_width() {
        let n = Normalizer::neutral(3);
        // one column would broadcast across all three without the check
        assert!(matches!(
            n.normalize(&FeatureMatrix::from_elem((2, 1), 7.0)),
            Err(PipelineError::FeatureDimMismatch { expected: 3, found: 1 })
        ));
        assert!(matches!(
            n.normalize(&FeatureMatrix::zeros((2, 4))),
            Err(PipelineError::FeatureDimMismatch { expected: 3, found: 4 })
        ));
    }

    #[test]
    fn test_stats_roundtrip() {
        let n = Normalizer::fit(&[array![[1.0f32, 2.0], [3.0, 6.0]]]).unwrap();
        let back = Normalizer::from_stats(n.to_stats()).unwrap();
        assert_eq!(back, n);
    }
}
