// ============================================================
// Layer 4 - CTC Batch Assembly
// ============================================================
// Stacks variable-length examples into rectangular arrays.
//
// Given N examples with T_i frames and L_i labels:
//
//   features      [N, max T_i, F]   zero beyond row T_i
//   labels        [N, max L_i]      blank beyond column L_i
//   input_lengths [N]               T_i
//   label_lengths [N]               L_i
//   ctc target    [N]               zeros (loss placeholder)
//
// The padded width is the maximum of THIS window, not a global
// maximum, so consecutive batches can differ in shape.
//
// Why zeros for features and blank for labels?
//   A zero frame after normalisation carries no signal, and the
//   true input_lengths tell the loss where each example ends.
//   Labels cannot be padded with 0 because 0 is a real symbol
//   (the apostrophe), so they are padded with the blank id,
//   which never occurs inside an encoded transcript.
//
// Why keep lengths as rank-1 arrays?
//   They are host-side bookkeeping. The burn hand-off
//   (data::batcher) reshapes them to [N, 1] columns on the
//   device.
//
// Example with 2 examples, F = 2, blank = 28:
//
//   example 0: 1 frame,  labels [9]
//   example 1: 3 frames, labels [1, 2, 3]
//
//   features[0] = [[x, x], [0, 0], [0, 0]]   input_lengths = [1, 3]
//   labels      = [[9, 28, 28], [1, 2, 3]]   label_lengths = [1, 3]
//
// Reference: Graves et al. (2006) Connectionist Temporal Classification

use ndarray::{s, Array1, Array2, Array3};

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::FeatureMatrix;

/// One featurized, normalized and encoded example.
#[derive(Debug, Clone)]
pub struct EncodedExample {
    pub features: FeatureMatrix,
    pub labels:   Vec<u32>,
}

/// Model inputs for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcInputs {
    /// [batch, max_time, feature_dim]
    pub features:      Array3<f32>,
    /// [batch, max_label], blank-padded
    pub labels:        Array2<u32>,
    pub input_lengths: Array1<usize>,
    pub label_lengths: Array1<usize>,
}

/// Loss-side placeholder: the CTC loss layer computes its own
/// value, the target is just zeros of the right length.
#[derive(Debug, Clone, PartialEq)]
pub struct CtcTargets {
    pub ctc: Array1<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CtcBatch {
    pub inputs:  CtcInputs,
    pub outputs: CtcTargets,
}

impl CtcBatch {
    pub fn batch_size(&self) -> usize {
        self.inputs.features.shape()[0]
    }

    pub fn max_time(&self) -> usize {
        self.inputs.features.shape()[1]
    }

    pub fn feature_dim(&self) -> usize {
        self.inputs.features.shape()[2]
    }

    pub fn max_label(&self) -> usize {
        self.inputs.labels.ncols()
    }

    /// Fraction of feature rows that are padding.
    pub fn padding_ratio(&self) -> f64 {
        let total = self.batch_size() * self.max_time();
        if total == 0 {
            return 0.0;
        }
        let real: usize = self.inputs.input_lengths.sum();
        1.0 - real as f64 / total as f64
    }

    /// Assemble a batch from already-encoded examples.
    ///
    /// Every example must have `feature_dim` columns.
    pub fn assemble(examples: &[EncodedExample], feature_dim: usize, blank: u32) -> Result<Self> {
        if let Some(bad) = examples.iter().find(|e| e.features.ncols() != feature_dim) {
            return Err(PipelineError::FeatureDimMismatch {
                expected: feature_dim,
                found:    bad.features.ncols(),
            });
        }

        let batch_size = examples.len();
        let max_time   = examples.iter().map(|e| e.features.nrows()).max().unwrap_or(0);
        let max_label  = examples.iter().map(|e| e.labels.len()).max().unwrap_or(0);

        let mut features      = Array3::<f32>::zeros((batch_size, max_time, feature_dim));
        let mut labels        = Array2::<u32>::from_elem((batch_size, max_label), blank);
        let mut input_lengths = Array1::<usize>::zeros(batch_size);
        let mut label_lengths = Array1::<usize>::zeros(batch_size);

        for (i, example) in examples.iter().enumerate() {
            let time = example.features.nrows();
            features.slice_mut(s![i, ..time, ..]).assign(&example.features);
            input_lengths[i] = time;

            let len = example.labels.len();
            labels
                .slice_mut(s![i, ..len])
                .assign(&ndarray::ArrayView1::from(&example.labels[..]));
            label_lengths[i] = len;
        }

        Ok(Self {
            inputs: CtcInputs {
                features,
                labels,
                input_lengths,
                label_lengths,
            },
            outputs: CtcTargets {
                ctc: Array1::zeros(batch_size),
            },
        })
    }
}
