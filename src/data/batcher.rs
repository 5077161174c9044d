// ============================================================
// Layer 4 - CTC Batcher
// ============================================================
// Implements Burn's Batcher trait to turn encoded examples into
// device tensors for a CTC model.
//
// What does it produce?
//
//   features       [batch, max_time, feature_dim]  Float
//   labels         [batch, max_label]              Int
//   input_lengths  [batch, 1]                      Int
//   label_lengths  [batch, 1]                      Int
//   ctc_target     [batch, 1]                      Float (zeros)
//
//   The length vectors and the loss target are column tensors,
//   one row per example, which is the layout CTC loss layers
//   take their per-example lengths in.
//
// How batching works here:
//   Padding is done on the host by CtcBatch::assemble (zero
//   feature rows, blank labels). The batcher then flattens each
//   ndarray in row-major order and reshapes it on the device:
//   [e1_t1_f1, e1_t1_f2, ..., eN_tT_fF] → [N, T, F]
//
// BatchGenerator already hands out assembled CtcBatch values,
// so the batches command goes through `tensors`; `batch` is the
// DataLoader entry point for raw examples.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::batch::{CtcBatch, EncodedExample};
use crate::domain::error::Result;

// ─── CtcTensorBatch ───────────────────────────────────────────────────────────
/// One CTC batch on the device. All tensors have batch_size as
/// their first dimension.
#[derive(Debug, Clone)]
pub struct CtcTensorBatch<B: Backend> {
    pub features:      Tensor<B, 3>,
    pub labels:        Tensor<B, 2, Int>,
    pub input_lengths: Tensor<B, 2, Int>,
    pub label_lengths: Tensor<B, 2, Int>,
    pub ctc_target:    Tensor<B, 2>,
}

// ─── CtcBatcher ───────────────────────────────────────────────────────────────
/// Holds the target device plus what padding needs to know:
/// the feature width and the blank label id.
#[derive(Clone, Debug)]
pub struct CtcBatcher<B: Backend> {
    pub device:  B::Device,
    feature_dim: usize,
    blank:       u32,
}

impl<B: Backend> CtcBatcher<B> {
    pub fn new(device: B::Device, feature_dim: usize, blank: u32) -> Self {
        Self { device, feature_dim, blank }
    }

    /// Pad `items` and move them to the device. Fails if any
    /// example has the wrong feature width.
    pub fn try_batch(&self, items: Vec<EncodedExample>) -> Result<CtcTensorBatch<B>> {
        let batch = CtcBatch::assemble(&items, self.feature_dim, self.blank)?;
        Ok(self.tensors(&batch))
    }

    /// Move an already assembled batch to the device.
    pub fn tensors(&self, batch: &CtcBatch) -> CtcTensorBatch<B> {
        let batch_size  = batch.batch_size();
        let max_time    = batch.max_time();
        let feature_dim = batch.feature_dim();
        let max_label   = batch.max_label();

        // ── Flatten in row-major order ────────────────────────────────────────
        // Burn uses i32 for Int tensor data
        let feature_flat: Vec<f32> = batch.inputs.features.iter().copied().collect();
        let label_flat: Vec<i32> = batch.inputs.labels.iter().map(|&x| x as i32).collect();
        let input_lens: Vec<i32> = batch.inputs.input_lengths.iter().map(|&x| x as i32).collect();
        let label_lens: Vec<i32> = batch.inputs.label_lengths.iter().map(|&x| x as i32).collect();
        let target: Vec<f32> = batch.outputs.ctc.to_vec();

        // ── Create tensors, then reshape ──────────────────────────────────────
        let features = Tensor::<B, 1>::from_floats(feature_flat.as_slice(), &self.device)
            .reshape([batch_size, max_time, feature_dim]);

        let labels = Tensor::<B, 1, Int>::from_ints(label_flat.as_slice(), &self.device)
            .reshape([batch_size, max_label]);

        let input_lengths = Tensor::<B, 1, Int>::from_ints(input_lens.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let label_lengths = Tensor::<B, 1, Int>::from_ints(label_lens.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let ctc_target = Tensor::<B, 1>::from_floats(target.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        CtcTensorBatch {
            features,
            labels,
            input_lengths,
            label_lengths,
            ctc_target,
        }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// Makes CtcBatcher usable with Burn's DataLoader, which calls
// .batch(items) with each mini-batch of examples.
impl<B: Backend> Batcher<EncodedExample, CtcTensorBatch<B>> for CtcBatcher<B> {
    /// # Panics
    /// Panics if an example's feature width differs from the
    /// batcher's. The trait has no error channel; use `try_batch`
    /// where the width is not already guaranteed.
    fn batch(&self, items: Vec<EncodedExample>) -> CtcTensorBatch<B> {
        match self.try_batch(items) {
            Ok(batch) => batch,
            Err(e)    => panic!("cannot batch CTC examples: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::FeatureMatrix;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn batcher(feature_dim: usize) -> CtcBatcher<TestBackend> {
        CtcBatcher::new(Default::default(), feature_dim, 28)
    }

    #[test]
    fn test_tensor_shapes_match_batch() {
        let examples = vec![
            EncodedExample { features: FeatureMatrix::from_elem((2, 3), 1.0), labels: vec![4, 5, 6] },
            EncodedExample { features: FeatureMatrix::from_elem((4, 3), 2.0), labels: vec![7] },
        ];
        let t = batcher(3).batch(examples);

        assert_eq!(t.features.dims(), [2, 4, 3]);
        assert_eq!(t.labels.dims(), [2, 3]);
        assert_eq!(t.input_lengths.dims(), [2, 1]);
        assert_eq!(t.label_lengths.dims(), [2, 1]);
        assert_eq!(t.ctc_target.dims(), [2, 1]);

        let labels: Vec<i64> = t.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![4, 5, 6, 7, 28, 28]);

        let lens: Vec<i64> = t.input_lengths.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(lens, vec![2, 4]);

        let label_lens: Vec<i64> = t.label_lengths.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(label_lens, vec![3, 1]);
    }

    #[test]
    fn test_padding_survives_conversion() {
        let examples = vec![
            EncodedExample { features: FeatureMatrix::from_elem((1, 2), 3.0), labels: vec![1] },
            EncodedExample { features: FeatureMatrix::from_elem((3, 2), 3.0), labels: vec![1] },
        ];
        let t      = batcher(2).batch(examples);
        let values: Vec<f32> = t.features.into_data().to_vec().unwrap();

        // example 0: one real row then two zero rows
        assert_eq!(&values[..6], &[3.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_tensors_from_assembled_batch() {
        let batch = CtcBatch::assemble(
            &[EncodedExample { features: FeatureMatrix::zeros((5, 2)), labels: vec![2, 3] }],
            2,
            28,
        )
        .unwrap();
        let t = batcher(2).tensors(&batch);

        assert_eq!(t.features.dims(), [1, 5, 2]);
        assert_eq!(t.input_lengths.dims(), [1, 1]);
        let target: Vec<f32> = t.ctc_target.into_data().to_vec().unwrap();
        assert_eq!(target, vec![0.0]);
    }

    #[test]
    fn test_try_batch_rejects_wrong_width() {
        let examples = vec![EncodedExample { features: FeatureMatrix::zeros((2, 4)), labels: vec![1] }];
        assert!(batcher(3).try_batch(examples).is_err());
    }
}
