// ============================================================
// Layer 4 - Batch Iterator
// ============================================================
// One pass over a partition in fixed-size windows.
//
//   has_more()    a full window still fits
//   next_batch()  Ok(Some(batch)) and advance, Ok(None) once
//                 exhausted; a trailing partial window is never
//                 returned
//   reset()       rewind to the start of the partition
//
// The iterator keeps its own cursor, so several passes can run
// over the same generator without touching the generator's
// stored cursors.

use crate::data::{batch::CtcBatch, generator::BatchGenerator};
use crate::domain::{error::Result, partition::Partition};

pub struct BatchIterator<'a> {
    generator: &'a BatchGenerator,
    partition: Partition,
    cursor:    usize,
    /// Set once a batch fails, so `Iterator::next` stops
    failed:    bool,
}

impl<'a> BatchIterator<'a> {
    /// Starts at the generator's stored cursor for `partition`.
    pub fn new(generator: &'a BatchGenerator, partition: Partition) -> Self {
        Self {
            generator,
            partition,
            cursor: generator.cursor(partition),
            failed: false,
        }
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.generator.partition(self.partition).len()
    }

    pub fn has_more(&self) -> bool {
        self.cursor
            .checked_add(self.generator.batch_size())
            .is_some_and(|end| end <= self.len())
    }

    /// Full windows left from the current cursor.
    pub fn remaining_batches(&self) -> usize {
        self.len().saturating_sub(self.cursor) / self.generator.batch_size()
    }

    pub fn next_batch(&mut self) -> Result<Option<CtcBatch>> {
        if !self.has_more() {
            return Ok(None);
        }
        let batch = self.generator.get_batch_at(self.partition, self.cursor)?;
        self.cursor += self.generator.batch_size();
        Ok(Some(batch))
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.failed = false;
    }
}

impl Iterator for BatchIterator<'_> {
    type Item = Result<CtcBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_batch().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}
