// ============================================================
// Layer 3 - Partitions and Utterances
// ============================================================
// A corpus is split into three disjoint pools: train, valid
// and test. Each pool stores its examples as three parallel
// sequences (audio path, duration, transcript). Any reordering
// must move all three together, so the only way to reorder a
// PartitionData is `permute`, which takes one index list and
// applies it to every column.
//
// Reference: Rust Book §6 (Enums), §8 (Vectors)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

/// One of the three example pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Valid,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Valid, Partition::Test];

    /// Stable slot used to index per-partition state arrays
    pub fn index(self) -> usize {
        match self {
            Partition::Train => 0,
            Partition::Valid => 1,
            Partition::Test  => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Valid => "valid",
            Partition::Test  => "test",
        }
    }

    /// Only train and valid may be reordered between epochs.
    pub fn is_reorderable(self) -> bool {
        !matches!(self, Partition::Test)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Partition {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Partition::Train),
            "valid" => Ok(Partition::Valid),
            "test"  => Ok(Partition::Test),
            other   => Err(PipelineError::InvalidArgument(format!(
                "invalid partition '{other}', must be train, valid or test"
            ))),
        }
    }
}

/// A single labelled clip, as stored in a description file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub audio_path: String,
    pub duration:   f64,
    pub text:       String,
}

impl Utterance {
    pub fn new(audio_path: impl Into<String>, duration: f64, text: impl Into<String>) -> Self {
        Self {
            audio_path: audio_path.into(),
            duration,
            text: text.into(),
        }
    }
}

/// Three parallel columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionData {
    audio_paths: Vec<String>,
    durations:   Vec<f64>,
    texts:       Vec<String>,
}

impl PartitionData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one example to all three columns.
    pub fn push(&mut self, utterance: Utterance) {
        self.audio_paths.push(utterance.audio_path);
        self.durations.push(utterance.duration);
        self.texts.push(utterance.text);
    }

    pub fn len(&self) -> usize {
        self.audio_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio_paths.is_empty()
    }

    pub fn audio_paths(&self) -> &[String] {
        &self.audio_paths
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Owned copy of the example at `index`, if any.
    pub fn utterance(&self, index: usize) -> Option<Utterance> {
        Some(Utterance {
            audio_path: self.audio_paths.get(index)?.clone(),
            duration:   *self.durations.get(index)?,
            text:       self.texts.get(index)?.clone(),
        })
    }

    pub fn utterances(&self) -> impl Iterator<Item = Utterance> + '_ {
        (0..self.len()).filter_map(|i| self.utterance(i))
    }

    /// Reorder all three columns so that new position `i` holds
    /// the example previously at `order[i]`.
    ///
    /// `order` must be a permutation of `0..len()`.
    pub fn permute(&mut self, order: &[usize]) -> Result<()> {
        if !is_permutation(order, self.len()) {
            return Err(PipelineError::InvalidArgument(format!(
                "reorder index list of length {} is not a permutation of {} examples",
                order.len(),
                self.len()
            )));
        }

        self.audio_paths = order.iter().map(|&i| self.audio_paths[i].clone()).collect();
        self.durations   = order.iter().map(|&i| self.durations[i]).collect();
        self.texts       = order.iter().map(|&i| self.texts[i].clone()).collect();
        Ok(())
    }
}

impl FromIterator<Utterance> for PartitionData {
    fn from_iter<I: IntoIterator<Item = Utterance>>(iter: I) -> Self {
        let mut data = PartitionData::new();
        for u in iter {
            data.push(u);
        }
        data
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in order {
        if i >= len || seen[i] {
            return false;
        }
        seen[i] = true;
    }
    true
}
