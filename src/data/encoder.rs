// ============================================================
// Layer 4 - Character Label Encoder
// ============================================================
// Maps transcripts to integer label sequences for CTC.
//
// Vocabulary (28 real symbols):
//   '        -> 0
//   <SPACE>  -> 1
//   a .. z   -> 2 .. 27
//
// The CTC blank sits one past the last real code (28) and is
// only ever used for padding; it never appears in an encoded
// transcript. Anything outside the table, uppercase included,
// is rejected rather than silently mapped.

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::LabelEncoder;

const APOSTROPHE: u32 = 0;
const SPACE: u32 = 1;
const FIRST_LETTER: u32 = 2;
const VOCAB_SIZE: usize = 28;

#[derive(Debug, Clone, Copy, Default)]
pub struct CharMap;

impl CharMap {
    pub fn new() -> Self {
        Self
    }

    fn code(c: char) -> Option<u32> {
        match c {
            '\''            => Some(APOSTROPHE),
            ' '             => Some(SPACE),
            'a'..='z'       => Some(FIRST_LETTER + (c as u32 - 'a' as u32)),
            _               => None,
        }
    }

    /// Inverse of `encode`. Blank and out-of-range ids are skipped.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter_map(|&id| match id {
                APOSTROPHE => Some('\''),
                SPACE      => Some(' '),
                id if (FIRST_LETTER..VOCAB_SIZE as u32).contains(&id) => {
                    char::from_u32('a' as u32 + id - FIRST_LETTER)
                }
                _ => None,
            })
            .collect()
    }
}

impl LabelEncoder for CharMap {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        text.chars()
            .map(|c| {
                Self::code(c).ok_or_else(|| PipelineError::UnknownSymbol {
                    symbol: c,
                    text:   text.to_string(),
                })
            })
            .collect()
    }

    fn vocab_size(&self) -> usize {
        VOCAB_SIZE
    }
}
