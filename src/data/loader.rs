// ============================================================
// Layer 4 - Corpus Description Loader
// ============================================================
// Reads a JSON-lines description file, one clip per line:
//
//   {"key": "clips/0001.wav", "duration": 2.35, "text": "hello there"}
//
// and fills the three parallel columns of a PartitionData.
//
// Clips longer than `max_duration` seconds are dropped.
// A malformed line is logged with its line number and skipped;
// only an unreadable file fails the whole load.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use serde::Deserialize;

use crate::domain::error::{PipelineError, Result};
use crate::domain::partition::{PartitionData, Utterance};
use crate::domain::traits::CorpusIndex;

/// On-disk shape of one description line
#[derive(Debug, Deserialize)]
struct DescLine {
    key:      String,
    duration: f64,
    text:     String,
}

/// Loads JSON-lines description files.
/// Implements the CorpusIndex trait from Layer 3.
#[derive(Debug, Clone)]
pub struct JsonLinesCorpus {
    max_duration: f64,
}

impl JsonLinesCorpus {
    pub fn new(max_duration: f64) -> Self {
        Self { max_duration }
    }
}

impl CorpusIndex for JsonLinesCorpus {
    fn load(&self, description_path: &Path) -> Result<PartitionData> {
        let file = File::open(description_path).map_err(|source| PipelineError::Io {
            path: description_path.to_path_buf(),
            source,
        })?;

        let mut data    = PartitionData::new();
        let mut skipped = 0usize;
        let mut too_long = 0usize;

        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| PipelineError::Io {
                path: description_path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<DescLine>(&line) {
                Ok(desc) if desc.duration > self.max_duration => too_long += 1,
                Ok(desc) => data.push(Utterance::new(desc.key, desc.duration, desc.text)),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        "Error reading line #{} of '{}': {}",
                        line_num,
                        description_path.display(),
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Loaded {} clips from '{}' ({} over {}s, {} malformed)",
            data.len(),
            description_path.display(),
            too_long,
            self.max_duration,
            skipped
        );
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_desc(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        f
    }

    #[test]
    fn test_loads_parallel_columns() {
        let f = write_desc(&[
            r#"{"key": "a.wav", "duration": 1.0, "text": "hi"}"#,
            r#"{"key": "b.wav", "duration": 3.0, "text": "hello there"}"#,
        ]);
        let data = JsonLinesCorpus::new(10.0).load(f.path()).unwrap();

        assert_eq!(data.audio_paths(), &["a.wav", "b.wav"]);
        assert_eq!(data.durations(), &[1.0, 3.0]);
        assert_eq!(data.texts(), &["hi", "hello there"]);
    }

    #[test]
    fn test_drops_clips_over_max_duration() {
        let f = write_desc(&[
            r#"{"key": "short.wav", "duration": 4.0, "text": "a"}"#,
            r#"{"key": "long.wav", "duration": 12.5, "text": "b"}"#,
        ]);
        let data = JsonLinesCorpus::new(10.0).load(f.path()).unwrap();
        assert_eq!(data.audio_paths(), &["short.wav"]);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let f = write_desc(&[
            r#"{"key": "a.wav", "duration": 1.0, "text": "ok"}"#,
            "not json at all",
            r#"{"key": "b.wav", "text": "missing duration"}"#,
            "",
            r#"{"key": "c.wav", "duration": 2.0, "text": "fine"}"#,
        ]);
        let data = JsonLinesCorpus::new(10.0).load(f.path()).unwrap();
        assert_eq!(data.audio_paths(), &["a.wav", "c.wav"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = JsonLinesCorpus::new(10.0)
            .load(Path::new("/no/such/corpus.json"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
