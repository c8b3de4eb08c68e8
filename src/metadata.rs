use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Why a file or directory was left out of a run.
///
/// Exclusions and unchanged-file skips are expected outcomes; the remaining
/// variants classify per-file failures so tests can assert on the kind
/// rather than on a message substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Path matched an ignore pattern
    IgnorePattern,
    /// Directory name is in the configured skip list
    SkippedDirectory,
    /// File exceeds the configured size ceiling
    TooLarge {
        /// Actual size in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },
    /// Content digest matches the stored one
    Unchanged,
    /// Content digest could not be computed
    HashFailed(String),
    /// File content looks binary
    Binary,
    /// File could not be read or decoded
    ReadFailed(String),
    /// Structured-source file failed to parse
    ParseFailed(String),
    /// Chunk output could not be written
    WriteFailed(String),
}

impl SkipReason {
    /// Returns true for failure skips, false for expected ones
    /// (exclusions, unchanged files).
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::HashFailed(_) | Self::ReadFailed(_) | Self::ParseFailed(_) | Self::WriteFailed(_)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnorePattern => write!(f, "Matches ignore pattern"),
            Self::SkippedDirectory => write!(f, "Skipped directory"),
            Self::TooLarge { size, limit } => {
                write!(f, "File exceeds size limit ({size} > {limit} bytes)")
            }
            Self::Unchanged => write!(f, "Unchanged file (hash match)"),
            Self::HashFailed(message) => write!(f, "Error computing file hash: {message}"),
            Self::Binary => write!(f, "Binary file"),
            Self::ReadFailed(message) => write!(f, "Error reading file: {message}"),
            Self::ParseFailed(message) => write!(f, "Error parsing file: {message}"),
            Self::WriteFailed(message) => write!(f, "Error writing chunk output: {message}"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-file record of a successful chunking.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    /// Repository-relative path
    pub path: String,
    /// Number of chunks produced
    pub chunks: usize,
    /// File size in bytes
    pub size: u64,
    /// Line count of the file content
    pub lines: usize,
    /// Total word count across the file's chunks
    pub words: usize,
}

/// Per-file record of a skip.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    /// Repository-relative path
    pub path: String,
    /// Why the file was skipped
    pub reason: SkipReason,
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Files successfully chunked this run
    pub total_files_processed: usize,
    /// Words across all chunks of processed files
    pub total_words: usize,
    /// Timestamp set when the metadata is persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// Everything recorded about one run.
///
/// Rebuilt fresh each run; never merged with a previous run's metadata.
#[derive(Debug, Default, Serialize)]
pub struct RunMetadata {
    /// Successfully chunked files, in walk order
    pub processed_files: Vec<ProcessedFile>,
    /// Skipped files and directories with reasons, in walk order
    pub skipped_files: Vec<SkippedFile>,
    /// Aggregate counters
    pub summary: RunSummary,
}

impl RunMetadata {
    /// Records a processed file and folds it into the summary.
    pub(crate) fn record_processed(&mut self, entry: ProcessedFile) {
        self.summary.total_files_processed += 1;
        self.summary.total_words += entry.words;
        self.processed_files.push(entry);
    }

    /// Records a skipped file or directory.
    pub(crate) fn record_skipped(&mut self, path: impl Into<String>, reason: SkipReason) {
        self.skipped_files.push(SkippedFile {
            path: path.into(),
            reason,
        });
    }

    /// Stamps the summary with the current local time.
    pub(crate) fn stamp(&mut self) {
        self.summary.generated_at =
            Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
    }

    /// Writes the metadata to disk as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or serialized.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_processed_updates_summary() {
        let mut metadata = RunMetadata::default();

        metadata.record_processed(ProcessedFile {
            path: "a.py".to_string(),
            chunks: 3,
            size: 120,
            lines: 10,
            words: 40,
        });
        metadata.record_processed(ProcessedFile {
            path: "b.py".to_string(),
            chunks: 1,
            size: 50,
            lines: 4,
            words: 12,
        });

        assert_eq!(metadata.summary.total_files_processed, 2);
        assert_eq!(metadata.summary.total_words, 52);
        assert_eq!(metadata.processed_files.len(), 2);
    }

    #[test]
    fn test_record_skipped_does_not_touch_summary() {
        let mut metadata = RunMetadata::default();
        metadata.record_skipped("vendor/lib.py", SkipReason::IgnorePattern);

        assert_eq!(metadata.summary.total_files_processed, 0);
        assert_eq!(metadata.skipped_files.len(), 1);
        assert_eq!(metadata.skipped_files[0].reason, SkipReason::IgnorePattern);
    }

    #[test]
    fn test_skip_reason_messages() {
        assert_eq!(SkipReason::Unchanged.to_string(), "Unchanged file (hash match)");
        assert_eq!(SkipReason::IgnorePattern.to_string(), "Matches ignore pattern");
        assert_eq!(
            SkipReason::TooLarge { size: 20, limit: 10 }.to_string(),
            "File exceeds size limit (20 > 10 bytes)"
        );
        assert!(
            SkipReason::ParseFailed("bad indent".to_string())
                .to_string()
                .contains("bad indent")
        );
    }

    #[test]
    fn test_failure_classification() {
        assert!(!SkipReason::Unchanged.is_failure());
        assert!(!SkipReason::IgnorePattern.is_failure());
        assert!(!SkipReason::Binary.is_failure());
        assert!(SkipReason::HashFailed("io".to_string()).is_failure());
        assert!(SkipReason::ParseFailed("syntax".to_string()).is_failure());
    }

    #[test]
    fn test_reason_serializes_as_message_string() {
        let skipped = SkippedFile {
            path: "a.py".to_string(),
            reason: SkipReason::Unchanged,
        };

        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["reason"], "Unchanged file (hash match)");
    }

    #[test]
    fn test_metadata_json_shape() {
        let mut metadata = RunMetadata::default();
        metadata.record_processed(ProcessedFile {
            path: "a.py".to_string(),
            chunks: 2,
            size: 10,
            lines: 3,
            words: 5,
        });
        metadata.record_skipped("b.py", SkipReason::Unchanged);

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["processed_files"][0]["path"], "a.py");
        assert_eq!(json["processed_files"][0]["chunks"], 2);
        assert_eq!(json["skipped_files"][0]["reason"], "Unchanged file (hash match)");
        assert_eq!(json["summary"]["total_files_processed"], 1);
        assert_eq!(json["summary"]["total_words"], 5);
    }
}
