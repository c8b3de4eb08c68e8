use crate::accumulator::{Accumulator, FlushPolicy};
use crate::chunk::OutputCategory;
use crate::chunker::{self, ChunkRouter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exclude::ExcludeRules;
use crate::hash::{self, HashIndex};
use crate::markdown;
use crate::metadata::{ProcessedFile, RunMetadata, SkipReason};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

const HASH_INDEX_FILE: &str = "hashes.json";
const METADATA_FILE: &str = "metadata.json";

const BINARY_PROBE_SIZE: usize = 8192;
const ASCII_THRESHOLD: f64 = 0.85;

/// Orchestrates one full repository run.
///
/// Walks the tree sequentially, gates each file through the exclusion rules
/// and the hash index, routes eligible files to their chunker and feeds the
/// results to the accumulator. Every per-file failure is caught at the file
/// boundary and recorded as a skip; the walk itself never aborts on one.
pub struct Pipeline {
    config: Config,
    repo_dir: PathBuf,
    exclude: ExcludeRules,
    router: ChunkRouter,
    accumulator: Accumulator,
    hashes: HashIndex,
    metadata: RunMetadata,
}

impl Pipeline {
    /// Creates a pipeline with the given configuration.
    ///
    /// Loads the persisted hash index (empty when absent) and creates the
    /// output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The output directory cannot be created
    /// - The ignore rules cannot be built
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let repo_dir = fs::canonicalize(&config.repo_dir)
            .map_err(|e| Error::io(&config.repo_dir, e))?;

        fs::create_dir_all(&config.output_dir)
            .map_err(|e| Error::io(&config.output_dir, e))?;

        let exclude = ExcludeRules::load(&repo_dir, &config.skip_patterns)?;
        let router = ChunkRouter::new()?;
        let hashes = HashIndex::load(&config.output_dir.join(HASH_INDEX_FILE));

        let repo_name = repo_dir
            .file_name()
            .map_or_else(|| "repository".to_string(), |name| name.to_string_lossy().into_owned());

        let policy = if config.split_on_files {
            FlushPolicy::PerFile
        } else {
            FlushPolicy::WordBudget {
                max_words: config.max_words,
            }
        };
        let accumulator = Accumulator::new(&config.output_dir, repo_name, policy);

        Ok(Self {
            config,
            repo_dir,
            exclude,
            router,
            accumulator,
            hashes,
            metadata: RunMetadata::default(),
        })
    }

    /// Executes the run and returns its metadata.
    ///
    /// On completion every non-empty buffer is flushed and the metadata and
    /// hash index are persisted best-effort: persistence failures are logged
    /// but never fail the run.
    ///
    /// # Errors
    ///
    /// Only setup-level defects escape; per-file failures are downgraded to
    /// skipped entries.
    pub fn run(mut self) -> Result<RunMetadata> {
        info!("Processing repository: {}", self.repo_dir.display());

        let mut walker = WalkDir::new(&self.repo_dir).follow_links(false).into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {e}");
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let path = entry.path();
            let relative = pathdiff::diff_paths(path, &self.repo_dir)
                .unwrap_or_else(|| path.to_path_buf());
            let rel = relative.to_string_lossy().into_owned();
            let is_dir = entry.file_type().is_dir();

            if self.exclude.is_excluded(&relative, is_dir) {
                debug!("Skipping {rel} due to ignore pattern");
                self.metadata.record_skipped(&rel, SkipReason::IgnorePattern);
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            if is_dir {
                let name = entry.file_name().to_string_lossy();
                if self.config.skip_dirs.iter().any(|dir| dir == name.as_ref()) {
                    debug!("Skipping directory {rel}");
                    self.metadata.record_skipped(&rel, SkipReason::SkippedDirectory);
                    walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    self.metadata
                        .record_skipped(&rel, SkipReason::ReadFailed(e.to_string()));
                    continue;
                }
            };

            if size > self.config.max_file_size {
                debug!("Skipping {rel} due to size ({size} bytes)");
                self.metadata.record_skipped(&rel, SkipReason::TooLarge {
                    size,
                    limit: self.config.max_file_size,
                });
                continue;
            }

            if chunker::is_documentation_file(path) {
                self.process_documentation_file(path, &rel);
            } else {
                self.process_file(path, &rel, size);
            }
        }

        if let Err(e) = self.accumulator.finish() {
            error!("Failed to flush remaining buffers: {e}");
        }

        self.metadata.stamp();
        if let Err(e) = self.metadata.save(&self.config.output_dir.join(METADATA_FILE)) {
            error!("Failed to save metadata: {e}");
        }
        if let Err(e) = self.hashes.save(&self.config.output_dir.join(HASH_INDEX_FILE)) {
            error!("Failed to save hash index: {e}");
        }

        info!(
            "Repository processing complete: {} files processed, {} skipped, {} words",
            self.metadata.summary.total_files_processed,
            self.metadata.skipped_files.len(),
            self.metadata.summary.total_words
        );

        Ok(self.metadata)
    }

    /// Chunks a documentation file into the markdown buffer.
    ///
    /// Documentation files bypass the change gate: they are reprocessed on
    /// every run and never enter the hash index or the processed list.
    fn process_documentation_file(&mut self, path: &Path, rel: &str) {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read documentation file {rel}: {e}");
                self.metadata
                    .record_skipped(rel, SkipReason::ReadFailed(e.to_string()));
                return;
            }
        };

        for chunk in markdown::chunk(&content) {
            if let Err(e) = self.accumulator.append(OutputCategory::Markdown, &chunk, rel) {
                self.metadata
                    .record_skipped(rel, SkipReason::WriteFailed(e.to_string()));
                return;
            }
        }
    }

    /// Gates, chunks and accumulates a single non-documentation file.
    ///
    /// The hash index entry is updated only after chunking and accumulation
    /// succeed, so a failed file is retried on the next run.
    fn process_file(&mut self, path: &Path, rel: &str, size: u64) {
        let digest = match hash::compute_digest(path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!("Failed to hash {rel}: {e}");
                self.metadata
                    .record_skipped(rel, SkipReason::HashFailed(e.to_string()));
                return;
            }
        };

        if self.hashes.matches(rel, &digest) {
            debug!("Skipping unchanged file {rel}");
            self.metadata.record_skipped(rel, SkipReason::Unchanged);
            return;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.metadata
                    .record_skipped(rel, SkipReason::ReadFailed(e.to_string()));
                return;
            }
        };

        if looks_binary(&bytes) {
            debug!("Skipping binary file {rel}");
            self.metadata.record_skipped(rel, SkipReason::Binary);
            return;
        }

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                self.metadata.record_skipped(
                    rel,
                    SkipReason::ReadFailed(Error::invalid_utf8(path).to_string()),
                );
                return;
            }
        };

        let category = OutputCategory::from_path(path);
        let chunks = match self.router.chunk(path, category, &content) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Failed to chunk {rel}: {e}");
                self.metadata
                    .record_skipped(rel, SkipReason::ParseFailed(e.to_string()));
                return;
            }
        };

        let mut words = 0;
        for chunk in &chunks {
            words += chunk.word_count();
            if let Err(e) = self.accumulator.append(category, chunk, rel) {
                self.metadata
                    .record_skipped(rel, SkipReason::WriteFailed(e.to_string()));
                return;
            }
        }

        self.metadata.record_processed(ProcessedFile {
            path: rel.to_string(),
            chunks: chunks.len(),
            size,
            lines: content.lines().count(),
            words,
        });
        self.hashes.insert(rel, digest);
    }
}

/// Probes the first bytes of a file for binary content: a null byte or a
/// low ASCII ratio marks it binary.
fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(BINARY_PROBE_SIZE)];
    if sample.is_empty() {
        return false;
    }

    if memchr::memchr(0, sample).is_some() {
        return true;
    }

    let ascii_count = sample.iter().filter(|&&b| b < 128).count();
    (ascii_count as f64 / sample.len() as f64) < ASCII_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    fn run_pipeline(repo: &Path, out: &Path) -> RunMetadata {
        let config = Config::builder()
            .repo_dir(repo)
            .output_dir(out)
            .build()
            .unwrap();
        Pipeline::new(config).unwrap().run().unwrap()
    }

    #[test]
    fn test_unchanged_file_skipped_on_second_run() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("a.txt").write_str("alpha content").unwrap();
        repo.child("b.txt").write_str("beta content").unwrap();
        let out = temp.child("out");

        let first = run_pipeline(repo.path(), out.path());
        assert_eq!(first.summary.total_files_processed, 2);
        assert!(first.skipped_files.is_empty());

        repo.child("b.txt").write_str("beta content changed").unwrap();

        let second = run_pipeline(repo.path(), out.path());
        assert_eq!(second.summary.total_files_processed, 1);
        assert_eq!(second.processed_files[0].path, "b.txt");
        assert_eq!(second.skipped_files.len(), 1);
        assert_eq!(second.skipped_files[0].path, "a.txt");
        assert_eq!(second.skipped_files[0].reason, SkipReason::Unchanged);
    }

    #[test]
    fn test_fully_unchanged_tree_processes_nothing() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("one.txt").write_str("same").unwrap();
        let out = temp.child("out");

        run_pipeline(repo.path(), out.path());
        let second = run_pipeline(repo.path(), out.path());

        assert_eq!(second.summary.total_files_processed, 0);
        assert!(
            second
                .skipped_files
                .iter()
                .all(|s| s.reason == SkipReason::Unchanged)
        );
    }

    #[test]
    fn test_python_file_chunked_into_python_category() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("app.py")
            .write_str("def main():\n    return 0\n")
            .unwrap();
        let out = temp.child("out");

        let metadata = run_pipeline(repo.path(), out.path());

        assert_eq!(metadata.summary.total_files_processed, 1);
        assert_eq!(metadata.processed_files[0].chunks, 1);

        let text = fs::read_to_string(out.path().join("python/chunk_0.txt")).unwrap();
        assert!(text.contains("Function: main"));
    }

    #[test]
    fn test_documentation_bypasses_change_gate() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("README.md").write_str("# Title\nintro\n").unwrap();
        let out = temp.child("out");

        run_pipeline(repo.path(), out.path());
        let second = run_pipeline(repo.path(), out.path());

        // Reprocessed every run: never skipped, never hashed, never counted
        assert_eq!(second.summary.total_files_processed, 0);
        assert!(second.skipped_files.is_empty());

        let hashes = fs::read_to_string(out.path().join("hashes.json")).unwrap();
        assert!(!hashes.contains("README.md"));

        let text = fs::read_to_string(out.path().join("markdown/chunk_0.txt")).unwrap();
        assert!(text.contains("Header: # Title"));
    }

    #[test]
    fn test_gitignored_file_recorded_and_skipped() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child(".gitignore").write_str("ignored.txt\n").unwrap();
        repo.child("ignored.txt").write_str("nope").unwrap();
        repo.child("kept.txt").write_str("yes").unwrap();
        let out = temp.child("out");

        let metadata = run_pipeline(repo.path(), out.path());

        let ignored = metadata
            .skipped_files
            .iter()
            .find(|s| s.path == "ignored.txt")
            .unwrap();
        assert_eq!(ignored.reason, SkipReason::IgnorePattern);
        assert!(metadata.processed_files.iter().any(|p| p.path == "kept.txt"));
        assert!(metadata.processed_files.iter().all(|p| p.path != "ignored.txt"));
    }

    #[test]
    fn test_skip_dir_is_pruned() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("node_modules/pkg/index.js")
            .write_str("module.exports = 1;")
            .unwrap();
        repo.child("main.txt").write_str("kept").unwrap();
        let out = temp.child("out");

        let metadata = run_pipeline(repo.path(), out.path());

        assert_eq!(metadata.skipped_files.len(), 1);
        assert_eq!(metadata.skipped_files[0].path, "node_modules");
        assert_eq!(metadata.skipped_files[0].reason, SkipReason::SkippedDirectory);
        assert_eq!(metadata.summary.total_files_processed, 1);
    }

    #[test]
    fn test_oversize_file_skipped_with_size_reason() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("big.txt").write_str("0123456789 more bytes").unwrap();
        let out = temp.child("out");

        let config = Config::builder()
            .repo_dir(repo.path())
            .output_dir(out.path())
            .max_file_size(5)
            .build()
            .unwrap();
        let metadata = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(metadata.summary.total_files_processed, 0);
        assert!(matches!(
            metadata.skipped_files[0].reason,
            SkipReason::TooLarge { limit: 5, .. }
        ));
    }

    #[test]
    fn test_binary_file_skipped() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("blob.dat").write_binary(&[0u8, 1, 2, 0, 3]).unwrap();
        let out = temp.child("out");

        let metadata = run_pipeline(repo.path(), out.path());

        assert_eq!(metadata.skipped_files[0].reason, SkipReason::Binary);
        assert_eq!(metadata.summary.total_files_processed, 0);
    }

    #[test]
    fn test_parse_failure_recorded_and_retried() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("bad.py").write_str("def broken(:\n    pass\n").unwrap();
        let out = temp.child("out");

        let first = run_pipeline(repo.path(), out.path());
        assert!(matches!(
            first.skipped_files[0].reason,
            SkipReason::ParseFailed(_)
        ));

        // No hash entry was written, so the next run attempts it again
        let second = run_pipeline(repo.path(), out.path());
        assert!(matches!(
            second.skipped_files[0].reason,
            SkipReason::ParseFailed(_)
        ));
    }

    #[test]
    fn test_structured_file_without_units_counts_as_processed() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("flat.py").write_str("x = 1\n").unwrap();
        let out = temp.child("out");

        let metadata = run_pipeline(repo.path(), out.path());

        assert_eq!(metadata.summary.total_files_processed, 1);
        assert_eq!(metadata.processed_files[0].chunks, 0);
        // Nothing was buffered for it, so no python output file exists
        assert!(!out.path().join("python").exists());
    }

    #[test]
    fn test_metadata_and_hashes_persisted() {
        let temp = TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.create_dir_all().unwrap();
        repo.child("a.txt").write_str("content").unwrap();
        let out = temp.child("out");

        run_pipeline(repo.path(), out.path());

        let metadata = fs::read_to_string(out.path().join("metadata.json")).unwrap();
        assert!(metadata.contains("\"total_files_processed\": 1"));
        assert!(metadata.contains("generated_at"));

        let hashes = fs::read_to_string(out.path().join("hashes.json")).unwrap();
        assert!(hashes.contains("a.txt"));
    }

    #[test]
    fn test_looks_binary() {
        assert!(looks_binary(&[0u8, 1, 2]));
        assert!(!looks_binary(b"plain text here"));
        assert!(!looks_binary(b""));
    }
}
