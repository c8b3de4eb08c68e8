use crate::chunk::{Chunk, OutputCategory};
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Batching policy for accumulated chunk text, selected at configuration
/// time. The two policies are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushPolicy {
    /// Flush before an append would push the buffer past the word budget.
    /// A single chunk larger than the budget is still appended whole and
    /// triggers the next flush by itself.
    WordBudget {
        /// Maximum words per output file
        max_words: usize,
    },
    /// Flush whenever the originating file changes; each output file starts
    /// with a header naming the repository and source path. No word budget.
    PerFile,
}

/// Transient per-category buffer state.
#[derive(Debug, Default)]
struct Buffer {
    text: String,
    word_count: usize,
    current_file: Option<String>,
    counter: usize,
}

/// Buffers rendered chunk text per output category and writes numbered
/// `chunk_<n>.txt` files under the category's subdirectory.
pub(crate) struct Accumulator {
    output_dir: PathBuf,
    repo_name: String,
    policy: FlushPolicy,
    buffers: [Buffer; OutputCategory::ALL.len()],
}

impl Accumulator {
    /// Creates an accumulator with empty buffers for every category.
    pub(crate) fn new(
        output_dir: impl Into<PathBuf>,
        repo_name: impl Into<String>,
        policy: FlushPolicy,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            repo_name: repo_name.into(),
            policy,
            buffers: Default::default(),
        }
    }

    /// Appends a chunk's rendered text to the category's buffer, flushing
    /// first when the active policy requires it.
    ///
    /// `source` is the repository-relative path of the originating file.
    ///
    /// # Errors
    ///
    /// Returns an error if a triggered flush fails to write.
    pub(crate) fn append(
        &mut self,
        category: OutputCategory,
        chunk: &Chunk,
        source: &str,
    ) -> Result<()> {
        let words = chunk.word_count();

        match self.policy {
            FlushPolicy::WordBudget { max_words } => {
                if self.buffers[category.index()].word_count + words > max_words {
                    self.flush(category)?;
                }
            }
            FlushPolicy::PerFile => {
                let owner = self.buffers[category.index()].current_file.as_deref();
                if owner != Some(source) {
                    self.flush(category)?;

                    let buffer = &mut self.buffers[category.index()];
                    buffer.text.push_str(&format!(
                        "Repository: {}\nFile Path: {}\n{}\n\n",
                        self.repo_name,
                        source,
                        "=".repeat(50)
                    ));
                    buffer.current_file = Some(source.to_string());
                }
            }
        }

        let buffer = &mut self.buffers[category.index()];
        buffer.text.push_str(&chunk.render());
        buffer.text.push_str("\n\n");
        buffer.word_count += words;

        Ok(())
    }

    /// Writes the category's buffer to the next numbered output file and
    /// resets it. No-op if the buffer is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory or file cannot be written.
    pub(crate) fn flush(&mut self, category: OutputCategory) -> Result<()> {
        let buffer = &mut self.buffers[category.index()];
        if buffer.text.is_empty() {
            return Ok(());
        }

        let dir = self.output_dir.join(category.subdir());
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let path = dir.join(format!("chunk_{}.txt", buffer.counter));
        fs::write(&path, &buffer.text).map_err(|e| Error::io(&path, e))?;

        debug!(
            "Saved {} words to {}",
            buffer.word_count,
            path.display()
        );

        buffer.counter += 1;
        buffer.text.clear();
        buffer.word_count = 0;
        buffer.current_file = None;

        Ok(())
    }

    /// Flushes every non-empty buffer at end of run.
    ///
    /// # Errors
    ///
    /// Returns the first write error encountered.
    pub(crate) fn finish(&mut self) -> Result<()> {
        for category in OutputCategory::ALL {
            self.flush(category)?;
        }
        Ok(())
    }
}
