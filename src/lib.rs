//! # ragprep
//!
//! A library for converting code repositories into retrieval-ready text
//! chunks.
//!
//! ## Features
//!
//! - Semantic chunking of Python sources (functions, classes, comments)
//!   via tree-sitter
//! - Header-based section chunking of Markdown with embedded-markup cleanup
//! - Word-budget or per-file output batching
//! - Incremental runs: unchanged files are skipped by content hash
//! - `.gitignore` / `.dockerignore` aware exclusion
//!
//! ## Quick Start
//!
//! ```no_run
//! use ragprep::{Config, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .repo_dir("./my-repo")
//!     .output_dir("./chunks")
//!     .max_words(100_000)
//!     .build()?;
//!
//! let metadata = Pipeline::new(config)?.run()?;
//! println!("processed {} files", metadata.summary.total_files_processed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a single-pass pipeline:
//! 1. **Walk**: Traverses the tree sequentially, applying exclusion rules
//! 2. **Gate**: Skips files whose content hash is unchanged since last run
//! 3. **Chunk**: Splits each file into semantic units by file type
//! 4. **Accumulate**: Batches rendered units into numbered output files

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod accumulator;
mod chunk;
mod chunker;
mod config;
mod error;
mod exclude;
mod hash;
mod markdown;
mod metadata;
mod pipeline;
mod python;

pub use chunk::{Chunk, CommentLine, OutputCategory};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use metadata::{ProcessedFile, RunMetadata, RunSummary, SkipReason, SkippedFile};
pub use pipeline::Pipeline;

/// Runs the complete chunking pipeline with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The repository directory doesn't exist or is inaccessible
/// - The output directory cannot be created
///
/// Per-file failures never abort the run; they appear as skipped entries in
/// the returned metadata.
///
/// # Examples
///
/// ```no_run
/// use ragprep::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .repo_dir(".")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<RunMetadata> {
    Pipeline::new(config)?.run()
}
