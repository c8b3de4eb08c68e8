use crate::chunk::{Chunk, OutputCategory};
use crate::error::Result;
use crate::markdown;
use crate::python::PythonChunker;
use std::path::Path;

/// Conventional top-level documentation filenames.
///
/// These are always routed through the section chunker, whatever their
/// extension, and are reprocessed on every run.
const DOC_FILENAMES: &[&str] = &["README.md", "README.rst", "CONTRIBUTING.md", "CHANGELOG.md"];

/// Returns true if the file is recognized as documentation by name.
pub(crate) fn is_documentation_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| DOC_FILENAMES.contains(&name))
}

/// Selects and runs the chunker matching a file's category.
pub(crate) struct ChunkRouter {
    python: PythonChunker,
}

impl ChunkRouter {
    /// Creates a router with its per-language chunkers initialized.
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            python: PythonChunker::new()?,
        })
    }

    /// Chunks `content` according to the file's category.
    ///
    /// # Errors
    ///
    /// Returns a parse error for structured-source files with syntax errors;
    /// the other chunkers are infallible on in-memory text.
    pub(crate) fn chunk(
        &mut self,
        path: &Path,
        category: OutputCategory,
        content: &str,
    ) -> Result<Vec<Chunk>> {
        match category {
            OutputCategory::Python => self.python.chunk(path, content),
            OutputCategory::Markdown => Ok(markdown::chunk(content)),
            OutputCategory::Other => Ok(vec![whole_file(path, content)]),
        }
    }
}

/// Wraps a file's full content as a single whole-file chunk.
pub(crate) fn whole_file(path: &Path, content: &str) -> Chunk {
    Chunk::Blob {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content: content.to_string(),
    }
}
