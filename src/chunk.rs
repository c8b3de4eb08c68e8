use std::path::Path;

/// One semantically bounded unit of extracted content.
///
/// The variant set is closed: formatting and word counting are exhaustive
/// matches, so there is no "unknown chunk" path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A single function definition with its verbatim source span.
    Function {
        /// Function name
        name: String,
        /// Source lines spanning the definition
        code: String,
    },

    /// A class definition with its source span and direct method names.
    Class {
        /// Class name
        name: String,
        /// Names of the class's immediate methods (no bodies)
        methods: Vec<String>,
        /// Source lines spanning the definition
        code: String,
    },

    /// All inline comments of one source file, in line order.
    Comments(Vec<CommentLine>),

    /// One header-delimited section of a document.
    Section {
        /// Header line, absent for content before the first header
        header: Option<String>,
        /// Section body after markup normalization
        body: String,
    },

    /// Whole-file content for files without a dedicated chunker.
    Blob {
        /// File name
        name: String,
        /// Raw text content
        content: String,
    },
}

/// A single inline comment: source line number and marker-stripped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// 1-indexed source line number
    pub line: usize,
    /// Comment text with the marker and surrounding whitespace stripped
    pub text: String,
}

impl Chunk {
    /// Returns the chunk's word count.
    ///
    /// Counting is whitespace-split and deterministic per variant: code spans
    /// for functions and classes, the sum over comment texts for comment
    /// blocks, the body or content field for sections and blobs.
    #[must_use]
    pub fn word_count(&self) -> usize {
        match self {
            Self::Function { code, .. } | Self::Class { code, .. } => count_words(code),
            Self::Comments(comments) => comments.iter().map(|c| count_words(&c.text)).sum(),
            Self::Section { body, .. } => count_words(body),
            Self::Blob { content, .. } => count_words(content),
        }
    }

    /// Renders the chunk as labeled plain text for accumulation.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Function { name, code } => format!("Function: {name}\nCode:\n{code}"),
            Self::Class { name, code, .. } => format!("Class: {name}\nCode:\n{code}"),
            Self::Comments(comments) => {
                let lines = comments
                    .iter()
                    .map(|c| format!("Line {}: {}", c.line, c.text))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("Comments:\n{lines}")
            }
            Self::Section { header, body } => {
                format!("Header: {}\nContent:\n{}", header.as_deref().unwrap_or(""), body)
            }
            Self::Blob { name, content } => format!("File: {name}\nContent:\n{content}"),
        }
    }
}

/// Output grouping for a file's chunks, derived from its extension.
///
/// Each category owns one accumulator buffer and one output subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCategory {
    /// Python source files
    Python,
    /// Markdown documents
    Markdown,
    /// Everything else
    Other,
}

impl OutputCategory {
    /// All categories, in buffer-index order.
    pub(crate) const ALL: [Self; 3] = [Self::Python, Self::Markdown, Self::Other];

    /// Derives the category from a file path's extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("py") => Self::Python,
            Some("md" | "markdown") => Self::Markdown,
            _ => Self::Other,
        }
    }

    /// Returns the output subdirectory name for this category.
    #[must_use]
    pub const fn subdir(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Markdown => "markdown",
            Self::Other => "other",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Python => 0,
            Self::Markdown => 1,
            Self::Other => 2,
        }
    }
}

#[inline]
fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
