use crate::error::{Error, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::{debug, warn};

const IGNORE_FILES: &[&str] = &[".gitignore", ".dockerignore"];

/// Exclusion predicate over repository-relative paths.
///
/// Seeded from `.gitignore` and `.dockerignore` at the repository root (when
/// present) plus the configured skip patterns, all in gitignore syntax.
pub(crate) struct ExcludeRules {
    matcher: Gitignore,
}

impl ExcludeRules {
    /// Builds the rules for a repository.
    ///
    /// Malformed lines in the on-disk ignore files are logged and ignored;
    /// an invalid configured pattern is a configuration error.
    pub(crate) fn load(repo_dir: &Path, extra_patterns: &[String]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(repo_dir);

        for ignore_file in IGNORE_FILES {
            let path = repo_dir.join(ignore_file);
            if path.exists() {
                debug!("Loading ignore patterns from {}", path.display());
                if let Some(e) = builder.add(&path) {
                    warn!("Skipping malformed {}: {}", path.display(), e);
                }
            }
        }

        for pattern in extra_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| Error::config(format!("Invalid skip pattern '{pattern}': {e}")))?;
        }

        let matcher = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build ignore rules: {e}")))?;

        Ok(Self { matcher })
    }

    /// Returns true if the repository-relative path is excluded.
    pub(crate) fn is_excluded(&self, relative_path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative_path, is_dir)
            .is_ignore()
    }
}
