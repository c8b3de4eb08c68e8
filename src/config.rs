use crate::error::{Error, Result};
use std::path::PathBuf;

const DEFAULT_MAX_WORDS: usize = 200_000;
const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_SKIP_PATTERNS: &[&str] = &[".git"];
const DEFAULT_SKIP_DIRS: &[&str] = &["node_modules", "__pycache__"];

/// Configuration for the ragprep pipeline.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Root directory of the repository to process
    pub repo_dir: PathBuf,

    /// Output directory for chunk files and run artifacts
    pub output_dir: PathBuf,

    /// Maximum words per accumulated output file (word-budget policy)
    pub max_words: usize,

    /// Maximum file size in bytes; larger files are skipped
    pub max_file_size: u64,

    /// Additional ignore patterns (gitignore syntax), applied on top of
    /// `.gitignore` / `.dockerignore`
    pub skip_patterns: Vec<String>,

    /// Directory names pruned from the walk
    pub skip_dirs: Vec<String>,

    /// Group output by source file instead of by word budget
    pub split_on_files: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use ragprep::Config;
    ///
    /// let config = Config::builder()
    ///     .repo_dir(".")
    ///     .max_words(50_000)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Repository directory doesn't exist or is not a directory
    /// - Word budget is zero
    pub fn validate(&self) -> Result<()> {
        if !self.repo_dir.exists() {
            return Err(Error::config(format!(
                "Repository directory does not exist: {}",
                self.repo_dir.display()
            )));
        }

        if !self.repo_dir.is_dir() {
            return Err(Error::config(format!(
                "Repository path is not a directory: {}",
                self.repo_dir.display()
            )));
        }

        if self.max_words == 0 {
            return Err(Error::config("max_words must be greater than 0"));
        }

        if self.max_file_size == 0 {
            return Err(Error::config("max_file_size must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            output_dir: PathBuf::from("out"),
            max_words: DEFAULT_MAX_WORDS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            skip_patterns: DEFAULT_SKIP_PATTERNS.iter().map(ToString::to_string).collect(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(ToString::to_string).collect(),
            split_on_files: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    repo_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    max_words: Option<usize>,
    max_file_size: Option<u64>,
    skip_patterns: Option<Vec<String>>,
    skip_dirs: Option<Vec<String>>,
    split_on_files: bool,
}

impl ConfigBuilder {
    /// Sets the repository directory to process.
    #[must_use]
    pub fn repo_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_dir = Some(path.into());
        self
    }

    /// Sets the output directory for chunk files.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the maximum words per accumulated output file.
    #[must_use]
    pub fn max_words(mut self, words: usize) -> Self {
        self.max_words = Some(words);
        self
    }

    /// Sets the maximum processable file size in bytes.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Sets additional ignore patterns (gitignore syntax).
    #[must_use]
    pub fn skip_patterns(mut self, patterns: Vec<String>) -> Self {
        self.skip_patterns = Some(patterns);
        self
    }

    /// Sets directory names to prune from the walk.
    #[must_use]
    pub fn skip_dirs(mut self, dirs: Vec<String>) -> Self {
        self.skip_dirs = Some(dirs);
        self
    }

    /// Enables grouping output by source file instead of by word budget.
    #[must_use]
    pub fn split_on_files(mut self, enabled: bool) -> Self {
        self.split_on_files = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();

        let config = Config {
            repo_dir: self.repo_dir.unwrap_or(defaults.repo_dir),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            max_words: self.max_words.unwrap_or(defaults.max_words),
            max_file_size: self.max_file_size.unwrap_or(defaults.max_file_size),
            skip_patterns: self.skip_patterns.unwrap_or(defaults.skip_patterns),
            skip_dirs: self.skip_dirs.unwrap_or(defaults.skip_dirs),
            split_on_files: self.split_on_files,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder().repo_dir(temp.path()).build().unwrap();

        assert_eq!(config.max_words, DEFAULT_MAX_WORDS);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(!config.split_on_files);
        assert!(config.skip_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_invalid_repo_dir() {
        let result = Config::builder()
            .repo_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_word_budget() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = Config::builder()
            .repo_dir(temp.path())
            .max_words(0)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let temp = assert_fs::TempDir::new().unwrap();

        let config = Config::builder()
            .repo_dir(temp.path())
            .output_dir(temp.path().join("chunks"))
            .max_words(500)
            .skip_dirs(vec!["vendor".to_string()])
            .split_on_files(true)
            .build()
            .unwrap();

        assert_eq!(config.max_words, 500);
        assert_eq!(config.skip_dirs, vec!["vendor".to_string()]);
        assert!(config.split_on_files);
    }
}
