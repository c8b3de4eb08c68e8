use anyhow::Context;
use clap::Parser;
use ragprep::{Config, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "ragprep",
    version,
    about = "Convert code repositories into retrieval-ready text chunks",
    long_about = "Convert code repositories into retrieval-ready text chunks.\n\n\
    This tool walks a repository, splits each file into semantic units \
    (functions, classes, comments, document sections or whole files) and \
    packs them into bounded-size output files grouped by file type. Files \
    unchanged since the previous run are skipped via content hashing, and \
    .gitignore / .dockerignore patterns are respected.\n\n\
    USAGE EXAMPLES:\n  \
      # Chunk the current directory into ./out\n  \
      ragprep\n\n  \
      # Chunk a specific repository\n  \
      ragprep --dir ./my-project --out ./chunks\n\n  \
      # One output file per source file\n  \
      ragprep --dir ./src --split-on-files\n\n  \
      # Tighter word budget per output file\n  \
      ragprep --dir ./src --max-words 50000"
)]
struct Cli {
    /// Repository directory to process
    #[arg(short, long, default_value = ".", value_name = "PATH")]
    dir: PathBuf,

    /// Output directory for chunk files and run metadata
    #[arg(short, long, default_value = "out", value_name = "PATH")]
    out: PathBuf,

    /// Max words per accumulated output file
    #[arg(long, default_value_t = 200_000)]
    max_words: usize,

    /// Max file size in bytes; larger files are skipped
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    max_file_size: u64,

    /// Additional ignore pattern, gitignore syntax (can be used multiple times)
    #[arg(long = "skip-pattern", value_name = "PATTERN")]
    skip_patterns: Vec<String>,

    /// Directory name to prune from the walk (can be used multiple times)
    #[arg(long = "skip-dir", value_name = "NAME")]
    skip_dirs: Vec<String>,

    /// Group output by source file instead of by word budget
    #[arg(long)]
    split_on_files: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let mut builder = Config::builder()
        .repo_dir(cli.dir)
        .output_dir(cli.out)
        .max_words(cli.max_words)
        .max_file_size(cli.max_file_size)
        .split_on_files(cli.split_on_files);

    if !cli.skip_patterns.is_empty() {
        let mut patterns = vec![".git".to_string()];
        patterns.extend(cli.skip_patterns);
        builder = builder.skip_patterns(patterns);
    }

    if !cli.skip_dirs.is_empty() {
        builder = builder.skip_dirs(cli.skip_dirs);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let metadata = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Repository processing failed")?;

    println!(
        "Processed {} files ({} words), skipped {}",
        metadata.summary.total_files_processed,
        metadata.summary.total_words,
        metadata.skipped_files.len()
    );

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("ragprep=info"),
        1 => EnvFilter::new("ragprep=debug"),
        _ => EnvFilter::new("ragprep=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}
