//! dupetree - find duplicate files and prune them from a disposable subtree.
//!
//! Usage:
//!   dupetree index ROOT                     Build the fingerprint index
//!   dupetree report ROOT -d DISPOSABLE      Show heavily duplicated subtrees
//!   dupetree prune ROOT -d DISPOSABLE       Remove duplicates from DISPOSABLE
//!   dupetree --help                         Show help

mod logging;
mod settings;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};

use dupetree_analyze::{
    DupeReport, deletable_files, disposable_candidates, find_duplicates, highest_duplicates,
};
use dupetree_core::{DedupeConfig, DupeTree, FingerprintIndex};
use dupetree_ops::{DeleteOptions, Deleter};
use dupetree_scan::{IndexConfig, Indexer, ScanProgress, TreeBuilder};

use settings::Overrides;

#[derive(Parser)]
#[command(
    name = "dupetree",
    version,
    about = "Find duplicate files and prune them from a disposable subtree",
    long_about = "dupetree fingerprints every file under a root, then reports which \
                  directories are made up of duplicates. A file only counts as a \
                  duplicate when a copy of it survives outside the disposable \
                  directory, so pruning never removes the last copy."
)]
struct Cli {
    /// Log at debug level (overrides DUPETREE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and persist the fingerprint index
    Index {
        /// Directory to index
        root: PathBuf,

        /// Index file to write
        #[arg(short, long, default_value = "index.csv")]
        index: PathBuf,
    },

    /// Report duplicated subtrees
    Report {
        /// Directory to analyze
        root: PathBuf,

        /// Directory whose files may be removed
        #[arg(short, long)]
        disposable: Option<PathBuf>,

        /// Index file to read, built first if missing
        #[arg(short, long, default_value = "index.csv")]
        index: PathBuf,

        /// Rebuild the index even if it exists
        #[arg(long)]
        rebuild: bool,

        /// Minimum duplicate fraction for a subtree to be reported
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Report only candidates with more duplicates than this
        #[arg(short, long)]
        min_duplicates: Option<u64>,

        /// Report every minimal subtree, not only disposable candidates
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete duplicate files from the disposable directory
    Prune {
        /// Directory to analyze
        root: PathBuf,

        /// Directory whose files may be removed
        #[arg(short, long)]
        disposable: Option<PathBuf>,

        /// Index file to read, built first if missing
        #[arg(short, long, default_value = "index.csv")]
        index: PathBuf,

        /// Rebuild the index even if it exists
        #[arg(long)]
        rebuild: bool,

        /// List what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,

        /// Move files to the trash instead of deleting them
        #[arg(long)]
        trash: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Index { root, index } => {
            run_index(&root, &index, &config)?;
        }
        Command::Report {
            root,
            disposable,
            index,
            rebuild,
            threshold,
            min_duplicates,
            all,
            format,
        } => {
            let overrides = Overrides {
                disposable,
                threshold,
                min_duplicates,
            };
            let config = settings::apply(config, overrides)?;
            run_report(&root, &index, rebuild, all, format, &config)?;
        }
        Command::Prune {
            root,
            disposable,
            index,
            rebuild,
            dry_run,
            trash,
        } => {
            let overrides = Overrides {
                disposable,
                ..Default::default()
            };
            let config = settings::apply(config, overrides)?;
            let options = DeleteOptions {
                dry_run,
                use_trash: trash,
            };
            run_prune(&root, &index, rebuild, options, &config)?;
        }
    }

    Ok(())
}

fn log_progress(progress: &ScanProgress) {
    tracing::info!(
        items = progress.items,
        per_second = progress.items_per_second() as u64,
        path = %progress.current_path.display(),
        "{}",
        progress.phase
    );
}

/// Index `root` and write the result to `index_path`.
fn build_index(root: &Path, index_path: &Path, config: &DedupeConfig) -> Result<FingerprintIndex> {
    eprintln!("Indexing {}...", root.display());

    let indexer = Indexer::with_config(IndexConfig::from(config));
    let output = indexer
        .index_with_progress(root, log_progress)
        .context("Indexing failed")?;
    let rows = output
        .write_to(index_path)
        .wrap_err_with(|| format!("Failed to write {}", index_path.display()))?;

    let stats = &output.stats;
    eprintln!(
        " {} files, {} hashed ({}), {} rows written to {} in {:.2}s",
        stats.files_enumerated,
        stats.files_hashed,
        format_size(stats.bytes_hashed),
        rows,
        index_path.display(),
        stats.duration.as_secs_f64()
    );
    if !output.warnings.is_empty() {
        eprintln!(" {} warning(s) during indexing", output.warnings.len());
    }

    Ok(FingerprintIndex::new(output.records))
}

/// Load the index at `index_path`, building it first if needed.
fn open_index(
    root: &Path,
    index_path: &Path,
    rebuild: bool,
    config: &DedupeConfig,
) -> Result<FingerprintIndex> {
    if rebuild || !index_path.exists() {
        return build_index(root, index_path, config);
    }
    tracing::info!(path = %index_path.display(), "loading index");
    FingerprintIndex::load(index_path)
        .wrap_err_with(|| format!("Failed to read {}", index_path.display()))
}

/// Build the duplicate tree for `root`.
fn analyze(root: &Path, index_path: &Path, rebuild: bool, config: &DedupeConfig) -> Result<DupeTree> {
    let root = root.canonicalize().context("Invalid path")?;
    let index = open_index(&root, index_path, rebuild, config)?;

    let tree = TreeBuilder::new()
        .with_progress_interval(config.progress_interval)
        .build_with_progress(&root, log_progress)
        .context("Scan failed")?;
    if tree.has_warnings() {
        eprintln!(" {} warning(s) during scan", tree.warnings.len());
    }

    Ok(find_duplicates(&index, &tree, &config.disposable_root))
}

fn run_index(root: &Path, index_path: &Path, config: &DedupeConfig) -> Result<()> {
    let root = root.canonicalize().context("Invalid path")?;
    build_index(&root, index_path, config)?;
    Ok(())
}

fn run_report(
    root: &Path,
    index_path: &Path,
    rebuild: bool,
    all: bool,
    format: OutputFormat,
    config: &DedupeConfig,
) -> Result<()> {
    let dupes = analyze(root, index_path, rebuild, config)?;
    let selected = highest_duplicates(&dupes, config.threshold)?;
    let report = if all {
        DupeReport::new(&dupes, &config.disposable_root, selected)
    } else {
        let candidates =
            disposable_candidates(selected, &config.disposable_root, config.min_duplicates);
        DupeReport::new(&dupes, &config.disposable_root, candidates)
    };

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_report(report: &DupeReport) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" Duplicate Report for {}", report.root.display());
    println!(
        " {} of {} files duplicated ({:.1}%)",
        report.duplicates,
        report.total,
        report.percentage * 100.0
    );
    println!(" Disposable: {}", report.disposable_root);
    println!("{}", "─".repeat(70));
    println!();

    if !report.has_entries() {
        println!(" No duplicated subtrees found.");
        return;
    }

    for entry in &report.entries {
        let dir_marker = if entry.is_dir { "/" } else { "" };
        println!(
            " {:>8}  {}{} ({:.1}%)",
            entry.total,
            entry.path.display(),
            dir_marker,
            entry.percentage * 100.0
        );
    }
    println!();
    println!(
        " {} duplicate file(s) in {} selected subtree(s)",
        report.selected_duplicates(),
        report.entries.len()
    );
}

fn run_prune(
    root: &Path,
    index_path: &Path,
    rebuild: bool,
    options: DeleteOptions,
    config: &DedupeConfig,
) -> Result<()> {
    let dupes = analyze(root, index_path, rebuild, config)?;
    let targets: Vec<&Path> = deletable_files(&dupes, &config.disposable_root)
        .map(|node| node.path.as_path())
        .collect();

    if targets.is_empty() {
        println!(" Nothing to delete.");
        return Ok(());
    }
    let deleter = Deleter::with_options(config.disposable_root.clone(), options);
    if deleter.options().dry_run {
        for path in &targets {
            println!("   {}", path.display());
        }
    }

    let complete = deleter.delete_with_progress(&targets, |progress| {
        if let Some(path) = &progress.current_file {
            tracing::debug!(
                done = progress.files_completed,
                total = progress.files_total,
                path = %path.display(),
                "deleting"
            );
        }
    });

    println!(" {}", complete.summary());
    for error in &complete.errors {
        eprintln!("   {}", error);
    }
    if !complete.is_success() {
        bail!("{} deletion(s) failed", complete.failed);
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
