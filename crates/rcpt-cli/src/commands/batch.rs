//! Batch processing command for multiple receipt files.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use rcpt_core::{
    ExtractedRecord, ReceiptExtractor, SourceKind, TextAcquirer, SUPPORTED_EXTENSIONS,
};

use super::process::{format_record, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default: batch.jobs from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

const SUMMARY_FILE: &str = "summary.csv";

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    outcome: Result<Processed, String>,
    processing_time_ms: u64,
}

struct Processed {
    record: ExtractedRecord,
    source: SourceKind,
    pages: u32,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);
    debug!("Processing with {} workers", jobs);

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let acquirer = Arc::new(TextAcquirer::from_config(&config)?);
    let extractor = Arc::new(ReceiptExtractor::from_config(&config.extraction));
    let semaphore = Arc::new(Semaphore::new(jobs));

    let mut tasks = JoinSet::new();
    for path in files {
        let acquirer = Arc::clone(&acquirer);
        let extractor = Arc::clone(&extractor);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let result = tokio::task::spawn_blocking(move || {
                process_file(path, &acquirer, &extractor)
            })
            .await?;
            anyhow::Ok(result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined??;
        progress.inc(1);

        if let Err(e) = &result.outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), e);
            } else {
                error!("Failed to process {}: {}", result.path.display(), e);
                tasks.abort_all();
                progress.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), e);
            }
        }

        results.push(result);
    }

    progress.finish_and_clear();

    // Workers finish in any order
    results.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(output_dir) = &args.output_dir {
        let paths: Vec<&Path> = results.iter().map(|r| r.path.as_path()).collect();
        let reserved = if args.summary { vec![SUMMARY_FILE] } else { Vec::new() };
        let names = output_names(&paths, args.format.extension(), &reserved);

        for (result, output_name) in results.iter().zip(&names) {
            if let Ok(processed) = &result.outcome {
                let output_path = output_dir.join(output_name);

                fs::write(&output_path, format_record(&processed.record, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join(SUMMARY_FILE))
            .unwrap_or_else(|| PathBuf::from(SUMMARY_FILE));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.outcome.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(e) = &result.outcome {
                println!("  - {}: {}", result.path.display(), e);
            }
        }
    }

    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Output file names for `paths`, one per path and all distinct.
///
/// A file is named after its stem (`a.txt` -> `a.json`). Inputs sharing a
/// stem keep their extension (`a.txt.json`, `a.pdf.json`), and any remaining
/// clash gets a numeric suffix.
fn output_names(paths: &[&Path], extension: &str, reserved: &[&str]) -> Vec<String> {
    let stem = |p: &Path| {
        p.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("receipt")
            .to_string()
    };

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for path in paths {
        *stem_counts.entry(stem(path)).or_default() += 1;
    }

    let mut taken: HashSet<String> = reserved.iter().map(|s| s.to_string()).collect();
    let mut names = Vec::with_capacity(paths.len());

    for path in paths {
        let base = if stem_counts[&stem(path)] > 1 {
            path.file_name()
                .and_then(|s| s.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| stem(path))
        } else {
            stem(path)
        };

        let mut name = format!("{}.{}", base, extension);
        let mut n = 2;
        while taken.contains(&name) {
            name = format!("{}-{}.{}", base, n, extension);
            n += 1;
        }

        taken.insert(name.clone());
        names.push(name);
    }

    names
}

fn process_file(path: PathBuf, acquirer: &TextAcquirer, extractor: &ReceiptExtractor) -> FileResult {
    let start = Instant::now();

    let outcome = acquirer
        .acquire(&path)
        .map(|acquisition| Processed {
            record: extractor.extract(&acquisition.text),
            source: acquisition.source,
            pages: acquisition.pages,
        })
        .map_err(|e| e.to_string());

    FileResult {
        path,
        outcome,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "vendor",
        "date",
        "amount",
        "category",
        "currency",
        "source",
        "pages",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.outcome {
            Ok(processed) => {
                let record = &processed.record;
                wtr.write_record([
                    filename,
                    "success",
                    &record.vendor,
                    &record.date.map(|d| d.to_string()).unwrap_or_default(),
                    &record.amount.to_string(),
                    record.category.as_str(),
                    record.currency.code(),
                    processed.source.as_str(),
                    &processed.pages.to_string(),
                    &result.processing_time_ms.to_string(),
                    "",
                ])?;
            }
            Err(e) => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &result.processing_time_ms.to_string(),
                    e,
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
