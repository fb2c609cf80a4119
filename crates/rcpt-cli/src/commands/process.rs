//! Process command - extract a record from a single receipt file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::{Acquisition, ExtractedRecord, ReceiptExtractor, TextAcquirer};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (.txt, .jpg, .jpeg, .png or .pdf)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Tesseract executable to use instead of the configured one
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// ONNX model directory to use instead of the configured one
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Print the acquired raw text to stderr
    #[arg(long)]
    show_text: bool,

    /// Show processing times
    #[arg(long)]
    show_timing: bool,

    /// Validate the extracted record
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for outputs written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(tesseract) = &args.tesseract {
        config.ocr.tesseract_path = tesseract.clone();
    }
    if let Some(model_dir) = &args.model_dir {
        config.ocr.model_dir = model_dir.clone();
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Acquiring text...");
    pb.set_position(10);

    let acquirer = TextAcquirer::from_config(&config)?;
    let input = args.input.clone();
    let acquisition: Acquisition =
        tokio::task::spawn_blocking(move || acquirer.acquire(&input)).await??;

    pb.set_message("Extracting receipt fields...");
    pb.set_position(70);

    let extractor = ReceiptExtractor::from_config(&config.extraction);
    let outcome = extractor.extract_with_outcome(&acquisition.text);

    pb.set_position(100);
    pb.finish_and_clear();

    if args.show_text {
        eprintln!("{}", style("Raw text:").bold());
        eprintln!("{}", acquisition.text);
    }

    if let Some(reason) = &outcome.fallback_reason {
        eprintln!(
            "{} Extraction fell back to defaults: {}",
            style("⚠").yellow(),
            reason
        );
    }

    // Validate if requested
    if args.validate {
        let issues = outcome.record.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_record(&outcome.record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_timing {
        eprintln!(
            "{} Acquired {} page(s) of {} in {}ms",
            style("ℹ").blue(),
            acquisition.pages,
            acquisition.source,
            acquisition.processing_time_ms
        );
        eprintln!(
            "{} Extraction time: {}ms",
            style("ℹ").blue(),
            outcome.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a record in the requested output format.
pub fn format_record(record: &ExtractedRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &ExtractedRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["vendor", "date", "amount", "category", "currency"])?;
    wtr.write_record([
        record.vendor.as_str(),
        &record.date.map(|d| d.to_string()).unwrap_or_default(),
        &record.amount.to_string(),
        record.category.as_str(),
        record.currency.code(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &ExtractedRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Vendor:   {}\n", record.vendor));
    match record.date {
        Some(date) => output.push_str(&format!("Date:     {}\n", date)),
        None => output.push_str("Date:     (not found)\n"),
    }
    output.push_str(&format!("Amount:   {} {}\n", record.amount, record.currency));
    output.push_str(&format!("Category: {}\n", record.category));

    output
}
