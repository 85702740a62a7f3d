//! cellfill - Reconstruct table cells from rulings and text
//!
//! Reads JSON page descriptions (page size, ruling segments, text fragments
//! and table regions) and prints the reconstructed cells of every region
//! as JSON or as tab-separated text.

mod document;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cellfill_core::high_level::{PageOptions, page_cell_text};
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use document::{PageInput, RegionOutput, write_json, write_text};

/// Output type for the reconstructed cells.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputType {
    /// JSON array of regions with their cells (default)
    #[default]
    Json,
    /// One tab-separated line per cell
    Text,
}

/// Reconstruct table cell grids from ruling segments and text.
#[derive(Parser, Debug)]
#[command(name = "cellfill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more JSON page descriptions
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Type of output to generate
    #[arg(short = 't', long = "output-type", value_enum, default_value = "json")]
    output_type: OutputType,

    /// Language code overriding the one in the page files
    #[arg(long)]
    language: Option<String>,

    /// Number of worker threads (default: available parallelism)
    #[arg(long)]
    threads: Option<usize>,

    /// Maximum repair passes per region
    #[arg(long = "max-passes", default_value = "4")]
    max_passes: usize,

    /// Do not split cells holding two widely separated fragments
    #[arg(long = "no-split", action = ArgAction::SetTrue)]
    no_split: bool,

    /// Keep empty edge columns without a backing ruling
    #[arg(long = "no-clean", action = ArgAction::SetTrue)]
    no_clean: bool,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn process_file(path: &Path, args: &Args) -> Result<Vec<RegionOutput>> {
    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let input = PageInput::from_json(&json).with_context(|| format!("in {}", path.display()))?;
    let page = input.to_page(args.language.as_deref())?;

    let mut options = PageOptions {
        threads: args.threads,
        split_cells: !args.no_split,
        clean_edge_columns: !args.no_clean,
        ..PageOptions::default()
    };
    options.region.max_passes = args.max_passes;
    options.region.seeds = input.seeds();

    let regions = page_cell_text(&page, &input.regions(), &options)?;
    tracing::debug!(file = %path.display(), regions = regions.len(), "processed page");
    Ok(regions
        .iter()
        .map(|(region, cells)| RegionOutput::new(region, cells))
        .collect())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.debug);

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .map_err(|e| format!("Failed to create output file {}: {}", args.outfile, e))?;
        Box::new(BufWriter::new(file))
    };

    let mut regions = Vec::new();
    for path in &args.files {
        if !path.exists() {
            eprintln!("Error: File not found: {}", path.display());
            std::process::exit(1);
        }
        match process_file(path, &args) {
            Ok(found) => regions.extend(found),
            Err(e) => {
                eprintln!("Error processing {}: {:#}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    match args.output_type {
        OutputType::Json => write_json(&mut output, &regions)?,
        OutputType::Text => write_text(&mut output, &regions)?,
    }
    output.flush()?;

    Ok(())
}
