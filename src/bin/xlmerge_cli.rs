//! CLI tool for xlmerge - consolidates XLSX files into one sheet
//!
//! Usage:
//!   xlmerge_cli a.xlsx b.xlsx -o merged.xlsx
//!   xlmerge_cli *.xlsx -o merged.xlsx --config merge.json --no-signature

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use xlmerge::{merge_to_workbook, write_with_fallback, MergeConfig, OutputBase};

#[derive(Parser)]
#[command(about = "Merge XLSX workbooks into a single \"Consolidated\" sheet.")]
struct Args {
    /// Input workbooks, merged in the order given.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output workbook path.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON merge config (camelCase keys); flags below override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// First data row of every sheet; rows above it are the header.
    #[arg(long)]
    start_row: Option<u32>,

    /// First column of the copied window (letters).
    #[arg(long)]
    start_column: Option<String>,

    /// Last column of the copied window (letters).
    #[arg(long)]
    end_column: Option<String>,

    /// Drop TOTAL rows and subtotal-shaped rows.
    #[arg(long)]
    no_total: bool,

    /// Do not append a signature section.
    #[arg(long)]
    no_signature: bool,

    /// `fresh` or `first-input`.
    #[arg(long)]
    output_base: Option<OutputBase>,
}

impl Args {
    fn merge_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                MergeConfig::from_json(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => MergeConfig::default(),
        };

        if let Some(row) = self.start_row {
            config.start_row = row;
        }
        if let Some(col) = &self.start_column {
            config.start_column.clone_from(col);
        }
        if let Some(col) = &self.end_column {
            config.end_column.clone_from(col);
        }
        if self.no_total {
            config.include_total = false;
        }
        if self.no_signature {
            config.include_signature = false;
        }
        if let Some(base) = self.output_base {
            config.output_base = base;
        }

        let config = config.normalized();
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.merge_config()?;

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        sources.push(bytes);
    }

    let outcome = merge_to_workbook(&sources, &config).context("merging workbooks")?;
    let bytes = write_with_fallback(&outcome.workbook).context("writing merged workbook")?;
    fs::write(&args.output, bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;

    eprintln!("{}", outcome.summary);
    eprintln!("wrote {}", args.output.display());
    Ok(())
}
