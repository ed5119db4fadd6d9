//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tractstats - aggregate tractography result counts into summary tables
///
/// Walks <IN_FOLDER>/<subject>/<*atlas*>/<*atlas*>_<index>[_<side>].txt,
/// reads the streamline counts from each JSON result file and writes one
/// table per atlas plus a combined table.
///
/// Examples:
///   tractstats results/ combined.csv
///   tractstats results/ combined.csv -f --atlas-dir tables/
///   tractstats results/ combined.tsv --format tsv --atlas CorticoThalamic
///   tractstats results/ combined.csv --dry-run
///   tractstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Results folder (one sub-folder per subject)
    #[arg(value_name = "IN_FOLDER", required_unless_present = "init_config")]
    pub in_folder: Option<PathBuf>,

    /// Output file for the combined table
    #[arg(value_name = "OUT_FILE", required_unless_present = "init_config")]
    pub out_file: Option<PathBuf>,

    /// Force overwriting of the output files
    #[arg(short = 'f', long)]
    pub overwrite: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tractstats.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "TRACTSTATS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the per-atlas tables (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub atlas_dir: Option<PathBuf>,

    /// Output format (csv, tsv)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Name of the count field inside each filter object
    ///
    /// Example: --count-field tract_count_after_filtering
    #[arg(long, value_name = "NAME")]
    pub count_field: Option<String>,

    /// Only process these atlases (repeatable)
    #[arg(long, value_name = "NAME")]
    pub atlas: Vec<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// List the files each combination would read, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .tractstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Delimited text format of the written tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values (default)
    #[default]
    Csv,
    /// Tab-separated values
    Tsv,
}

impl OutputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let in_folder = self
            .in_folder
            .as_ref()
            .ok_or_else(|| "Missing input folder".to_string())?;
        if !in_folder.is_dir() {
            return Err(format!(
                "Input folder {} does not exist",
                in_folder.display()
            ));
        }

        // Nothing is written on a dry run
        if self.dry_run {
            return Ok(());
        }

        let out_file = self
            .out_file
            .as_ref()
            .ok_or_else(|| "Missing output file".to_string())?;
        if out_file.is_dir() {
            return Err(format!("Output path {} is a directory", out_file.display()));
        }
        if out_file.is_file() && !self.overwrite {
            return Err(format!(
                "Output file {} exists. Use -f to force overwriting",
                out_file.display()
            ));
        }

        if let Some(ref field) = self.count_field {
            if field.trim().is_empty() {
                return Err("Count field name must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
