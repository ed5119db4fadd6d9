//! Tractstats - tractography result aggregator
//!
//! Walks a folder of per-subject tractography results, reads the streamline
//! counts of every per-tract JSON file and writes one summary table per
//! atlas plus a combined table.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (malformed file name, missing JSON field, I/O)
//!   2 - Usage error (bad arguments, output exists without -f)

mod analysis;
mod cli;
mod config;
mod error;
mod extract;
mod models;
mod report;
mod scanner;

use analysis::Aggregator;
use anyhow::{Context, Result};
use clap::CommandFactory;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        usage_error(e);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("Tractstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args, &config) {
        error!("Aggregation failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Report a usage problem through clap and exit with status 2.
fn usage_error(message: String) -> ! {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .exit()
}

/// Handle --init-config: generate a default .tractstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("Edit it to change atlases, sides, field names and output format.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Load configuration, merge CLI overrides and validate the result.
///
/// Invalid combinations of values are usage errors.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = read_config_file(args)?;

    if let Err(e) = config.merge_with_args(args) {
        usage_error(e);
    }
    if let Err(e) = config.validate() {
        usage_error(e);
    }

    Ok(config)
}

fn read_config_file(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location; a file that exists but does not parse is fatal
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Run the sweep and write every table.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let in_folder = args
        .in_folder
        .clone()
        .context("Missing input folder")?;
    info!("Input folder: {}", in_folder.display());

    if args.dry_run {
        return handle_dry_run(in_folder, config);
    }

    let out_file = args.out_file.clone().context("Missing output file")?;
    let atlas_dir = &config.general.atlas_dir;
    std::fs::create_dir_all(atlas_dir)
        .with_context(|| format!("Failed to create {}", atlas_dir.display()))?;

    let show_progress = !args.quiet && std::io::stderr().is_terminal();
    let aggregator = Aggregator::new(in_folder, &config.sweep, &config.schema)
        .with_progress(show_progress);

    let mut written: Vec<PathBuf> = Vec::new();
    let (combined, stats) = aggregator.run(|atlas, table| {
        let path = report::atlas_table_path(atlas_dir, atlas, &config.output);
        report::write_table(table, &config.output, &path)?;
        info!("Wrote {}", path.display());
        written.push(path);
        Ok(())
    })?;

    if combined.is_empty() {
        warn!("No result files matched under the input folder");
    }

    report::write_table(&combined, &config.output, &out_file)?;
    info!("Wrote {}", out_file.display());

    if !args.quiet {
        println!("Summary:");
        for (atlas, files) in &stats.files_per_atlas {
            println!("   {}: {} file(s)", atlas, files);
        }
        println!("   Files processed: {}", stats.files_processed);
        println!("   Rows: {}", combined.len());
        println!("   Columns: {}", combined.columns().len());
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        for path in &written {
            println!("   Atlas table: {}", path.display());
        }
        println!("   Combined table: {}", out_file.display());
    }

    Ok(())
}

/// Handle --dry-run: list the files each combination would read.
fn handle_dry_run(in_folder: PathBuf, config: &Config) -> Result<()> {
    let file_scanner = scanner::FileScanner::new(in_folder);
    let matches = file_scanner.scan_all(&config.sweep);

    let mut total = 0;
    for (combination, files) in &matches {
        if files.is_empty() {
            continue;
        }
        println!("{} ({} file(s))", combination, files.len());
        for file in files {
            let shown = file.strip_prefix(file_scanner.root()).unwrap_or(file);
            println!("   {}", shown.display());
        }
        total += files.len();
    }

    if total == 0 {
        println!("No matching result files found.");
    } else {
        println!("Total: {} file(s)", total);
    }
    Ok(())
}
