//! The atlas x index x side sweep.
//!
//! Fills one table per atlas and a combined table in a single linear pass.
//! The first error aborts the sweep; per-atlas tables already handed to the
//! sink are not rolled back.

use crate::analysis::table::SummaryTable;
use crate::config::{SchemaConfig, SweepConfig};
use crate::error::StatsError;
use crate::extract::read_record;
use crate::scanner::FileScanner;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info};

/// Counters gathered during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Result files read across all atlases.
    pub files_processed: usize,
    /// Files read per atlas, in sweep order.
    pub files_per_atlas: Vec<(String, usize)>,
}

/// Orchestrates locate, extract and upsert for every combination.
pub struct Aggregator<'a> {
    scanner: FileScanner,
    sweep: &'a SweepConfig,
    schema: &'a SchemaConfig,
    show_progress: bool,
}

impl<'a> Aggregator<'a> {
    pub fn new(in_folder: PathBuf, sweep: &'a SweepConfig, schema: &'a SchemaConfig) -> Self {
        Self {
            scanner: FileScanner::new(in_folder),
            sweep,
            schema,
            show_progress: false,
        }
    }

    /// Draw a progress bar ticking once per combination.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the sweep.
    ///
    /// `on_atlas` receives each finished per-atlas table before the next
    /// atlas starts. Returns the combined table.
    pub fn run<F>(&self, mut on_atlas: F) -> Result<(SummaryTable, RunStats), StatsError>
    where
        F: FnMut(&str, &SummaryTable) -> Result<(), StatsError>,
    {
        let progress = self.progress_bar();
        let result = self.sweep_atlases(&progress, &mut on_atlas);
        progress.finish_and_clear();
        result
    }

    fn sweep_atlases<F>(
        &self,
        progress: &ProgressBar,
        on_atlas: &mut F,
    ) -> Result<(SummaryTable, RunStats), StatsError>
    where
        F: FnMut(&str, &SummaryTable) -> Result<(), StatsError>,
    {
        let mut combined = SummaryTable::new();
        let mut stats = RunStats::default();

        for atlas in &self.sweep.atlases {
            progress.set_message(atlas.name.clone());
            let mut atlas_table = SummaryTable::new();
            let mut atlas_files = 0;

            for combination in self.sweep.combinations(atlas) {
                let column = combination.column_name();

                for path in self.scanner.locate(&combination) {
                    let record = read_record(&path, combination.side, self.schema)?;
                    debug!(
                        "{} {}/{} <- {}",
                        column,
                        record.key.subject_id,
                        record.key.tract_id,
                        path.display()
                    );

                    atlas_table.upsert(&record, &column);
                    combined.upsert(&record, &column);
                    atlas_files += 1;
                }

                progress.inc(1);
            }

            info!(
                "{}: {} file(s), {} row(s), {} column(s)",
                atlas.name,
                atlas_files,
                atlas_table.len(),
                atlas_table.columns().len()
            );
            on_atlas(&atlas.name, &atlas_table)?;

            stats.files_processed += atlas_files;
            stats.files_per_atlas.push((atlas.name.clone(), atlas_files));
        }

        Ok((combined, stats))
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(self.sweep.combination_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}
