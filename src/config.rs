//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tractstats.toml` files. The extraction schema lives here rather than
//! in code because upstream pipelines disagree on field names.

use crate::cli::OutputFormat;
use crate::models::{Combination, Side};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".tractstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// JSON field names read from each result file.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Atlases, region indices and sides to sweep.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Output table settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory receiving the per-atlas tables.
    #[serde(default = "default_atlas_dir")]
    pub atlas_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            atlas_dir: default_atlas_dir(),
        }
    }
}

fn default_atlas_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Key paths of the counts inside a result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Top-level count after the final filtering step.
    #[serde(default = "default_final_count_field")]
    pub final_count_field: String,

    /// Count field inside the filter object.
    #[serde(default = "default_filter_count_field")]
    pub filter_count_field: String,

    /// Filter object read on sided passes.
    #[serde(default = "default_sided_filter")]
    pub sided_filter: String,

    /// Filter object read on the unsided pass.
    #[serde(default = "default_unsided_filter")]
    pub unsided_filter: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            final_count_field: default_final_count_field(),
            filter_count_field: default_filter_count_field(),
            sided_filter: default_sided_filter(),
            unsided_filter: default_unsided_filter(),
        }
    }
}

fn default_final_count_field() -> String {
    "streamline_count_final_filtering".to_string()
}

fn default_filter_count_field() -> String {
    "streamline_count_after_filtering".to_string()
}

fn default_sided_filter() -> String {
    "Filter_0".to_string()
}

fn default_unsided_filter() -> String {
    "Filter_1".to_string()
}

impl SchemaConfig {
    /// Filter object consulted for the given side.
    pub fn filter_for(&self, side: Side) -> &str {
        if side.is_sided() {
            &self.sided_filter
        } else {
            &self.unsided_filter
        }
    }
}

/// One atlas and the region indices it defines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasConfig {
    pub name: String,
    pub indices: Vec<u32>,
}

impl AtlasConfig {
    fn new(name: &str, indices: &[u32]) -> Self {
        Self {
            name: name.to_string(),
            indices: indices.to_vec(),
        }
    }
}

/// The atlas x index x side cross-product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Sides tried for every region index, in order.
    #[serde(default = "default_sides")]
    pub sides: Vec<Side>,

    /// Atlases, in processing order.
    #[serde(default = "default_atlases")]
    pub atlases: Vec<AtlasConfig>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sides: default_sides(),
            atlases: default_atlases(),
        }
    }
}

fn default_sides() -> Vec<Side> {
    vec![
        Side::Left,
        Side::Right,
        Side::LeftRight,
        Side::RightLeft,
        Side::Unsided,
    ]
}

fn default_atlases() -> Vec<AtlasConfig> {
    vec![
        AtlasConfig::new(
            "CorticoCortical",
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17],
        ),
        AtlasConfig::new(
            "CorticoStriatal",
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14, 16, 17],
        ),
        AtlasConfig::new(
            "CorticoThalamic",
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 16],
        ),
    ]
}

impl SweepConfig {
    /// All combinations of one atlas, indices outer and sides inner.
    pub fn combinations(&self, atlas: &AtlasConfig) -> Vec<Combination> {
        atlas
            .indices
            .iter()
            .flat_map(|&index| {
                self.sides
                    .iter()
                    .map(move |&side| Combination::new(atlas.name.clone(), index, side))
            })
            .collect()
    }

    /// Total number of combinations across all atlases.
    pub fn combination_count(&self) -> usize {
        self.atlases
            .iter()
            .map(|a| a.indices.len() * self.sides.len())
            .sum()
    }

    /// Keep only the named atlases, preserving configured order.
    pub fn restrict_to(&mut self, names: &[String]) -> Result<(), String> {
        for name in names {
            if !self.atlases.iter().any(|a| &a.name == name) {
                return Err(format!("Unknown atlas: {}", name));
            }
        }
        self.atlases.retain(|a| names.contains(&a.name));
        Ok(())
    }
}

/// Output table settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Delimiter and file extension of written tables.
    #[serde(default)]
    pub format: OutputFormat,

    /// Prepend an unnamed 0-based row number column.
    #[serde(default)]
    pub index_column: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            index_column: false,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) -> Result<(), String> {
        if let Some(ref dir) = args.atlas_dir {
            self.general.atlas_dir = dir.clone();
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
        if let Some(ref field) = args.count_field {
            self.schema.filter_count_field = field.clone();
        }
        if !args.atlas.is_empty() {
            self.sweep.restrict_to(&args.atlas)?;
        }
        Ok(())
    }

    /// Check the sweep and schema for values that cannot produce a table.
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep.atlases.is_empty() {
            return Err("At least one atlas must be configured".to_string());
        }
        if self.sweep.sides.is_empty() {
            return Err("At least one side must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for atlas in &self.sweep.atlases {
            if atlas.name.trim().is_empty() {
                return Err("Atlas names must not be empty".to_string());
            }
            if !seen.insert(atlas.name.as_str()) {
                return Err(format!("Atlas configured twice: {}", atlas.name));
            }
            if atlas.indices.is_empty() {
                return Err(format!("Atlas {} has no region indices", atlas.name));
            }
        }

        let fields = [
            &self.schema.final_count_field,
            &self.schema.filter_count_field,
            &self.schema.sided_filter,
            &self.schema.unsided_filter,
        ];
        if fields.iter().any(|f| f.is_empty()) {
            return Err("Schema field names must not be empty".to_string());
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
