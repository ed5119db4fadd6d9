//! Data models for the stats aggregator.
//!
//! This module contains the small value types shared between the
//! locator, the extractors, and the summary tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Laterality qualifier of a region index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Side {
    Left,
    Right,
    LeftRight,
    RightLeft,
    /// No side; the file name carries only the region index.
    Unsided,
}

impl Side {
    /// The label used in file and column names (empty when unsided).
    pub fn label(&self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
            Side::LeftRight => "LR",
            Side::RightLeft => "RL",
            Side::Unsided => "",
        }
    }

    pub fn is_sided(&self) -> bool {
        !matches!(self, Side::Unsided)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(Side::Left),
            "R" => Ok(Side::Right),
            "LR" => Ok(Side::LeftRight),
            "RL" => Ok(Side::RightLeft),
            "" => Ok(Side::Unsided),
            other => Err(format!(
                "unknown side '{}' (expected one of L, R, LR, RL or \"\")",
                other
            )),
        }
    }
}

impl TryFrom<String> for Side {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Side> for String {
    fn from(side: Side) -> Self {
        side.label().to_string()
    }
}

/// One (atlas, region index, side) cell of the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub atlas: String,
    pub index: u32,
    pub side: Side,
}

impl Combination {
    pub fn new(atlas: impl Into<String>, index: u32, side: Side) -> Self {
        Self {
            atlas: atlas.into(),
            index,
            side,
        }
    }

    /// Column name: `<atlas>_<index>` or `<atlas>_<index>_<side>`.
    pub fn column_name(&self) -> String {
        if self.side.is_sided() {
            format!("{}_{}_{}", self.atlas, self.index, self.side)
        } else {
            format!("{}_{}", self.atlas, self.index)
        }
    }

    /// Suffix every matching result file name ends with.
    pub fn file_suffix(&self) -> String {
        if self.side.is_sided() {
            format!("_{}_{}.txt", self.index, self.side)
        } else {
            format!("_{}.txt", self.index)
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

/// Row key of a summary table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TractKey {
    pub subject_id: String,
    /// Six-digit tract id, kept as text so leading zeros survive.
    pub tract_id: String,
}

impl TractKey {
    pub fn new(subject_id: impl Into<String>, tract_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            tract_id: tract_id.into(),
        }
    }
}

/// Counts read from one result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub key: TractKey,
    /// Streamlines left after the final filtering step.
    pub count_after_streamline_filter: i64,
    /// Streamlines left after the region filter of this pass.
    pub count_after_region_filter: i64,
}
