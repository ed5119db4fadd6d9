//! Delimited text serialization of summary tables.
//!
//! Tables are written with the `csv` crate so quoting of odd subject ids
//! stays correct for both comma and tab delimiters.

use crate::analysis::table::{SummaryTable, SUBJECT_COLUMN, TRACT_COLUMN};
use crate::config::OutputConfig;
use crate::error::StatsError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serialize `table` into any writer.
fn write_table_to<W: Write>(
    table: &SummaryTable,
    output: &OutputConfig,
    sink: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(output.format.delimiter())
        .from_writer(sink);

    let mut header: Vec<&str> = Vec::with_capacity(table.columns().len() + 3);
    if output.index_column {
        header.push("");
    }
    header.push(SUBJECT_COLUMN);
    header.push(TRACT_COLUMN);
    header.extend(table.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (i, row) in table.rows().iter().enumerate() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if output.index_column {
            record.push(i.to_string());
        }
        record.push(row.key.subject_id.clone());
        record.push(row.key.tract_id.clone());
        record.extend(
            row.cells
                .iter()
                .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a table to `path`, replacing any existing file.
pub fn write_table(
    table: &SummaryTable,
    output: &OutputConfig,
    path: &Path,
) -> Result<(), StatsError> {
    let file = std::fs::File::create(path).map_err(|e| StatsError::io(path, e))?;
    write_table_to(table, output, std::io::BufWriter::new(file)).map_err(|source| {
        StatsError::Csv {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Path of the per-atlas table: `<dir>/<AtlasName>.<ext>`.
pub fn atlas_table_path(dir: &Path, atlas: &str, output: &OutputConfig) -> PathBuf {
    dir.join(format!("{}.{}", atlas, output.format.extension()))
}
