//! Identifier and count extraction from a single result file.

use crate::config::SchemaConfig;
use crate::error::StatsError;
use crate::models::{ResultRecord, Side, TractKey};
use regex::Regex;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;

/// Greedy prefix, so the last `_######` group in the name is the tract id.
const IDENTIFIER_PATTERN: &str = r"^(.*)_([0-9]{6})";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"))
}

/// Split a result file name into its subject id and tract id.
pub fn parse_identifiers(path: &Path) -> Result<TractKey, StatsError> {
    let malformed = || StatsError::MalformedFilename {
        path: path.to_path_buf(),
    };

    let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(malformed)?;
    let caps = identifier_regex().captures(file_name).ok_or_else(malformed)?;

    Ok(TractKey::new(&caps[1], &caps[2]))
}

/// Read both counts from a parsed result document.
///
/// Returns `(count_after_streamline_filter, count_after_region_filter)`.
pub fn extract_counts(
    doc: &Value,
    side: Side,
    schema: &SchemaConfig,
    path: &Path,
) -> Result<(i64, i64), StatsError> {
    let final_count = integer_at(doc, &[&schema.final_count_field], path)?;
    let filter = schema.filter_for(side);
    let region_count = integer_at(doc, &[filter, &schema.filter_count_field], path)?;
    Ok((final_count, region_count))
}

/// Parse one result file into a record.
pub fn read_record(
    path: &Path,
    side: Side,
    schema: &SchemaConfig,
) -> Result<ResultRecord, StatsError> {
    let key = parse_identifiers(path)?;

    let doc: Value = {
        let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            if source.is_io() {
                StatsError::io(path, source.into())
            } else {
                StatsError::InvalidJson {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?
    };

    let (count_after_streamline_filter, count_after_region_filter) =
        extract_counts(&doc, side, schema, path)?;

    Ok(ResultRecord {
        key,
        count_after_streamline_filter,
        count_after_region_filter,
    })
}

fn integer_at(doc: &Value, keys: &[&str], path: &Path) -> Result<i64, StatsError> {
    let field = keys.join(".");

    let mut current = doc;
    for key in keys {
        current = current
            .get(*key)
            .ok_or_else(|| StatsError::missing_field(path, field.clone()))?;
    }

    current.as_i64().ok_or_else(|| StatsError::InvalidField {
        path: path.to_path_buf(),
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_parse_identifiers() {
        let key = parse_identifiers(Path::new(
            "in/S001/S001_000042_CorticoCortical/S001_000042_CorticoCortical_1_L.txt",
        ))
        .unwrap();
        assert_eq!(key.subject_id, "S001");
        assert_eq!(key.tract_id, "000042");
    }

    #[test]
    fn test_parse_identifiers_takes_last_group() {
        let key = parse_identifiers(Path::new("sub_123456_run_654321_CorticoStriatal_3.txt"))
            .unwrap();
        assert_eq!(key.subject_id, "sub_123456_run");
        assert_eq!(key.tract_id, "654321");
    }

    #[test]
    fn test_parse_identifiers_ignores_directories() {
        // Digits in the folder name do not rescue a malformed file name
        let err = parse_identifiers(Path::new(
            "in/S_000001/S_000001_CorticoCortical/SUBJ_ABC_CorticoCortical_1.txt",
        ))
        .unwrap_err();
        assert!(matches!(err, StatsError::MalformedFilename { .. }));
    }

    #[test]
    fn test_parse_identifiers_rejects_short_ids() {
        let err = parse_identifiers(Path::new("S001_12345_CorticoCortical_1.txt")).unwrap_err();
        assert!(matches!(err, StatsError::MalformedFilename { .. }));
    }

    #[test]
    fn test_extract_counts_sided_and_unsided() {
        let doc = json!({
            "streamline_count_final_filtering": 120,
            "Filter_0": {"streamline_count_after_filtering": 150},
            "Filter_1": {"streamline_count_after_filtering": 175},
        });
        let schema = SchemaConfig::default();
        let path = PathBuf::from("x.txt");

        assert_eq!(
            extract_counts(&doc, Side::Left, &schema, &path).unwrap(),
            (120, 150)
        );
        assert_eq!(
            extract_counts(&doc, Side::Unsided, &schema, &path).unwrap(),
            (120, 175)
        );
    }

    #[test]
    fn test_missing_sided_filter() {
        let doc = json!({
            "streamline_count_final_filtering": 120,
            "Filter_1": {"streamline_count_after_filtering": 175},
        });
        let err = extract_counts(&doc, Side::RightLeft, &SchemaConfig::default(), Path::new("x"))
            .unwrap_err();
        match err {
            StatsError::MissingField { field, .. } => {
                assert_eq!(field, "Filter_0.streamline_count_after_filtering")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_final_count() {
        let doc = json!({"Filter_0": {"streamline_count_after_filtering": 1}});
        let err = extract_counts(&doc, Side::Left, &SchemaConfig::default(), Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, StatsError::MissingField { .. }));
    }

    #[test]
    fn test_non_integer_count() {
        let doc = json!({
            "streamline_count_final_filtering": "many",
            "Filter_0": {"streamline_count_after_filtering": 1},
        });
        let err = extract_counts(&doc, Side::Left, &SchemaConfig::default(), Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, StatsError::InvalidField { .. }));
    }

    #[test]
    fn test_alternate_schema() {
        let doc = json!({
            "streamline_count_final_filtering": 7,
            "Filter_0": {"tract_count_after_filtering": 9},
        });
        let schema = SchemaConfig {
            filter_count_field: "tract_count_after_filtering".to_string(),
            ..SchemaConfig::default()
        };
        assert_eq!(
            extract_counts(&doc, Side::Left, &schema, Path::new("x")).unwrap(),
            (7, 9)
        );
    }

    #[test]
    fn test_read_record_from_disk() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("S9_000777_CorticoThalamic_5_R.txt");
        fs::write(
            &path,
            r#"{"streamline_count_final_filtering": 3, "Filter_0": {"streamline_count_after_filtering": 4}}"#,
        )
        .unwrap();

        let record = read_record(&path, Side::Right, &SchemaConfig::default()).unwrap();
        assert_eq!(record.key, TractKey::new("S9", "000777"));
        assert_eq!(record.count_after_streamline_filter, 3);
        assert_eq!(record.count_after_region_filter, 4);
    }

    #[test]
    fn test_read_record_invalid_json() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("S9_000777_CorticoThalamic_5.txt");
        fs::write(&path, "streamlines: 3").unwrap();

        let err = read_record(&path, Side::Unsided, &SchemaConfig::default()).unwrap_err();
        assert!(matches!(err, StatsError::InvalidJson { .. }));
    }
}
