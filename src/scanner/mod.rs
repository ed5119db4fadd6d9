//! Naming-convention locator for tract result files.
//!
//! Result files live exactly three levels below the input folder:
//! `<root>/<subject>/<*atlas*>/<*atlas*>_<index>[_<side>].txt`.

use crate::config::SweepConfig;
use crate::models::Combination;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Depth of a result file below the input folder.
const RESULT_DEPTH: usize = 3;

/// File locator rooted at the input folder.
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find every result file of one combination, sorted by path bytes.
    ///
    /// An empty result is not an error.
    pub fn locate(&self, combination: &Combination) -> Vec<PathBuf> {
        let suffix = combination.file_suffix();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .min_depth(RESULT_DEPTH)
            .max_depth(RESULT_DEPTH)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if self.matches(entry.path(), &combination.atlas, &suffix) {
                files.push(entry.into_path());
            }
        }

        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        debug!("{}: {} file(s)", combination, files.len());
        files
    }

    /// Locate files for every combination of the sweep, in sweep order.
    pub fn scan_all(&self, sweep: &SweepConfig) -> Vec<(Combination, Vec<PathBuf>)> {
        sweep
            .atlases
            .iter()
            .flat_map(|atlas| sweep.combinations(atlas))
            .map(|combination| {
                let files = self.locate(&combination);
                (combination, files)
            })
            .collect()
    }

    /// Check the atlas folder and file name of a depth-3 path.
    fn matches(&self, path: &Path, atlas: &str, suffix: &str) -> bool {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => return false,
        };

        let stem = match file_name.strip_suffix(suffix) {
            Some(s) => s,
            None => return false,
        };
        if !stem.contains(atlas) {
            return false;
        }

        let atlas_folder = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("");

        atlas_folder.contains(atlas)
    }
}

/// Shell globs never match dot-prefixed names with `*`.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    fn names(files: &[PathBuf], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_locate_sided_and_unsided() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(root, "S2/S2_000001_CorticoCortical/S2_000001_CorticoCortical_1_L.txt");
        touch(root, "S1/S1_000001_CorticoCortical/S1_000001_CorticoCortical_1_L.txt");
        touch(root, "S1/S1_000001_CorticoCortical/S1_000001_CorticoCortical_1.txt");
        touch(root, "S1/S1_000001_CorticoCortical/S1_000001_CorticoCortical_11.txt");
        touch(root, "S1/S1_000001_CorticoCortical/S1_000001_CorticoCortical_1_LR.txt");

        let scanner = FileScanner::new(root.to_path_buf());

        let left = scanner.locate(&Combination::new("CorticoCortical", 1, Side::Left));
        assert_eq!(
            names(&left, root),
            vec![
                "S1/S1_000001_CorticoCortical/S1_000001_CorticoCortical_1_L.txt",
                "S2/S2_000001_CorticoCortical/S2_000001_CorticoCortical_1_L.txt",
            ]
        );

        let unsided = scanner.locate(&Combination::new("CorticoCortical", 1, Side::Unsided));
        assert_eq!(
            names(&unsided, root),
            vec!["S1/S1_000001_CorticoCortical/S1_000001_CorticoCortical_1.txt"]
        );
    }

    #[test]
    fn test_atlas_must_appear_in_folder_and_file() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        // Wrong folder
        touch(root, "S1/other/S1_000001_CorticoCortical_2_R.txt");
        // Wrong file stem
        touch(root, "S1/S1_CorticoCortical/S1_000001_CorticoStriatal_2_R.txt");
        // Too shallow and too deep
        touch(root, "S1/S1_000001_CorticoCortical_2_R.txt");
        touch(root, "S1/x/S1_CorticoCortical/S1_000001_CorticoCortical_2_R.txt");

        let scanner = FileScanner::new(root.to_path_buf());
        let found = scanner.locate(&Combination::new("CorticoCortical", 2, Side::Right));
        assert!(found.is_empty());
    }

    #[test]
    fn test_hidden_entries_are_skipped() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(root, ".cache/S1_CorticoThalamic/S1_000001_CorticoThalamic_3.txt");
        touch(root, "S1/.S1_CorticoThalamic/S1_000001_CorticoThalamic_3.txt");
        touch(root, "S1/S1_CorticoThalamic/.S1_000001_CorticoThalamic_3.txt");
        touch(root, "S1/S1_CorticoThalamic/S1_000001_CorticoThalamic_3.txt");

        let scanner = FileScanner::new(root.to_path_buf());
        let found = scanner.locate(&Combination::new("CorticoThalamic", 3, Side::Unsided));
        assert_eq!(
            names(&found, root),
            vec!["S1/S1_CorticoThalamic/S1_000001_CorticoThalamic_3.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_result_file_is_found() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("results");
        let store = tmp.path().join("store");
        fs::create_dir_all(&store).unwrap();
        fs::write(store.join("payload.json"), "{}").unwrap();

        let atlas_dir = root.join("S1/S1_CorticoCortical");
        fs::create_dir_all(&atlas_dir).unwrap();
        std::os::unix::fs::symlink(
            store.join("payload.json"),
            atlas_dir.join("S1_000001_CorticoCortical_1_L.txt"),
        )
        .unwrap();

        let scanner = FileScanner::new(root.clone());
        let found = scanner.locate(&Combination::new("CorticoCortical", 1, Side::Left));
        assert_eq!(
            names(&found, &root),
            vec!["S1/S1_CorticoCortical/S1_000001_CorticoCortical_1_L.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_subject_dir_is_walked() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("results");
        let store = tmp.path().join("store");
        touch(&store, "S1/S1_CorticoCortical/S1_000001_CorticoCortical_1_L.txt");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(store.join("S1"), root.join("S1")).unwrap();

        let scanner = FileScanner::new(root.clone());
        let found = scanner.locate(&Combination::new("CorticoCortical", 1, Side::Left));
        assert_eq!(
            names(&found, &root),
            vec!["S1/S1_CorticoCortical/S1_000001_CorticoCortical_1_L.txt"]
        );
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        let tmp = tempdir().unwrap();
        let scanner = FileScanner::new(tmp.path().to_path_buf());
        assert!(scanner
            .locate(&Combination::new("CorticoStriatal", 4, Side::RightLeft))
            .is_empty());
    }

    #[test]
    fn test_scan_all_follows_sweep_order() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        touch(root, "S1/S1_CorticoCortical/S1_000001_CorticoCortical_2.txt");

        let sweep = SweepConfig {
            sides: vec![Side::Left, Side::Unsided],
            atlases: vec![crate::config::AtlasConfig {
                name: "CorticoCortical".to_string(),
                indices: vec![1, 2],
            }],
        };
        let scanner = FileScanner::new(root.to_path_buf());
        let all = scanner.scan_all(&sweep);

        let columns: Vec<String> = all.iter().map(|(c, _)| c.column_name()).collect();
        assert_eq!(
            columns,
            vec![
                "CorticoCortical_1_L",
                "CorticoCortical_1",
                "CorticoCortical_2_L",
                "CorticoCortical_2",
            ]
        );
        assert_eq!(all[3].1.len(), 1);
        assert!(all[..3].iter().all(|(_, files)| files.is_empty()));
    }
}
