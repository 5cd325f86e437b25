//! Observation and logging layer loaders

mod layers;
mod observations;

pub use layers::{LayerFilter, LayerLoader};
pub use observations::{CleaningStats, ObservationLoader};

use fellwatch_core::error::{FellwatchError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Files directly in `dir` with one of `extensions` (case-insensitive),
/// sorted by name so observation ids are stable between runs
pub fn discover_input_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FellwatchError::NoInputFiles { dir: dir.to_path_buf() })
        }
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false);

        // Skip lock files Excel leaves next to open workbooks
        let is_lock_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("~$"))
            .unwrap_or(false);

        if matches && !is_lock_file && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(FellwatchError::NoInputFiles { dir: dir.to_path_buf() });
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b_2023.xlsx", "a_2021.XLSX", "notes.txt", "~$b_2023.xlsx"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("processed.xlsx")).unwrap();

        let files = discover_input_files(dir.path(), &["xlsx"]).unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_str().unwrap().to_string()).collect();
        assert_eq!(names, vec!["a_2021.XLSX", "b_2023.xlsx"]);
    }

    #[test]
    fn test_no_input_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();

        assert!(matches!(
            discover_input_files(dir.path(), &["xlsx"]),
            Err(FellwatchError::NoInputFiles { .. })
        ));
        assert!(matches!(
            discover_input_files(&dir.path().join("missing"), &["xlsx"]),
            Err(FellwatchError::NoInputFiles { .. })
        ));
    }
}
