// Export to and import from dated JSON files

use crate::error::TaskError;
use crate::slot::Slot;
use crate::store::TaskStore;
use crate::view::Notice;
use chrono::{NaiveDate, Utc};
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `todos-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("todos-{}.json", date.format("%Y-%m-%d"))
}

/// Write the pretty-printed task list to `dir/todos-<today>.json`
///
/// "Today" is the UTC date.
pub fn export_to_dir<S: Slot>(store: &mut TaskStore<S>, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    export_to_file(store, &path)?;
    Ok(path)
}

/// Write the pretty-printed task list to `path`
pub fn export_to_file<S: Slot>(store: &mut TaskStore<S>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create export directory")?;
    }

    let snapshot = store.export_all()?;
    fs::write(path, snapshot).with_context(|| format!("Failed to write export file {:?}", path))?;
    info!(path = ?path, count = store.len(), "Exported tasks");

    store.notify(&Notice::success("Tasks exported successfully!"));
    Ok(())
}

/// Replace the store contents with the tasks in a JSON file
pub fn import_from_file<S: Slot>(store: &mut TaskStore<S>, path: &Path) -> Result<usize, TaskError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| TaskError::InvalidImportFormat(format!("cannot read {}: {}", path.display(), e)))?;
    store.import_json(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlot;
    use tempfile::TempDir;

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "todos-2024-03-07.json");
    }

    #[test]
    fn test_export_then_import_file() {
        let temp = TempDir::new().unwrap();
        let mut store = TaskStore::open(MemorySlot::new());
        let a = store.add("a").unwrap();
        store.add("b").unwrap();
        store.toggle(&a.id).unwrap();

        let path = export_to_dir(&mut store, temp.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("todos-") && name.ends_with(".json"));

        let mut other = TaskStore::open(MemorySlot::new());
        assert_eq!(import_from_file(&mut other, &path).unwrap(), 2);
        assert_eq!(other.tasks(), store.tasks());
    }

    #[test]
    fn test_export_file_uses_utc_date() {
        let temp = TempDir::new().unwrap();
        let mut store = TaskStore::open(MemorySlot::new());

        let today = Utc::now().date_naive();
        let path = export_to_dir(&mut store, temp.path()).unwrap();
        // Tolerate the run crossing midnight UTC
        let names = [
            export_file_name(today),
            export_file_name(Utc::now().date_naive()),
        ];
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(names.contains(&name), "unexpected export name {}", name);
    }

    #[test]
    fn test_export_creates_directory() {
        let temp = TempDir::new().unwrap();
        let mut store = TaskStore::open(MemorySlot::new());
        let path = temp.path().join("nested/out.json");

        export_to_file(&mut store, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_import_missing_file() {
        let temp = TempDir::new().unwrap();
        let mut store = TaskStore::open(MemorySlot::new());
        store.add("keep").unwrap();

        let err = import_from_file(&mut store, &temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, TaskError::InvalidImportFormat(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_import_non_array_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{\"tasks\": []}").unwrap();

        let mut store = TaskStore::open(MemorySlot::new());
        store.add("keep").unwrap();

        assert!(matches!(
            import_from_file(&mut store, &path),
            Err(TaskError::InvalidImportFormat(_))
        ));
        assert_eq!(store.len(), 1);
    }
}
