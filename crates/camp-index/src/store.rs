//! Reading and writing the index file

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::IndexError;
use crate::model::Index;

/// Read the index at `path`, or start a fresh one.
///
/// A missing, unreadable or corrupt file yields an empty index; the corrupt
/// file is left in place and overwritten by the next save.
pub fn load_or_empty(path: &Path) -> Index {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No index at {}, starting empty", path.display());
            return Index::empty();
        }
        Err(e) => {
            warn!("Could not read index {}: {}", path.display(), e);
            return Index::empty();
        }
    };

    match serde_json::from_str(&content) {
        Ok(index) => index,
        Err(e) => {
            warn!("Discarding unparseable index {}: {}", path.display(), e);
            Index::empty()
        }
    }
}

/// Sibling path the document is staged in before the rename
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_else(|| "index".as_ref()));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the whole document, replacing `path` atomically via rename
pub fn write_index(path: &Path, index: &Index) -> Result<(), IndexError> {
    let content = serde_json::to_string_pretty(index)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
    }

    let staging = staging_path(path);
    fs::write(&staging, content).map_err(|e| IndexError::io(&staging, e))?;

    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(IndexError::io(path, e));
    }

    debug!("Saved index to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{project, table};
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let index = load_or_empty(&tmp.path().join("nope.json"));
        assert!(index.projects.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&index.last_full_update).is_ok());
    }

    #[test]
    fn test_corrupt_file_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.json");
        fs::write(&path, "{ \"version\": ").unwrap();

        assert!(load_or_empty(&path).projects.is_empty());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deep").join("dir").join("index.json");

        let mut index = Index::empty();
        index.projects = vec![
            project("1", "Alpha", vec![table("t1", &["Backlog", "Doing"])]),
            project("2", "Beta", vec![]),
        ];

        write_index(&path, &index).unwrap();
        assert_eq!(load_or_empty(&path), index);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_write_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.json");

        let mut first = Index::empty();
        first.projects = vec![project("1", "Alpha", vec![])];
        write_index(&path, &first).unwrap();

        let second = Index::empty();
        write_index(&path, &second).unwrap();
        assert_eq!(load_or_empty(&path), second);
    }

    #[test]
    fn test_write_into_unwritable_location_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_index(&blocker.join("index.json"), &Index::empty()).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
    }

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        assert_eq!(
            staging_path(Path::new("/data/index-cache.json")),
            PathBuf::from("/data/.index-cache.json.tmp")
        );
    }
}
