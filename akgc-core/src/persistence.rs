//! On-disk JSON documents: the fact cache and batch reports.
//!
//! A document is replaced as a whole. The new content is streamed into a
//! process-tagged scratch file next to the target, synced, and renamed over
//! it, so readers see either the old document or the new one.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Replace the document at `path` with `value` rendered as pretty JSON.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
        _ => {}
    }

    let scratch = scratch_path(path);
    let written = File::create(&scratch).and_then(|file| {
        let mut out = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::other)?;
        out.write_all(b"\n")?;
        out.into_inner().map_err(|e| e.into_error())?.sync_all()
    });

    match written.and_then(|()| fs::rename(&scratch, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&scratch);
            Err(e)
        }
    }
}

/// Open the document at `path`.
///
/// `Ok(None)` when nothing is stored there yet. Content that does not
/// decode is reported as [`io::ErrorKind::InvalidData`].
pub fn open_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Like [`open_json`], but an absent or unusable document is `T::default()`.
pub fn load_json_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    open_json(path).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable JSON document");
        None
    })
    .unwrap_or_default()
}

fn scratch_path(path: &Path) -> PathBuf {
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{stem}.{}.partial", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    type Entries = BTreeMap<String, Vec<String>>;

    fn france() -> Entries {
        Entries::from([(
            "France".to_string(),
            vec!["The capital of France is Paris.".to_string()],
        )])
    }

    #[test]
    fn test_saved_cache_opens_again() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kg_cache.json");

        save_json(&path, &france()).unwrap();
        assert_eq!(open_json::<Entries>(&path).unwrap(), Some(france()));
    }

    #[test]
    fn test_save_replaces_previous_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kg_cache.json");

        save_json(&path, &france()).unwrap();
        save_json(&path, &Entries::new()).unwrap();
        assert_eq!(open_json::<Entries>(&path).unwrap(), Some(Entries::new()));
    }

    #[test]
    fn test_save_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".akgc").join("runs").join("report.json");

        save_json(&path, &france()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_only_the_document_remains() {
        let dir = TempDir::new().unwrap();
        save_json(&dir.path().join("kg_cache.json"), &france()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("kg_cache.json")]);
    }

    #[test]
    fn test_open_absent_document() {
        let dir = TempDir::new().unwrap();
        let opened = open_json::<Entries>(&dir.path().join("kg_cache.json")).unwrap();
        assert!(opened.is_none());
    }

    #[test]
    fn test_open_garbled_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kg_cache.json");
        fs::write(&path, "{ \"France\": [").unwrap();

        let err = open_json::<Entries>(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_load_or_default_on_wrong_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kg_cache.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let entries: Entries = load_json_or_default(&path);
        assert!(entries.is_empty());
    }
}
